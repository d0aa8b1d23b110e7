//! Offline fallback speech — used only for lines whose synthesis failed.
//!
//! [`ProcessSpeaker`] pipes the raw line text into a local TTS command
//! (`espeak-ng` by default) over stdin and waits for it to exit.  Quality
//! is well below the synthesis service, but the line is still heard.

use std::io::Write;
use std::process::{Command, Stdio};

use crate::config::PlaybackConfig;
use crate::playback::output::OutputError;

// ---------------------------------------------------------------------------
// FallbackSpeaker trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for the offline speech path.
///
/// Implementations speak `text` synchronously.
pub trait FallbackSpeaker: Send + Sync {
    /// Speak `text` aloud, blocking until done.
    fn speak(&self, text: &str) -> Result<(), OutputError>;
}

// ---------------------------------------------------------------------------
// ProcessSpeaker
// ---------------------------------------------------------------------------

/// Runs a local TTS program, feeding it the text on stdin.
#[derive(Debug, Clone)]
pub struct ProcessSpeaker {
    program: String,
    args: Vec<String>,
}

impl ProcessSpeaker {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &PlaybackConfig) -> Self {
        Self::new(config.fallback_command.clone(), config.fallback_args.clone())
    }
}

impl FallbackSpeaker for ProcessSpeaker {
    fn speak(&self, text: &str) -> Result<(), OutputError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| OutputError::Fallback(format!("{}: {e}", self.program)))?;

        if let Some(stdin) = child.stdin.as_mut() {
            stdin
                .write_all(text.as_bytes())
                .and_then(|()| stdin.write_all(b"\n"))
                .map_err(|e| OutputError::Fallback(format!("{}: {e}", self.program)))?;
        }
        // Drop stdin so the child sees EOF and finishes speaking.
        drop(child.stdin.take());

        let status = child
            .wait()
            .map_err(|e| OutputError::Fallback(format!("{}: {e}", self.program)))?;

        if !status.success() {
            return Err(OutputError::Fallback(format!(
                "{} exited with {status}",
                self.program
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_reports_fallback_error() {
        let speaker = ProcessSpeaker::new("definitely-not-a-real-tts-binary", vec![]);
        let err = speaker.speak("hello").unwrap_err();
        assert!(matches!(err, OutputError::Fallback(_)));
    }

    /// `cat` consumes stdin and exits 0 — stands in for a working TTS binary.
    #[test]
    #[cfg(unix)]
    fn successful_command_returns_ok() {
        let speaker = ProcessSpeaker::new("cat", vec![]);
        speaker.speak("hello").unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn failing_command_returns_error() {
        let speaker = ProcessSpeaker::new("false", vec![]);
        assert!(speaker.speak("hello").is_err());
    }

    #[test]
    fn speaker_is_object_safe() {
        let _: Box<dyn FallbackSpeaker> = Box::new(ProcessSpeaker::new("cat", vec![]));
    }
}
