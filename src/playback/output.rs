//! Audio output backed by `rodio`.
//!
//! Playback is synchronous: [`AudioOutput::play`] returns only once the
//! audio has finished (or failed).  That is exactly what the sequencer
//! needs — it plays one line at a time, in order.

use std::io::Cursor;

use rodio::{Decoder, OutputStream, Sink};
use thiserror::Error;

// ---------------------------------------------------------------------------
// OutputError
// ---------------------------------------------------------------------------

/// Errors from the audio output and fallback speech collaborators.
#[derive(Debug, Error)]
pub enum OutputError {
    /// No usable output device, or the device rejected the stream.
    #[error("audio device unavailable: {0}")]
    Device(String),

    /// The synthesized bytes could not be decoded as audio.
    #[error("could not decode synthesized audio: {0}")]
    Decode(String),

    /// The fallback speech command could not be run or reported failure.
    #[error("fallback speech failed: {0}")]
    Fallback(String),
}

// ---------------------------------------------------------------------------
// AudioOutput trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for playing a complete audio document.
///
/// Implementations block until playback finishes.
pub trait AudioOutput: Send + Sync {
    /// Play `audio` to completion.
    fn play(&self, audio: &[u8]) -> Result<(), OutputError>;
}

// ---------------------------------------------------------------------------
// RodioOutput
// ---------------------------------------------------------------------------

/// Plays audio bytes on the default output device via `rodio`.
///
/// The container format is auto-detected by rodio's decoder, so whatever
/// the synthesis service returns (wav, mp3, ogg) plays unchanged.
///
/// A fresh output stream is opened per call: `rodio`'s stream handle is not
/// `Send`, and opening one is cheap next to the seconds of audio that
/// follow.
#[derive(Debug, Default)]
pub struct RodioOutput;

impl RodioOutput {
    pub fn new() -> Self {
        Self
    }
}

impl AudioOutput for RodioOutput {
    fn play(&self, audio: &[u8]) -> Result<(), OutputError> {
        let (_stream, handle) =
            OutputStream::try_default().map_err(|e| OutputError::Device(e.to_string()))?;

        let sink = Sink::try_new(&handle).map_err(|e| OutputError::Device(e.to_string()))?;

        let source = Decoder::new(Cursor::new(audio.to_vec()))
            .map_err(|e| OutputError::Decode(e.to_string()))?;

        sink.append(source);
        sink.sleep_until_end();
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
    fn output_is_object_safe() {
        fn _takes(_: Box<dyn AudioOutput>) {}
    }

    #[test]
    fn error_display_is_descriptive() {
        let e = OutputError::Decode("unknown container".into());
        assert!(e.to_string().contains("unknown container"));
    }
}
