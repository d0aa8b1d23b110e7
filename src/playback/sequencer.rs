//! Strictly-ordered playback loop.
//!
//! [`PlaybackSequencer`] walks the script from a start index, and for each
//! line: publishes its index to the shared playhead (so the pool converts
//! upcoming lines first), polls until the line settles, plays it — or
//! speaks the raw text through the fallback when its synthesis failed —
//! and advances.  At the end it either wraps (loop mode) or stops.
//!
//! # Loop
//!
//! ```text
//! ┌─▶ playhead.set(index)
//! │      │
//! │      ▼
//! │   poll every poll_interval while line is Free/Dispatched
//! │      │                         (a stop request aborts here)
//! │      ▼
//! │   Ready  → AudioOutput::play(audio)
//! │   Error  → warn + FallbackSpeaker::speak(text)
//! │   other  → broken invariant, fatal
//! │      │
//! │      ▼
//! └── index += 1;  at end: wrap if looping, else done
//! ```
//!
//! Per-line output failures are logged and skipped; the only fatal error is
//! a line observed in an impossible state after the wait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::playback::fallback::FallbackSpeaker;
use crate::playback::output::AudioOutput;
use crate::pool::Playhead;
use crate::script::Script;

// ---------------------------------------------------------------------------
// PlaybackError
// ---------------------------------------------------------------------------

/// Run-terminating playback errors.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The requested resume point does not exist in the script.
    #[error("start index {start} is out of range for a script of {len} line(s)")]
    StartOutOfRange { start: usize, len: usize },

    /// A line left the wait loop while neither ready nor failed.  This
    /// breaks the state-machine invariant and the run must not continue.
    #[error("line {index} was neither ready nor failed after the readiness wait")]
    LinePending { index: usize },
}

// ---------------------------------------------------------------------------
// StopHandle
// ---------------------------------------------------------------------------

/// Cloneable handle that aborts a running sequencer from another thread.
///
/// The sequencer observes the request at its next poll tick; the line
/// currently playing finishes first.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the playback loop to stop.
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// PlaybackSequencer
// ---------------------------------------------------------------------------

/// Drives ordered playback of one script.
pub struct PlaybackSequencer {
    script: Arc<Script>,
    playhead: Playhead,
    output: Arc<dyn AudioOutput>,
    fallback: Arc<dyn FallbackSpeaker>,
    poll_interval: Duration,
    stop: StopHandle,
}

impl PlaybackSequencer {
    pub fn new(
        script: Arc<Script>,
        playhead: Playhead,
        output: Arc<dyn AudioOutput>,
        fallback: Arc<dyn FallbackSpeaker>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            script,
            playhead,
            output,
            fallback,
            poll_interval,
            stop: StopHandle::new(),
        }
    }

    /// Handle for aborting the loop from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Play the script from `start`, wrapping at the end when `looping`.
    ///
    /// Returns when the script is empty, the end is reached without
    /// looping, or a stop was requested.  The caller still owns pool
    /// shutdown: close the pool after this returns, in every case.
    pub fn run(&self, start: usize, looping: bool) -> Result<(), PlaybackError> {
        let len = self.script.len();
        if len == 0 {
            log::info!("playback: empty script, nothing to do");
            return Ok(());
        }
        if start >= len {
            return Err(PlaybackError::StartOutOfRange { start, len });
        }

        let mut index = start;
        loop {
            self.playhead.set(index);

            // Wait for the line to settle; a stop request aborts the run.
            while self.script.line(index).is_pending() {
                if self.stop.is_stopped() {
                    log::info!("playback: stop requested at line {index}");
                    return Ok(());
                }
                std::thread::sleep(self.poll_interval);
            }
            if self.stop.is_stopped() {
                log::info!("playback: stop requested at line {index}");
                return Ok(());
            }

            self.play_line(index)?;

            index += 1;
            if index >= len {
                if !looping {
                    log::info!("playback: reached the end");
                    return Ok(());
                }
                index %= len;
            }
        }
    }

    /// Play one settled line: audio when ready, fallback speech when failed.
    fn play_line(&self, index: usize) -> Result<(), PlaybackError> {
        let line = self.script.line(index);

        if let Some(audio) = line.audio() {
            log::debug!("playback: line {index} ({} bytes)", audio.len());
            if let Err(e) = self.output.play(&audio) {
                // Losing one line's audio is not worth losing the run.
                log::warn!("playback: output failed on line {index}: {e}");
            }
        } else if let Some(reason) = line.error() {
            log::warn!("playback: line {index} has no audio ({reason}); using fallback speech");
            if let Err(e) = self.fallback.speak(line.text()) {
                log::warn!("playback: fallback failed on line {index}: {e}");
            }
        } else {
            return Err(PlaybackError::LinePending { index });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::playback::output::OutputError;
    use crate::pool::SynthPool;
    use crate::synth::MockSynthesizer;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Records played audio as text (tests synthesize text bytes as audio).
    #[derive(Default)]
    struct RecordingOutput {
        played: Mutex<Vec<String>>,
    }

    impl RecordingOutput {
        fn played(&self) -> Vec<String> {
            self.played.lock().unwrap().clone()
        }
    }

    impl AudioOutput for RecordingOutput {
        fn play(&self, audio: &[u8]) -> Result<(), OutputError> {
            self.played
                .lock()
                .unwrap()
                .push(String::from_utf8_lossy(audio).into_owned());
            Ok(())
        }
    }

    /// Records spoken fallback texts.
    #[derive(Default)]
    struct RecordingFallback {
        spoken: Mutex<Vec<String>>,
    }

    impl RecordingFallback {
        fn spoken(&self) -> Vec<String> {
            self.spoken.lock().unwrap().clone()
        }
    }

    impl FallbackSpeaker for RecordingFallback {
        fn speak(&self, text: &str) -> Result<(), OutputError> {
            self.spoken.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    const POLL: Duration = Duration::from_millis(2);

    fn make_ready(script: &Script, index: usize) {
        let line = script.line(index);
        assert!(line.try_claim());
        line.complete(line.text().as_bytes().to_vec());
    }

    fn make_failed(script: &Script, index: usize) {
        let line = script.line(index);
        assert!(line.try_claim());
        line.fail("synthesis refused");
    }

    struct Harness {
        script: Arc<Script>,
        output: Arc<RecordingOutput>,
        fallback: Arc<RecordingFallback>,
        sequencer: PlaybackSequencer,
    }

    fn harness(text: &str) -> Harness {
        let script = Arc::new(Script::from_text(text));
        let output = Arc::new(RecordingOutput::default());
        let fallback = Arc::new(RecordingFallback::default());
        let sequencer = PlaybackSequencer::new(
            Arc::clone(&script),
            Playhead::new(),
            Arc::clone(&output) as _,
            Arc::clone(&fallback) as _,
            POLL,
        );
        Harness {
            script,
            output,
            fallback,
            sequencer,
        }
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[test]
    fn plays_ready_lines_in_order() {
        let h = harness("one\ntwo\nthree");
        for i in 0..3 {
            make_ready(&h.script, i);
        }

        h.sequencer.run(0, false).unwrap();
        assert_eq!(h.output.played(), vec!["one", "two", "three"]);
        assert!(h.fallback.spoken().is_empty());
    }

    #[test]
    fn resumes_from_start_index() {
        let h = harness("one\ntwo\nthree");
        for i in 0..3 {
            make_ready(&h.script, i);
        }

        h.sequencer.run(1, false).unwrap();
        assert_eq!(h.output.played(), vec!["two", "three"]);
    }

    #[test]
    fn empty_script_is_terminal() {
        let h = harness("");
        h.sequencer.run(0, false).unwrap();
        assert!(h.output.played().is_empty());
    }

    #[test]
    fn start_out_of_range_is_an_error() {
        let h = harness("one\ntwo");
        let err = h.sequencer.run(5, false).unwrap_err();
        assert!(matches!(
            err,
            PlaybackError::StartOutOfRange { start: 5, len: 2 }
        ));
    }

    #[test]
    fn failed_line_uses_fallback_exactly_once() {
        let h = harness("good\nbroken\nalso good");
        make_ready(&h.script, 0);
        make_failed(&h.script, 1);
        make_ready(&h.script, 2);

        h.sequencer.run(0, false).unwrap();
        assert_eq!(h.output.played(), vec!["good", "also good"]);
        assert_eq!(h.fallback.spoken(), vec!["broken"]);
    }

    #[test]
    fn waits_for_a_line_to_become_ready() {
        let h = harness("late bloomer");
        let script = Arc::clone(&h.script);

        // Settle the line from another thread after a short delay.
        let converter = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            make_ready(&script, 0);
        });

        h.sequencer.run(0, false).unwrap();
        converter.join().unwrap();
        assert_eq!(h.output.played(), vec!["late bloomer"]);
    }

    #[test]
    fn stop_handle_aborts_a_blocked_run() {
        let h = harness("never ready");
        let stop = h.sequencer.stop_handle();

        let runner = std::thread::spawn(move || h.sequencer.run(0, false));
        std::thread::sleep(Duration::from_millis(20));
        stop.stop();

        runner.join().unwrap().unwrap();
    }

    #[test]
    fn looping_wraps_until_stopped() {
        let h = harness("a\nb");
        make_ready(&h.script, 0);
        make_ready(&h.script, 1);

        let stop = h.sequencer.stop_handle();
        let output = Arc::clone(&h.output);

        let runner = std::thread::spawn(move || h.sequencer.run(0, true));

        // Let it wrap at least twice, then stop.
        for _ in 0..2_000 {
            if output.played().len() >= 5 {
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        stop.stop();
        runner.join().unwrap().unwrap();

        let played = output.played();
        assert!(played.len() >= 5, "expected wrapped playback, got {played:?}");
        for (i, text) in played.iter().enumerate() {
            let expected = if i % 2 == 0 { "a" } else { "b" };
            assert_eq!(text, expected, "wrong order at position {i}");
        }
    }

    #[test]
    fn playhead_follows_the_playback_position() {
        let script = Arc::new(Script::from_text("one\ntwo"));
        let playhead = Playhead::new();
        let output = Arc::new(RecordingOutput::default());
        let fallback = Arc::new(RecordingFallback::default());
        let sequencer = PlaybackSequencer::new(
            Arc::clone(&script),
            playhead.clone(),
            output as _,
            fallback as _,
            POLL,
        );

        make_ready(&script, 0);
        make_ready(&script, 1);
        sequencer.run(0, false).unwrap();

        // After the run the playhead sits on the last line visited.
        assert_eq!(playhead.get(), 1);
    }

    /// Full pipeline: "Hello\n\nWorld" → pool converts → both lines play
    /// in order and the run terminates.
    #[test]
    fn end_to_end_hello_world() {
        let script = Arc::new(Script::from_text("Hello\n\nWorld"));
        assert_eq!(script.len(), 2);

        let synth = Arc::new(MockSynthesizer::ok());
        let mut pool = SynthPool::start(Arc::clone(&script), synth as _, None, 3);

        let output = Arc::new(RecordingOutput::default());
        let fallback = Arc::new(RecordingFallback::default());
        let sequencer = PlaybackSequencer::new(
            Arc::clone(&script),
            pool.playhead(),
            Arc::clone(&output) as _,
            Arc::clone(&fallback) as _,
            POLL,
        );

        sequencer.run(0, false).unwrap();
        pool.close();

        assert_eq!(output.played(), vec!["Hello", "World"]);
        assert!(fallback.spoken().is_empty());
    }
}
