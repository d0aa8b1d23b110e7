//! Playback side of the pipeline — ordered sequencing, audio output, and
//! the offline fallback path.
//!
//! * [`PlaybackSequencer`] — walks the script in order, blocking on
//!   readiness, with optional wraparound looping.
//! * [`AudioOutput`] / [`RodioOutput`] — synchronous playback of the
//!   synthesized audio bytes.
//! * [`FallbackSpeaker`] / [`ProcessSpeaker`] — offline speech for lines
//!   whose synthesis failed.
//! * [`StopHandle`] — aborts a running sequencer from another thread.

pub mod fallback;
pub mod output;
pub mod sequencer;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use fallback::{FallbackSpeaker, ProcessSpeaker};
pub use output::{AudioOutput, OutputError, RodioOutput};
pub use sequencer::{PlaybackError, PlaybackSequencer, StopHandle};
