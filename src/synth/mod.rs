//! Text-to-speech synthesis backends.
//!
//! * [`Synthesizer`] — object-safe sync trait the worker pool calls.
//! * [`HttpSynthesizer`] — OpenAI-compatible `/v1/audio/speech` client.
//! * [`SynthError`] — error variants for synthesis calls.

pub mod engine;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use engine::{HttpSynthesizer, SynthError, Synthesizer};

#[cfg(test)]
pub use engine::MockSynthesizer;
