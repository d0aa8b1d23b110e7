//! Synthesis worker pool and the shared playhead.
//!
//! [`SynthPool`] owns the worker threads; [`Playhead`] is the narrow handle
//! both the pool and the playback loop hold on the current playback index.

pub mod playhead;
pub mod runner;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use playhead::Playhead;
pub use runner::SynthPool;
