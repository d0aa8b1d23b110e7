//! read-aloud — turn lines of text into speech, in order, without waiting.
//!
//! The pipeline converts each line of the input to audio through a remote
//! synthesis service and plays the lines back strictly in order.  The slow
//! part — synthesis — runs on a pool of worker threads, out of order,
//! prioritized around the line currently being played, so playback almost
//! never waits.  Converted audio is cached on disk keyed by the exact text
//! content; reading the same text again skips synthesis entirely.
//!
//! # Architecture
//!
//! ```text
//! input text ──▶ Script (ordered lines) ──▶ ScriptCache (hit? restore audio)
//!                      │
//!        ┌─────────────┴──────────────┐
//!        ▼                            ▼
//!   SynthPool                  PlaybackSequencer
//!   N workers claim lines      plays line i, waits on readiness,
//!   near the playhead and      advances the shared playhead,
//!   convert them               falls back to offline speech on error
//!        │
//!        └─▶ on completion: cache write-back (atomic rename)
//! ```

pub mod cli;
pub mod config;
pub mod playback;
pub mod pool;
pub mod script;
pub mod source;
pub mod synth;
