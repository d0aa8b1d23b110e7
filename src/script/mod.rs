//! Script model and cache — lines, their conversion state machine, and the
//! content-addressed on-disk cache.
//!
//! # Data flow
//!
//! ```text
//! raw text ──▶ Script::from_text ──▶ ScriptCache::resolve (hit? restore)
//!                    │
//!                    ▼
//!          SynthPool converts lines           (Free → Dispatched → Ready/Error)
//!                    │
//!                    ▼
//!          CacheWriteback::run ──▶ script-<hash>.json   (atomic rename)
//! ```

pub mod cache;
pub mod line;
pub mod sequence;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use cache::{CacheError, CacheLookup, CacheWriteback, ScriptCache};
pub use line::{Line, LineStatus};
pub use sequence::Script;
