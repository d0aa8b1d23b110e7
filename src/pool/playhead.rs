//! Shared playback-position handle.
//!
//! The playhead is the one piece of mutable state both halves of the
//! pipeline touch: the playback loop writes it as it advances, the workers
//! read it to decide which line to claim next.  It is a plain index behind
//! a mutex, wrapped in a narrow get/set handle so neither side can reach
//! past it — no ambient globals.

use std::sync::{Arc, Mutex};

/// Cheap-to-clone handle on the shared playback index.
///
/// Lock with `.lock().unwrap()` for a load or store only; the critical
/// section never does I/O.
#[derive(Debug, Clone, Default)]
pub struct Playhead(Arc<Mutex<usize>>);

impl Playhead {
    /// A playhead positioned at index 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current playback index.
    pub fn get(&self) -> usize {
        *self.0.lock().unwrap()
    }

    /// Move the playhead.  Takes effect for subsequent claim scans; claims
    /// already in flight are not reordered.
    pub fn set(&self, index: usize) {
        *self.0.lock().unwrap() = index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        assert_eq!(Playhead::new().get(), 0);
    }

    #[test]
    fn clones_share_the_position() {
        let a = Playhead::new();
        let b = a.clone();
        a.set(7);
        assert_eq!(b.get(), 7);
    }
}
