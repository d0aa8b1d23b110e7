//! A single line of text and its conversion state.
//!
//! [`Line`] is the unit the whole pipeline operates on: the synthesis pool
//! claims lines, converts them, and stores the resulting audio; the playback
//! loop waits for a line to settle and then plays it.
//!
//! # State machine
//!
//! ```text
//! Free ──try_claim──▶ Dispatched ──complete──▶ Ready(audio)
//!                                ──fail──────▶ Error(detail)
//! ```
//!
//! `try_claim` is atomic with respect to other threads: out of any number of
//! concurrent callers, exactly one wins the `Free → Dispatched` transition.
//! The winner owns the line's payload until it calls [`complete`] or
//! [`fail`]; no other transition exists, so the payload fields never race.
//!
//! Equality and hashing consider **only the text** — two lines with the same
//! text are equal regardless of conversion state.  This is what makes the
//! cache comparison in [`crate::script::cache`] meaningful.
//!
//! [`complete`]: Line::complete
//! [`fail`]: Line::fail

use std::hash::{Hash, Hasher};
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// LineStatus
// ---------------------------------------------------------------------------

/// Snapshot of a line's conversion state, without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStatus {
    /// Not yet claimed by any worker.
    Free,
    /// Claimed by a worker; synthesis is in flight.
    Dispatched,
    /// Synthesis succeeded; audio bytes are stored on the line.
    Ready,
    /// Synthesis failed; the failure detail is stored on the line.
    Error,
}

impl LineStatus {
    /// `true` while the line has not reached a final state yet.
    ///
    /// The playback loop polls this to decide whether to keep waiting.
    pub fn is_pending(self) -> bool {
        matches!(self, LineStatus::Free | LineStatus::Dispatched)
    }
}

// ---------------------------------------------------------------------------
// Line
// ---------------------------------------------------------------------------

/// Internal tagged state.  `Ready` owns the audio exclusively; `Error` owns
/// the failure detail.
#[derive(Debug)]
enum LineState {
    Free,
    Dispatched,
    Ready(Vec<u8>),
    Error(String),
}

/// One line of input text plus its conversion state.
///
/// The text is trimmed at construction and immutable afterwards.  The state
/// sits behind the line's own mutex so that claim-and-mark is indivisible;
/// all critical sections are a few loads/stores long and never block on I/O.
#[derive(Debug)]
pub struct Line {
    text: String,
    state: Mutex<LineState>,
}

impl Line {
    /// Create a fresh (unconverted) line.  `text` is trimmed.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into().trim().to_string(),
            state: Mutex::new(LineState::Free),
        }
    }

    /// Create a line that already carries converted audio (cache restore).
    pub(crate) fn ready(text: impl Into<String>, audio: Vec<u8>) -> Self {
        Self {
            text: text.into().trim().to_string(),
            state: Mutex::new(LineState::Ready(audio)),
        }
    }

    /// The trimmed text content.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Current state, without payload.
    pub fn status(&self) -> LineStatus {
        match *self.state.lock().unwrap() {
            LineState::Free => LineStatus::Free,
            LineState::Dispatched => LineStatus::Dispatched,
            LineState::Ready(_) => LineStatus::Ready,
            LineState::Error(_) => LineStatus::Error,
        }
    }

    /// `true` while the line is `Free` or `Dispatched`.
    pub fn is_pending(&self) -> bool {
        self.status().is_pending()
    }

    /// The converted audio bytes, if the line is `Ready`.
    pub fn audio(&self) -> Option<Vec<u8>> {
        match *self.state.lock().unwrap() {
            LineState::Ready(ref audio) => Some(audio.clone()),
            _ => None,
        }
    }

    /// The failure detail, if the line is `Error`.
    pub fn error(&self) -> Option<String> {
        match *self.state.lock().unwrap() {
            LineState::Error(ref detail) => Some(detail.clone()),
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // State transitions (crate-internal — pool only)
    // -----------------------------------------------------------------------

    /// Attempt the `Free → Dispatched` transition.
    ///
    /// Returns `true` for exactly one caller; every other concurrent caller
    /// (and any caller once the line has left `Free`) gets `false`.
    pub(crate) fn try_claim(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        if matches!(*state, LineState::Free) {
            *state = LineState::Dispatched;
            true
        } else {
            false
        }
    }

    /// Record a successful conversion.  Caller must hold the claim.
    pub(crate) fn complete(&self, audio: Vec<u8>) {
        let mut state = self.state.lock().unwrap();
        debug_assert!(matches!(*state, LineState::Dispatched));
        *state = LineState::Ready(audio);
    }

    /// Record a failed conversion.  Caller must hold the claim.
    pub(crate) fn fail(&self, detail: impl Into<String>) {
        let mut state = self.state.lock().unwrap();
        debug_assert!(matches!(*state, LineState::Dispatched));
        *state = LineState::Error(detail.into());
    }
}

// Equality and hashing are text-only on purpose: conversion state must not
// affect whether two scripts are considered the same input.

impl PartialEq for Line {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Line {}

impl Hash for Line {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::sync::Arc;

    use super::*;

    fn hash_of(line: &Line) -> u64 {
        let mut hasher = DefaultHasher::new();
        line.hash(&mut hasher);
        hasher.finish()
    }

    // --- construction ---

    #[test]
    fn new_line_is_free_and_trimmed() {
        let line = Line::new("  hello world \t");
        assert_eq!(line.text(), "hello world");
        assert_eq!(line.status(), LineStatus::Free);
        assert!(line.is_pending());
        assert!(line.audio().is_none());
        assert!(line.error().is_none());
    }

    #[test]
    fn ready_line_carries_audio() {
        let line = Line::ready("hello", vec![1, 2, 3]);
        assert_eq!(line.status(), LineStatus::Ready);
        assert!(!line.is_pending());
        assert_eq!(line.audio(), Some(vec![1, 2, 3]));
    }

    // --- transitions ---

    #[test]
    fn claim_then_complete_reaches_ready() {
        let line = Line::new("hello");
        assert!(line.try_claim());
        assert_eq!(line.status(), LineStatus::Dispatched);
        assert!(line.is_pending());

        line.complete(vec![9, 9]);
        assert_eq!(line.status(), LineStatus::Ready);
        assert_eq!(line.audio(), Some(vec![9, 9]));
    }

    #[test]
    fn claim_then_fail_reaches_error() {
        let line = Line::new("hello");
        assert!(line.try_claim());
        line.fail("boom");
        assert_eq!(line.status(), LineStatus::Error);
        assert_eq!(line.error(), Some("boom".into()));
        assert!(line.audio().is_none());
    }

    #[test]
    fn second_claim_is_rejected() {
        let line = Line::new("hello");
        assert!(line.try_claim());
        assert!(!line.try_claim());
    }

    #[test]
    fn ready_line_cannot_be_claimed() {
        let line = Line::ready("hello", vec![1]);
        assert!(!line.try_claim());
    }

    /// Exactly one of many concurrent claimers may win.
    #[test]
    fn concurrent_claim_has_exactly_one_winner() {
        let line = Arc::new(Line::new("contested"));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let line = Arc::clone(&line);
                std::thread::spawn(move || line.try_claim())
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&won| won)
            .count();

        assert_eq!(wins, 1);
        assert_eq!(line.status(), LineStatus::Dispatched);
    }

    // --- equality / hashing ---

    #[test]
    fn equality_ignores_state() {
        let a = Line::new("same text");
        let b = Line::ready("same text", vec![1, 2, 3]);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn different_text_is_unequal() {
        assert_ne!(Line::new("one"), Line::new("two"));
    }

    #[test]
    fn status_is_pending_classification() {
        assert!(LineStatus::Free.is_pending());
        assert!(LineStatus::Dispatched.is_pending());
        assert!(!LineStatus::Ready.is_pending());
        assert!(!LineStatus::Error.is_pending());
    }
}
