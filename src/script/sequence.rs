//! An ordered script of lines built from raw input text.
//!
//! [`Script`] splits the input on newlines, trims each line, and drops
//! blank lines.  Order and membership are fixed for the lifetime of a run;
//! only individual line states change after construction.  That makes the
//! script safe to share as `Arc<Script>` between the synthesis pool and the
//! playback loop with no locking of its own.

use std::fmt;

use crate::script::line::Line;

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

/// The ordered sequence of lines for one run.
///
/// # Example
///
/// ```rust
/// use read_aloud::script::Script;
///
/// let script = Script::from_text("Hello\n\nWorld");
/// assert_eq!(script.len(), 2);
/// assert_eq!(script.line(0).text(), "Hello");
/// assert_eq!(script.line(1).text(), "World");
/// ```
#[derive(Debug)]
pub struct Script {
    lines: Vec<Line>,
}

impl Script {
    /// Build a script from raw text: split on `\n`, trim, drop blanks.
    ///
    /// Windows line endings are handled by the trim (`\r` is whitespace).
    pub fn from_text(raw: &str) -> Self {
        let lines = raw
            .split('\n')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(Line::new)
            .collect();
        Self { lines }
    }

    /// Build a script from pre-constructed lines (cache restore).
    pub(crate) fn from_lines(lines: Vec<Line>) -> Self {
        Self { lines }
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// `true` when the script has no lines (nothing to read).
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The line at `index`.
    ///
    /// # Panics
    ///
    /// Panics when `index >= len()` — callers index with the playhead, which
    /// is kept in range by construction.
    pub fn line(&self, index: usize) -> &Line {
        &self.lines[index]
    }

    /// All lines, in playback order.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// The newline-joined trimmed text of the whole script.
    ///
    /// This is the input to the cache content hash: identical joined text
    /// means identical script membership and order.
    pub fn joined_text(&self) -> String {
        let texts: Vec<&str> = self.lines.iter().map(Line::text).collect();
        texts.join("\n")
    }
}

/// Element-wise, order-sensitive comparison of line **texts** only.
/// Conversion states, audio, and errors do not take part.
impl PartialEq for Script {
    fn eq(&self, other: &Self) -> bool {
        self.lines == other.lines
    }
}

impl Eq for Script {}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} line(s)", self.len())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
