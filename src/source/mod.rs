//! Input text sources — where the lines to read come from.
//!
//! The pipeline itself only ever sees one raw string; this module resolves
//! it from a file, standard input, the system clipboard (via `arboard`), or
//! literal command-line arguments.  A short-lived clipboard handle is
//! created per call rather than kept around, because `arboard::Clipboard`
//! is not `Send` on all platforms and the handle is cheap to create.

use std::io::Read;
use std::path::PathBuf;

use arboard::Clipboard;
use thiserror::Error;

// ---------------------------------------------------------------------------
// SourceError
// ---------------------------------------------------------------------------

/// Errors from resolving the input text.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("could not read {path}: {reason}")]
    File { path: String, reason: String },

    #[error("could not read standard input: {0}")]
    Stdin(String),

    #[error("clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("clipboard has no text content")]
    ClipboardEmpty,

    #[error("no input given — pass a file, --text, --stdin or --clipboard")]
    NoInput,
}

// ---------------------------------------------------------------------------
// TextSource
// ---------------------------------------------------------------------------

/// One resolved choice of where the text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSource {
    /// Literal arguments; each argument becomes one line.
    Literal(Vec<String>),
    /// Read the whole file.
    File(PathBuf),
    /// Read standard input to EOF.
    Stdin,
    /// Take the current clipboard text.
    Clipboard,
}

/// Produce the raw text for `source`.
pub fn resolve(source: &TextSource) -> Result<String, SourceError> {
    match source {
        TextSource::Literal(lines) => Ok(lines.join("\n")),

        TextSource::File(path) => std::fs::read_to_string(path).map_err(|e| SourceError::File {
            path: path.display().to_string(),
            reason: e.to_string(),
        }),

        TextSource::Stdin => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| SourceError::Stdin(e.to_string()))?;
            Ok(text)
        }

        TextSource::Clipboard => {
            let mut clipboard =
                Clipboard::new().map_err(|e| SourceError::Clipboard(e.to_string()))?;
            clipboard.get_text().map_err(|_| SourceError::ClipboardEmpty)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_arguments_become_lines() {
        let source = TextSource::Literal(vec!["one".into(), "two".into()]);
        assert_eq!(resolve(&source).unwrap(), "one\ntwo");
    }

    #[test]
    fn file_source_reads_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.txt");
        std::fs::write(&path, "Hello\nWorld\n").unwrap();

        let text = resolve(&TextSource::File(path)).unwrap();
        assert_eq!(text, "Hello\nWorld\n");
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = resolve(&TextSource::File(PathBuf::from("/no/such/file.txt"))).unwrap_err();
        assert!(matches!(err, SourceError::File { .. }));
        assert!(err.to_string().contains("/no/such/file.txt"));
    }
}
