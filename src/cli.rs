//! Command-line interface definition.
//!
//! The flags mirror the run-time knobs of the pipeline and nothing more:
//! where to start, whether to loop, how the cache behaves,
//! how many workers convert, and where the text comes from.  Everything
//! else lives in `settings.toml`.

use std::path::PathBuf;

use clap::Parser;

use crate::source::{SourceError, TextSource};

/// Read text aloud, line by line, with concurrent synthesis and a local
/// audio cache.
#[derive(Debug, Parser)]
#[command(name = "read-aloud", version, about)]
pub struct Cli {
    /// Text file to read aloud.
    pub file: Option<PathBuf>,

    /// Speak these literal lines instead of reading a file.
    #[arg(short = 't', long = "text", value_name = "LINE")]
    pub text: Vec<String>,

    /// Read the text from standard input.
    #[arg(long)]
    pub stdin: bool,

    /// Read the text from the system clipboard.
    #[arg(long)]
    pub clipboard: bool,

    /// Line index to start playback from (resume point).
    #[arg(long, value_name = "INDEX", default_value_t = 0)]
    pub start: usize,

    /// Start over from the first line after the last one.
    #[arg(long = "loop")]
    pub looping: bool,

    /// Do not read or write the audio cache for this run.
    #[arg(long)]
    pub no_cache: bool,

    /// Delete every cached script before running.
    #[arg(long)]
    pub clear_cache: bool,

    /// Number of concurrent synthesis workers (default from settings).
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,
}

impl Cli {
    /// Pick the text source: literal text wins, then a file, then stdin,
    /// then the clipboard.
    pub fn text_source(&self) -> Result<TextSource, SourceError> {
        if !self.text.is_empty() {
            Ok(TextSource::Literal(self.text.clone()))
        } else if let Some(file) = &self.file {
            Ok(TextSource::File(file.clone()))
        } else if self.stdin {
            Ok(TextSource::Stdin)
        } else if self.clipboard {
            Ok(TextSource::Clipboard)
        } else {
            Err(SourceError::NoInput)
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
    fn defaults_are_off() {
        let cli = Cli::parse_from(["read-aloud", "book.txt"]);
        assert_eq!(cli.file, Some(PathBuf::from("book.txt")));
        assert_eq!(cli.start, 0);
        assert!(!cli.looping);
        assert!(!cli.no_cache);
        assert!(!cli.clear_cache);
        assert!(cli.workers.is_none());
    }

    #[test]
    fn all_flags_parse() {
        let cli = Cli::parse_from([
            "read-aloud",
            "book.txt",
            "--start",
            "12",
            "--loop",
            "--no-cache",
            "--clear-cache",
            "--workers",
            "5",
        ]);
        assert_eq!(cli.start, 12);
        assert!(cli.looping);
        assert!(cli.no_cache);
        assert!(cli.clear_cache);
        assert_eq!(cli.workers, Some(5));
    }

    #[test]
    fn literal_text_beats_file() {
        let cli = Cli::parse_from(["read-aloud", "book.txt", "-t", "hello", "-t", "world"]);
        assert_eq!(
            cli.text_source().unwrap(),
            TextSource::Literal(vec!["hello".into(), "world".into()])
        );
    }

    #[test]
    fn stdin_flag_selects_stdin() {
        let cli = Cli::parse_from(["read-aloud", "--stdin"]);
        assert_eq!(cli.text_source().unwrap(), TextSource::Stdin);
    }

    #[test]
    fn clipboard_flag_selects_clipboard() {
        let cli = Cli::parse_from(["read-aloud", "--clipboard"]);
        assert_eq!(cli.text_source().unwrap(), TextSource::Clipboard);
    }

    #[test]
    fn no_source_is_an_error() {
        let cli = Cli::parse_from(["read-aloud"]);
        assert!(matches!(cli.text_source(), Err(SourceError::NoInput)));
    }
}
