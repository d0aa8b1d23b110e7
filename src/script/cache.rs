//! On-disk cache of converted scripts, keyed by content hash.
//!
//! One JSON file per script, named `script-<hash>.json` where `<hash>` is a
//! truncated SHA-256 over the script's newline-joined trimmed text.  Because
//! the hash is short (8 hex digits by default) collisions are possible; they
//! are resolved by linear probing: the hash value is incremented (wrapping
//! within its keyspace) and the next path is tried until a matching file or
//! a free slot turns up.
//!
//! # File format
//!
//! ```json
//! {
//!   "version": 1,
//!   "lines": [
//!     { "text": "Hello", "ready": true, "audio": "<base64>" },
//!     { "text": "World", "ready": false }
//!   ]
//! }
//! ```
//!
//! The format is explicit and versioned so cache files survive schema
//! evolution; anything unreadable — wrong version, bad JSON, bad base64 —
//! is treated as a cache miss, never as a failure.
//!
//! Writes go through a temp file in the same directory followed by a
//! rename, so a crash mid-write leaves any previous cache file intact and
//! no partial file is ever observable at the final path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::script::line::{Line, LineStatus};
use crate::script::sequence::Script;

/// Current cache file schema version.
const CACHE_FORMAT_VERSION: u32 = 1;

/// Upper bound on linear probing before the run proceeds uncached.
const MAX_PROBES: u64 = 1024;

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Errors from cache I/O.  Readers treat all of these as a miss; only the
/// write-back path reports them (and even then the run is not undone).
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("cache file is not valid: {0}")]
    Malformed(String),

    #[error("cache file has unsupported version {0}")]
    UnsupportedVersion(u32),
}

// ---------------------------------------------------------------------------
// Persisted records
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    lines: Vec<CachedLine>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedLine {
    text: String,
    ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio: Option<String>,
}

impl CachedLine {
    /// Normalize a live line for persistence: `Ready` keeps its audio, every
    /// other state is reset to free with its error discarded.  A failed line
    /// is therefore retried on the next run instead of staying failed.
    fn from_line(line: &Line) -> Self {
        match line.audio() {
            Some(audio) => Self {
                text: line.text().to_string(),
                ready: true,
                audio: Some(BASE64.encode(audio)),
            },
            None => Self {
                text: line.text().to_string(),
                ready: false,
                audio: None,
            },
        }
    }

    fn into_line(self) -> Result<Line, CacheError> {
        if self.text.trim().is_empty() {
            return Err(CacheError::Malformed("empty line text".into()));
        }
        match (self.ready, self.audio) {
            (true, Some(b64)) => {
                let audio = BASE64
                    .decode(b64)
                    .map_err(|e| CacheError::Malformed(format!("bad audio encoding: {e}")))?;
                Ok(Line::ready(self.text, audio))
            }
            // Ready without audio should not happen; degrade to free.
            _ => Ok(Line::new(self.text)),
        }
    }
}

// ---------------------------------------------------------------------------
// CacheLookup
// ---------------------------------------------------------------------------

/// Result of probing the cache for a freshly built script.
#[derive(Debug)]
pub struct CacheLookup {
    /// The cached script on a hit (`Ready` lines restored), `None` on a miss.
    pub script: Option<Script>,
    /// Where this run's finalize should write.  `None` when probing gave up,
    /// in which case the run proceeds without persistence.
    pub target: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// ScriptCache
// ---------------------------------------------------------------------------

/// Handle on the cache directory: hashing, probing, load, atomic store, and
/// startup housekeeping.
#[derive(Debug, Clone)]
pub struct ScriptCache {
    dir: PathBuf,
    hash_digits: u32,
    warn_bytes: u64,
}

impl ScriptCache {
    /// Create a cache rooted at `dir`.
    ///
    /// `hash_digits` is the truncated hex-digit count of the content hash
    /// (clamped to `1..=16`); `warn_bytes` is the total-size threshold above
    /// which housekeeping logs a warning.
    pub fn new(dir: impl Into<PathBuf>, hash_digits: u32, warn_bytes: u64) -> Self {
        Self {
            dir: dir.into(),
            hash_digits: hash_digits.clamp(1, 16),
            warn_bytes,
        }
    }

    /// The cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // -----------------------------------------------------------------------
    // Hashing
    // -----------------------------------------------------------------------

    /// Truncated SHA-256 content hash of `text`, as lowercase hex.
    fn content_hash(&self, text: &str) -> String {
        let digest = Sha256::digest(text.as_bytes());
        let mut hash = hex::encode(digest);
        hash.truncate(self.hash_digits as usize);
        hash
    }

    /// The next hash slot: increment, wrapping within the truncated keyspace.
    fn next_hash(&self, hash: &str) -> String {
        let value = u64::from_str_radix(hash, 16).unwrap_or(0);
        let mask = if self.hash_digits == 16 {
            u64::MAX
        } else {
            (1u64 << (4 * self.hash_digits)) - 1
        };
        let next = value.wrapping_add(1) & mask;
        format!("{next:0width$x}", width = self.hash_digits as usize)
    }

    /// Cache file path for a given hash.
    fn slot_path(&self, hash: &str) -> PathBuf {
        self.dir.join(format!("script-{hash}.json"))
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// Probe for a cache file matching `fresh`.
    ///
    /// Walks hash slots starting at the content hash of `fresh`:
    ///
    /// * free slot → miss; the slot becomes this run's write-back target;
    /// * unreadable/corrupt file → miss; the slot is reclaimed as the target;
    /// * valid file with different texts → collision; probe the next slot;
    /// * valid file with equal texts → hit; the cached script (with its
    ///   `Ready` audio) replaces the fresh one.
    pub fn resolve(&self, fresh: &Script) -> CacheLookup {
        let mut hash = self.content_hash(&fresh.joined_text());

        for _ in 0..MAX_PROBES {
            let path = self.slot_path(&hash);
            if !path.exists() {
                log::debug!("cache: miss, will write {}", path.display());
                return CacheLookup {
                    script: None,
                    target: Some(path),
                };
            }

            match self.read_file(&path) {
                Ok(cached) if cached == *fresh => {
                    let ready = cached
                        .lines()
                        .iter()
                        .filter(|l| l.status() == LineStatus::Ready)
                        .count();
                    log::info!(
                        "cache: hit {} ({ready}/{} lines ready)",
                        path.display(),
                        cached.len()
                    );
                    return CacheLookup {
                        script: Some(cached),
                        target: Some(path),
                    };
                }
                Ok(_) => {
                    log::debug!("cache: hash collision at {}, probing on", path.display());
                    hash = self.next_hash(&hash);
                }
                Err(e) => {
                    log::warn!(
                        "cache: unreadable file {} ({e}); treating as miss",
                        path.display()
                    );
                    return CacheLookup {
                        script: None,
                        target: Some(path),
                    };
                }
            }
        }

        log::warn!("cache: gave up probing after {MAX_PROBES} slots; run will not be cached");
        CacheLookup {
            script: None,
            target: None,
        }
    }

    fn read_file(&self, path: &Path) -> Result<Script, CacheError> {
        let data = fs::read_to_string(path)?;
        let file: CacheFile =
            serde_json::from_str(&data).map_err(|e| CacheError::Malformed(e.to_string()))?;

        if file.version != CACHE_FORMAT_VERSION {
            return Err(CacheError::UnsupportedVersion(file.version));
        }

        let lines = file
            .lines
            .into_iter()
            .map(CachedLine::into_line)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Script::from_lines(lines))
    }

    // -----------------------------------------------------------------------
    // Finalize / store
    // -----------------------------------------------------------------------

    /// Persist `script` to `path` atomically.
    ///
    /// Lines are normalized first (non-`Ready` becomes free, errors are
    /// dropped).  The JSON is written to a sibling temp file and renamed
    /// into place, so readers never observe a partial file and an
    /// interrupted write leaves any previous file untouched.  Writing the
    /// same states twice produces a byte-identical file.
    pub fn store(&self, script: &Script, path: &Path) -> Result<(), CacheError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = CacheFile {
            version: CACHE_FORMAT_VERSION,
            lines: script.lines().iter().map(CachedLine::from_line).collect(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| CacheError::Malformed(e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Housekeeping
    // -----------------------------------------------------------------------

    /// Startup pass over the whole cache directory.
    ///
    /// With `clear` set, every cache file is deleted.  Otherwise the total
    /// size is summed and a warning logged above the configured threshold.
    /// Neither path ever fails the run; a missing directory is fine.
    pub fn housekeeping(&self, clear: bool) -> Result<(), CacheError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();

        if clear {
            let mut removed = 0usize;
            for path in &files {
                match fs::remove_file(path) {
                    Ok(()) => removed += 1,
                    Err(e) => log::warn!("cache: could not delete {} ({e})", path.display()),
                }
            }
            log::info!("cache: cleared {removed} file(s)");
            return Ok(());
        }

        let total: u64 = files
            .iter()
            .filter_map(|p| fs::metadata(p).ok())
            .map(|m| m.len())
            .sum();

        if total > self.warn_bytes {
            log::warn!(
                "cache: {} file(s) use {total} bytes (threshold {}); consider --clear-cache",
                files.len(),
                self.warn_bytes
            );
        } else {
            log::debug!("cache: {} file(s), {total} bytes", files.len());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CacheWriteback
// ---------------------------------------------------------------------------

/// The finalize step handed to the synthesis pool: where to persist the
/// script once all conversion activity for the run has ceased.
///
/// A failed write is reported but never propagated — playback that already
/// happened is not undone by a cache problem.
#[derive(Debug, Clone)]
pub struct CacheWriteback {
    cache: ScriptCache,
    path: PathBuf,
}

impl CacheWriteback {
    pub fn new(cache: ScriptCache, path: PathBuf) -> Self {
        Self { cache, path }
    }

    /// Run the finalize: normalize and persist `script`.
    pub fn run(&self, script: &Script) {
        match self.cache.store(script, &self.path) {
            Ok(()) => log::info!("cache: wrote {}", self.path.display()),
            Err(e) => log::error!("cache: write-back to {} failed: {e}", self.path.display()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
