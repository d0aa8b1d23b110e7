//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::AppPaths;

// ---------------------------------------------------------------------------
// SynthConfig
// ---------------------------------------------------------------------------

/// Settings for the remote speech-synthesis endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthConfig {
    /// Base URL of the API endpoint.
    ///
    /// - Local Kokoro-FastAPI default: `http://localhost:8880`
    /// - OpenAI: `https://api.openai.com`
    pub base_url: String,
    /// API key — `None` for local providers that need no authentication.
    pub api_key: Option<String>,
    /// Model identifier sent to the API (e.g. `"kokoro"`, `"tts-1"`).
    pub model: String,
    /// Voice identifier sent to the API (e.g. `"af_heart"`, `"alloy"`).
    pub voice: String,
    /// Audio container requested from the API (`"mp3"`, `"wav"`, …).
    pub response_format: String,
    /// Maximum seconds to wait for one synthesis response.
    pub timeout_secs: u64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8880".into(),
            api_key: None,
            model: "kokoro".into(),
            voice: "af_heart".into(),
            response_format: "mp3".into(),
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// PlaybackConfig
// ---------------------------------------------------------------------------

/// Settings for the playback loop and the offline fallback voice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Milliseconds between readiness polls while waiting for a line.
    pub poll_interval_ms: u64,
    /// Program used to speak lines whose synthesis failed.  The text is
    /// piped to its stdin.
    pub fallback_command: String,
    /// Extra arguments for `fallback_command`.
    pub fallback_args: Vec<String>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            fallback_command: "espeak-ng".into(),
            fallback_args: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// CacheConfig
// ---------------------------------------------------------------------------

/// Settings for the on-disk audio cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether the cache is consulted and written at all.
    pub enabled: bool,
    /// Cache directory override — `None` means the platform cache dir.
    pub dir: Option<PathBuf>,
    /// Total-size threshold in bytes above which startup housekeeping logs
    /// a warning (never deletes anything by itself).
    pub warn_bytes: u64,
    /// Hex digits kept from the content hash (1–16).  Fewer digits mean
    /// shorter file names but more collision probing.
    pub hash_digits: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            warn_bytes: 10 * 1024 * 1024 * 1024,
            hash_digits: 8,
        }
    }
}

// ---------------------------------------------------------------------------
// PoolConfig
// ---------------------------------------------------------------------------

/// Settings for the synthesis worker pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of concurrent synthesis workers.
    pub workers: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { workers: 3 }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use read_aloud::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Speech-synthesis endpoint settings.
    pub synth: SynthConfig,
    /// Playback / fallback settings.
    pub playback: PlaybackConfig,
    /// Audio cache settings.
    pub cache: CacheConfig,
    /// Worker pool settings.
    pub pool: PoolConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Verify that a default `AppConfig` can be serialised to TOML and
    /// deserialised back without any data loss.
    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");
        assert_eq!(original, loaded);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config, AppConfig::default());
    }

    /// Verify the documented default values.
    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.synth.base_url, "http://localhost:8880");
        assert!(cfg.synth.api_key.is_none());
        assert_eq!(cfg.synth.model, "kokoro");
        assert_eq!(cfg.synth.voice, "af_heart");
        assert_eq!(cfg.synth.response_format, "mp3");
        assert_eq!(cfg.synth.timeout_secs, 30);

        assert_eq!(cfg.playback.poll_interval_ms, 100);
        assert_eq!(cfg.playback.fallback_command, "espeak-ng");

        assert!(cfg.cache.enabled);
        assert!(cfg.cache.dir.is_none());
        assert_eq!(cfg.cache.warn_bytes, 10 * 1024 * 1024 * 1024);
        assert_eq!(cfg.cache.hash_digits, 8);

        assert_eq!(cfg.pool.workers, 3);
    }

    /// Verify that modified non-default values survive a round trip.
    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.synth.base_url = "https://api.openai.com".into();
        cfg.synth.api_key = Some("sk-test".into());
        cfg.synth.model = "tts-1".into();
        cfg.synth.voice = "alloy".into();
        cfg.synth.timeout_secs = 10;
        cfg.playback.poll_interval_ms = 50;
        cfg.playback.fallback_command = "say".into();
        cfg.cache.enabled = false;
        cfg.cache.dir = Some(PathBuf::from("/tmp/elsewhere"));
        cfg.cache.hash_digits = 12;
        cfg.pool.workers = 8;

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg, loaded);
    }
}
