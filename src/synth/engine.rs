//! Core synthesis trait and implementations.
//!
//! # Overview
//!
//! [`Synthesizer`] is the interface the worker pool calls.  It is object-safe
//! and `Send + Sync` so it can be held behind an `Arc<dyn Synthesizer>` and
//! shared by every worker thread.  The call is synchronous — workers are
//! plain threads and block inside it.
//!
//! [`HttpSynthesizer`] is the production implementation: it POSTs the line
//! text to an OpenAI-compatible `/v1/audio/speech` endpoint and returns the
//! raw audio bytes.  All connection details come from [`SynthConfig`];
//! nothing is hardcoded.
//!
//! [`MockSynthesizer`] (available under `#[cfg(test)]`) returns scripted
//! responses and counts calls — useful for testing the pool and playback
//! loop without a network.

use std::time::Duration;

use thiserror::Error;

use crate::config::SynthConfig;

// ---------------------------------------------------------------------------
// SynthError
// ---------------------------------------------------------------------------

/// All errors that can arise from a synthesis call.
///
/// The pipeline treats every variant the same way — record it on the line
/// and move on — so the taxonomy exists for logs, not for control flow.
#[derive(Debug, Clone, Error)]
pub enum SynthError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("synthesis request timed out")]
    Timeout,

    /// The endpoint answered with a non-success status code.
    #[error("synthesis endpoint returned status {0}")]
    Status(u16),

    /// The endpoint answered successfully but with an empty body.
    #[error("synthesis returned no audio data")]
    EmptyAudio,
}

impl From<reqwest::Error> for SynthError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SynthError::Timeout
        } else {
            SynthError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Synthesizer trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for text-to-speech backends.
///
/// # Contract
///
/// - `text` is one trimmed, non-empty line.
/// - On success the returned bytes are a complete audio document in
///   whatever container the backend produces; the pipeline treats them as
///   opaque and hands them to the audio output unchanged.
pub trait Synthesizer: Send + Sync {
    /// Convert `text` into audio bytes.
    fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthError>;
}

// Compile-time assertion: Box<dyn Synthesizer> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn Synthesizer>) {}
};

// ---------------------------------------------------------------------------
// HttpSynthesizer
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/audio/speech` endpoint.
///
/// Works with any provider that speaks that wire format — a local
/// Kokoro-FastAPI instance, OpenAI itself, or a compatible proxy.  The
/// per-request timeout from [`SynthConfig::timeout_secs`] bounds how long a
/// worker can be stuck in one call.
pub struct HttpSynthesizer {
    client: reqwest::blocking::Client,
    config: SynthConfig,
}

impl std::fmt::Debug for HttpSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSynthesizer")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("voice", &self.config.voice)
            .finish_non_exhaustive()
    }
}

impl HttpSynthesizer {
    /// Build an `HttpSynthesizer` from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`.  A default client is used as a last-resort
    /// fallback if the builder fails (should never happen in practice).
    pub fn from_config(config: &SynthConfig) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }
}

impl Synthesizer for HttpSynthesizer {
    /// POST `text` to the configured endpoint and return the response body.
    ///
    /// The `Authorization: Bearer …` header is attached **only** when
    /// `config.api_key` is a non-empty string — safe for local providers
    /// that require no authentication.
    fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthError> {
        let url = format!("{}/v1/audio/speech", self.config.base_url);

        let body = serde_json::json!({
            "model":           self.config.model,
            "input":           text,
            "voice":           self.config.voice,
            "response_format": self.config.response_format,
        });

        let mut req = self.client.post(&url).json(&body);

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(SynthError::Status(status.as_u16()));
        }

        let bytes = response.bytes()?;
        if bytes.is_empty() {
            return Err(SynthError::EmptyAudio);
        }

        Ok(bytes.to_vec())
    }
}

// ---------------------------------------------------------------------------
// MockSynthesizer  (test-only)
// ---------------------------------------------------------------------------

/// A test double with scripted behaviour and a call counter.
///
/// By default it succeeds, returning the input text's bytes as fake audio
/// (which lets tests read the "audio" back as a string).  Individual texts
/// can be marked as failing, and an artificial per-call delay can simulate
/// a slow network.
#[cfg(test)]
pub struct MockSynthesizer {
    failing: std::collections::HashSet<String>,
    delay: Option<Duration>,
    calls: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockSynthesizer {
    /// A mock that converts every text successfully.
    pub fn ok() -> Self {
        Self {
            failing: std::collections::HashSet::new(),
            delay: None,
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Mark `text` as failing with [`SynthError::Request`].
    pub fn failing_on(mut self, text: impl Into<String>) -> Self {
        self.failing.insert(text.into());
        self
    }

    /// Sleep for `delay` inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every text passed to [`Synthesizer::synthesize`], in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Synthesizer for MockSynthesizer {
    fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthError> {
        self.calls.lock().unwrap().push(text.to_string());
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.failing.contains(text) {
            return Err(SynthError::Request("mock failure".into()));
        }
        Ok(text.as_bytes().to_vec())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
