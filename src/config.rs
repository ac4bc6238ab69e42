//! Explicit configuration for both pipeline stages.
//!
//! Everything except the API key is fixed; the key is read from
//! `GROQ_API_KEY`, optionally via a `.env` file in the working directory.
//! A [`Config`] is built once at startup and passed by reference into the
//! operations that need it.

use std::{fmt, path::PathBuf};

use crate::error::{Error, Result};

/// Chat-completion endpoint (OpenAI-compatible, hosted by Groq).
pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Model identifier sent in every request body.
pub const DEFAULT_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";

/// Sampling temperature sent in every request body.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Environment variable holding the bearer token.
pub const API_KEY_VAR: &str = "GROQ_API_KEY";

/// Registry identifier of the spectrogram generator.
pub const DEFAULT_SPECTROGRAM_MODEL: &str = "tts_en_fastpitch";

/// Registry identifier of the vocoder.
pub const DEFAULT_VOCODER_MODEL: &str = "tts_hifigan";

/// Local model root: `<dir>/<id>/config.json` plus the ONNX file it names.
/// Used instead of the Hub whenever the directory exists.
pub const DEFAULT_MODEL_DIR: &str = "models";

/// Output file, overwritten on every run.
pub const DEFAULT_OUTPUT_PATH: &str = "output.wav";

/// Sample rate of the written WAV file.
pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;

// ─────────────────────────────────────────────────────────────────────────────
// LLM
// ─────────────────────────────────────────────────────────────────────────────

/// Settings for the chat-completion client.
#[derive(Clone)]
pub struct LlmConfig {
    /// Sent as `Authorization: Bearer <api_key>`.
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    pub temperature: f64,
}

impl LlmConfig {
    /// Fixed endpoint, model and temperature with the given key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TTS
// ─────────────────────────────────────────────────────────────────────────────

/// Settings for the synthesis stage.
#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub spectrogram_model: String,
    pub vocoder_model: String,
    pub model_dir: PathBuf,
    pub output_path: PathBuf,
    pub sample_rate: u32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            spectrogram_model: DEFAULT_SPECTROGRAM_MODEL.to_string(),
            vocoder_model: DEFAULT_VOCODER_MODEL.to_string(),
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub tts: TtsConfig,
}

impl Config {
    /// Load `.env` if present, then read [`API_KEY_VAR`] from the process
    /// environment.
    pub fn from_env() -> Result<Self> {
        // A missing .env is fine; the variable may come from the real environment.
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup(API_KEY_VAR)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(Error::MissingApiKey)?;

        Ok(Self { llm: LlmConfig::new(api_key), tts: TtsConfig::default() })
    }
}
