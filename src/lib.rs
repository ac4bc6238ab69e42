//! # groq-tts
//!
//! Ask a hosted LLM a question, then speak the answer.
//!
//! ## Quick start
//!
//! ```no_run
//! use groq_tts::{download::ModelSource, llm::LlmClient, synth::synthesize_speech, Config};
//!
//! let config = Config::from_env()?;                // GROQ_API_KEY, optionally from .env
//! let client = LlmClient::new(config.llm.clone())?;
//! let answer = client.get_llm_response("Tell me a fun fact about robotics.")?;
//!
//! let loader = ModelSource::for_config(&config.tts)?; // models/<id>/ ONNX exports, else the Hub
//! synthesize_speech(&loader, &config.tts, &answer)?; // writes output.wav, 22 050 Hz mono
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Pipeline
//! 1. **Chat completion** — one blocking `POST` to the Groq OpenAI-compatible
//!    endpoint; the answer is `choices[0].message.content`.
//! 2. **Normalisation** — Markdown stripped, numbers spelled out.
//! 3. **Tokenisation** — characters mapped to FastPitch vocabulary IDs.
//! 4. **FastPitch** (ONNX) — tokens → mel spectrogram.
//! 5. **HiFi-GAN** (ONNX) — mel spectrogram → waveform.
//! 6. **WAV** — 16-bit PCM, mono, written to `output.wav`.
//!
//! Both external dependencies sit behind traits
//! ([`llm::HttpTransport`], [`model::ModelLoader`]) so the whole flow can be
//! exercised without network access or model weights.

pub mod config;
pub mod download;
pub mod error;
pub mod llm;
pub mod model;
pub mod normalize;
pub mod synth;
pub mod tokenize;

// ─── Re-exports for convenience ─────────────────────────────────────────────

pub use config::{Config, LlmConfig, TtsConfig};
pub use error::{Error, Result};
pub use llm::{get_llm_response, LlmClient};
pub use synth::{synthesize_speech, Synthesizer};
