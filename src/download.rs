//! Pretrained-model registry — resolves identifiers like `"tts_en_fastpitch"`
//! to ONNX files and builds the models.
//!
//! Every model lives in its own repository (a HuggingFace repo, or a local
//! directory) holding a `config.json` and the ONNX file it names:
//!
//! ```json
//! { "type": "fastpitch", "model_file": "fastpitch.onnx", "sample_rate": 22050, "n_mels": 80 }
//! ```
//!
//! NeMo publishes these models as `.nemo` checkpoints; they have to be
//! exported to ONNX and paired with a `config.json` before either loader can
//! use them.  [`ModelSource::for_config`] prefers a local model directory and
//! only falls back to the Hub, where bare identifiers are expanded to the
//! `nvidia/` namespace.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use hf_hub::api::sync::Api;
use serde::Deserialize;

use crate::{
    config::{TtsConfig, DEFAULT_SAMPLE_RATE},
    model::{FastPitchOnnx, HifiGanOnnx, ModelLoader},
    tokenize::Vocabulary,
};

/// Namespace used for identifiers without an explicit owner.
pub const DEFAULT_NAMESPACE: &str = "nvidia";

const CONFIG_FILE: &str = "config.json";

/// Appended to "no config.json" failures.
const EXPORT_HINT: &str = "a model repository needs config.json and an ONNX export \
    (NeMo .nemo checkpoints must be exported to ONNX first)";

const DEFAULT_N_MELS: usize = 80;

// ─────────────────────────────────────────────────────────────────────────────
// config.json schema
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    FastPitch,
    HifiGan,
}

/// Deserialised `config.json` of a model repository.
#[derive(Debug, Deserialize)]
pub struct ModelConfig {
    #[serde(rename = "type")]
    pub model_type: ModelKind,

    /// Filename of the ONNX model inside the repo (e.g. `"fastpitch.onnx"`).
    pub model_file: String,

    /// Output rate of the vocoder.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Mel bins exchanged between the two models.
    #[serde(default = "default_n_mels")]
    pub n_mels: usize,

    /// Optional tokeniser symbol list (FastPitch only); index 0 is padding.
    #[serde(default)]
    pub symbols: Option<Vec<String>>,
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn default_n_mels() -> usize {
    DEFAULT_N_MELS
}

impl ModelConfig {
    fn expect_kind(&self, kind: ModelKind, id: &str) -> Result<()> {
        if self.model_type != kind {
            bail!("Model '{}' is a {:?} model, expected {:?}", id, self.model_type, kind);
        }
        Ok(())
    }
}

/// Read and parse a `config.json`.
pub fn load_model_config(path: &Path) -> Result<ModelConfig> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Cannot read config: {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// `"tts_hifigan"` → `"nvidia/tts_hifigan"`; `"owner/name"` is kept as is.
pub fn resolve_repo_id(id: &str) -> String {
    if id.contains('/') {
        id.to_string()
    } else {
        format!("{}/{}", DEFAULT_NAMESPACE, id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared construction
// ─────────────────────────────────────────────────────────────────────────────

fn open_generator(id: &str, fetch: impl Fn(&str) -> Result<PathBuf>) -> Result<FastPitchOnnx> {
    let config = load_model_config(&fetch(CONFIG_FILE)?)?;
    config.expect_kind(ModelKind::FastPitch, id)?;

    let vocab = match &config.symbols {
        Some(symbols) => Vocabulary::from_symbols(symbols)
            .with_context(|| format!("Bad symbol list in '{}'", id))?,
        None => Vocabulary::english(),
    };

    let model_path = fetch(&config.model_file)?;
    tracing::info!(model = id, path = %model_path.display(), "loading spectrogram generator");
    FastPitchOnnx::load(&model_path, vocab, config.n_mels)
}

fn open_vocoder(id: &str, fetch: impl Fn(&str) -> Result<PathBuf>) -> Result<HifiGanOnnx> {
    let config = load_model_config(&fetch(CONFIG_FILE)?)?;
    config.expect_kind(ModelKind::HifiGan, id)?;

    let model_path = fetch(&config.model_file)?;
    tracing::info!(model = id, path = %model_path.display(), "loading vocoder");
    HifiGanOnnx::load(&model_path, config.sample_rate, config.n_mels)
}

// ─────────────────────────────────────────────────────────────────────────────
// HuggingFace Hub
// ─────────────────────────────────────────────────────────────────────────────

/// Downloads models from the HuggingFace Hub.
///
/// Files are cached in the HuggingFace Hub cache directory
/// (`~/.cache/huggingface/hub` by default), so only the first run downloads.
pub struct HubModelLoader {
    api: Api,
}

impl HubModelLoader {
    pub fn new() -> Result<Self> {
        let api = Api::new().context("Failed to initialise HuggingFace Hub client")?;
        Ok(Self { api })
    }

    /// Download a single file from the repository behind `id`.
    fn hf_download(&self, id: &str, filename: &str) -> Result<PathBuf> {
        let repo_id = resolve_repo_id(id);
        tracing::info!(repo = %repo_id, file = filename, "fetching");
        self.api.model(repo_id.clone()).get(filename).with_context(|| {
            let mut msg = format!("Failed to download '{}' from '{}'", filename, repo_id);
            if filename == CONFIG_FILE {
                msg.push_str("; ");
                msg.push_str(EXPORT_HINT);
            }
            msg
        })
    }
}

impl ModelLoader for HubModelLoader {
    type Generator = FastPitchOnnx;
    type Vocoder = HifiGanOnnx;

    fn load_spectrogram_generator(&self, id: &str) -> Result<FastPitchOnnx> {
        open_generator(id, |file| self.hf_download(id, file))
    }

    fn load_vocoder(&self, id: &str) -> Result<HifiGanOnnx> {
        open_vocoder(id, |file| self.hf_download(id, file))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Local directory
// ─────────────────────────────────────────────────────────────────────────────

/// Loads models from `<root>/<id>/`, for offline machines and bundled apps.
pub struct LocalModelLoader {
    root: PathBuf,
}

impl LocalModelLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn local_file(&self, id: &str, filename: &str) -> Result<PathBuf> {
        let path = self.root.join(id).join(filename);
        if !path.is_file() {
            if filename == CONFIG_FILE {
                bail!("Model file not found: {}; {}", path.display(), EXPORT_HINT);
            }
            bail!("Model file not found: {}", path.display());
        }
        Ok(path)
    }
}

impl ModelLoader for LocalModelLoader {
    type Generator = FastPitchOnnx;
    type Vocoder = HifiGanOnnx;

    fn load_spectrogram_generator(&self, id: &str) -> Result<FastPitchOnnx> {
        open_generator(id, |file| self.local_file(id, file))
    }

    fn load_vocoder(&self, id: &str) -> Result<HifiGanOnnx> {
        open_vocoder(id, |file| self.local_file(id, file))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Source selection
// ─────────────────────────────────────────────────────────────────────────────

/// Where the binary gets its models: the local model directory when it
/// exists, the HuggingFace Hub otherwise.
pub enum ModelSource {
    Local(LocalModelLoader),
    Hub(HubModelLoader),
}

impl ModelSource {
    pub fn for_config(config: &TtsConfig) -> Result<Self> {
        if config.model_dir.is_dir() {
            tracing::info!(dir = %config.model_dir.display(), "using local models");
            Ok(Self::Local(LocalModelLoader::new(&config.model_dir)))
        } else {
            tracing::info!(
                dir = %config.model_dir.display(),
                "no local model directory; using the HuggingFace Hub"
            );
            Ok(Self::Hub(HubModelLoader::new()?))
        }
    }
}

impl ModelLoader for ModelSource {
    type Generator = FastPitchOnnx;
    type Vocoder = HifiGanOnnx;

    fn load_spectrogram_generator(&self, id: &str) -> Result<FastPitchOnnx> {
        match self {
            Self::Local(loader) => loader.load_spectrogram_generator(id),
            Self::Hub(loader) => loader.load_spectrogram_generator(id),
        }
    }

    fn load_vocoder(&self, id: &str) -> Result<HifiGanOnnx> {
        match self {
            Self::Local(loader) => loader.load_vocoder(id),
            Self::Hub(loader) => loader.load_vocoder(id),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
