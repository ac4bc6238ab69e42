//! Spectrogram generator and vocoder — traits plus ONNX Runtime backends.
//!
//! The synthesis pipeline only sees the [`SpectrogramGenerator`] and
//! [`Vocoder`] traits, and obtains them through a [`ModelLoader`].  The
//! production implementations run NeMo FastPitch / HiFi-GAN ONNX exports
//! with [`ort`]:
//!
//! | Model      | Input   | Shape               | dtype   |
//! |------------|---------|---------------------|---------|
//! | FastPitch  | `text`  | `[1, T]`            | int64   |
//! |            | `pitch` | `[1, T]`            | float32 |
//! |            | `pace`  | `[1, T]`            | float32 |
//! | HiFi-GAN   | `spec`  | `[1, n_mels, F]`    | float32 |
//!
//! FastPitch output 0 is the mel spectrogram `[1, n_mels, F]`; HiFi-GAN
//! output 0 is the waveform `[1, 1, S]` (or `[1, S]`).

use std::{path::Path, sync::Mutex};

use anyhow::{anyhow, bail, Context, Result};
use ort::{session::Session, value::Tensor};

use crate::{normalize::normalize, tokenize::Vocabulary};

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline values
// ─────────────────────────────────────────────────────────────────────────────

/// Token IDs produced by [`SpectrogramGenerator::parse`].
#[derive(Debug, PartialEq, Eq)]
pub struct Tokens(Vec<i64>);

impl Tokens {
    pub fn new(ids: Vec<i64>) -> Self {
        Self(ids)
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<i64> {
        self.0
    }
}

/// Mel spectrogram, `[n_mels, n_frames]` stored flat in row-major order.
#[derive(Debug)]
pub struct Spectrogram {
    n_mels: usize,
    n_frames: usize,
    data: Vec<f32>,
}

impl Spectrogram {
    pub fn new(n_mels: usize, n_frames: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != n_mels * n_frames {
            bail!(
                "Spectrogram data has {} values, expected {} × {} = {}",
                data.len(),
                n_mels,
                n_frames,
                n_mels * n_frames
            );
        }
        Ok(Self { n_mels, n_frames, data })
    }

    pub fn n_mels(&self) -> usize {
        self.n_mels
    }

    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }
}

/// Mono audio samples in `[-1.0, 1.0]`.
#[derive(Debug)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Capabilities
// ─────────────────────────────────────────────────────────────────────────────

/// Text → tokens → mel spectrogram.
pub trait SpectrogramGenerator {
    /// Normalise and tokenise `text`.
    fn parse(&self, text: &str) -> Result<Tokens>;

    fn generate_spectrogram(&self, tokens: Tokens) -> Result<Spectrogram>;
}

/// Mel spectrogram → waveform.
pub trait Vocoder {
    fn convert_spectrogram_to_audio(&self, spec: Spectrogram) -> Result<Waveform>;
}

/// Resolves registry identifiers such as `"tts_en_fastpitch"` to loaded models.
pub trait ModelLoader {
    type Generator: SpectrogramGenerator;
    type Vocoder: Vocoder;

    fn load_spectrogram_generator(&self, id: &str) -> Result<Self::Generator>;

    fn load_vocoder(&self, id: &str) -> Result<Self::Vocoder>;
}

// ─────────────────────────────────────────────────────────────────────────────
// ONNX helpers
// ─────────────────────────────────────────────────────────────────────────────

fn load_session(model_path: &Path) -> Result<Mutex<Session>> {
    let session = Session::builder()
        .context("Failed to create ORT session builder")?
        .commit_from_file(model_path)
        .with_context(|| format!("Cannot load ONNX model: {}", model_path.display()))?;
    Ok(Mutex::new(session))
}

/// Split an output shape into `(rows, cols)` for a batch of one, ignoring
/// leading singleton dims: `[1, 80, F]` → `(80, F)`, `[1, 1, S]` → `(1, S)`.
fn trailing_2d(shape: &[i64]) -> Result<(usize, usize)> {
    match shape {
        [.., rows, cols] if *rows >= 0 && *cols >= 0 => Ok((*rows as usize, *cols as usize)),
        [n] if *n >= 0 => Ok((1, *n as usize)),
        _ => bail!("Unexpected output shape {:?}", shape),
    }
}

/// Sample count of a single-channel waveform output. Batched or
/// multi-channel shapes are rejected rather than flattened.
fn mono_len(shape: &[i64]) -> Result<usize> {
    let (rows, samples) = trailing_2d(shape)?;
    let batch: i64 = shape.iter().rev().skip(2).product();
    if rows != 1 || batch != 1 {
        bail!("Expected a mono waveform [1, 1, S], got shape {:?}", shape);
    }
    Ok(samples)
}

// ─────────────────────────────────────────────────────────────────────────────
// FastPitch
// ─────────────────────────────────────────────────────────────────────────────

/// FastPitch spectrogram generator backed by an ONNX session.
pub struct FastPitchOnnx {
    session: Mutex<Session>,
    vocab: Vocabulary,
    n_mels: usize,
}

impl FastPitchOnnx {
    pub fn load(model_path: &Path, vocab: Vocabulary, n_mels: usize) -> Result<Self> {
        Ok(Self { session: load_session(model_path)?, vocab, n_mels })
    }
}

impl SpectrogramGenerator for FastPitchOnnx {
    fn parse(&self, text: &str) -> Result<Tokens> {
        let cleaned = normalize(text);
        let ids = self.vocab.encode(&cleaned);
        if ids.is_empty() {
            bail!("Nothing to synthesise: {:?} has no speakable characters", text);
        }
        tracing::debug!(chars = cleaned.len(), tokens = ids.len(), "parsed text");
        Ok(Tokens::new(ids))
    }

    fn generate_spectrogram(&self, tokens: Tokens) -> Result<Spectrogram> {
        let seq_len = tokens.len();

        // Positional inputs (ONNX graph order):
        //   0 → text   [1, T]  i64
        //   1 → pitch  [1, T]  f32  (zero shift)
        //   2 → pace   [1, T]  f32  (natural pace)
        let t_text = Tensor::<i64>::from_array(([1usize, seq_len], tokens.into_vec()))
            .context("Failed to build text tensor")?;
        let t_pitch = Tensor::<f32>::from_array(([1usize, seq_len], vec![0.0f32; seq_len]))
            .context("Failed to build pitch tensor")?;
        let t_pace = Tensor::<f32>::from_array(([1usize, seq_len], vec![1.0f32; seq_len]))
            .context("Failed to build pace tensor")?;

        let mut session =
            self.session.lock().map_err(|_| anyhow!("FastPitch session mutex poisoned"))?;
        let outputs = session
            .run(ort::inputs![t_text, t_pitch, t_pace])
            .context("FastPitch inference failed")?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Failed to extract spectrogram tensor")?;
        let dims: Vec<i64> = shape.iter().copied().collect();
        let (n_mels, n_frames) = trailing_2d(&dims)?;
        if n_mels != self.n_mels {
            bail!("FastPitch produced {} mel bins, config says {}", n_mels, self.n_mels);
        }
        tracing::debug!(n_mels, n_frames, "generated spectrogram");

        Spectrogram::new(n_mels, n_frames, data.to_vec())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HiFi-GAN
// ─────────────────────────────────────────────────────────────────────────────

/// HiFi-GAN vocoder backed by an ONNX session.
pub struct HifiGanOnnx {
    session: Mutex<Session>,
    sample_rate: u32,
    n_mels: usize,
}

impl HifiGanOnnx {
    pub fn load(model_path: &Path, sample_rate: u32, n_mels: usize) -> Result<Self> {
        Ok(Self { session: load_session(model_path)?, sample_rate, n_mels })
    }
}

impl Vocoder for HifiGanOnnx {
    fn convert_spectrogram_to_audio(&self, spec: Spectrogram) -> Result<Waveform> {
        let (n_mels, n_frames) = (spec.n_mels(), spec.n_frames());
        if n_mels != self.n_mels {
            bail!("HiFi-GAN expects {} mel bins, spectrogram has {}", self.n_mels, n_mels);
        }
        let t_spec = Tensor::<f32>::from_array(([1usize, n_mels, n_frames], spec.into_data()))
            .context("Failed to build spectrogram tensor")?;

        let mut session =
            self.session.lock().map_err(|_| anyhow!("HiFi-GAN session mutex poisoned"))?;
        let outputs = session
            .run(ort::inputs![t_spec])
            .context("HiFi-GAN inference failed")?;

        let (shape, audio) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Failed to extract audio tensor")?;
        let dims: Vec<i64> = shape.iter().copied().collect();
        let samples = mono_len(&dims)?;
        if samples != audio.len() {
            bail!("Audio shape {:?} does not match {} values", dims, audio.len());
        }
        tracing::debug!(n_frames, samples, "vocoded spectrogram");

        Ok(Waveform::new(audio.to_vec(), self.sample_rate))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spectrogram_rejects_bad_len() {
        assert!(Spectrogram::new(80, 10, vec![0.0; 800]).is_ok());
        assert!(Spectrogram::new(80, 10, vec![0.0; 799]).is_err());
    }

    #[test]
    fn test_trailing_2d() {
        assert_eq!(trailing_2d(&[1, 80, 123]).unwrap(), (80, 123));
        assert_eq!(trailing_2d(&[1, 1, 4096]).unwrap(), (1, 4096));
        assert_eq!(trailing_2d(&[4096]).unwrap(), (1, 4096));
        assert!(trailing_2d(&[]).is_err());
        assert!(trailing_2d(&[1, -1, 5]).is_err());
    }

    #[test]
    fn test_mono_len() {
        assert_eq!(mono_len(&[1, 1, 4096]).unwrap(), 4096);
        assert_eq!(mono_len(&[1, 4096]).unwrap(), 4096);
        assert_eq!(mono_len(&[4096]).unwrap(), 4096);
        // stereo
        assert!(mono_len(&[1, 2, 4096]).is_err());
        // batch of two
        assert!(mono_len(&[2, 1, 4096]).is_err());
        assert!(mono_len(&[2, 4096]).is_err());
    }

    #[test]
    fn test_waveform_duration() {
        let w = Waveform::new(vec![0.0; 22_050], 22_050);
        assert_eq!(w.len(), 22_050);
        assert!((w.duration_secs() - 1.0).abs() < f32::EPSILON);
    }
}
