//! Text → WAV: spectrogram generator, then vocoder, then a 16-bit PCM file.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::{
    config::TtsConfig,
    model::{ModelLoader, SpectrogramGenerator, Vocoder, Waveform},
};

/// A loaded spectrogram generator + vocoder pair.
pub struct Synthesizer<G, V> {
    generator: G,
    vocoder: V,
}

impl<G: SpectrogramGenerator, V: Vocoder> Synthesizer<G, V> {
    pub fn new(generator: G, vocoder: V) -> Self {
        Self { generator, vocoder }
    }

    /// Load both models through `loader`.
    pub fn load<L>(loader: &L, config: &TtsConfig) -> Result<Self>
    where
        L: ModelLoader<Generator = G, Vocoder = V>,
    {
        let generator = loader
            .load_spectrogram_generator(&config.spectrogram_model)
            .with_context(|| format!("Cannot load model '{}'", config.spectrogram_model))?;
        let vocoder = loader
            .load_vocoder(&config.vocoder_model)
            .with_context(|| format!("Cannot load model '{}'", config.vocoder_model))?;
        Ok(Self::new(generator, vocoder))
    }

    /// parse → generate_spectrogram → convert_spectrogram_to_audio.
    pub fn synthesize(&self, text: &str) -> Result<Waveform> {
        let tokens = self.generator.parse(text)?;
        let spectrogram = self.generator.generate_spectrogram(tokens)?;
        let waveform = self.vocoder.convert_spectrogram_to_audio(spectrogram)?;
        if waveform.is_empty() {
            bail!("Vocoder produced no audio for {:?}", text);
        }
        Ok(waveform)
    }
}

/// Load the configured models, synthesise `text` and write
/// `config.output_path` at `config.sample_rate`.
///
/// Any existing file at the output path is overwritten.
pub fn synthesize_speech<L: ModelLoader>(loader: &L, config: &TtsConfig, text: &str) -> Result<()> {
    let synth = Synthesizer::load(loader, config)?;
    let waveform = synth.synthesize(text)?;
    write_wav(&waveform, &config.output_path, config.sample_rate)
}

/// Write `waveform` to a mono 16-bit PCM WAV file at `sample_rate` Hz.
///
/// The header rate is always `sample_rate`; samples are not resampled.
pub fn write_wav(waveform: &Waveform, output_path: &Path, sample_rate: u32) -> Result<()> {
    // Checked before `create`, which truncates an existing file.
    if waveform.is_empty() {
        bail!("Refusing to write an empty WAV: {}", output_path.display());
    }
    if waveform.sample_rate() != sample_rate {
        tracing::warn!(
            model_rate = waveform.sample_rate(),
            file_rate = sample_rate,
            "vocoder sample rate differs from output rate; writing without resampling"
        );
    }

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(output_path, spec)
        .with_context(|| format!("Cannot create WAV: {}", output_path.display()))?;
    for &s in waveform.samples() {
        // f32 [-1.0, 1.0] → i16 [-32768, 32767].
        let s16 = (s * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        writer.write_sample(s16).context("WAV write error")?;
    }
    writer.finalize().context("WAV finalise error")?;

    tracing::info!(
        samples = waveform.len(),
        seconds = waveform.len() as f32 / sample_rate as f32,
        path = %output_path.display(),
        "saved audio"
    );
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
