//! End-to-end synthesis with stand-in models: text in, WAV file out.

use std::cell::RefCell;

use anyhow::{bail, Result};
use groq_tts::{
    model::{ModelLoader, Spectrogram, SpectrogramGenerator, Tokens, Vocoder, Waveform},
    synthesize_speech, TtsConfig,
};

const HOP: usize = 256;

/// One frame per word, 80 mel bins.
struct WordFrames;

impl SpectrogramGenerator for WordFrames {
    fn parse(&self, text: &str) -> Result<Tokens> {
        let ids: Vec<i64> = text.split_whitespace().map(|w| w.len() as i64).collect();
        if ids.is_empty() {
            bail!("nothing to say");
        }
        Ok(Tokens::new(ids))
    }

    fn generate_spectrogram(&self, tokens: Tokens) -> Result<Spectrogram> {
        let frames = tokens.len();
        Spectrogram::new(80, frames, vec![-4.0; 80 * frames])
    }
}

/// HOP samples of a quiet square wave per frame.
struct SquareVocoder;

impl Vocoder for SquareVocoder {
    fn convert_spectrogram_to_audio(&self, spec: Spectrogram) -> Result<Waveform> {
        let samples = (0..spec.n_frames() * HOP)
            .map(|i| if (i / 32) % 2 == 0 { 0.25 } else { -0.25 })
            .collect();
        Ok(Waveform::new(samples, 22_050))
    }
}

#[derive(Default)]
struct FakeLoader {
    requested: RefCell<Vec<String>>,
}

impl ModelLoader for FakeLoader {
    type Generator = WordFrames;
    type Vocoder = SquareVocoder;

    fn load_spectrogram_generator(&self, id: &str) -> Result<WordFrames> {
        self.requested.borrow_mut().push(id.to_string());
        Ok(WordFrames)
    }

    fn load_vocoder(&self, id: &str) -> Result<SquareVocoder> {
        self.requested.borrow_mut().push(id.to_string());
        Ok(SquareVocoder)
    }
}

/// Fails like a registry with no network.
struct OfflineLoader;

impl ModelLoader for OfflineLoader {
    type Generator = WordFrames;
    type Vocoder = SquareVocoder;

    fn load_spectrogram_generator(&self, id: &str) -> Result<WordFrames> {
        bail!("cannot reach registry for {id}")
    }

    fn load_vocoder(&self, id: &str) -> Result<SquareVocoder> {
        bail!("cannot reach registry for {id}")
    }
}

/// A vocoder whose export produced a zero-length waveform.
struct SilentVocoder;

impl Vocoder for SilentVocoder {
    fn convert_spectrogram_to_audio(&self, _spec: Spectrogram) -> Result<Waveform> {
        Ok(Waveform::new(Vec::new(), 22_050))
    }
}

struct SilentLoader;

impl ModelLoader for SilentLoader {
    type Generator = WordFrames;
    type Vocoder = SilentVocoder;

    fn load_spectrogram_generator(&self, _id: &str) -> Result<WordFrames> {
        Ok(WordFrames)
    }

    fn load_vocoder(&self, _id: &str) -> Result<SilentVocoder> {
        Ok(SilentVocoder)
    }
}

fn config_in(dir: &tempfile::TempDir) -> TtsConfig {
    TtsConfig { output_path: dir.path().join("output.wav"), ..TtsConfig::default() }
}

#[test]
fn writes_mono_22050_wav() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let loader = FakeLoader::default();

    synthesize_speech(&loader, &config, "Robots were first named in a 1920 play.").unwrap();

    let reader = hound::WavReader::open(&config.output_path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, 22_050);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(reader.len() as usize, 8 * HOP);
}

#[test]
fn loads_the_configured_model_ids() {
    let dir = tempfile::tempdir().unwrap();
    let loader = FakeLoader::default();

    synthesize_speech(&loader, &config_in(&dir), "hello").unwrap();

    assert_eq!(*loader.requested.borrow(), vec!["tts_en_fastpitch", "tts_hifigan"]);
}

#[test]
fn second_run_overwrites_the_same_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let loader = FakeLoader::default();

    synthesize_speech(&loader, &config, "one two three four five six").unwrap();
    let first = hound::WavReader::open(&config.output_path).unwrap().len();

    synthesize_speech(&loader, &config, "one two").unwrap();
    let second = hound::WavReader::open(&config.output_path).unwrap().len();

    assert_eq!(first as usize, 6 * HOP);
    assert_eq!(second as usize, 2 * HOP);
    let entries = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(entries, 1, "no extra or versioned files");
}

#[test]
fn loader_failure_is_fatal_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);

    let err = synthesize_speech(&OfflineLoader, &config, "hello").unwrap_err();

    assert!(format!("{err:#}").contains("cannot reach registry"), "got: {err:#}");
    assert!(!config.output_path.exists());
}

#[test]
fn unspeakable_text_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);

    assert!(synthesize_speech(&FakeLoader::default(), &config, "   ").is_err());
    assert!(!config.output_path.exists());
}

#[test]
fn empty_audio_is_an_error_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);

    let err = synthesize_speech(&SilentLoader, &config, "hello there").unwrap_err();

    assert!(format!("{err:#}").contains("no audio"), "got: {err:#}");
    assert!(!config.output_path.exists());
}

#[test]
fn empty_audio_leaves_the_previous_file_intact() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    synthesize_speech(&FakeLoader::default(), &config, "one two three").unwrap();

    assert!(synthesize_speech(&SilentLoader, &config, "four five").is_err());

    let kept = hound::WavReader::open(&config.output_path).unwrap().len();
    assert_eq!(kept as usize, 3 * HOP);
}
