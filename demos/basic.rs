//! Speak a single prompt's answer.
//!
//! Usage:
//!   cargo run --example basic
//!   cargo run --example basic -- "Why do cats purr?"
//!
//! Requirements:
//!   - GROQ_API_KEY in the environment or in .env
//!   - ONNX exports of both models in models/<id>/ (config.json + .onnx);
//!     without that directory they are fetched from the HuggingFace Hub

use groq_tts::{download::ModelSource, llm::LlmClient, synth::Synthesizer, Config};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let prompt = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Tell me a fun fact about robotics.".to_string());

    let config = Config::from_env()?;
    println!("Prompt : {:?}", prompt);
    println!("Models : {} + {}", config.tts.spectrogram_model, config.tts.vocoder_model);
    println!("Dir    : {}", config.tts.model_dir.display());
    println!("Output : {}", config.tts.output_path.display());
    println!();

    let answer = LlmClient::new(config.llm.clone())?.get_llm_response(&prompt)?;
    println!("{answer}\n");

    let synth = Synthesizer::load(&ModelSource::for_config(&config.tts)?, &config.tts)?;
    let waveform = synth.synthesize(&answer)?;
    println!("Synthesised {:.1} s of audio", waveform.duration_secs());

    groq_tts::synth::write_wav(&waveform, &config.tts.output_path, config.tts.sample_rate)?;
    println!("Done!");
    Ok(())
}
