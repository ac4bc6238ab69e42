//! Ask two questions, print both answers, speak the second one to `output.wav`.
//!
//! Needs `GROQ_API_KEY` in the environment or in `.env`, and the ONNX exports
//! of both models under `models/<id>/` (see `groq_tts::download`).  Log verbosity is
//! controlled by `RUST_LOG` (default `info`); `RUST_LOG=groq_tts=debug`
//! also prints the raw HTTP status and body of every chat completion.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use groq_tts::{download::ModelSource, llm::LlmClient, synth::synthesize_speech, Config};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env()?;
    let client = LlmClient::new(config.llm.clone()).context("Cannot build HTTP client")?;

    let answer = client
        .get_llm_response("What is Industry 5.0?")
        .context("First chat completion failed")?;
    println!("{answer}");

    let text = client
        .get_llm_response("Tell me a fun fact about robotics.")
        .context("Second chat completion failed")?;
    println!("{text}");

    let loader = ModelSource::for_config(&config.tts)?;
    synthesize_speech(&loader, &config.tts, &text).context("Speech synthesis failed")?;

    Ok(())
}
