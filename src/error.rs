//! Errors raised by configuration loading and the chat-completion client.
//!
//! The TTS half of the crate reports failures through [`anyhow`] (model
//! download, ONNX inference and WAV I/O are all fatal with no recovery), so
//! only the conditions a caller may want to match on get a variant here.

use thiserror::Error;

/// Configuration and LLM client errors.
#[derive(Debug, Error)]
pub enum Error {
    /// `GROQ_API_KEY` is absent from the environment and from `.env`.
    #[error("GROQ_API_KEY is not set (environment or .env file)")]
    MissingApiKey,

    /// Connection, TLS or body-read failure below the HTTP status layer.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-2xx status.
    #[error("chat completion request failed with HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body is not JSON at all.
    #[error("chat completion response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The response is JSON but lacks `choices[0].message.content`.
    #[error("unexpected chat completion response shape: {0}")]
    MalformedResponse(String),
}

impl Error {
    /// HTTP status for [`Error::Http`], `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_display_carries_status_and_body() {
        let err = Error::Http { status: 401, body: "invalid api key".into() };
        let msg = err.to_string();
        assert!(msg.contains("401"), "got: {msg}");
        assert!(msg.contains("invalid api key"), "got: {msg}");
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn test_status_is_none_for_non_http_errors() {
        assert_eq!(Error::MissingApiKey.status(), None);
        assert_eq!(Error::MalformedResponse("x".into()).status(), None);
    }
}
