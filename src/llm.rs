//! Chat-completion client for an OpenAI-compatible endpoint.
//!
//! One blocking request per call: no retries, no streaming, no timeout.
//! The wire body is
//!
//! ```json
//! {"model": "...", "messages": [{"role": "user", "content": "<prompt>"}], "temperature": 0.7}
//! ```
//!
//! and the answer is read from `choices[0].message.content`.
//!
//! HTTP goes through the [`HttpTransport`] trait so tests can swap in a fake
//! without touching the network.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

use crate::{
    config::LlmConfig,
    error::{Error, Result},
};

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

/// Request body for `POST /chat/completions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: String,
}

/// Extract `choices[0].message.content` from a raw response body.
///
/// Invalid JSON is [`Error::Json`]; valid JSON of the wrong shape (missing
/// keys, empty `choices`, `null` content) is [`Error::MalformedResponse`].
pub fn extract_content(body: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let response: ChatCompletionResponse = serde_json::from_value(value)
        .map_err(|e| Error::MalformedResponse(e.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| Error::MalformedResponse("`choices` is empty".to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Transport
// ─────────────────────────────────────────────────────────────────────────────

/// Status and body of a completed HTTP exchange, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Capability to POST a JSON body with a bearer token.
///
/// Implementations return `Ok` for every response that arrived, including
/// 4xx/5xx; status validation is the caller's job.
pub trait HttpTransport {
    fn post_json(
        &self,
        url: &str,
        bearer_token: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse>;
}

/// [`HttpTransport`] over a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        // reqwest's blocking client defaults to a 30 s timeout; requests here
        // wait as long as the server takes.
        let client = reqwest::blocking::Client::builder()
            .timeout(None::<Duration>)
            .build()?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn post_json(
        &self,
        url: &str,
        bearer_token: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse> {
        let response = self
            .client
            .post(url)
            .bearer_auth(bearer_token)
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()?;
        let status = response.status().as_u16();
        read_body(status, response.text())
    }
}

/// Pair `status` with the body read result. A body that cannot be read on a
/// non-2xx response still reports the status, with an empty body.
fn read_body<E: Into<Error>>(
    status: u16,
    body: std::result::Result<String, E>,
) -> Result<HttpResponse> {
    let response = HttpResponse { status, body: String::new() };
    match body {
        Ok(body) => Ok(HttpResponse { body, ..response }),
        Err(e) if !response.is_success() => {
            let e: Error = e.into();
            tracing::warn!(status, error = %e, "could not read error response body");
            Ok(response)
        }
        Err(e) => Err(e.into()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// Chat-completion client bound to one [`LlmConfig`].
pub struct LlmClient<T = ReqwestTransport> {
    config: LlmConfig,
    transport: T,
}

impl LlmClient<ReqwestTransport> {
    /// Client over a fresh blocking reqwest transport.
    pub fn new(config: LlmConfig) -> Result<Self> {
        Ok(Self::with_transport(config, ReqwestTransport::new()?))
    }
}

impl<T: HttpTransport> LlmClient<T> {
    pub fn with_transport(config: LlmConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Request body for `prompt`: configured model and temperature, one
    /// `user` message holding the prompt verbatim.
    pub fn build_request(&self, prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage::user(prompt)],
            temperature: self.config.temperature,
        }
    }

    /// Send `prompt` and return the first choice's message content.
    pub fn get_llm_response(&self, prompt: &str) -> Result<String> {
        let body = serde_json::to_value(self.build_request(prompt))?;

        tracing::info!(endpoint = %self.config.endpoint, model = %self.config.model, "requesting chat completion");
        let response =
            self.transport.post_json(&self.config.endpoint, &self.config.api_key, &body)?;

        // Logged before the status check so failed calls show the body too.
        tracing::debug!(status = response.status, body = %response.body, "raw response");

        if !response.is_success() {
            return Err(Error::Http { status: response.status, body: response.body });
        }
        extract_content(&response.body)
    }
}

/// One-shot convenience: build a reqwest-backed client and ask `prompt`.
pub fn get_llm_response(config: &LlmConfig, prompt: &str) -> Result<String> {
    LlmClient::new(config.clone())?.get_llm_response(prompt)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Sent {
        url: String,
        token: String,
        body: serde_json::Value,
    }

    /// Replies with a canned response and remembers every request.
    struct FakeTransport {
        reply: HttpResponse,
        sent: RefCell<Vec<Sent>>,
    }

    impl FakeTransport {
        fn replying(status: u16, body: &str) -> Self {
            Self {
                reply: HttpResponse { status, body: body.to_string() },
                sent: RefCell::new(Vec::new()),
            }
        }
    }

    impl HttpTransport for FakeTransport {
        fn post_json(
            &self,
            url: &str,
            bearer_token: &str,
            body: &serde_json::Value,
        ) -> Result<HttpResponse> {
            self.sent.borrow_mut().push(Sent {
                url: url.to_string(),
                token: bearer_token.to_string(),
                body: body.clone(),
            });
            Ok(self.reply.clone())
        }
    }

    fn client(status: u16, body: &str) -> LlmClient<FakeTransport> {
        LlmClient::with_transport(LlmConfig::new("gsk_test"), FakeTransport::replying(status, body))
    }

    const HELLO: &str = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Hello"}}]}"#;

    #[test]
    fn test_returns_first_choice_content() {
        let c = client(200, HELLO);
        assert_eq!(c.get_llm_response("Say hello").unwrap(), "Hello");
    }

    #[test]
    fn test_non_2xx_is_http_error() {
        let c = client(401, r#"{"error":{"message":"Invalid API Key"}}"#);
        let err = c.get_llm_response("hi").unwrap_err();
        match err {
            Error::Http { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("Invalid API Key"));
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[test]
    fn test_server_error_is_http_error() {
        let err = client(503, "upstream unavailable").get_llm_response("hi").unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn test_missing_choices_is_structural_error() {
        let err = client(200, r#"{"id":"x","object":"chat.completion"}"#)
            .get_llm_response("hi")
            .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)), "got {err:?}");
    }

    #[test]
    fn test_empty_choices_is_structural_error() {
        let err = client(200, r#"{"choices":[]}"#).get_llm_response("hi").unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)), "got {err:?}");
    }

    #[test]
    fn test_null_content_is_structural_error() {
        let err = extract_content(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)), "got {err:?}");
    }

    #[test]
    fn test_non_json_body_is_json_error() {
        let err = client(200, "<html>oops</html>").get_llm_response("hi").unwrap_err();
        assert!(matches!(err, Error::Json(_)), "got {err:?}");
    }

    #[test]
    fn test_request_body_fixed_fields_regardless_of_prompt() {
        let c = client(200, HELLO);
        for prompt in ["What is Industry 5.0?", "", "temperature: 1.0 \"model\": x", "🤖"] {
            c.get_llm_response(prompt).unwrap();
        }
        let sent = c.transport().sent.borrow();
        assert_eq!(sent.len(), 4);
        for s in sent.iter() {
            assert_eq!(s.body["temperature"], 0.7);
            assert_eq!(s.body["model"], "meta-llama/llama-4-scout-17b-16e-instruct");
            assert_eq!(s.body["messages"].as_array().unwrap().len(), 1);
            assert_eq!(s.body["messages"][0]["role"], "user");
            assert_eq!(s.url, "https://api.groq.com/openai/v1/chat/completions");
        }
        assert_eq!(sent[0].body["messages"][0]["content"], "What is Industry 5.0?");
        assert_eq!(sent[3].body["messages"][0]["content"], "🤖");
    }

    #[test]
    fn test_bearer_token_comes_from_config() {
        let c = client(200, HELLO);
        c.get_llm_response("hi").unwrap();
        assert_eq!(c.transport().sent.borrow()[0].token, "gsk_test");
    }

    #[test]
    fn test_request_serialises_to_exact_wire_shape() {
        let c = client(200, HELLO);
        let value = serde_json::to_value(c.build_request("ping")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "model": "meta-llama/llama-4-scout-17b-16e-instruct",
                "messages": [{"role": "user", "content": "ping"}],
                "temperature": 0.7
            })
        );
    }

    #[test]
    fn test_unreadable_error_body_keeps_status() {
        let cut = || Err::<String, Error>(Error::MalformedResponse("connection reset".into()));

        let r = read_body(502, cut()).unwrap();
        assert_eq!(r, HttpResponse { status: 502, body: String::new() });
        assert!(read_body(200, cut()).is_err());

        let c = client(r.status, &r.body);
        assert_eq!(c.get_llm_response("hi").unwrap_err().status(), Some(502));
    }
}
