//! Google Gemini provider implementing [`TextCompletionClient`].
//!
//! Uses the API-key flavour of the Generative Language API: one non-streaming
//! `POST {base_url}/models/{model}:generateContent` per call, with the persona
//! role sent as `systemInstruction`.

use std::time::Duration;

use async_trait::async_trait;
use pipeline::{AtelierError, CompletionError, ModelName, TextCompletionClient};
use tracing::{debug, error, instrument};

use crate::types::{ErrorEnvelope, GenerateContentRequest, GenerateContentResponse};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Longest slice of an unparseable error body kept in the error message.
const MAX_RAW_ERROR_CHARS: usize = 500;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Connection settings for [`GeminiProvider`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key sent in the `x-goog-api-key` header.
    pub api_key: String,
    /// Model to call.
    pub model: ModelName,
    /// API root without a trailing slash.
    pub base_url: String,
    /// Sampling temperature. `None` leaves the provider default.
    pub temperature: Option<f32>,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Config with default model, base URL and a 120 s timeout.
    pub fn new(api_key: impl Into<String>) -> Result<Self, AtelierError> {
        Ok(Self {
            api_key: api_key.into(),
            model: model_name(DEFAULT_MODEL)?,
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: None,
            timeout: Duration::from_secs(120),
        })
    }
}

fn model_name(raw: &str) -> Result<ModelName, AtelierError> {
    ModelName::new(raw).ok_or_else(|| AtelierError::ConfigurationError {
        message: "model name must not be empty".to_string(),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider
// ─────────────────────────────────────────────────────────────────────────────

/// Gemini text-completion client. Cheap to share behind an `Arc`.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Builds the provider and its HTTP client.
    pub fn new(config: GeminiConfig) -> Result<Self, AtelierError> {
        if config.api_key.trim().is_empty() {
            return Err(AtelierError::ConfigurationError {
                message: "Gemini API key is empty".to_string(),
            });
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AtelierError::ConfigurationError {
                message: format!("could not build HTTP client: {e}"),
            })?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl TextCompletionClient for GeminiProvider {
    #[instrument(skip_all, fields(model = %self.config.model))]
    async fn generate(&self, role_text: &str, input_text: &str) -> Result<String, CompletionError> {
        let body = GenerateContentRequest::new(role_text, input_text, self.config.temperature);
        debug!(input_chars = input_text.chars().count(), "calling generateContent");

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| CompletionError::Transport {
            message: e.to_string(),
        })?;

        if !status.is_success() {
            let message = parse_api_error(&text);
            error!(status = status.as_u16(), message = %message, "Gemini API error");
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&text).map_err(|e| CompletionError::MalformedResponse {
                message: e.to_string(),
            })?;

        parsed.text().ok_or_else(|| CompletionError::EmptyResponse {
            reason: parsed.empty_reason(),
        })
    }
}

/// Provider error message from a JSON error envelope, or a bounded slice of
/// the raw body.
fn parse_api_error(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => body.chars().take(MAX_RAW_ERROR_CHARS).collect(),
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn provider(server: &MockServer) -> GeminiProvider {
        let mut config = GeminiConfig::new("test-key").unwrap();
        config.base_url = server.uri();
        config.temperature = Some(0.7);
        GeminiProvider::new(config).unwrap()
    }

    // ── parse_api_error ──────────────────────────────────────────────

    #[test]
    fn parse_api_error_reads_envelope() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(parse_api_error(body), "Resource has been exhausted");
    }

    #[test]
    fn parse_api_error_falls_back_to_raw_body() {
        assert_eq!(parse_api_error("Bad Gateway"), "Bad Gateway");
        assert_eq!(parse_api_error("  "), "no response body");
        assert_eq!(parse_api_error(&"x".repeat(2000)).len(), MAX_RAW_ERROR_CHARS);
    }

    // ── configuration ────────────────────────────────────────────────

    #[test]
    fn empty_api_key_is_rejected() {
        let config = GeminiConfig::new("  ").unwrap();
        assert!(matches!(
            GeminiProvider::new(config),
            Err(AtelierError::ConfigurationError { .. })
        ));
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let mut config = GeminiConfig::new("k").unwrap();
        config.base_url = "http://localhost:9000/v1beta/".into();
        let provider = GeminiProvider::new(config).unwrap();
        assert_eq!(
            provider.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    // ── generate (mock server) ───────────────────────────────────────

    #[tokio::test]
    async fn generate_returns_candidate_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "systemInstruction": {"parts": [{"text": "너는 도슨트야"}]},
                "contents": [{"role": "user", "parts": [{"text": "별이 빛나는 밤"}]}],
                "generationConfig": {"temperature": 0.7}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "이 작품은..."}]},
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = provider(&server)
            .generate("너는 도슨트야", "별이 빛나는 밤")
            .await
            .unwrap();

        assert_eq!(text, "이 작품은...");
    }

    #[tokio::test]
    async fn generate_maps_http_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"code": 429, "message": "quota exceeded", "status": "RESOURCE_EXHAUSTED"}
            })))
            .mount(&server)
            .await;

        let err = provider(&server).generate("role", "input").await.unwrap_err();

        assert_eq!(
            err,
            CompletionError::Api {
                status: 429,
                message: "quota exceeded".into()
            }
        );
    }

    #[tokio::test]
    async fn generate_reports_blocked_prompts_as_empty() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&server)
            .await;

        let err = provider(&server).generate("role", "input").await.unwrap_err();

        assert_eq!(
            err,
            CompletionError::EmptyResponse {
                reason: Some("SAFETY".into())
            }
        );
    }

    #[tokio::test]
    async fn generate_rejects_non_json_success_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
            .mount(&server)
            .await;

        let err = provider(&server).generate("role", "input").await.unwrap_err();

        assert!(matches!(err, CompletionError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn generate_reports_unreachable_host_as_transport_failure() {
        let mut config = GeminiConfig::new("k").unwrap();
        config.base_url = "http://127.0.0.1:1".into();
        config.timeout = Duration::from_secs(2);
        let provider = GeminiProvider::new(config).unwrap();

        let err = provider.generate("role", "input").await.unwrap_err();

        assert!(matches!(err, CompletionError::Transport { .. }));
    }
}
