//! OpenRouter rewriter implementation.
//!
//! Speaks the OpenAI-compatible `/chat/completions` protocol that OpenRouter
//! exposes, sending the system instruction and the text to rewrite as a
//! two-message conversation. The model is checked against the deployment
//! allow-list before any request leaves the process.

use async_trait::async_trait;
use contentforge_config::RewriterConfig;
use contentforge_core::error::RewriteError;
use contentforge_core::rewriter::{RewriteRequest, RewriteResponse, TextRewriter, Usage};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// An OpenRouter-backed [`TextRewriter`].
pub struct OpenRouterRewriter {
    name: String,
    base_url: String,
    api_key: Option<String>,
    allowed_models: Vec<String>,
    timeout: Duration,
    referer: String,
    app_title: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenRouterRewriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterRewriter")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("allowed_models", &self.allowed_models)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenRouterRewriter {
    /// Create a rewriter for `base_url`. A missing key is not an error here;
    /// every call will fail with [`RewriteError::Unavailable`] instead.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        allowed_models: Vec<String>,
    ) -> Result<Self, RewriteError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RewriteError::Unavailable(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            name: "openrouter".into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            allowed_models,
            timeout: Duration::from_secs(60),
            referer: String::new(),
            app_title: "AI Content Optimizer".into(),
            client,
        })
    }

    /// Build from the `[rewriter]` config section.
    pub fn from_config(config: &RewriterConfig) -> Result<Self, RewriteError> {
        Ok(Self::new(
            &config.api_base,
            config.api_key.clone(),
            config.allowed_models.clone(),
        )?
        .with_timeout(Duration::from_secs(config.timeout_secs))
        .with_attribution(&config.referer, &config.app_title))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the `HTTP-Referer` and `X-Title` attribution headers.
    pub fn with_attribution(mut self, referer: impl Into<String>, app_title: impl Into<String>) -> Self {
        self.referer = referer.into();
        self.app_title = app_title.into();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn validate_model<'a>(&self, model: &'a str) -> Result<&'a str, RewriteError> {
        if self.allowed_models.iter().any(|m| m == model) {
            Ok(model)
        } else {
            Err(RewriteError::UnsupportedModel(model.to_string()))
        }
    }

    fn to_api_request(request: &RewriteRequest) -> ApiRequest<'_> {
        ApiRequest {
            model: &request.model,
            messages: vec![
                ApiMessage {
                    role: "system",
                    content: &request.system_instruction,
                },
                ApiMessage {
                    role: "user",
                    content: &request.user_text,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
        }
    }

    async fn dispatch(
        &self,
        api_key: &str,
        request: &RewriteRequest,
    ) -> Result<RewriteResponse, RewriteError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.app_title)
            .header("Content-Type", "application/json")
            .json(&Self::to_api_request(request))
            .send()
            .await
            .map_err(|e| RewriteError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(5);
            return Err(RewriteError::RateLimited { retry_after_secs });
        }

        if status == 401 || status == 403 {
            return Err(RewriteError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Rewriter returned error");
            return Err(RewriteError::Upstream {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| RewriteError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| RewriteError::InvalidResponse("No choices in response".into()))?;

        let text = choice
            .message
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| RewriteError::InvalidResponse("Empty completion content".into()))?;

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(RewriteResponse {
            text,
            model: request.model.clone(),
            usage,
        })
    }
}

#[async_trait]
impl TextRewriter for OpenRouterRewriter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn rewrite(&self, request: RewriteRequest) -> Result<RewriteResponse, RewriteError> {
        self.validate_model(&request.model)?;

        let api_key = self.api_key.as_deref().ok_or_else(|| {
            RewriteError::Unavailable(
                "OPENROUTER_API_KEY missing. Add it to the config file or the environment".into(),
            )
        })?;

        debug!(
            rewriter = %self.name,
            model = %request.model,
            chars = request.user_text.len(),
            "Sending rewrite request"
        );

        match tokio::time::timeout(self.timeout, self.dispatch(api_key, &request)).await {
            Ok(result) => result,
            Err(_) => Err(RewriteError::Timeout(self.timeout.as_secs())),
        }
    }
}

// --- OpenAI-compatible API types (internal) ---

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL: &str = "qwen/qwen-turbo";

    fn rewriter(server: &MockServer) -> OpenRouterRewriter {
        OpenRouterRewriter::new(
            format!("{}/", server.uri()),
            Some("sk-or-test".into()),
            vec![MODEL.to_string()],
        )
        .unwrap()
        .with_attribution("https://example.com", "ContentForge Tests")
    }

    fn request() -> RewriteRequest {
        RewriteRequest::new("You polish text.", "Rewrite this.\n\nSome text.", MODEL)
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "gen-1",
            "model": MODEL,
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20}
        })
    }

    #[tokio::test]
    async fn successful_rewrite_sends_headers_and_trims_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-or-test"))
            .and(header("HTTP-Referer", "https://example.com"))
            .and(header("X-Title", "ContentForge Tests"))
            .and(body_partial_json(json!({
                "model": MODEL,
                "max_tokens": 2048,
                "messages": [
                    {"role": "system", "content": "You polish text."},
                    {"role": "user", "content": "Rewrite this.\n\nSome text."}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("  Polished.  \n")))
            .expect(1)
            .mount(&server)
            .await;

        let response = rewriter(&server).rewrite(request()).await.unwrap();
        assert_eq!(response.text, "Polished.");
        assert_eq!(response.model, MODEL);
        assert_eq!(response.usage.unwrap().total_tokens, 20);
    }

    #[tokio::test]
    async fn disallowed_model_is_rejected_before_dispatch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("x")))
            .expect(0)
            .mount(&server)
            .await;

        let mut req = request();
        req.model = "openai/gpt-5.1".into();
        let err = rewriter(&server).rewrite(req).await.unwrap_err();
        assert!(matches!(err, RewriteError::UnsupportedModel(m) if m == "openai/gpt-5.1"));
    }

    #[tokio::test]
    async fn missing_key_is_unavailable() {
        let server = MockServer::start().await;
        let rewriter =
            OpenRouterRewriter::new(server.uri(), Some("  ".into()), vec![MODEL.into()]).unwrap();
        assert!(!rewriter.has_api_key());

        let err = rewriter.rewrite(request()).await.unwrap_err();
        assert!(matches!(err, RewriteError::Unavailable(_)));
    }

    #[tokio::test]
    async fn rate_limit_reads_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "17"))
            .mount(&server)
            .await;

        let err = rewriter(&server).rewrite(request()).await.unwrap_err();
        assert!(matches!(err, RewriteError::RateLimited { retry_after_secs: 17 }));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_authentication_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = rewriter(&server).rewrite(request()).await.unwrap_err();
        assert!(matches!(err, RewriteError::AuthenticationFailed(_)));
    }

    #[tokio::test]
    async fn server_error_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let err = rewriter(&server).rewrite(request()).await.unwrap_err();
        match err {
            RewriteError::Upstream {
                status_code,
                message,
            } => {
                assert_eq!(status_code, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = rewriter(&server).rewrite(request()).await.unwrap_err();
        assert!(matches!(err, RewriteError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = rewriter(&server).rewrite(request()).await.unwrap_err();
        assert!(matches!(err, RewriteError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("late"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let err = rewriter(&server)
            .with_timeout(Duration::from_millis(50))
            .rewrite(request())
            .await
            .unwrap_err();
        assert!(matches!(err, RewriteError::Timeout(_)));
    }

    #[test]
    fn from_config_uses_rewriter_section() {
        let mut config = RewriterConfig::default();
        config.api_key = Some("sk-or-secret".into());
        config.timeout_secs = 15;
        let rewriter = OpenRouterRewriter::from_config(&config).unwrap();
        assert_eq!(rewriter.name(), "openrouter");
        assert_eq!(rewriter.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(rewriter.timeout, Duration::from_secs(15));
        assert!(rewriter.has_api_key());
        assert!(!format!("{rewriter:?}").contains("sk-or-secret"));
    }
}
