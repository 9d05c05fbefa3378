//! OpenAI chat-completions client over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::llm::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider,
};

const PROVIDER: &str = "openai";

/// Chat-completions provider bound to one API key and model.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OpenAiProvider {
    /// Build a client that sends `api_key` as a bearer token on every request.
    ///
    /// Fails with `AuthFailed` if the key cannot be carried in an HTTP header.
    pub fn new(
        api_key: &SecretString,
        base_url: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|_| LlmError::AuthFailed {
                provider: PROVIDER.to_string(),
            })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to create OpenAI client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionBody {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), model = %self.model, "OpenAI request rejected");
            return Err(error_for_status(status, retry_after, &text, &self.model));
        }

        let text = response.text().await.map_err(transport_error)?;
        let completion = parse_completion(&text)?;
        debug!(
            model = %self.model,
            input_tokens = completion.input_tokens,
            output_tokens = completion.output_tokens,
            finish_reason = ?completion.finish_reason,
            "OpenAI completion received"
        );
        Ok(completion)
    }
}

// ── Wire format ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// Parse a successful chat-completions body.
///
/// A missing first choice or null content yields an empty `content`.
fn parse_completion(body: &str) -> Result<CompletionResponse, LlmError> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)?;
    let usage = parsed.usage.unwrap_or(Usage {
        prompt_tokens: 0,
        completion_tokens: 0,
    });
    let first = parsed.choices.into_iter().next();
    let finish_reason = FinishReason::from_api(
        first
            .as_ref()
            .and_then(|c| c.finish_reason.as_deref()),
    );
    let content = first
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .unwrap_or_default();

    Ok(CompletionResponse {
        content,
        input_tokens: usage.prompt_tokens,
        output_tokens: usage.completion_tokens,
        finish_reason,
        response_id: parsed.id,
    })
}

/// Map a non-2xx response to an `LlmError`.
fn error_for_status(
    status: StatusCode,
    retry_after: Option<Duration>,
    body: &str,
    model: &str,
) -> LlmError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body).ok().map(|e| e.error);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::AuthFailed {
            provider: PROVIDER.to_string(),
        },
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited {
            provider: PROVIDER.to_string(),
            retry_after,
        },
        StatusCode::NOT_FOUND
            if detail
                .as_ref()
                .and_then(|d| d.code.as_deref())
                .is_some_and(|c| c == "model_not_found") =>
        {
            LlmError::ModelNotAvailable {
                provider: PROVIDER.to_string(),
                model: model.to_string(),
            }
        }
        _ => {
            let reason = match detail {
                Some(d) if !d.message.is_empty() => format!("HTTP {}: {}", status.as_u16(), d.message),
                _ => format!("HTTP {}", status.as_u16()),
            };
            LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason,
            }
        }
    }
}

fn transport_error(e: reqwest::Error) -> LlmError {
    let reason = if e.is_timeout() {
        "request timed out".to_string()
    } else {
        e.to_string()
    };
    LlmError::RequestFailed {
        provider: PROVIDER.to_string(),
        reason,
    }
}
