/// LLM Client — the single point of entry for all Claude API calls in Vitae.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// All LLM interactions MUST go through this module.
///
/// Calls are single-shot. A failed call is reported to the caller, which decides
/// what the failure means (a `failed` CV record, or an empty job analysis).
use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod prompts;

use prompts::JSON_ONLY_SYSTEM;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls in Vitae.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-sonnet-4-5";
/// Output ceiling large enough for a full CV.
pub const MAX_TOKENS: u32 = 4000;
/// Low randomness for analysis-type calls.
pub const ANALYSIS_TEMPERATURE: f32 = 0.3;

/// Assistant pre-fill that forces the reply to start inside a JSON object.
const JSON_PREFILL: &str = "{";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Per-call knobs. `temperature: None` leaves the API default in place.
#[derive(Debug, Clone, Copy)]
pub struct CallOptions {
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl CallOptions {
    /// Creative generation: full token budget, default temperature.
    pub fn generation() -> Self {
        Self {
            max_tokens: MAX_TOKENS,
            temperature: None,
        }
    }

    /// Analysis: full token budget, low temperature.
    pub fn analysis() -> Self {
        Self {
            max_tokens: MAX_TOKENS,
            temperature: Some(ANALYSIS_TEMPERATURE),
        }
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// The single LLM client used by all services in Vitae.
/// Wraps the Anthropic Messages API with a JSON-object output helper.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl LlmClient {
    /// `request_timeout` caps a single HTTP exchange with the API.
    pub fn new(api_key: String, request_timeout: Duration) -> Self {
        Self::with_endpoint(api_key, request_timeout, ANTHROPIC_API_URL)
    }

    /// Same client against another Messages endpoint (a proxy or a local stub).
    pub fn with_endpoint(
        api_key: String,
        request_timeout: Duration,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(request_timeout)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            endpoint: endpoint.into(),
        }
    }

    /// Makes one raw call to the Claude API. No retries.
    async fn call(
        &self,
        messages: Vec<AnthropicMessage<'_>>,
        system: &str,
        options: CallOptions,
    ) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            system,
            messages,
        };

        let response = self
            .client
            .post(self.endpoint.as_str())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let llm_response: LlmResponse = response.json().await?;

        debug!(
            "LLM call succeeded: input_tokens={}, output_tokens={}",
            llm_response.usage.input_tokens, llm_response.usage.output_tokens
        );

        Ok(llm_response)
    }

    /// Calls the LLM and deserializes the reply as a single JSON object.
    ///
    /// The Messages API has no JSON response mode, so the assistant turn is
    /// pre-filled with `{` and the model continues from inside the object.
    pub async fn call_json_object<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
        options: CallOptions,
    ) -> Result<T, LlmError> {
        let system = format!("{system}\n\n{JSON_ONLY_SYSTEM}");
        let messages = vec![
            AnthropicMessage {
                role: "user",
                content: prompt,
            },
            AnthropicMessage {
                role: "assistant",
                content: JSON_PREFILL,
            },
        ];
        let response = self.call(messages, &system, options).await?;

        let text = response.text().ok_or(LlmError::EmptyContent)?;
        let json = complete_prefilled_object(text).ok_or(LlmError::EmptyContent)?;

        serde_json::from_str(&json).map_err(LlmError::Parse)
    }
}

/// Re-attaches the `{` pre-fill to the model's continuation.
/// Returns `None` when the model produced nothing.
fn complete_prefilled_object(continuation: &str) -> Option<String> {
    let body = strip_json_fences(continuation);
    if body.is_empty() {
        return None;
    }
    if body.starts_with('{') {
        // The model repeated the opening brace despite the pre-fill.
        Some(body.to_string())
    } else {
        Some(format!("{JSON_PREFILL}{body}"))
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
