//! Chat-completions client
//!
//! Blocking HTTP client for an OpenAI-compatible endpoint. Only compiled with
//! the `llm` feature; without it every call returns an error explaining how
//! to enable it.

use tracing::{error, info, warn};

use super::prompts::{build_messages, ChatMessage, JSON_ONLY_REMINDER};
use super::response::{normalize_response, parse_json_safe, Text2FxResponse};
use super::Text2FxRequest;
use crate::config::LlmSettings;
use crate::error::{Result, Text2FxError};

/// Client for the chat-completions endpoint
#[derive(Debug, Clone)]
pub struct ChatClient {
    settings: LlmSettings,
}

impl ChatClient {
    /// Create a client after checking the API key
    ///
    /// # Errors
    /// * `LlmAuth` - the key is missing or does not start with `sk-`
    pub fn new(settings: LlmSettings) -> Result<Self> {
        match settings.api_key.as_deref() {
            Some(key) if key.starts_with("sk-") => Ok(Self { settings }),
            _ => Err(Text2FxError::LlmAuth),
        }
    }

    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    /// Translate a validated request into normalized parameters
    ///
    /// Retries once with a JSON-only reminder when the first reply does not
    /// parse.
    pub fn translate(&self, request: &Text2FxRequest) -> Result<Text2FxResponse> {
        request.validate()?;
        let mut messages = build_messages(
            request.fx_type.as_str(),
            &request.instruction,
            &request.instrument,
        );

        let first = self.complete(&messages)?;
        let raw = match parse_json_safe(&first) {
            Some(raw) => raw,
            None => {
                warn!(len = first.len(), "model reply was not JSON, retrying");
                if let Some(last) = messages.last_mut() {
                    last.content.push_str(JSON_ONLY_REMINDER);
                }
                let second = self.complete(&messages)?;
                parse_json_safe(&second).ok_or_else(|| {
                    error!(len = second.len(), "model reply was not JSON twice");
                    Text2FxError::LlmInvalidJson
                })?
            }
        };

        info!("translated instruction");
        Ok(normalize_response(&raw))
    }

    /// Send one chat request and return the assistant's content
    #[cfg(feature = "llm")]
    pub fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        use reqwest::StatusCode;
        use serde_json::{json, Value};

        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(self.settings.timeout_s))
            .build()
            .map_err(|e| Text2FxError::LlmApi {
                message: e.to_string(),
            })?;

        let body = json!({
            "model": self.settings.model,
            "messages": messages,
            "temperature": self.settings.temperature,
            "max_tokens": self.settings.max_tokens,
            "response_format": { "type": "json_object" },
        });

        let url = self.settings.chat_url();
        info!(model = %self.settings.model, %url, messages = messages.len(), "chat request");

        let response = client
            .post(&url)
            .bearer_auth(self.settings.api_key.as_deref().unwrap_or_default())
            .json(&body)
            .send()
            .map_err(|e| Text2FxError::LlmApi {
                message: if e.is_timeout() {
                    format!("request timed out after {}s", self.settings.timeout_s)
                } else {
                    e.to_string()
                },
            })?;

        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(Text2FxError::LlmAuth),
            StatusCode::TOO_MANY_REQUESTS => return Err(Text2FxError::LlmRateLimited),
            status if !status.is_success() => {
                let text = response.text().unwrap_or_default();
                let message = parse_json_safe(&text)
                    .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                    .unwrap_or_else(|| format!("{} - {}", status, text));
                error!(%status, "chat request failed");
                return Err(Text2FxError::LlmApi { message });
            }
            _ => {}
        }

        let data: Value = response.json().map_err(|e| Text2FxError::LlmApi {
            message: format!("invalid response body: {}", e),
        })?;
        info!(usage = %data["usage"], "chat response");

        data["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Text2FxError::LlmApi {
                message: "response has no message content".to_string(),
            })
    }

    #[cfg(not(feature = "llm"))]
    pub fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        Err(Text2FxError::LlmApi {
            message: "chat support not compiled. Build with --features llm".to_string(),
        })
    }
}
