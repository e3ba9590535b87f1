//! Chat-completion endpoint abstraction and implementations.
//!
//! Defines the [`CompletionModel`] trait and the [`OpenAiModel`]
//! implementation, which calls an OpenAI-compatible chat-completions API
//! with a bounded timeout and exponential-backoff retry.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors and timeouts → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use async_trait::async_trait;
use std::time::Duration;

use crate::config::CompletionConfig;
use crate::error::CompletionError;

/// Base system prompt; the rendered document context is appended when
/// retrieval produced output.
const SYSTEM_PROMPT: &str = "You are an assistant that answers questions about the \
documents in the team's repository. Ground your answers in the provided context when \
it is present, and say when the context does not cover the question.";

#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Model identifier sent to the endpoint (e.g. `"gpt-4o-mini"`).
    fn model_name(&self) -> &str;

    /// One prompt → one generated reply.
    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, CompletionError>;
}

/// System prompt plus the rendered `<context>` block, when there is one.
pub fn assemble_system_prompt(config: &CompletionConfig, context: &str) -> String {
    let base = config.system_prompt.as_deref().unwrap_or(SYSTEM_PROMPT);
    if context.is_empty() {
        base.to_string()
    } else {
        format!("{base}\n\n{context}")
    }
}

// ============ OpenAI-compatible Model ============

/// Chat-completion client for an OpenAI-compatible endpoint.
///
/// Calls `POST {base_url}/chat/completions` with the configured model. The
/// API credential is read from the environment variable named in
/// `completion.api_key_env`.
#[derive(Debug)]
pub struct OpenAiModel {
    config: CompletionConfig,
    client: reqwest::Client,
}

impl OpenAiModel {
    /// # Errors
    ///
    /// Fails when the API key environment variable is unset or the HTTP
    /// client cannot be constructed.
    pub fn new(config: &CompletionConfig) -> Result<Self, CompletionError> {
        if std::env::var(&config.api_key_env).is_err() {
            return Err(CompletionError::MissingApiKey(config.api_key_env.clone()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            config: config.clone(),
            client,
        })
    }
}

#[async_trait]
impl CompletionModel for OpenAiModel {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, CompletionError> {
        let api_key = std::env::var(&self.config.api_key_env)
            .map_err(|_| CompletionError::MissingApiKey(self.config.api_key_env.clone()))?;

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_message },
            ],
        });

        let mut last_err: Option<CompletionError> = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_completion_response(&json);
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err = Some(CompletionError::Api {
                            status: status.as_u16(),
                            body: body_text,
                        });
                        continue;
                    }

                    // Client error (not 429) — don't retry
                    return Err(CompletionError::Api {
                        status: status.as_u16(),
                        body: body_text,
                    });
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(CompletionError::RetriesExhausted {
            attempts: self.config.max_retries + 1,
            last: last_err.map(|e| e.to_string()).unwrap_or_default(),
        })
    }
}

/// Pull the first choice's message content out of a chat-completions
/// response body.
fn parse_completion_response(json: &serde_json::Value) -> Result<String, CompletionError> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(str::to_string)
        .ok_or(CompletionError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CompletionConfig {
        CompletionConfig {
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "DOCDESK_TEST_NO_SUCH_KEY".to_string(),
            timeout_secs: 30,
            max_retries: 5,
            system_prompt: None,
        }
    }

    #[test]
    fn parse_valid_response() {
        let json = serde_json::json!({
            "choices": [ { "message": { "role": "assistant", "content": "hello" } } ]
        });
        assert_eq!(parse_completion_response(&json).unwrap(), "hello");
    }

    #[test]
    fn parse_missing_choices_is_error() {
        let json = serde_json::json!({ "choices": [] });
        assert!(matches!(
            parse_completion_response(&json),
            Err(CompletionError::EmptyResponse)
        ));
    }

    #[test]
    fn system_prompt_without_context_is_bare() {
        let prompt = assemble_system_prompt(&config(), "");
        assert!(!prompt.contains("<context>"));
    }

    #[test]
    fn system_prompt_appends_context_block() {
        let prompt = assemble_system_prompt(&config(), "<context>facts</context>");
        assert!(prompt.ends_with("\n\n<context>facts</context>"));
    }

    #[test]
    fn config_override_replaces_base_prompt() {
        let mut cfg = config();
        cfg.system_prompt = Some("Answer tersely.".to_string());
        let prompt = assemble_system_prompt(&cfg, "<context>x</context>");
        assert_eq!(prompt, "Answer tersely.\n\n<context>x</context>");
    }

    #[test]
    fn missing_api_key_fails_construction() {
        let err = OpenAiModel::new(&config()).unwrap_err();
        assert!(matches!(err, CompletionError::MissingApiKey(_)));
    }
}
