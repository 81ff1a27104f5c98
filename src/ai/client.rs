//! HTTP client for the reframing service.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::ai::prompts::{DEFAULT_EMOTION_SUGGESTIONS, PromptType};
use crate::ai::provider::{
    EmotionsResponse, IStatementSuggestion, ReframeRequest, ReframeResponse, ReframeService,
};
use crate::config::AiConfig;
use crate::error::AiError;

/// Most emotion words returned to a caller.
const MAX_EMOTIONS: usize = 5;

/// Talks JSON to the reframing backend.
pub struct HttpReframeClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpReframeClient {
    pub fn new(config: &AiConfig) -> Result<Self, AiError> {
        if !config.enabled {
            return Err(AiError::Disabled);
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AiError::Unavailable {
                reason: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, AiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(path, status = status.as_u16(), "Reframe service returned an error");
            return Err(AiError::Status {
                status: status.as_u16(),
            });
        }

        resp.json::<R>().await.map_err(|e| {
            if e.is_timeout() {
                AiError::Timeout {
                    timeout: self.timeout,
                }
            } else {
                AiError::InvalidResponse {
                    reason: e.to_string(),
                }
            }
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> AiError {
        if e.is_timeout() {
            tracing::warn!(timeout = ?self.timeout, "Reframe service timed out");
            AiError::Timeout {
                timeout: self.timeout,
            }
        } else {
            tracing::warn!("Reframe service unreachable: {e}");
            AiError::Unavailable {
                reason: e.to_string(),
            }
        }
    }
}

fn require_text(input: &str) -> Result<&str, AiError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Err(AiError::EmptyInput)
    } else {
        Ok(trimmed)
    }
}

#[async_trait]
impl ReframeService for HttpReframeClient {
    async fn reframe(
        &self,
        statement: &str,
        prompt_type: PromptType,
        full_prompt: &str,
    ) -> Result<String, AiError> {
        require_text(statement)?;
        let body = ReframeRequest {
            statement: statement.to_string(),
            prompt_type,
            full_prompt: full_prompt.to_string(),
        };
        tracing::debug!(%prompt_type, "Requesting reframe");
        let resp: ReframeResponse = self.post("/ai/reframe", &body).await?;
        Ok(resp.text_or(statement))
    }

    async fn reframe_i_statement(
        &self,
        statement: &str,
    ) -> Result<IStatementSuggestion, AiError> {
        let statement = require_text(statement)?;
        let body = serde_json::json!({ "statement": statement });
        let suggestion: IStatementSuggestion = self.post("/ai/reframe", &body).await?;
        if suggestion.emotion.trim().is_empty() && suggestion.situation.trim().is_empty() {
            return Err(AiError::InvalidResponse {
                reason: "response had neither emotion nor situation".to_string(),
            });
        }
        Ok(suggestion)
    }

    async fn suggest_emotions(&self, context: &str) -> Result<Vec<String>, AiError> {
        if context.trim().is_empty() {
            return Ok(DEFAULT_EMOTION_SUGGESTIONS
                .iter()
                .map(|s| s.to_string())
                .collect());
        }
        let body = serde_json::json!({ "context": context.trim() });
        let resp: EmotionsResponse = self.post("/ai/suggest-emotions", &body).await?;
        Ok(resp
            .emotions
            .into_iter()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .take(MAX_EMOTIONS)
            .collect())
    }

    async fn health(&self) -> bool {
        match self.client.get(self.url("/health")).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!("Reframe health check failed: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpReframeClient {
        HttpReframeClient::new(&AiConfig {
            // Nothing listens on port 9; every request fails fast.
            base_url: "http://127.0.0.1:9/".to_string(),
            timeout: Duration::from_millis(500),
            enabled: true,
        })
        .unwrap()
    }

    #[test]
    fn disabled_config_is_refused() {
        let config = AiConfig {
            enabled: false,
            ..AiConfig::default()
        };
        assert!(matches!(
            HttpReframeClient::new(&config),
            Err(AiError::Disabled)
        ));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        assert_eq!(client().base_url(), "http://127.0.0.1:9");
        assert_eq!(client().url("/health"), "http://127.0.0.1:9/health");
    }

    #[tokio::test]
    async fn blank_input_rejected_locally() {
        let err = client()
            .reframe("   ", PromptType::Problem, "p")
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::EmptyInput));

        let err = client().reframe_i_statement("").await.unwrap_err();
        assert!(matches!(err, AiError::EmptyInput));
    }

    #[tokio::test]
    async fn empty_context_gets_default_emotions() {
        let emotions = client().suggest_emotions(" ").await.unwrap();
        assert_eq!(emotions, DEFAULT_EMOTION_SUGGESTIONS);
    }

    #[tokio::test]
    async fn unreachable_service_is_an_error() {
        let c = client();
        assert!(!c.health().await);
        let err = c
            .reframe("you never listen", PromptType::IStatement, "p")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AiError::Unavailable { .. } | AiError::Timeout { .. }
        ));
    }
}
