//! Optional AI reframing helper.
//!
//! The helper only ever proposes text. Whatever it returns is written into
//! an input field the user still controls; a failed call leaves that field
//! exactly as it was and produces an inline notice instead.

pub mod client;
pub mod prompts;
pub mod provider;

pub use client::HttpReframeClient;
pub use prompts::{DEFAULT_EMOTION_SUGGESTIONS, EMOTIONS, PromptType, full_prompt};
pub use provider::{IStatementSuggestion, ReframeRequest, ReframeResponse, ReframeService};

use std::sync::Arc;

use crate::config::AiConfig;
use crate::error::AiError;
use crate::session::IStatement;

/// Shown next to the field when a suggestion could not be fetched.
pub const UNAVAILABLE_NOTICE: &str = "Couldn't connect to AI. You can still write it yourself below.";

/// Build the configured service, or `None` when the helper is switched off.
pub fn create_service(config: &AiConfig) -> Result<Option<Arc<dyn ReframeService>>, AiError> {
    if !config.enabled {
        tracing::info!("AI helper disabled");
        return Ok(None);
    }
    let client = HttpReframeClient::new(config)?;
    tracing::info!("AI helper using {}", client.base_url());
    Ok(Some(Arc::new(client)))
}

/// Write a successful suggestion into `field`.
///
/// On failure `field` is untouched and the notice to display is returned.
pub fn apply_suggestion(
    field: &mut String,
    outcome: Result<String, AiError>,
) -> Result<(), &'static str> {
    match outcome {
        Ok(text) => {
            *field = text;
            Ok(())
        }
        Err(e) => {
            tracing::debug!("Keeping user text after AI failure: {e}");
            Err(UNAVAILABLE_NOTICE)
        }
    }
}

/// Fill an I-statement draft from a decomposition.
///
/// Blank parts of the suggestion keep what the user already had.
pub fn apply_i_statement(
    draft: &mut IStatement,
    outcome: Result<IStatementSuggestion, AiError>,
) -> Result<(), &'static str> {
    let suggestion = match outcome {
        Ok(s) => s,
        Err(e) => {
            tracing::debug!("Keeping user I-statement after AI failure: {e}");
            return Err(UNAVAILABLE_NOTICE);
        }
    };
    let emotion = suggestion.emotion.trim();
    if !emotion.is_empty() {
        draft.emotion = emotion.to_lowercase();
    }
    let situation = suggestion.situation.trim();
    if !situation.is_empty() {
        draft.situation = situation.to_string();
    }
    if let Some(refined) = suggestion.refined.filter(|r| !r.trim().is_empty()) {
        draft.refined = Some(refined);
    }
    Ok(())
}

/// Emotion suggestions, falling back to the default list on any failure.
pub async fn suggest_emotions_or_default(
    service: &dyn ReframeService,
    context: &str,
) -> Vec<String> {
    match service.suggest_emotions(context).await {
        Ok(emotions) if !emotions.is_empty() => emotions,
        Ok(_) => default_emotions(),
        Err(e) => {
            tracing::debug!("Using default emotions: {e}");
            default_emotions()
        }
    }
}

fn default_emotions() -> Vec<String> {
    DEFAULT_EMOTION_SUGGESTIONS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Offline;

    #[async_trait]
    impl ReframeService for Offline {
        async fn reframe(&self, _: &str, _: PromptType, _: &str) -> Result<String, AiError> {
            Err(AiError::Status { status: 500 })
        }

        async fn reframe_i_statement(&self, _: &str) -> Result<IStatementSuggestion, AiError> {
            Err(AiError::Status { status: 500 })
        }

        async fn suggest_emotions(&self, _: &str) -> Result<Vec<String>, AiError> {
            Err(AiError::Unavailable {
                reason: "offline".into(),
            })
        }

        async fn health(&self) -> bool {
            false
        }
    }

    #[test]
    fn success_replaces_field() {
        let mut field = "you always forget".to_string();
        apply_suggestion(&mut field, Ok("I feel forgotten".into())).unwrap();
        assert_eq!(field, "I feel forgotten");
    }

    #[test]
    fn failure_keeps_field_and_returns_notice() {
        let mut field = "you always forget".to_string();
        let notice = apply_suggestion(&mut field, Err(AiError::Status { status: 500 })).unwrap_err();
        assert_eq!(field, "you always forget");
        assert_eq!(notice, UNAVAILABLE_NOTICE);
    }

    #[test]
    fn i_statement_keeps_existing_parts_when_suggestion_blank() {
        let mut draft = IStatement::new("hurt", "plans change last minute");
        apply_i_statement(
            &mut draft,
            Ok(IStatementSuggestion {
                emotion: "Anxious".into(),
                situation: " ".into(),
                refined: None,
            }),
        )
        .unwrap();
        assert_eq!(draft.emotion, "anxious");
        assert_eq!(draft.situation, "plans change last minute");
        assert!(draft.refined.is_none());
    }

    #[test]
    fn i_statement_failure_is_untouched() {
        let mut draft = IStatement::new("hurt", "late");
        let before = draft.clone();
        assert!(apply_i_statement(&mut draft, Err(AiError::EmptyInput)).is_err());
        assert_eq!(draft, before);
    }

    #[tokio::test]
    async fn emotions_default_when_offline() {
        let emotions = suggest_emotions_or_default(&Offline, "they were late again").await;
        assert_eq!(emotions, DEFAULT_EMOTION_SUGGESTIONS);
        assert!(!Offline.health().await);
    }

    #[test]
    fn disabled_config_builds_nothing() {
        let config = AiConfig {
            enabled: false,
            ..AiConfig::default()
        };
        assert!(create_service(&config).unwrap().is_none());
    }
}
