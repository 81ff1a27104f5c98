//! Reframing service trait and wire types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ai::prompts::PromptType;
use crate::error::AiError;

/// Body of `POST /ai/reframe`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReframeRequest {
    pub statement: String,
    pub prompt_type: PromptType,
    pub full_prompt: String,
}

/// Reply of `POST /ai/reframe`. Either field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReframeResponse {
    #[serde(default)]
    pub refined: Option<String>,
    #[serde(default)]
    pub suggestion: Option<String>,
}

impl ReframeResponse {
    /// `refined`, then `suggestion`, then the text the user sent.
    pub fn text_or(self, original: &str) -> String {
        self.refined
            .filter(|s| !s.trim().is_empty())
            .or(self.suggestion.filter(|s| !s.trim().is_empty()))
            .unwrap_or_else(|| original.to_string())
    }
}

/// A draft split into the two I-statement fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IStatementSuggestion {
    #[serde(default)]
    pub emotion: String,
    #[serde(default)]
    pub situation: String,
    #[serde(default)]
    pub refined: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EmotionsResponse {
    #[serde(default)]
    pub emotions: Vec<String>,
}

/// Optional helper that rewrites a draft into gentler wording.
///
/// Failures never touch session state; callers keep what the user wrote.
#[async_trait]
pub trait ReframeService: Send + Sync {
    /// Rewrite `statement` using the instruction for `prompt_type`.
    async fn reframe(
        &self,
        statement: &str,
        prompt_type: PromptType,
        full_prompt: &str,
    ) -> Result<String, AiError>;

    /// Split a free-form draft into emotion and situation.
    async fn reframe_i_statement(&self, statement: &str)
    -> Result<IStatementSuggestion, AiError>;

    /// Up to five emotion words that fit `context`.
    async fn suggest_emotions(&self, context: &str) -> Result<Vec<String>, AiError>;

    /// Whether the service answers at all.
    async fn health(&self) -> bool;
}
