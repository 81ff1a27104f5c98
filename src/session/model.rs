//! Session records and the patch types used to mutate them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::Phase;

/// Lifecycle status of a session. Moves once from `InProgress` to `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    InProgress,
    Completed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// How partner B answered partner A's request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AcknowledgmentType {
    Accept,
    Discuss,
    Counter,
    /// No choice made yet. Persisted as an empty string.
    #[default]
    #[serde(rename = "")]
    Unset,
}

impl AcknowledgmentType {
    pub fn is_set(&self) -> bool {
        !matches!(self, Self::Unset)
    }

    /// Short description shown next to each choice.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Accept => "Yes, I can do that",
            Self::Discuss => "I'd like to discuss this more",
            Self::Counter => "I have a different idea",
            Self::Unset => "",
        }
    }
}

impl std::fmt::Display for AcknowledgmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accept => write!(f, "accept"),
            Self::Discuss => write!(f, "discuss"),
            Self::Counter => write!(f, "counter"),
            Self::Unset => write!(f, "unset"),
        }
    }
}

/// A feeling paired with the situation that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct IStatement {
    pub emotion: String,
    pub situation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refined: Option<String>,
}

impl IStatement {
    pub fn new(emotion: impl Into<String>, situation: impl Into<String>) -> Self {
        Self {
            emotion: emotion.into(),
            situation: situation.into(),
            refined: None,
        }
    }

    pub fn with_refined(mut self, refined: impl Into<String>) -> Self {
        self.refined = Some(refined.into());
        self
    }

    /// Both the emotion and the situation are filled in.
    pub fn is_complete(&self) -> bool {
        !self.emotion.trim().is_empty() && !self.situation.trim().is_empty()
    }

    /// Render as "I feel {emotion} when {situation}".
    ///
    /// Empty when the statement is incomplete.
    pub fn sentence(&self) -> String {
        if !self.is_complete() {
            return String::new();
        }
        format!(
            "I feel {} when {}",
            self.emotion.trim(),
            self.situation.trim().to_lowercase()
        )
    }
}

/// Everything partner A writes while sharing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PartnerAData {
    pub readiness_check: bool,
    pub intent_acknowledgment: String,
    pub i_statement: IStatement,
    pub problem_description: String,
    pub request: String,
}

/// Partner B's responses to what partner A shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PartnerBResponses {
    pub reflection: String,
    pub acknowledgment: String,
    pub acknowledgment_type: AcknowledgmentType,
}

/// Partner B's own turn at sharing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PartnerBData {
    pub i_statement: IStatement,
    /// `None` when partner B chose not to make a request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
}

pub const DEFAULT_PARTNER_A: &str = "Partner A";
pub const DEFAULT_PARTNER_B: &str = "Partner B";

fn display_name(name: String, fallback: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// One guided conversation between two partners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub partner_a: String,
    pub partner_b: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub status: SessionStatus,
    pub current_phase: Phase,
    pub current_step: u8,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub partner_a_data: PartnerAData,
    pub partner_b_responses: PartnerBResponses,
    pub partner_b_data: PartnerBData,
}

impl Session {
    /// A fresh session at the start of partner A's turn.
    ///
    /// Blank names fall back to "Partner A" / "Partner B".
    pub fn new(
        partner_a: impl Into<String>,
        partner_b: impl Into<String>,
        topic: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            partner_a: display_name(partner_a.into(), DEFAULT_PARTNER_A),
            partner_b: display_name(partner_b.into(), DEFAULT_PARTNER_B),
            topic: topic
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            status: SessionStatus::InProgress,
            current_phase: Phase::PartnerA,
            current_step: Phase::PartnerA.first_step(),
            created_at: Utc::now(),
            completed_at: None,
            partner_a_data: PartnerAData::default(),
            partner_b_responses: PartnerBResponses::default(),
            partner_b_data: PartnerBData::default(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }
}

/// Shallow top-level update. Nested objects replace the stored ones wholesale.
///
/// Identity fields (`id`, partner names, `topic`, `created_at`) never change
/// after creation and have no patch field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionPatch {
    pub status: Option<SessionStatus>,
    pub current_phase: Option<Phase>,
    pub current_step: Option<u8>,
    pub completed_at: Option<DateTime<Utc>>,
    pub partner_a_data: Option<PartnerAData>,
    pub partner_b_responses: Option<PartnerBResponses>,
    pub partner_b_data: Option<PartnerBData>,
}

impl SessionPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether the patch sets status, phase, step or completion time.
    pub fn touches_progress(&self) -> bool {
        self.status.is_some()
            || self.current_phase.is_some()
            || self.current_step.is_some()
            || self.completed_at.is_some()
    }

    pub fn apply_to(self, session: &mut Session) {
        if let Some(status) = self.status {
            session.status = status;
        }
        if let Some(phase) = self.current_phase {
            session.current_phase = phase;
        }
        if let Some(step) = self.current_step {
            session.current_step = step;
        }
        if let Some(at) = self.completed_at {
            session.completed_at = Some(at);
        }
        if let Some(data) = self.partner_a_data {
            session.partner_a_data = data;
        }
        if let Some(responses) = self.partner_b_responses {
            session.partner_b_responses = responses;
        }
        if let Some(data) = self.partner_b_data {
            session.partner_b_data = data;
        }
    }
}

/// Field-level update within [`PartnerAData`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartnerADataPatch {
    pub readiness_check: Option<bool>,
    pub intent_acknowledgment: Option<String>,
    pub i_statement: Option<IStatement>,
    pub problem_description: Option<String>,
    pub request: Option<String>,
}

impl PartnerADataPatch {
    pub fn apply_to(self, data: &mut PartnerAData) {
        if let Some(ready) = self.readiness_check {
            data.readiness_check = ready;
        }
        if let Some(ack) = self.intent_acknowledgment {
            data.intent_acknowledgment = ack;
        }
        if let Some(statement) = self.i_statement {
            data.i_statement = statement;
        }
        if let Some(problem) = self.problem_description {
            data.problem_description = problem;
        }
        if let Some(request) = self.request {
            data.request = request;
        }
    }
}

/// Field-level update within [`PartnerBResponses`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartnerBResponsesPatch {
    pub reflection: Option<String>,
    pub acknowledgment: Option<String>,
    pub acknowledgment_type: Option<AcknowledgmentType>,
}

impl PartnerBResponsesPatch {
    pub fn apply_to(self, responses: &mut PartnerBResponses) {
        if let Some(reflection) = self.reflection {
            responses.reflection = reflection;
        }
        if let Some(ack) = self.acknowledgment {
            responses.acknowledgment = ack;
        }
        if let Some(kind) = self.acknowledgment_type {
            responses.acknowledgment_type = kind;
        }
    }
}

/// Field-level update within [`PartnerBData`].
///
/// `request: Some(None)` records that partner B skipped the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartnerBDataPatch {
    pub i_statement: Option<IStatement>,
    pub request: Option<Option<String>>,
}

impl PartnerBDataPatch {
    pub fn apply_to(self, data: &mut PartnerBData) {
        if let Some(statement) = self.i_statement {
            data.i_statement = statement;
        }
        if let Some(request) = self.request {
            data.request = request;
        }
    }
}
