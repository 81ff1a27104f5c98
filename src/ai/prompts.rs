//! Prompt templates for the reframing helper on each wizard screen.

use serde::{Deserialize, Serialize};

use crate::session::Location;

/// Which kind of help the user asked for. Sent as `prompt_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptType {
    Reschedule,
    CalmTone,
    GoodIntentions,
    IStatement,
    Problem,
    Request,
    Reflect,
    Acknowledge,
}

impl PromptType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reschedule => "reschedule",
            Self::CalmTone => "calm_tone",
            Self::GoodIntentions => "good_intentions",
            Self::IStatement => "i_statement",
            Self::Problem => "problem",
            Self::Request => "request",
            Self::Reflect => "reflect",
            Self::Acknowledge => "acknowledge",
        }
    }

    /// Instruction sent to the model for this tag.
    pub fn template(&self) -> &'static str {
        match self {
            Self::Reschedule => {
                "Help me gently express that I need to postpone this conversation"
            }
            Self::CalmTone => "Help me set a calm, collaborative tone for this conversation",
            Self::GoodIntentions => {
                "Help me acknowledge that my partner had good intentions and didn't mean to cause hurt"
            }
            Self::IStatement => {
                "Transform this into a constructive 'I feel [emotion] when [situation]' statement"
            }
            Self::Problem => {
                "Help me describe this problem factually without blame or accusation"
            }
            Self::Request => "Help me phrase this as a gentle, respectful request",
            Self::Reflect => "Help me reflect back what my partner shared in a validating way",
            Self::Acknowledge => "Help me respond to this request in a constructive way",
        }
    }

    /// Label of the button that opens the helper.
    pub fn button_text(&self) -> &'static str {
        match self {
            Self::Reschedule => "Help me express that I need more time",
            Self::CalmTone => "Help me set a calm tone",
            Self::GoodIntentions => "Help me acknowledge their intentions",
            Self::IStatement => "Help me phrase this constructively",
            Self::Problem => "Help me describe without blame",
            Self::Request => "Help me ask gently",
            Self::Reflect => "Help me respond thoughtfully",
            Self::Acknowledge => "Help me phrase my response",
        }
    }

    /// The helper offered on a screen, if any.
    pub fn for_location(location: Location) -> Option<PromptType> {
        match location {
            Location::Readiness => Some(Self::Reschedule),
            Location::Approach => Some(Self::CalmTone),
            Location::Intent => Some(Self::GoodIntentions),
            Location::IStatement | Location::BStatement => Some(Self::IStatement),
            Location::Problem => Some(Self::Problem),
            Location::Request | Location::BRequest => Some(Self::Request),
            Location::Reflect => Some(Self::Reflect),
            Location::Acknowledge => Some(Self::Acknowledge),
            _ => None,
        }
    }
}

impl std::fmt::Display for PromptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assemble the full instruction: template, then the partner's name, then
/// any extra context.
pub fn full_prompt(
    prompt_type: PromptType,
    partner_name: Option<&str>,
    context: Option<&str>,
) -> String {
    let mut prompt = prompt_type.template().to_string();
    if let Some(name) = partner_name.map(str::trim).filter(|n| !n.is_empty()) {
        prompt.push_str(&format!(" (partner's name: {name})"));
    }
    if let Some(context) = context.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str(&format!(" Context: {context}"));
    }
    prompt
}

/// Emotion words offered on the I-statement screens.
pub const EMOTIONS: [&str; 12] = [
    "hurt",
    "frustrated",
    "worried",
    "lonely",
    "overwhelmed",
    "disappointed",
    "anxious",
    "sad",
    "scared",
    "confused",
    "unheard",
    "stressed",
];

/// Suggestions used when the service has nothing better.
pub const DEFAULT_EMOTION_SUGGESTIONS: [&str; 5] =
    ["hurt", "frustrated", "worried", "lonely", "overwhelmed"];
