//! Step submissions: what each wizard screen writes and when it may
//! move on.
//!
//! A screen builds a [`StepSubmission`] from its inputs. [`submit`] checks
//! that the submission belongs to the session's current screen, checks the
//! screen's "can continue" predicate, writes the fields, and advances.

use crate::error::{SessionError, StorageError};
use crate::session::{
    AcknowledgmentType, IStatement, Location, PartnerADataPatch, PartnerBDataPatch,
    PartnerBResponsesPatch, Session,
};
use crate::session::try_route_for;
use crate::store::SessionStore;

use super::accessor::{Advanced, SessionAccessor};

/// Inputs for one wizard screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepSubmission {
    /// Both readiness boxes must be ticked.
    Readiness { calm: bool, relaxed: bool },
    /// Guidelines screen; nothing to record.
    Approach,
    /// Acknowledge the other partner's good intentions, in words or by ticking.
    Intent {
        acknowledgment: String,
        confirmed: bool,
    },
    IStatement(IStatement),
    Problem(String),
    Request(String),
    /// Hand the device to partner B.
    Transition,
    Reflect(String),
    Acknowledge {
        kind: AcknowledgmentType,
        text: String,
    },
    BStatement(IStatement),
    /// `None` means partner B explicitly skipped the request.
    BRequest(Option<String>),
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn trimmed_statement(statement: &IStatement) -> IStatement {
    IStatement {
        emotion: statement.emotion.trim().to_string(),
        situation: statement.situation.trim().to_string(),
        refined: statement
            .refined
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string),
    }
}

impl StepSubmission {
    /// Screen this submission belongs to.
    pub fn location(&self) -> Location {
        match self {
            Self::Readiness { .. } => Location::Readiness,
            Self::Approach => Location::Approach,
            Self::Intent { .. } => Location::Intent,
            Self::IStatement(_) => Location::IStatement,
            Self::Problem(_) => Location::Problem,
            Self::Request(_) => Location::Request,
            Self::Transition => Location::Transition,
            Self::Reflect(_) => Location::Reflect,
            Self::Acknowledge { .. } => Location::Acknowledge,
            Self::BStatement(_) => Location::BStatement,
            Self::BRequest(_) => Location::BRequest,
        }
    }

    /// Why the screen cannot continue yet, if it cannot.
    pub fn blocked_reason(&self) -> Option<&'static str> {
        match self {
            Self::Readiness { calm, relaxed } => {
                (!(*calm && *relaxed)).then_some("both readiness checks must be confirmed")
            }
            Self::Approach | Self::Transition => None,
            Self::Intent {
                acknowledgment,
                confirmed,
            } => (!*confirmed && is_blank(acknowledgment))
                .then_some("write an acknowledgment or confirm their good intentions"),
            Self::IStatement(statement) | Self::BStatement(statement) => {
                if is_blank(&statement.emotion) {
                    Some("choose an emotion")
                } else if is_blank(&statement.situation) {
                    Some("describe the situation")
                } else {
                    None
                }
            }
            Self::Problem(text) => is_blank(text).then_some("describe the problem"),
            Self::Request(text) => is_blank(text).then_some("write your request"),
            Self::Reflect(text) => is_blank(text).then_some("reflect back what you heard"),
            Self::Acknowledge { kind, text } => {
                if !kind.is_set() {
                    Some("choose how you respond to the request")
                } else if is_blank(text) {
                    Some("write your response")
                } else {
                    None
                }
            }
            Self::BRequest(Some(text)) => {
                is_blank(text).then_some("write your request or skip it")
            }
            Self::BRequest(None) => None,
        }
    }

    /// Whether the screen's progression control is enabled.
    pub fn can_continue(&self) -> bool {
        self.blocked_reason().is_none()
    }

    /// Write this submission's fields through the accessor.
    fn write(self, accessor: &mut SessionAccessor<'_>) -> Result<(), SessionError> {
        match self {
            Self::Approach | Self::Transition => {}
            Self::Readiness { .. } => {
                accessor.update_partner_a(PartnerADataPatch {
                    readiness_check: Some(true),
                    ..Default::default()
                })?;
            }
            Self::Intent { acknowledgment, .. } => {
                accessor.update_partner_a(PartnerADataPatch {
                    intent_acknowledgment: Some(acknowledgment.trim().to_string()),
                    ..Default::default()
                })?;
            }
            Self::IStatement(statement) => {
                accessor.update_partner_a(PartnerADataPatch {
                    i_statement: Some(trimmed_statement(&statement)),
                    ..Default::default()
                })?;
            }
            Self::Problem(text) => {
                accessor.update_partner_a(PartnerADataPatch {
                    problem_description: Some(text.trim().to_string()),
                    ..Default::default()
                })?;
            }
            Self::Request(text) => {
                accessor.update_partner_a(PartnerADataPatch {
                    request: Some(text.trim().to_string()),
                    ..Default::default()
                })?;
            }
            Self::Reflect(text) => {
                accessor.update_b_responses(PartnerBResponsesPatch {
                    reflection: Some(text.trim().to_string()),
                    ..Default::default()
                })?;
            }
            Self::Acknowledge { kind, text } => {
                accessor.update_b_responses(PartnerBResponsesPatch {
                    acknowledgment: Some(text.trim().to_string()),
                    acknowledgment_type: Some(kind),
                    ..Default::default()
                })?;
            }
            Self::BStatement(statement) => {
                accessor.update_partner_b(PartnerBDataPatch {
                    i_statement: Some(trimmed_statement(&statement)),
                    ..Default::default()
                })?;
            }
            Self::BRequest(request) => {
                accessor.update_partner_b(PartnerBDataPatch {
                    request: Some(request.map(|r| r.trim().to_string())),
                    ..Default::default()
                })?;
            }
        }
        Ok(())
    }
}

/// Record a screen's inputs and advance to the next screen.
pub fn submit(
    accessor: &mut SessionAccessor<'_>,
    submission: StepSubmission,
) -> Result<Advanced, SessionError> {
    let session = accessor.refresh().cloned().ok_or_else(|| SessionError::NotFound {
        id: accessor.session_id().to_string(),
    })?;
    if session.is_completed() {
        return Err(SessionError::ReadOnly { id: session.id });
    }

    // A corrupted position must fail before anything is written.
    let expected = try_route_for(session.current_phase, session.current_step)?;
    let actual = submission.location();
    if expected != actual {
        return Err(SessionError::StepMismatch { expected, actual });
    }
    if let Some(reason) = submission.blocked_reason() {
        return Err(SessionError::InvalidInput {
            step: actual,
            reason: reason.to_string(),
        });
    }

    submission.write(accessor)?;
    accessor.advance()
}

/// Start a new conversation. Returns the session and its first screen.
pub fn start(
    store: &SessionStore,
    partner_a: &str,
    partner_b: &str,
    topic: Option<&str>,
) -> Result<(Session, Location), StorageError> {
    let session = store.create(partner_a, partner_b, topic)?;
    let first = crate::session::route_for_session(&session);
    Ok((session, first))
}
