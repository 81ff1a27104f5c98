//! One-time upgrade of the legacy single-phase session shape.
//!
//! Older records tracked a 5-step flow per partner with a `currentPartner`
//! letter instead of a phase. They are read through [`StoredSession`] and
//! converted immediately; nothing downstream ever sees the legacy shape.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::model::{
    IStatement, PartnerAData, PartnerBData, PartnerBResponses, Session, SessionStatus,
};
use super::state::Phase;

/// Partner letter in the legacy shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LegacyPartner {
    A,
    B,
}

/// Per-partner data in the legacy shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegacyPartnerData {
    pub readiness_check: bool,
    pub i_statement: IStatement,
    pub problem_description: String,
    pub request: String,
}

/// A session record in the legacy 5-step shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySession {
    pub id: String,
    pub partner_a: String,
    pub partner_b: String,
    #[serde(default)]
    pub topic: Option<String>,
    pub status: SessionStatus,
    pub current_step: u8,
    pub current_partner: LegacyPartner,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub partner_a_data: LegacyPartnerData,
    #[serde(default)]
    pub partner_b_data: LegacyPartnerData,
}

/// Either shape, as found in storage.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoredSession {
    Current(Session),
    Legacy(LegacySession),
}

impl StoredSession {
    /// Whether this record needed upgrading.
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy(_))
    }

    pub fn into_session(self) -> Session {
        match self {
            Self::Current(session) => session,
            Self::Legacy(legacy) => legacy.into(),
        }
    }
}

/// Map a legacy `(partner, step)` onto the phase-based model.
///
/// Legacy A steps were readiness, approach, i-statement, problem, request,
/// which are partner_a steps 1, 2, 4, 5, 6. Legacy B steps collapse onto
/// partner B's two sharing screens.
fn legacy_position(partner: LegacyPartner, step: u8, completed: bool) -> (Phase, u8) {
    if completed {
        return (Phase::Complete, 0);
    }
    match partner {
        LegacyPartner::A => match step {
            0 | 1 => (Phase::PartnerA, 1),
            2 => (Phase::PartnerA, 2),
            3 => (Phase::PartnerA, 4),
            4 => (Phase::PartnerA, 5),
            _ => (Phase::PartnerA, 6),
        },
        LegacyPartner::B => match step {
            0..=3 => (Phase::PartnerBShare, 1),
            _ => (Phase::PartnerBShare, 2),
        },
    }
}

impl From<LegacySession> for Session {
    fn from(legacy: LegacySession) -> Self {
        let completed = legacy.status == SessionStatus::Completed;
        let (phase, step) = legacy_position(legacy.current_partner, legacy.current_step, completed);
        let completed_at = match (completed, legacy.completed_at) {
            (true, None) => Some(legacy.created_at),
            (_, at) => at,
        };
        let b_request = legacy.partner_b_data.request.trim().to_string();

        tracing::warn!(
            session_id = %legacy.id,
            %phase,
            step,
            "Upgrading legacy session record"
        );

        Session {
            id: legacy.id,
            partner_a: legacy.partner_a,
            partner_b: legacy.partner_b,
            topic: legacy.topic,
            status: legacy.status,
            current_phase: phase,
            current_step: step,
            created_at: legacy.created_at,
            completed_at,
            partner_a_data: PartnerAData {
                readiness_check: legacy.partner_a_data.readiness_check,
                intent_acknowledgment: String::new(),
                i_statement: legacy.partner_a_data.i_statement,
                problem_description: legacy.partner_a_data.problem_description,
                request: legacy.partner_a_data.request,
            },
            partner_b_responses: PartnerBResponses::default(),
            partner_b_data: PartnerBData {
                i_statement: legacy.partner_b_data.i_statement,
                request: (!b_request.is_empty()).then_some(b_request),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::Position;

    fn legacy_json(partner: &str, step: u8, status: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "legacy-1",
            "partnerA": "Alex",
            "partnerB": "Jordan",
            "status": status,
            "currentStep": step,
            "currentPartner": partner,
            "createdAt": "2024-05-01T10:00:00Z",
            "partnerAData": {
                "readinessCheck": true,
                "iStatement": { "emotion": "hurt", "situation": "plans changed" },
                "problemDescription": "last-minute changes",
                "request": "tell me earlier"
            },
            "partnerBData": {
                "readinessCheck": false,
                "iStatement": { "emotion": "", "situation": "" },
                "problemDescription": "",
                "request": "  "
            }
        })
    }

    #[test]
    fn current_shape_is_not_legacy() {
        let s = Session::new("Alex", "Jordan", None);
        let stored: StoredSession =
            serde_json::from_value(serde_json::to_value(&s).unwrap()).unwrap();
        assert!(!stored.is_legacy());
        assert_eq!(stored.into_session(), s);
    }

    #[test]
    fn legacy_partner_a_step_maps_past_intent() {
        let stored: StoredSession =
            serde_json::from_value(legacy_json("A", 3, "in_progress")).unwrap();
        assert!(stored.is_legacy());
        let s = stored.into_session();
        assert_eq!((s.current_phase, s.current_step), (Phase::PartnerA, 4));
        assert_eq!(s.partner_a_data.i_statement.emotion, "hurt");
        assert_eq!(s.partner_a_data.request, "tell me earlier");
        assert!(s.partner_a_data.intent_acknowledgment.is_empty());
        assert!(Position::of(&s).is_valid());
    }

    #[test]
    fn legacy_partner_b_lands_in_share_phase() {
        let s = StoredSession::Legacy(
            serde_json::from_value(legacy_json("B", 5, "in_progress")).unwrap(),
        )
        .into_session();
        assert_eq!((s.current_phase, s.current_step), (Phase::PartnerBShare, 2));
        assert!(s.partner_b_data.request.is_none(), "blank request becomes absent");
    }

    #[test]
    fn legacy_completed_becomes_complete_with_timestamp() {
        let s: Session = serde_json::from_value::<LegacySession>(legacy_json("B", 5, "completed"))
            .unwrap()
            .into();
        assert_eq!(s.current_phase, Phase::Complete);
        assert_eq!(s.status, SessionStatus::Completed);
        assert_eq!(s.completed_at, Some(s.created_at));
    }
}
