//! Session state machine: phase/step sequencing and route derivation.
//!
//! Pure functions of session state. Nothing here touches storage or the
//! network; callers persist the results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::{Session, SessionPatch, SessionStatus};
use crate::error::SessionError;

/// The coarse stages of a conversation.
///
/// Progresses linearly: PartnerA → Transition → PartnerBRespond →
/// PartnerBShare → Complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    PartnerA,
    Transition,
    PartnerBRespond,
    PartnerBShare,
    Complete,
}

impl Phase {
    /// All phases in order.
    pub const ALL: [Phase; 5] = [
        Phase::PartnerA,
        Phase::Transition,
        Phase::PartnerBRespond,
        Phase::PartnerBShare,
        Phase::Complete,
    ];

    /// Number of numbered steps in this phase. Single-position phases have none.
    pub fn step_count(&self) -> u8 {
        match self {
            Self::PartnerA => 6,
            Self::PartnerBRespond | Self::PartnerBShare => 2,
            Self::Transition | Self::Complete => 0,
        }
    }

    /// The step a session lands on when it enters this phase.
    pub fn first_step(&self) -> u8 {
        if self.step_count() == 0 { 0 } else { 1 }
    }

    /// Whether `step` is a legal position within this phase.
    ///
    /// `Complete` is terminal and accepts any step.
    pub fn is_valid_step(&self, step: u8) -> bool {
        if self.is_terminal() {
            return true;
        }
        match self.step_count() {
            0 => step == 0,
            n => (1..=n).contains(&step),
        }
    }

    /// Whether this phase is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// The following phase, if any.
    pub fn next(&self) -> Option<Phase> {
        match self {
            Self::PartnerA => Some(Self::Transition),
            Self::Transition => Some(Self::PartnerBRespond),
            Self::PartnerBRespond => Some(Self::PartnerBShare),
            Self::PartnerBShare => Some(Self::Complete),
            Self::Complete => None,
        }
    }

    /// Check if a phase change from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: Phase) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PartnerA => "partner_a",
            Self::Transition => "transition",
            Self::PartnerBRespond => "partner_b_respond",
            Self::PartnerBShare => "partner_b_share",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

/// A `(phase, step)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub phase: Phase,
    pub step: u8,
}

impl Position {
    pub const START: Position = Position {
        phase: Phase::PartnerA,
        step: 1,
    };

    pub fn new(phase: Phase, step: u8) -> Self {
        Self { phase, step }
    }

    pub fn of(session: &Session) -> Self {
        Self::new(session.current_phase, session.current_step)
    }

    pub fn is_valid(&self) -> bool {
        self.phase.is_valid_step(self.step)
    }

    /// The position after one advance.
    ///
    /// `Complete` maps to itself whatever its step. Invalid positions are
    /// rejected rather than clamped.
    pub fn next(self) -> Result<Position, SessionError> {
        if self.phase.is_terminal() {
            return Ok(self);
        }
        if !self.is_valid() {
            return Err(SessionError::InvalidPosition {
                phase: self.phase,
                step: self.step,
            });
        }
        if self.step < self.phase.step_count() {
            return Ok(Position::new(self.phase, self.step + 1));
        }
        // Last step of a non-terminal phase always has a successor.
        let next = self.phase.next().unwrap_or(Phase::Complete);
        Ok(Position::new(next, next.first_step()))
    }

    /// The routable screen for this position.
    pub fn location(&self) -> Location {
        route_for(self.phase, self.step)
    }
}

/// Compute the patch that advances `session` by one step.
///
/// Returns `None` when the session is already complete.
pub fn advance_patch(
    session: &Session,
    now: DateTime<Utc>,
) -> Result<Option<SessionPatch>, SessionError> {
    let current = Position::of(session);
    if current.phase.is_terminal() {
        return Ok(None);
    }

    let next = current.next()?;
    let mut patch = SessionPatch {
        current_phase: Some(next.phase),
        current_step: Some(next.step),
        ..Default::default()
    };
    if next.phase.is_terminal() {
        patch.status = Some(SessionStatus::Completed);
        if session.completed_at.is_none() {
            // Never earlier than creation, even with a skewed clock.
            patch.completed_at = Some(now.max(session.created_at));
        }
    }
    Ok(Some(patch))
}

/// Advance `session` by one step, returning the new record.
///
/// Advancing a completed session returns an identical copy.
pub fn advance(session: &Session, now: DateTime<Utc>) -> Result<Session, SessionError> {
    let mut next = session.clone();
    if let Some(patch) = advance_patch(session, now)? {
        patch.apply_to(&mut next);
    }
    Ok(next)
}

/// Named screens exposed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Location {
    New,
    Readiness,
    Approach,
    Intent,
    IStatement,
    Problem,
    Request,
    Transition,
    Reflect,
    Acknowledge,
    BStatement,
    BRequest,
    Summary,
    History,
    About,
}

impl Location {
    /// Screens that belong to the step sequence, in order.
    pub const STEPS: [Location; 12] = [
        Location::Readiness,
        Location::Approach,
        Location::Intent,
        Location::IStatement,
        Location::Problem,
        Location::Request,
        Location::Transition,
        Location::Reflect,
        Location::Acknowledge,
        Location::BStatement,
        Location::BRequest,
        Location::Summary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Readiness => "readiness",
            Self::Approach => "approach",
            Self::Intent => "intent",
            Self::IStatement => "i-statement",
            Self::Problem => "problem",
            Self::Request => "request",
            Self::Transition => "transition",
            Self::Reflect => "reflect",
            Self::Acknowledge => "acknowledge",
            Self::BStatement => "b-statement",
            Self::BRequest => "b-request",
            Self::Summary => "summary",
            Self::History => "history",
            Self::About => "about",
        }
    }

    /// Whether the screen is scoped to a single session.
    pub fn requires_session(&self) -> bool {
        !matches!(self, Self::New | Self::History | Self::About)
    }

    /// The state a session must be in to show this screen.
    pub fn position(&self) -> Option<Position> {
        let (phase, step) = match self {
            Self::Readiness => (Phase::PartnerA, 1),
            Self::Approach => (Phase::PartnerA, 2),
            Self::Intent => (Phase::PartnerA, 3),
            Self::IStatement => (Phase::PartnerA, 4),
            Self::Problem => (Phase::PartnerA, 5),
            Self::Request => (Phase::PartnerA, 6),
            Self::Transition => (Phase::Transition, 0),
            Self::Reflect => (Phase::PartnerBRespond, 1),
            Self::Acknowledge => (Phase::PartnerBRespond, 2),
            Self::BStatement => (Phase::PartnerBShare, 1),
            Self::BRequest => (Phase::PartnerBShare, 2),
            Self::Summary => (Phase::Complete, 0),
            Self::New | Self::History | Self::About => return None,
        };
        Some(Position::new(phase, step))
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Location {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::STEPS
            .iter()
            .chain([Location::New, Location::History, Location::About].iter())
            .find(|loc| loc.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown location: {s}"))
    }
}

/// Strict route derivation: out-of-range steps are an error.
pub fn try_route_for(phase: Phase, step: u8) -> Result<Location, SessionError> {
    let location = match (phase, step) {
        (Phase::PartnerA, 1) => Location::Readiness,
        (Phase::PartnerA, 2) => Location::Approach,
        (Phase::PartnerA, 3) => Location::Intent,
        (Phase::PartnerA, 4) => Location::IStatement,
        (Phase::PartnerA, 5) => Location::Problem,
        (Phase::PartnerA, 6) => Location::Request,
        (Phase::Transition, 0) => Location::Transition,
        (Phase::PartnerBRespond, 1) => Location::Reflect,
        (Phase::PartnerBRespond, 2) => Location::Acknowledge,
        (Phase::PartnerBShare, 1) => Location::BStatement,
        (Phase::PartnerBShare, 2) => Location::BRequest,
        (Phase::Complete, _) => Location::Summary,
        _ => return Err(SessionError::InvalidPosition { phase, step }),
    };
    Ok(location)
}

/// Lenient route derivation.
///
/// A step outside the phase's range falls back to the phase's first screen
/// so a stale step number never strands the user.
pub fn route_for(phase: Phase, step: u8) -> Location {
    match try_route_for(phase, step) {
        Ok(location) => location,
        Err(_) => {
            tracing::warn!(%phase, step, "Out-of-range step, falling back to first screen of phase");
            route_for(phase, phase.first_step())
        }
    }
}

/// The route for a session's current state.
pub fn route_for_session(session: &Session) -> Location {
    route_for(session.current_phase, session.current_step)
}

/// Which partner the wizard is addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartnerRole {
    A,
    B,
}

impl std::fmt::Display for PartnerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// Whether the active partner is sharing or responding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Sharing,
    Responding,
}

/// Whose turn it is, and in what capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Turn {
    pub role: PartnerRole,
    pub activity: Activity,
}

impl Turn {
    pub fn is_sharing(&self) -> bool {
        self.activity == Activity::Sharing
    }
}

/// Derive the active partner for a phase. `None` once complete.
pub fn current_turn(phase: Phase) -> Option<Turn> {
    match phase {
        Phase::PartnerA => Some(Turn {
            role: PartnerRole::A,
            activity: Activity::Sharing,
        }),
        Phase::PartnerBShare => Some(Turn {
            role: PartnerRole::B,
            activity: Activity::Sharing,
        }),
        Phase::Transition | Phase::PartnerBRespond => Some(Turn {
            role: PartnerRole::B,
            activity: Activity::Responding,
        }),
        Phase::Complete => None,
    }
}

/// Total steps in partner A's flow.
pub const PARTNER_A_TOTAL_STEPS: u8 = 6;
/// Total steps in partner B's flow (respond + share).
pub const PARTNER_B_TOTAL_STEPS: u8 = 4;

const PARTNER_A_STEPS: [(&str, Option<&str>); 6] = [
    ("Readiness Check", Some("Set a gentle approach")),
    ("Gentle Approach", Some("Acknowledge their intentions")),
    ("Acknowledge Intent", Some("Share your I-statement")),
    ("I-Statement", Some("Describe the problem")),
    ("Problem Description", Some("Make your request")),
    ("Respectful Request", None),
];

const PARTNER_B_STEPS: [(&str, Option<&str>); 4] = [
    ("Reflect on Feelings", Some("Respond to the request")),
    ("Respond to Request", Some("Share your feelings")),
    ("Your I-Statement", Some("Make your request (optional)")),
    ("Your Request", None),
];

/// Progress header for a wizard screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepInfo {
    pub role: PartnerRole,
    pub activity: Activity,
    /// 1-based step within the partner's whole flow.
    pub display_step: u8,
    pub total_steps: u8,
    pub title: &'static str,
    pub next_hint: Option<&'static str>,
}

impl StepInfo {
    pub fn progress_percent(&self) -> u8 {
        ((u16::from(self.display_step) * 100) / u16::from(self.total_steps.max(1))) as u8
    }
}

/// Step labels for a position. `None` for transition and complete.
///
/// Partner B's share steps are numbered 3–4 in B's overall flow. An
/// out-of-range step shows the phase's first label.
pub fn step_info(phase: Phase, step: u8) -> Option<StepInfo> {
    let turn = current_turn(phase)?;
    let step = if phase.is_valid_step(step) {
        step
    } else {
        phase.first_step()
    };
    let (display_step, total_steps, table): (u8, u8, &[(&str, Option<&str>)]) = match phase {
        Phase::PartnerA => (step, PARTNER_A_TOTAL_STEPS, &PARTNER_A_STEPS),
        Phase::PartnerBRespond => (step, PARTNER_B_TOTAL_STEPS, &PARTNER_B_STEPS),
        Phase::PartnerBShare => (step + 2, PARTNER_B_TOTAL_STEPS, &PARTNER_B_STEPS),
        Phase::Transition | Phase::Complete => return None,
    };
    let (title, next_hint) = table[usize::from(display_step - 1)];
    Some(StepInfo {
        role: turn.role,
        activity: turn.activity,
        display_step,
        total_steps,
        title,
        next_hint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(phase: Phase, step: u8) -> Session {
        let mut s = Session::new("Alex", "Jordan", None);
        s.current_phase = phase;
        s.current_step = step;
        s
    }

    #[test]
    fn valid_transitions() {
        use Phase::*;
        for (from, to) in [
            (PartnerA, Transition),
            (Transition, PartnerBRespond),
            (PartnerBRespond, PartnerBShare),
            (PartnerBShare, Complete),
        ] {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use Phase::*;
        assert!(!PartnerA.can_transition_to(PartnerBRespond));
        assert!(!PartnerBShare.can_transition_to(PartnerA));
        assert!(!Complete.can_transition_to(PartnerA));
        assert!(!Transition.can_transition_to(Transition));
    }

    #[test]
    fn display_matches_serde() {
        for phase in Phase::ALL {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(format!("\"{phase}\""), json);
        }
        for location in Location::STEPS {
            let json = serde_json::to_string(&location).unwrap();
            assert_eq!(format!("\"{location}\""), json);
        }
    }

    #[test]
    fn six_advances_reach_transition() {
        let mut s = Session::new("Alex", "Jordan", None);
        for _ in 0..5 {
            s = advance(&s, Utc::now()).unwrap();
            assert_eq!(s.current_phase, Phase::PartnerA);
        }
        assert_eq!(s.current_step, 6);
        s = advance(&s, Utc::now()).unwrap();
        assert_eq!(s.current_phase, Phase::Transition);
        assert_eq!(s.current_step, 0);
    }

    #[test]
    fn transition_advances_to_partner_b_respond() {
        let s = advance(&at(Phase::Transition, 0), Utc::now()).unwrap();
        assert_eq!((s.current_phase, s.current_step), (Phase::PartnerBRespond, 1));
    }

    #[test]
    fn respond_step_two_advances_to_share() {
        let s = advance(&at(Phase::PartnerBRespond, 2), Utc::now()).unwrap();
        assert_eq!((s.current_phase, s.current_step), (Phase::PartnerBShare, 1));
        assert_eq!(s.status, SessionStatus::InProgress);
    }

    #[test]
    fn share_step_two_completes_session() {
        let before = at(Phase::PartnerBShare, 2);
        let s = advance(&before, Utc::now()).unwrap();
        assert_eq!(s.current_phase, Phase::Complete);
        assert_eq!(s.status, SessionStatus::Completed);
        let completed_at = s.completed_at.expect("completed_at set");
        assert!(completed_at >= s.created_at);
    }

    #[test]
    fn completed_at_never_precedes_creation() {
        let s = at(Phase::PartnerBShare, 2);
        let skewed = s.created_at - chrono::Duration::hours(1);
        let done = advance(&s, skewed).unwrap();
        assert_eq!(done.completed_at, Some(s.created_at));
    }

    #[test]
    fn advancing_complete_is_idempotent() {
        let done = advance(&at(Phase::PartnerBShare, 2), Utc::now()).unwrap();
        let again = advance(&done, Utc::now()).unwrap();
        assert_eq!(again, done);
        assert!(advance_patch(&done, Utc::now()).unwrap().is_none());
    }

    #[test]
    fn phase_never_decreases_and_steps_stay_valid() {
        let mut s = Session::new("Alex", "Jordan", None);
        let mut last = s.current_phase;
        for _ in 0..20 {
            s = advance(&s, Utc::now()).unwrap();
            assert!(s.current_phase >= last);
            assert!(Position::of(&s).is_valid());
            last = s.current_phase;
        }
        assert_eq!(s.current_phase, Phase::Complete);
    }

    #[test]
    fn walk_visits_every_step_location_once() {
        let mut s = Session::new("Alex", "Jordan", None);
        let mut seen = vec![route_for_session(&s)];
        while !s.is_completed() {
            s = advance(&s, Utc::now()).unwrap();
            seen.push(route_for_session(&s));
        }
        assert_eq!(seen, Location::STEPS.to_vec());
    }

    #[test]
    fn complete_with_stale_step_is_still_terminal() {
        let mut done = advance(&at(Phase::PartnerBShare, 2), Utc::now()).unwrap();
        done.current_step = 2;
        assert!(Position::of(&done).is_valid());
        assert_eq!(Position::of(&done).next().unwrap(), Position::of(&done));
        assert!(advance_patch(&done, Utc::now()).unwrap().is_none());
        assert_eq!(advance(&done, Utc::now()).unwrap(), done);
        assert_eq!(route_for_session(&done), Location::Summary);
    }

    #[test]
    fn invalid_position_is_rejected() {
        let err = advance(&at(Phase::PartnerA, 7), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidPosition {
                phase: Phase::PartnerA,
                step: 7
            }
        ));
        assert!(advance(&at(Phase::Transition, 1), Utc::now()).is_err());
        assert!(advance(&at(Phase::PartnerBShare, 0), Utc::now()).is_err());
    }

    #[test]
    fn route_derivation_examples() {
        assert_eq!(route_for(Phase::PartnerA, 3), Location::Intent);
        assert_eq!(route_for(Phase::PartnerBShare, 2), Location::BRequest);
        assert_eq!(route_for(Phase::Complete, 0), Location::Summary);
        assert_eq!(route_for(Phase::Complete, 42), Location::Summary);
        assert_eq!(route_for(Phase::Transition, 0), Location::Transition);
    }

    #[test]
    fn out_of_range_route_falls_back_to_first_screen() {
        assert_eq!(route_for(Phase::PartnerA, 0), Location::Readiness);
        assert_eq!(route_for(Phase::PartnerA, 9), Location::Readiness);
        assert_eq!(route_for(Phase::PartnerBRespond, 5), Location::Reflect);
        assert_eq!(route_for(Phase::Transition, 3), Location::Transition);
        assert!(try_route_for(Phase::PartnerA, 9).is_err());
    }

    #[test]
    fn location_position_round_trips_through_route() {
        for location in Location::STEPS {
            let pos = location.position().unwrap();
            assert_eq!(pos.location(), location);
        }
        assert!(Location::History.position().is_none());
        assert!(!Location::About.requires_session());
        assert!(Location::Reflect.requires_session());
    }

    #[test]
    fn location_from_str() {
        assert_eq!("b-statement".parse::<Location>().unwrap(), Location::BStatement);
        assert_eq!("history".parse::<Location>().unwrap(), Location::History);
        assert!("nowhere".parse::<Location>().is_err());
    }

    #[test]
    fn current_turn_per_phase() {
        let a = current_turn(Phase::PartnerA).unwrap();
        assert_eq!((a.role, a.is_sharing()), (PartnerRole::A, true));
        let b = current_turn(Phase::PartnerBRespond).unwrap();
        assert_eq!((b.role, b.is_sharing()), (PartnerRole::B, false));
        let b = current_turn(Phase::PartnerBShare).unwrap();
        assert_eq!((b.role, b.is_sharing()), (PartnerRole::B, true));
        assert!(current_turn(Phase::Complete).is_none());
    }

    #[test]
    fn step_info_numbers_partner_b_share_as_three_and_four() {
        let info = step_info(Phase::PartnerBShare, 1).unwrap();
        assert_eq!(info.display_step, 3);
        assert_eq!(info.total_steps, 4);
        assert_eq!(info.title, "Your I-Statement");

        let info = step_info(Phase::PartnerBShare, 2).unwrap();
        assert_eq!(info.display_step, 4);
        assert_eq!(info.next_hint, None);
        assert_eq!(info.progress_percent(), 100);
    }

    #[test]
    fn step_info_for_partner_a() {
        let info = step_info(Phase::PartnerA, 3).unwrap();
        assert_eq!(info.title, "Acknowledge Intent");
        assert_eq!(info.total_steps, 6);
        assert_eq!(info.role, PartnerRole::A);
        assert_eq!(info.progress_percent(), 50);

        let fallback = step_info(Phase::PartnerA, 12).unwrap();
        assert_eq!(fallback.title, "Readiness Check");
        assert!(step_info(Phase::Complete, 0).is_none());
        assert!(step_info(Phase::Transition, 0).is_none());
    }
}
