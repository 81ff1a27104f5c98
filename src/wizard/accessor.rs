//! SessionAccessor: the facade wizard screens read and write through.
//!
//! Binds one session id to a [`SessionStore`], keeps the last-read record,
//! and delegates every transition to the state machine so no screen
//! computes the next route itself.

use chrono::Utc;
use tracing::{debug, info};

use crate::error::SessionError;
use crate::session::{
    Location, PartnerADataPatch, PartnerBDataPatch, PartnerBResponsesPatch, PartnerRole, Session,
    SessionPatch, StepInfo, Turn, advance_patch, current_turn, route_for_session, step_info,
};
use crate::store::SessionStore;

/// Result of a successful advance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advanced {
    pub session: Session,
    /// Screen for the new state.
    pub next: Location,
}

/// Per-session view over the store.
pub struct SessionAccessor<'a> {
    store: &'a SessionStore,
    session_id: String,
    session: Option<Session>,
}

impl<'a> SessionAccessor<'a> {
    /// Bind to `session_id` and read it once.
    pub fn open(store: &'a SessionStore, session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        let session = store.get(&session_id);
        if session.is_none() {
            debug!(session_id = %session_id, "Accessor opened for missing session");
        }
        Self {
            store,
            session_id,
            session,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The last-read record, if the session exists.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The last-read record, or `NotFound`.
    pub fn require(&self) -> Result<&Session, SessionError> {
        self.session.as_ref().ok_or_else(|| self.not_found())
    }

    /// Re-read the record from storage.
    pub fn refresh(&mut self) -> Option<&Session> {
        self.session = self.store.get(&self.session_id);
        self.session.as_ref()
    }

    /// Shallow top-level update of the partner records.
    ///
    /// Status, phase, step and completion time change only through
    /// [`advance`](Self::advance); a patch setting any of them is refused.
    pub fn update(&mut self, patch: SessionPatch) -> Result<Session, SessionError> {
        self.ensure_writable()?;
        if patch.touches_progress() {
            return Err(SessionError::ProgressUpdate {
                id: self.session_id.clone(),
            });
        }
        let result = self.store.patch(&self.session_id, patch)?;
        self.accept(result)
    }

    /// Field-level update of partner A's data.
    pub fn update_partner_a(&mut self, patch: PartnerADataPatch) -> Result<Session, SessionError> {
        self.ensure_writable()?;
        let result = self.store.patch_partner_a_data(&self.session_id, patch)?;
        self.accept(result)
    }

    /// Field-level update of partner B's responses.
    pub fn update_b_responses(
        &mut self,
        patch: PartnerBResponsesPatch,
    ) -> Result<Session, SessionError> {
        self.ensure_writable()?;
        let result = self
            .store
            .patch_partner_b_responses(&self.session_id, patch)?;
        self.accept(result)
    }

    /// Field-level update of partner B's own data.
    pub fn update_partner_b(&mut self, patch: PartnerBDataPatch) -> Result<Session, SessionError> {
        self.ensure_writable()?;
        let result = self.store.patch_partner_b_data(&self.session_id, patch)?;
        self.accept(result)
    }

    /// Advance one step and return the screen to show next.
    ///
    /// Works from the stored record rather than the cached one. On a
    /// completed session this is a no-op that points at the summary.
    pub fn advance(&mut self) -> Result<Advanced, SessionError> {
        let Some(current) = self.refresh().cloned() else {
            return Err(self.not_found());
        };

        let session = match advance_patch(&current, Utc::now())? {
            None => current,
            Some(patch) => {
                let result = self.store.patch(&self.session_id, patch)?;
                self.accept(result)?
            }
        };

        let next = route_for_session(&session);
        if session.is_completed() {
            info!(session_id = %session.id, "Session completed");
        } else {
            debug!(
                session_id = %session.id,
                phase = %session.current_phase,
                step = session.current_step,
                %next,
                "Session advanced"
            );
        }
        Ok(Advanced { session, next })
    }

    /// Screen for the current state.
    pub fn location(&self) -> Option<Location> {
        self.session.as_ref().map(route_for_session)
    }

    /// Whose turn it is. `None` once complete or when missing.
    pub fn current_turn(&self) -> Option<Turn> {
        self.session
            .as_ref()
            .and_then(|s| current_turn(s.current_phase))
    }

    /// Name of the partner whose turn it is.
    pub fn current_partner_name(&self) -> Option<&str> {
        let session = self.session.as_ref()?;
        let turn = self.current_turn()?;
        Some(partner_name(session, turn.role))
    }

    /// Name of the partner who is not currently active.
    pub fn other_partner_name(&self) -> Option<&str> {
        let session = self.session.as_ref()?;
        let other = match self.current_turn()?.role {
            PartnerRole::A => PartnerRole::B,
            PartnerRole::B => PartnerRole::A,
        };
        Some(partner_name(session, other))
    }

    /// Progress header for the current screen.
    pub fn step_info(&self) -> Option<StepInfo> {
        self.session
            .as_ref()
            .and_then(|s| step_info(s.current_phase, s.current_step))
    }

    fn ensure_writable(&self) -> Result<(), SessionError> {
        match &self.session {
            None => Err(self.not_found()),
            Some(s) if s.is_completed() => Err(SessionError::ReadOnly {
                id: s.id.clone(),
            }),
            Some(_) => Ok(()),
        }
    }

    /// Cache a store result; a missing record means it was deleted elsewhere.
    fn accept(&mut self, result: Option<Session>) -> Result<Session, SessionError> {
        self.session = result;
        self.session.clone().ok_or_else(|| self.not_found())
    }

    fn not_found(&self) -> SessionError {
        SessionError::NotFound {
            id: self.session_id.clone(),
        }
    }
}

/// Display name for a partner role.
pub fn partner_name(session: &Session, role: PartnerRole) -> &str {
    match role {
        PartnerRole::A => &session.partner_a,
        PartnerRole::B => &session.partner_b,
    }
}
