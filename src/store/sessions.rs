//! SessionStore: CRUD over the session collection.
//!
//! The whole collection lives in one JSON blob under a single key. Every
//! mutation reads the full collection, changes one record, and writes the
//! full collection back. Concurrent writers are not coordinated: the last
//! write wins.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::backend::StorageBackend;
use crate::error::StorageError;
use crate::session::{
    PartnerADataPatch, PartnerBDataPatch, PartnerBResponsesPatch, Session, SessionPatch,
    SessionStatus, StoredSession,
};

/// Default namespaced key of the session blob.
pub const DEFAULT_STORAGE_KEY: &str = "gentle-disagree-sessions";

/// Persistent session storage over an injected backend.
pub struct SessionStore {
    backend: Arc<dyn StorageBackend>,
    key: String,
}

impl SessionStore {
    /// Create a store persisting under [`DEFAULT_STORAGE_KEY`].
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_key(backend, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(backend: Arc<dyn StorageBackend>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the collection. Any failure yields an empty collection.
    fn load(&self) -> Vec<Session> {
        let blob = match self.backend.get(&self.key) {
            Ok(Some(blob)) => blob,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read sessions, treating store as empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<StoredSession>>(&blob) {
            Ok(records) => records.into_iter().map(StoredSession::into_session).collect(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Corrupt session data, treating store as empty");
                Vec::new()
            }
        }
    }

    fn save(&self, sessions: &[Session]) -> Result<(), StorageError> {
        let blob = serde_json::to_string(sessions)?;
        self.backend.set(&self.key, &blob)
    }

    /// Apply `f` to the record with `id` and persist. `Ok(None)` if absent.
    fn modify<F>(&self, id: &str, f: F) -> Result<Option<Session>, StorageError>
    where
        F: FnOnce(&mut Session),
    {
        let mut sessions = self.load();
        let Some(session) = sessions.iter_mut().find(|s| s.id == id) else {
            debug!(session_id = %id, "Session not found for update");
            return Ok(None);
        };
        f(session);
        let updated = session.clone();
        self.save(&sessions)?;
        Ok(Some(updated))
    }

    /// All sessions, newest first.
    pub fn list_all(&self) -> Vec<Session> {
        self.load()
    }

    /// Completed sessions, newest first.
    pub fn list_completed(&self) -> Vec<Session> {
        self.list_by_status(SessionStatus::Completed)
    }

    /// In-progress sessions, newest first.
    pub fn list_in_progress(&self) -> Vec<Session> {
        self.list_by_status(SessionStatus::InProgress)
    }

    fn list_by_status(&self, status: SessionStatus) -> Vec<Session> {
        self.load().into_iter().filter(|s| s.status == status).collect()
    }

    /// Look up a session. `None` if no record has this id.
    pub fn get(&self, id: &str) -> Option<Session> {
        self.load().into_iter().find(|s| s.id == id)
    }

    /// Create a session at the head of the collection and persist it.
    pub fn create(
        &self,
        partner_a: &str,
        partner_b: &str,
        topic: Option<&str>,
    ) -> Result<Session, StorageError> {
        let session = Session::new(partner_a, partner_b, topic.map(str::to_string));
        let mut sessions = self.load();
        sessions.insert(0, session.clone());
        self.save(&sessions)?;
        info!(session_id = %session.id, "Session created");
        Ok(session)
    }

    /// Shallow merge of top-level fields.
    ///
    /// Nested objects in `patch` replace the stored ones wholesale; use the
    /// `patch_partner_*` methods for field-level nested updates.
    pub fn patch(&self, id: &str, patch: SessionPatch) -> Result<Option<Session>, StorageError> {
        self.modify(id, |session| patch.apply_to(session))
    }

    /// Field-level merge within `partner_a_data`.
    pub fn patch_partner_a_data(
        &self,
        id: &str,
        patch: PartnerADataPatch,
    ) -> Result<Option<Session>, StorageError> {
        self.modify(id, |session| patch.apply_to(&mut session.partner_a_data))
    }

    /// Field-level merge within `partner_b_responses`.
    pub fn patch_partner_b_responses(
        &self,
        id: &str,
        patch: PartnerBResponsesPatch,
    ) -> Result<Option<Session>, StorageError> {
        self.modify(id, |session| {
            patch.apply_to(&mut session.partner_b_responses)
        })
    }

    /// Field-level merge within `partner_b_data`.
    pub fn patch_partner_b_data(
        &self,
        id: &str,
        patch: PartnerBDataPatch,
    ) -> Result<Option<Session>, StorageError> {
        self.modify(id, |session| patch.apply_to(&mut session.partner_b_data))
    }

    /// Remove one session. `Ok(false)` if no record has this id.
    pub fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let mut sessions = self.load();
        let before = sessions.len();
        sessions.retain(|s| s.id != id);
        if sessions.len() == before {
            return Ok(false);
        }
        self.save(&sessions)?;
        info!(session_id = %id, "Session deleted");
        Ok(true)
    }

    /// Remove the entire collection.
    pub fn clear_all(&self) -> Result<(), StorageError> {
        self.backend.remove(&self.key)?;
        info!(key = %self.key, "All sessions cleared");
        Ok(())
    }
}
