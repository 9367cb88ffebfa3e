//! Editing sessions.
//!
//! A [`ConfigSession`] owns the state of one editing session and applies
//! actions to it in dispatch order. [`SessionRegistry`] keeps any number of
//! independent sessions keyed by ID.

use crate::error::ConfigError;
use crate::models::{Action, ConfigurationState, RawRecord};
use crate::services::{commit, hydrate, reduce};

use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

/// One editing session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSession {
    state: Option<ConfigurationState>,
}

impl ConfigSession {
    /// Create an empty session (absent state).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session hydrated from a persisted record.
    pub fn from_record(record: RawRecord) -> Self {
        Self { state: Some(hydrate(record)) }
    }

    /// Get the current state.
    pub fn state(&self) -> Option<&ConfigurationState> {
        self.state.as_ref()
    }

    /// Check if the session holds a configuration.
    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    /// Apply one action.
    pub fn dispatch(&mut self, action: Action) {
        self.state = reduce(self.state.as_ref(), action);
    }

    /// Apply actions in order.
    pub fn dispatch_all(&mut self, actions: impl IntoIterator<Item = Action>) {
        for action in actions {
            self.dispatch(action);
        }
    }

    /// Produce the wire record for the current state.
    pub fn commit(&self) -> Result<RawRecord, ConfigError> {
        let state = self.state.as_ref().ok_or(ConfigError::NoActiveState)?;
        commit::serialize(state)
    }
}

/// Thread-safe registry of editing sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, ConfigSession>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an empty session.
    pub fn open(&self) -> Uuid {
        self.insert(ConfigSession::new())
    }

    /// Open a session hydrated from a persisted record.
    pub fn open_with(&self, record: RawRecord) -> Uuid {
        self.insert(ConfigSession::from_record(record))
    }

    fn insert(&self, session: ConfigSession) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.write().insert(id, session);
        tracing::debug!(session_id = %id, "Session opened");
        id
    }

    /// Apply an action to one session.
    pub fn dispatch(&self, id: Uuid, action: Action) -> Result<(), ConfigError> {
        let mut sessions = self.sessions.write();
        let session = sessions.get_mut(&id).ok_or_else(|| ConfigError::session_not_found(id))?;
        tracing::trace!(session_id = %id, action = action.kind(), "Dispatching");
        session.dispatch(action);
        Ok(())
    }

    /// Get a copy of a session's current state.
    pub fn snapshot(&self, id: Uuid) -> Result<Option<ConfigurationState>, ConfigError> {
        self.sessions
            .read()
            .get(&id)
            .map(|session| session.state().cloned())
            .ok_or_else(|| ConfigError::session_not_found(id))
    }

    /// Produce the wire record for a session.
    pub fn commit(&self, id: Uuid) -> Result<RawRecord, ConfigError> {
        self.sessions.read().get(&id).ok_or_else(|| ConfigError::session_not_found(id))?.commit()
    }

    /// Close a session, returning it if it existed.
    pub fn close(&self, id: Uuid) -> Option<ConfigSession> {
        let session = self.sessions.write().remove(&id);
        if session.is_some() {
            tracing::debug!(session_id = %id, "Session closed");
        }
        session
    }

    /// Get all session IDs.
    pub fn session_ids(&self) -> Vec<Uuid> {
        self.sessions.read().keys().copied().collect()
    }

    /// Get the number of open sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Check if no sessions are open.
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
