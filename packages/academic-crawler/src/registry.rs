//! Process-wide session registry.
//!
//! Constructed once at startup and injected into callers; the map is
//! guarded by a mutex for concurrent create/lookup/list/remove.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::session::CrawlSession;
use crate::storage::SessionStore;
use crate::types::SessionSummary;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// A session with this id is still registered.
    #[error("session {0} already exists")]
    DuplicateSession(String),
}

pub struct SessionRegistry {
    store: Arc<dyn SessionStore>,
    sessions: Mutex<HashMap<String, Arc<CrawlSession>>>,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Create and register a new session. Ids must be unique while the
    /// session is registered.
    pub fn create(&self, session_id: impl Into<String>) -> Result<Arc<CrawlSession>, RegistryError> {
        let session_id = session_id.into();
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.contains_key(&session_id) {
            return Err(RegistryError::DuplicateSession(session_id));
        }
        let session = CrawlSession::new(session_id.clone(), self.store.clone());
        sessions.insert(session_id, session.clone());
        Ok(session)
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<CrawlSession>> {
        self.sessions.lock().unwrap().get(session_id).cloned()
    }

    pub fn list(&self) -> Vec<SessionSummary> {
        self.sessions
            .lock()
            .unwrap()
            .values()
            .map(|session| session.summary())
            .collect()
    }

    /// Drop the registry's handle; the session itself stays alive for any
    /// holder of another `Arc`.
    pub fn remove(&self, session_id: &str) -> Option<Arc<CrawlSession>> {
        self.sessions.lock().unwrap().remove(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().unwrap().is_empty()
    }
}

/// `session_<timestamp>_<uuid8>`, the id shape the surrounding tooling
/// expects.
pub fn generate_session_id() -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let unique = Uuid::new_v4().simple().to_string();
    format!("session_{timestamp}_{}", &unique[..8])
}
