//! In-memory checkpoint store for tests and development.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::storage::SessionStore;
use crate::types::{Collaborator, Profile, SessionCheckpoint};

/// Keeps checkpoints and result sequences in process memory. Not suitable
/// for production, everything is lost on restart.
#[derive(Default)]
pub struct MemorySessionStore {
    checkpoints: RwLock<HashMap<String, SessionCheckpoint>>,
    profiles: RwLock<HashMap<String, Vec<Profile>>>,
    collaborators: RwLock<HashMap<String, Vec<Collaborator>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn checkpoint(&self, session_id: &str) -> Option<SessionCheckpoint> {
        self.checkpoints.read().unwrap().get(session_id).cloned()
    }

    pub fn profiles(&self, session_id: &str) -> Vec<Profile> {
        self.profiles
            .read()
            .unwrap()
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn collaborators(&self, session_id: &str) -> Vec<Collaborator> {
        self.collaborators
            .read()
            .unwrap()
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn checkpoint_count(&self) -> usize {
        self.checkpoints.read().unwrap().len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save_checkpoint(&self, checkpoint: &SessionCheckpoint) -> Result<()> {
        self.checkpoints
            .write()
            .unwrap()
            .insert(checkpoint.session_id.clone(), checkpoint.clone());
        Ok(())
    }

    async fn save_profiles(&self, session_id: &str, profiles: &[Profile]) -> Result<()> {
        self.profiles
            .write()
            .unwrap()
            .insert(session_id.to_string(), profiles.to_vec());
        Ok(())
    }

    async fn save_collaborators(
        &self,
        session_id: &str,
        collaborators: &[Collaborator],
    ) -> Result<()> {
        self.collaborators
            .write()
            .unwrap()
            .insert(session_id.to_string(), collaborators.to_vec());
        Ok(())
    }
}
