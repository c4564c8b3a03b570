//! Filesystem checkpoint store: one directory per session holding
//! `session.json`, `profiles.json` and `collaborators.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

use crate::storage::SessionStore;
use crate::types::{Collaborator, Profile, SessionCheckpoint};

pub struct FsSessionStore {
    base_dir: PathBuf,
}

impl FsSessionStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        self.base_dir.join(sanitize_component(session_id))
    }

    async fn write_json<T: Serialize>(&self, session_id: &str, file: &str, value: &T) -> Result<()> {
        let dir = self.session_dir(session_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create session dir {}", dir.display()))?;
        let path = dir.join(file);
        let bytes = serde_json::to_vec_pretty(value).context("failed to serialize session data")?;
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FsSessionStore {
    async fn save_checkpoint(&self, checkpoint: &SessionCheckpoint) -> Result<()> {
        self.write_json(&checkpoint.session_id, "session.json", checkpoint)
            .await
    }

    async fn save_profiles(&self, session_id: &str, profiles: &[Profile]) -> Result<()> {
        self.write_json(session_id, "profiles.json", &profiles).await
    }

    async fn save_collaborators(
        &self,
        session_id: &str,
        collaborators: &[Collaborator],
    ) -> Result<()> {
        self.write_json(session_id, "collaborators.json", &collaborators)
            .await
    }
}

/// Directory names keep alphanumerics (Turkish letters included) and turn
/// every other run of characters into a single underscore.
fn sanitize_component(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for ch in name.chars() {
        let keep = ch.is_ascii_alphanumeric()
            || ch == ' '
            || matches!(
                ch,
                'Ğ' | 'Ü' | 'Ş' | 'İ' | 'Ö' | 'Ç' | 'ğ' | 'ü' | 'ş' | 'i' | 'ö' | 'ç'
            );
        if keep {
            out.push(ch);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out.trim().replace(' ', "_")
}
