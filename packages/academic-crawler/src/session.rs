//! Session state: the single source of truth for one crawl's progress,
//! status and accumulated results.
//!
//! A session is owned by the orchestrator driving it; the registry hands
//! out non-owning `Arc` handles for external lookup. Every read path
//! returns copies, never the live sequences, so the snapshot path needs
//! no coordination with the single mutator.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use url::Url;

use crate::storage::SessionStore;
use crate::types::{
    Collaborator, Profile, SessionCheckpoint, SessionSnapshot, SessionStatus, SessionSummary,
};

struct SessionInner {
    status: SessionStatus,
    progress: u8,
    current_step: String,
    profiles: Vec<Profile>,
    collaborators: Vec<Collaborator>,
    error_message: Option<String>,
}

pub struct CrawlSession {
    session_id: String,
    started_at: DateTime<Utc>,
    inner: RwLock<SessionInner>,
    store: Arc<dyn SessionStore>,
}

impl CrawlSession {
    pub fn new(session_id: impl Into<String>, store: Arc<dyn SessionStore>) -> Arc<Self> {
        Arc::new(Self {
            session_id: session_id.into(),
            started_at: Utc::now(),
            inner: RwLock::new(SessionInner {
                status: SessionStatus::Initialized,
                progress: 0,
                current_step: String::new(),
                profiles: Vec::new(),
                collaborators: Vec::new(),
                error_message: None,
            }),
            store,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Set progress and the in-flight step description, then persist a
    /// checkpoint.
    ///
    /// Progress is clamped to the non-decreasing 0–100 invariant; it never
    /// goes backward. Below 100 the session is `Running`, at 100 it is
    /// `Completed`. Ignored once the session is terminal.
    pub async fn update_progress(&self, percent: u8, step: impl Into<String>) {
        let checkpoint = {
            let mut inner = self.inner.write().unwrap();
            if inner.status.is_terminal() {
                tracing::warn!(
                    session_id = %self.session_id,
                    status = ?inner.status,
                    "progress update on terminal session ignored"
                );
                return;
            }
            let mut percent = percent.min(100);
            if percent < inner.progress {
                tracing::warn!(
                    session_id = %self.session_id,
                    from = inner.progress,
                    to = percent,
                    "backward progress clamped"
                );
                percent = inner.progress;
            }
            inner.progress = percent;
            inner.current_step = step.into();
            inner.status = if percent < 100 {
                SessionStatus::Running
            } else {
                SessionStatus::Completed
            };
            self.checkpoint_of(&inner)
        };
        self.persist_checkpoint(checkpoint).await;
    }

    /// Append a profile and persist the accumulated sequence.
    ///
    /// A profile whose `url` duplicates an existing one is silently
    /// ignored; the call returns `false` and nothing is persisted.
    pub async fn add_profile(&self, profile: Profile) -> bool {
        let profiles = {
            let mut inner = self.inner.write().unwrap();
            if inner.profiles.iter().any(|p| p.url == profile.url) {
                tracing::debug!(
                    session_id = %self.session_id,
                    url = %profile.url,
                    "duplicate profile ignored"
                );
                return false;
            }
            inner.profiles.push(profile);
            inner.profiles.clone()
        };
        if let Err(error) = self.store.save_profiles(&self.session_id, &profiles).await {
            tracing::warn!(
                session_id = %self.session_id,
                error = %error,
                "failed to persist profiles"
            );
        }
        true
    }

    /// Append a collaborator and persist the accumulated sequence.
    pub async fn add_collaborator(&self, collaborator: Collaborator) {
        let collaborators = {
            let mut inner = self.inner.write().unwrap();
            inner.collaborators.push(collaborator);
            inner.collaborators.clone()
        };
        if let Err(error) = self
            .store
            .save_collaborators(&self.session_id, &collaborators)
            .await
        {
            tracing::warn!(
                session_id = %self.session_id,
                error = %error,
                "failed to persist collaborators"
            );
        }
    }

    /// Transition to `Error` and record the message. Terminal; ignored if
    /// the session already reached a terminal status.
    pub async fn set_error(&self, message: impl Into<String>) {
        let checkpoint = {
            let mut inner = self.inner.write().unwrap();
            if inner.status.is_terminal() {
                return;
            }
            inner.status = SessionStatus::Error;
            inner.error_message = Some(message.into());
            self.checkpoint_of(&inner)
        };
        self.persist_checkpoint(checkpoint).await;
    }

    /// Immutable point-in-time snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.read().unwrap();
        SessionSnapshot {
            session_id: self.session_id.clone(),
            status: inner.status,
            progress: inner.progress,
            current_step: inner.current_step.clone(),
            profiles_count: inner.profiles.len(),
            collaborators_count: inner.collaborators.len(),
            error_message: inner.error_message.clone(),
            started_at: self.started_at,
            elapsed_seconds: (Utc::now() - self.started_at).num_milliseconds() as f64 / 1000.0,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        let inner = self.inner.read().unwrap();
        SessionSummary {
            session_id: self.session_id.clone(),
            status: inner.status,
            progress: inner.progress,
            profiles_count: inner.profiles.len(),
            collaborators_count: inner.collaborators.len(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.read().unwrap().status
    }

    pub fn profiles(&self) -> Vec<Profile> {
        self.inner.read().unwrap().profiles.clone()
    }

    pub fn collaborators(&self) -> Vec<Collaborator> {
        self.inner.read().unwrap().collaborators.clone()
    }

    pub fn profile_count(&self) -> usize {
        self.inner.read().unwrap().profiles.len()
    }

    pub fn collaborator_count(&self) -> usize {
        self.inner.read().unwrap().collaborators.len()
    }

    pub fn has_profile_url(&self, url: &Url) -> bool {
        self.inner
            .read()
            .unwrap()
            .profiles
            .iter()
            .any(|p| p.url == *url)
    }

    fn checkpoint_of(&self, inner: &SessionInner) -> SessionCheckpoint {
        SessionCheckpoint {
            session_id: self.session_id.clone(),
            status: inner.status,
            progress: inner.progress,
            current_step: inner.current_step.clone(),
            profiles_count: inner.profiles.len(),
            collaborators_count: inner.collaborators.len(),
            started_at: self.started_at,
            last_update: Utc::now(),
        }
    }

    async fn persist_checkpoint(&self, checkpoint: SessionCheckpoint) {
        if let Err(error) = self.store.save_checkpoint(&checkpoint).await {
            tracing::warn!(
                session_id = %self.session_id,
                error = %error,
                "failed to persist session checkpoint"
            );
        }
    }
}
