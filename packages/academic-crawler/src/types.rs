use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Sentinel photo reference used when a record exposes no picture.
pub const DEFAULT_PHOTO_URL: &str = "/default_photo.jpg";

/// A profile record discovered during stage 1.
///
/// `url` is the record's canonical identity: within one session no two
/// profiles share a `url`. `id` is assigned in discovery order, starting
/// at 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: u32,
    pub name: String,
    pub title: String,
    pub url: Url,
    pub header: String,
    pub field_label: String,
    pub specialty_label: String,
    pub keywords: Vec<String>,
    /// Case-insensitive compare key for email matching.
    pub email: Option<String>,
    pub photo_url: String,
}

/// Extraction state of a collaborator record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollaboratorStatus {
    Pending,
    /// Extraction finished, regardless of `deleted`.
    Completed,
}

/// A neighbor resolved during the stage-2 collaboration-graph walk.
///
/// An absent `url` signals an unresolved or removed neighbor; such records
/// carry `deleted = true` and the default photo reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collaborator {
    pub id: u32,
    pub name: String,
    pub url: Option<Url>,
    pub deleted: bool,
    pub title: String,
    pub header: String,
    pub field_label: String,
    pub specialty_label: String,
    pub keywords: Vec<String>,
    pub email: Option<String>,
    pub photo_url: String,
    pub status: CollaboratorStatus,
}

/// Lifecycle of one crawl session.
///
/// Transitions are monotone: `Initialized → Running → {Completed, Error}`.
/// Terminal states accept no further progress mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Initialized,
    Running,
    Completed,
    Error,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Error)
    }
}

/// Immutable point-in-time view of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub status: SessionStatus,
    pub progress: u8,
    pub current_step: String,
    pub profiles_count: usize,
    pub collaborators_count: usize,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub elapsed_seconds: f64,
}

/// Condensed per-session row for registry listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub status: SessionStatus,
    pub progress: u8,
    pub profiles_count: usize,
    pub collaborators_count: usize,
}

/// The persisted shape of a session checkpoint, rewritten after every
/// state mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCheckpoint {
    pub session_id: String,
    pub status: SessionStatus,
    pub progress: u8,
    pub current_step: String,
    pub profiles_count: usize,
    pub collaborators_count: usize,
    pub started_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_terminality() {
        assert!(!SessionStatus::Initialized.is_terminal());
        assert!(!SessionStatus::Running.is_terminal());
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Error.is_terminal());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&SessionStatus::Initialized).unwrap();
        assert_eq!(json, "\"initialized\"");
    }
}
