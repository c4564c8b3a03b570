use serde::{Deserialize, Serialize};

use crate::types::{Collaborator, Profile};

/// Events produced by a crawl, in emission order.
///
/// The sequence is lazy and terminates at the first `completed` or `error`
/// event; it is restartable only by starting a new session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CrawlEvent {
    Progress {
        percent: u8,
        step: String,
    },

    ProfileAdded {
        profile: Profile,
        count: usize,
        percent: u8,
    },

    /// A candidate's email equals the configured target; stage 2 begins.
    EmailMatch {
        profile: Profile,
        message: String,
    },

    CollaboratorAdded {
        collaborator: Collaborator,
        count: usize,
        total: usize,
        percent: u8,
    },

    Completed {
        session_id: String,
        profiles_count: usize,
        collaborators_count: usize,
    },

    Error {
        message: String,
        session_id: String,
    },
}

impl CrawlEvent {
    /// Whether this event terminates the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CrawlEvent::Completed { .. } | CrawlEvent::Error { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_tag_with_snake_case_type() {
        let event = CrawlEvent::Progress {
            percent: 15,
            step: "searching".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "progress");
        assert_eq!(json["percent"], 15);

        let event = CrawlEvent::Completed {
            session_id: "s1".into(),
            profiles_count: 3,
            collaborators_count: 0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "completed");
    }

    #[test]
    fn only_completed_and_error_terminate() {
        assert!(CrawlEvent::Completed {
            session_id: "s".into(),
            profiles_count: 0,
            collaborators_count: 0,
        }
        .is_terminal());
        assert!(CrawlEvent::Error {
            message: "boom".into(),
            session_id: "s".into(),
        }
        .is_terminal());
        assert!(!CrawlEvent::Progress {
            percent: 5,
            step: "".into(),
        }
        .is_terminal());
    }
}
