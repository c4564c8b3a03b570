use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-crawl search parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Name submitted to the directory search.
    pub term: String,
    /// Field filter, resolved to a name through the taxonomy.
    pub field_id: Option<u32>,
    /// Specialty filters; only applied together with `field_id`, since
    /// specialty names resolve within a field.
    pub specialty_ids: Vec<u32>,
    /// Email target for the early-exit match.
    pub email: Option<String>,
}

impl SearchRequest {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Default::default()
        }
    }

    pub fn with_field(mut self, field_id: u32) -> Self {
        self.field_id = Some(field_id);
        self
    }

    pub fn with_specialties(mut self, specialty_ids: impl IntoIterator<Item = u32>) -> Self {
        self.specialty_ids = specialty_ids.into_iter().collect();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Crawl tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Stage 1 stops once this many profiles were accumulated.
    pub profile_limit: usize,
    /// Ceiling applied to every page load, navigation and detail fetch.
    pub navigation_timeout: Duration,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            profile_limit: 50,
            navigation_timeout: Duration::from_secs(10),
        }
    }
}

impl CrawlConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile_limit(mut self, limit: usize) -> Self {
        self.profile_limit = limit;
        self
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits() {
        let config = CrawlConfig::default();
        assert_eq!(config.profile_limit, 50);
        assert_eq!(config.navigation_timeout, Duration::from_secs(10));
    }

    #[test]
    fn builders_override_defaults() {
        let config = CrawlConfig::new()
            .with_profile_limit(100)
            .with_navigation_timeout(Duration::from_secs(5));
        assert_eq!(config.profile_limit, 100);
        assert_eq!(config.navigation_timeout, Duration::from_secs(5));

        let request = SearchRequest::new("Ahmet")
            .with_field(3)
            .with_specialties([7, 9])
            .with_email("a@b.edu");
        assert_eq!(request.field_id, Some(3));
        assert_eq!(request.specialty_ids, vec![7, 9]);
        assert_eq!(request.email.as_deref(), Some("a@b.edu"));
    }
}
