//! Typed errors for the crawl core.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so each failure
//! site maps to exactly one error kind.

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that abort a crawl stage or the whole crawl.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The directory client (navigation primitive) could not be acquired.
    /// Fatal before any page is fetched.
    #[error("failed to acquire directory client: {0}")]
    Setup(#[source] BoxError),

    /// A bounded wait exceeded its ceiling. Fatal at stage level.
    #[error("navigation timed out during {step}")]
    NavigationTimeout { step: &'static str },

    /// The directory client failed a navigation step outright.
    /// Same severity as a timeout.
    #[error("navigation failed during {step}: {source}")]
    Navigation {
        step: &'static str,
        #[source]
        source: BoxError,
    },

    /// A record could not be parsed. Recovered locally: the row is
    /// skipped, the graph node degrades to a partial or deleted record.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The crawl was cancelled by its caller.
    #[error("crawl cancelled")]
    Cancelled,
}

/// A single candidate row or detail fragment could not be turned into a
/// typed record.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The row exposes no profile link.
    #[error("candidate row has no profile link")]
    MissingUrl,

    /// The row exposes no name text.
    #[error("candidate row has no name")]
    MissingName,

    /// The record URL does not parse.
    #[error("invalid record URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

pub type Result<T> = std::result::Result<T, CrawlError>;
