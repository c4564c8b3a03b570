//! Streaming crawl/extraction core for a paginated academic directory.
//!
//! Stage 1 paginates candidate profile rows, deduplicates and filters
//! them, and watches for an email match; after a match, stage 2 walks the
//! matched profile's collaboration graph and resolves each neighbor's
//! detail record. Progress, results and status live in a per-crawl
//! session, checkpointed after every mutation, while the orchestrator
//! emits a typed event stream that always ends with exactly one
//! `completed` or `error` event.
//!
//! The browser-automation driver, the remote site's markup and any host
//! protocol are external collaborators behind the capability traits in
//! [`traits`].
//!
//! # Example
//!
//! ```rust,ignore
//! let registry = SessionRegistry::new(Arc::new(FsSessionStore::new("sessions")));
//! let session = registry.create(generate_session_id())?;
//!
//! let request = SearchRequest::new("AYŞE YILMAZ").with_email("ayse@example.edu");
//! let mut handle = Crawler::new(browser, taxonomy).spawn(request, session.clone());
//!
//! while let Some(event) = handle.next_event().await {
//!     println!("{}", serde_json::to_string(&event)?);
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod events;
pub mod extractor;
pub mod registry;
pub mod session;
pub mod storage;
pub mod taxonomy;
pub mod testing;
pub mod traits;
pub mod types;

pub use config::{CrawlConfig, SearchRequest};
pub use crawler::{CrawlHandle, Crawler};
pub use error::{CrawlError, ExtractError};
pub use events::CrawlEvent;
pub use registry::{generate_session_id, RegistryError, SessionRegistry};
pub use session::CrawlSession;
pub use storage::{FsSessionStore, MemorySessionStore, SessionStore};
pub use taxonomy::StaticTaxonomy;
pub use traits::{
    DetailRecord, DirectoryBrowser, DirectoryClient, RowRecord, TaxonomyResolver,
};
pub use types::{
    Collaborator, CollaboratorStatus, Profile, SessionSnapshot, SessionStatus, SessionSummary,
    DEFAULT_PHOTO_URL,
};
