//! Capability seams the crawl core depends on.
//!
//! The browser-automation driver behind these traits is an external
//! collaborator: the core never touches markup or selectors, it only
//! consumes the raw fragments a driver hands back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

/// One entry of the paginated listing, as raw text fragments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowRecord {
    /// Anchor text of the profile link.
    pub name: String,
    /// Href of the profile link.
    pub url: String,
    /// Full text of the info cell (title / name / header / keyword lines).
    pub info: String,
    /// Text of the first label anchor, empty when absent.
    pub field_label: String,
    /// Text of the second label anchor, empty when absent.
    pub specialty_label: String,
    /// Raw mailto text, possibly `[at]`-obfuscated; empty when absent.
    pub email: String,
    /// Photo `src` attribute, if any.
    pub photo_url: Option<String>,
}

/// The detail portion of a record page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
    /// Full text of the info cell.
    pub info: String,
    /// Raw label line, `"<field>  <specialty>  kw1; kw2"`; empty when the
    /// page exposes no labels.
    pub label_line: String,
    /// Raw mailto text, possibly `[at]`-obfuscated; empty when absent.
    pub email: String,
    /// Photo `src` attribute, if any.
    pub photo_url: Option<String>,
}

/// Navigation and fetch operations over the external directory.
///
/// Every method is a suspension point; the orchestrator wraps each call in
/// a bounded wait and never runs two calls for one session concurrently.
/// Implementations release their underlying automation handle on drop.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    type Page: Send + Sync + 'static;
    type Graph: Send + Sync + 'static;
    type Node: Send + Sync + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Submit the search term; resolves once the first result page is
    /// ready.
    async fn search(&self, term: &str) -> Result<Self::Page, Self::Error>;

    /// Raw candidate rows of the current page, in document order.
    async fn current_rows(&self, page: &Self::Page) -> Result<Vec<RowRecord>, Self::Error>;

    /// Whether a next-page control exists and the current page is not the
    /// last one.
    async fn has_next_page(&self, page: &Self::Page) -> Result<bool, Self::Error>;

    /// Activate the next-page control; resolves once the next page has
    /// replaced the current one.
    async fn goto_next_page(&self, page: Self::Page) -> Result<Self::Page, Self::Error>;

    /// Fetch one detail record. `Ok(None)` means the record was deleted
    /// upstream.
    async fn open_detail(&self, url: &Url) -> Result<Option<DetailRecord>, Self::Error>;

    /// Open the collaboration-graph view of a profile.
    async fn open_graph(&self, url: &Url) -> Result<Self::Graph, Self::Error>;

    /// All graph nodes in rendered order, leading placeholders included;
    /// resolves once the rendering surface is ready.
    async fn graph_nodes(&self, graph: &Self::Graph) -> Result<Vec<Self::Node>, Self::Error>;

    /// Label text of one graph node.
    async fn node_label(&self, node: &Self::Node) -> Result<String, Self::Error>;

    /// Select the node and read the detail URL it exposes. `Ok(None)` when
    /// no URL resolves.
    async fn resolve_node_target(&self, node: &Self::Node) -> Result<Option<String>, Self::Error>;
}

/// Acquisition seam for the navigation primitive.
///
/// Acquisition is scoped: the returned client owns its handle and releases
/// it on drop, on every exit path.
#[async_trait]
pub trait DirectoryBrowser: Send + Sync {
    type Client: DirectoryClient + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn acquire(&self) -> Result<Self::Client, Self::Error>;
}

/// Resolves configured filter identifiers to the exact names candidate
/// labels are compared against.
pub trait TaxonomyResolver: Send + Sync {
    fn field_name_by_id(&self, field_id: u32) -> Option<&str>;
    fn specialty_name_by_id(&self, field_id: u32, specialty_id: u32) -> Option<&str>;
}
