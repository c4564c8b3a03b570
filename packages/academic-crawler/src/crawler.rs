//! Two-stage crawl orchestration: profile discovery across result pages,
//! then the collaboration-graph walk for an email-matched profile.
//!
//! One crawl is a single cooperative task; every client call is a
//! suspension point and no two calls for the same session are ever in
//! flight concurrently. Events cross to the consumer over a bounded
//! channel and end with exactly one `completed` or `error` event.

use std::future::Future;
use std::sync::Arc;

use async_stream::stream;
use futures::{pin_mut, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::{CrawlConfig, SearchRequest};
use crate::error::CrawlError;
use crate::events::CrawlEvent;
use crate::extractor;
use crate::session::CrawlSession;
use crate::traits::{DirectoryBrowser, DirectoryClient, TaxonomyResolver};
use crate::types::Profile;

// Fixed progress checkpoints of stage 1.
const PROGRESS_SETUP: u8 = 5;
const PROGRESS_CONNECTED: u8 = 10;
const PROGRESS_SEARCHING: u8 = 15;
const PROGRESS_LISTING: u8 = 20;
const PROGRESS_DISCOVERY_END: u8 = 90;

// Stage 2 maps its walk linearly onto this band.
const PROGRESS_WALK_START: u8 = 50;
const PROGRESS_WALK_BAND: u8 = 40;

/// Leading graph nodes that render the profile itself and a placeholder;
/// always skipped.
const GRAPH_PLACEHOLDER_NODES: usize = 2;

const EVENT_BUFFER: usize = 32;

/// Discovery progress, spread linearly between the listing checkpoint and
/// the end of the discovery band across the configured cap.
fn discovery_progress(count: usize, limit: usize) -> u8 {
    let span = f64::from(PROGRESS_DISCOVERY_END - PROGRESS_LISTING);
    let step = span / limit.max(1) as f64;
    let percent = f64::from(PROGRESS_LISTING) + count as f64 * step;
    percent.min(f64::from(PROGRESS_DISCOVERY_END)) as u8
}

fn walk_progress(done: usize, total: usize) -> u8 {
    let fraction = done as f64 / total.max(1) as f64;
    (f64::from(PROGRESS_WALK_START) + fraction * f64::from(PROGRESS_WALK_BAND)) as u8
}

/// Filter identifiers resolved to names once, up front.
struct ResolvedFilter {
    field_name: Option<String>,
    specialty_names: Vec<String>,
}

impl ResolvedFilter {
    fn resolve(taxonomy: &impl TaxonomyResolver, request: &SearchRequest) -> Self {
        let field_name = request.field_id.and_then(|field_id| {
            let name = taxonomy.field_name_by_id(field_id);
            if name.is_none() {
                tracing::warn!(field_id, "unknown field id, field filter not applied");
            }
            name.map(String::from)
        });

        let mut specialty_names = Vec::new();
        match (request.field_id, &field_name) {
            (Some(field_id), Some(_)) => {
                for &specialty_id in &request.specialty_ids {
                    match taxonomy.specialty_name_by_id(field_id, specialty_id) {
                        Some(name) => specialty_names.push(name.to_string()),
                        None => tracing::warn!(
                            field_id,
                            specialty_id,
                            "unknown specialty id, ignored"
                        ),
                    }
                }
            }
            _ if !request.specialty_ids.is_empty() => {
                tracing::warn!("specialty filter requires a resolvable field id, ignored");
            }
            _ => {}
        }

        Self {
            field_name,
            specialty_names,
        }
    }

    /// Exact, case-sensitive comparison against the resolved names. A row
    /// must match the field and, when specialties are configured, at least
    /// one specialty.
    fn keeps(&self, profile: &Profile) -> bool {
        let Some(field_name) = &self.field_name else {
            return true;
        };
        if profile.field_label != *field_name {
            return false;
        }
        self.specialty_names.is_empty()
            || self
                .specialty_names
                .iter()
                .any(|name| profile.specialty_label == *name)
    }
}

/// Drives one crawl over an abstract directory client.
pub struct Crawler<B, T> {
    browser: B,
    taxonomy: T,
    config: CrawlConfig,
}

/// Consumer side of a spawned crawl.
pub struct CrawlHandle {
    events: mpsc::Receiver<CrawlEvent>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl CrawlHandle {
    /// Next event in emission order; `None` after the terminal event.
    pub async fn next_event(&mut self) -> Option<CrawlEvent> {
        self.events.recv().await
    }

    /// Request cancellation; takes effect at the next suspension point.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the crawl task to finish.
    pub async fn join(self) -> Result<(), tokio::task::JoinError> {
        let Self { events, task, .. } = self;
        // Keep the receiver alive so an unfinished crawl is not mistaken
        // for an abandoned one.
        let _events = events;
        task.await
    }
}

impl<B, T> Crawler<B, T>
where
    B: DirectoryBrowser + 'static,
    T: TaxonomyResolver + 'static,
{
    pub fn new(browser: B, taxonomy: T) -> Self {
        Self {
            browser,
            taxonomy,
            config: CrawlConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CrawlConfig) -> Self {
        self.config = config;
        self
    }

    /// Start the crawl on a background task and return the event handle.
    pub fn spawn(self, request: SearchRequest, session: Arc<CrawlSession>) -> CrawlHandle {
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            self.drive(request, session, task_cancel, tx).await;
        });
        CrawlHandle {
            events: rx,
            cancel,
            task,
        }
    }

    async fn drive(
        self,
        request: SearchRequest,
        session: Arc<CrawlSession>,
        cancel: CancellationToken,
        tx: mpsc::Sender<CrawlEvent>,
    ) {
        let session_id = session.session_id().to_string();
        let events = self.run(request, session.clone());
        pin_mut!(events);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    // Dropping the generator releases the client at the
                    // current suspension point.
                    tracing::info!(session_id = %session_id, "crawl cancelled");
                    let message = CrawlError::Cancelled.to_string();
                    session.set_error(message.clone()).await;
                    let _ = tx
                        .send(CrawlEvent::Error {
                            message,
                            session_id: session_id.clone(),
                        })
                        .await;
                    return;
                }
                event = events.next() => match event {
                    Some(event) => {
                        let terminal = event.is_terminal();
                        if tx.send(event).await.is_err() {
                            tracing::info!(
                                session_id = %session_id,
                                "event consumer went away, stopping crawl"
                            );
                            session.set_error("event consumer went away").await;
                            return;
                        }
                        if terminal {
                            return;
                        }
                    }
                    None => return,
                },
            }
        }
    }

    fn run(
        &self,
        request: SearchRequest,
        session: Arc<CrawlSession>,
    ) -> impl Stream<Item = CrawlEvent> + '_ {
        stream! {
            let session_id = session.session_id().to_string();
            let limit = self.config.profile_limit.max(1);

            // starting
            session
                .update_progress(PROGRESS_SETUP, "starting directory client")
                .await;
            yield CrawlEvent::Progress {
                percent: PROGRESS_SETUP,
                step: "starting directory client".into(),
            };

            let client = match tokio::time::timeout(
                self.config.navigation_timeout,
                self.browser.acquire(),
            )
            .await
            {
                Ok(Ok(client)) => client,
                Ok(Err(source)) => {
                    let error = CrawlError::Setup(Box::new(source));
                    tracing::error!(session_id = %session_id, error = %error, "crawl aborted");
                    session.set_error(error.to_string()).await;
                    yield CrawlEvent::Error {
                        message: error.to_string(),
                        session_id: session_id.clone(),
                    };
                    return;
                }
                Err(elapsed) => {
                    let error = CrawlError::Setup(Box::new(elapsed));
                    tracing::error!(session_id = %session_id, error = %error, "crawl aborted");
                    session.set_error(error.to_string()).await;
                    yield CrawlEvent::Error {
                        message: error.to_string(),
                        session_id: session_id.clone(),
                    };
                    return;
                }
            };

            // searching
            session
                .update_progress(PROGRESS_CONNECTED, "opening the directory")
                .await;
            yield CrawlEvent::Progress {
                percent: PROGRESS_CONNECTED,
                step: "opening the directory".into(),
            };
            let step = format!("searching for '{}'", request.term);
            session.update_progress(PROGRESS_SEARCHING, step.clone()).await;
            yield CrawlEvent::Progress {
                percent: PROGRESS_SEARCHING,
                step,
            };

            let mut page = match self.bounded("search", client.search(&request.term)).await {
                Ok(page) => page,
                Err(error) => {
                    tracing::error!(session_id = %session_id, error = %error, "search failed");
                    session.set_error(error.to_string()).await;
                    yield CrawlEvent::Error {
                        message: error.to_string(),
                        session_id: session_id.clone(),
                    };
                    return;
                }
            };

            session
                .update_progress(PROGRESS_LISTING, "loading the result list")
                .await;
            yield CrawlEvent::Progress {
                percent: PROGRESS_LISTING,
                step: "loading the result list".into(),
            };

            let filter = ResolvedFilter::resolve(&self.taxonomy, &request);
            let mut matched: Option<Profile> = None;
            let mut page_num = 1usize;

            // paging
            'paging: loop {
                let rows = match self.bounded("load rows", client.current_rows(&page)).await {
                    Ok(rows) => rows,
                    Err(error) if session.profile_count() > 0 => {
                        // Results already accumulated stay valid; treat the
                        // page as unreachable and stop paginating.
                        tracing::warn!(
                            session_id = %session_id,
                            page = page_num,
                            error = %error,
                            "result page unreachable, stopping discovery"
                        );
                        break 'paging;
                    }
                    Err(error) => {
                        tracing::error!(session_id = %session_id, error = %error, "discovery failed");
                        session.set_error(error.to_string()).await;
                        yield CrawlEvent::Error {
                            message: error.to_string(),
                            session_id: session_id.clone(),
                        };
                        return;
                    }
                };
                if rows.is_empty() {
                    break; // exhausted
                }
                tracing::debug!(session_id = %session_id, page = page_num, rows = rows.len(), "page loaded");

                for row in rows {
                    let id = (session.profile_count() + 1) as u32;
                    let profile = match extractor::extract_profile(&row, id) {
                        Ok(profile) => profile,
                        Err(error) => {
                            tracing::warn!(
                                session_id = %session_id,
                                page = page_num,
                                error = %error,
                                "skipping unparsable row"
                            );
                            continue;
                        }
                    };

                    if !filter.keeps(&profile) {
                        continue;
                    }
                    if session.has_profile_url(&profile.url) {
                        continue;
                    }

                    if let Some(target) = &request.email {
                        let matches = profile
                            .email
                            .as_deref()
                            .is_some_and(|email| email.eq_ignore_ascii_case(target));
                        if matches {
                            session.add_profile(profile.clone()).await;
                            tracing::info!(
                                session_id = %session_id,
                                url = %profile.url,
                                "email match found"
                            );
                            yield CrawlEvent::EmailMatch {
                                message: format!("email match found: {}", profile.name),
                                profile: profile.clone(),
                            };
                            matched = Some(profile);
                            break 'paging;
                        }
                    }

                    if !session.add_profile(profile.clone()).await {
                        continue;
                    }
                    let count = session.profile_count();
                    let percent = discovery_progress(count, limit);
                    session
                        .update_progress(
                            percent,
                            format!("processed profile {count}/{limit}: {}", profile.name),
                        )
                        .await;
                    yield CrawlEvent::ProfileAdded {
                        profile,
                        count,
                        percent,
                    };

                    if count >= limit {
                        tracing::info!(session_id = %session_id, count, "profile cap reached");
                        break 'paging; // limited
                    }
                }

                match self.bounded("next page check", client.has_next_page(&page)).await {
                    Ok(true) => {}
                    Ok(false) => break, // exhausted
                    Err(error) => {
                        tracing::warn!(session_id = %session_id, error = %error, "pagination stopped");
                        break;
                    }
                }
                page = match self.bounded("next page", client.goto_next_page(page)).await {
                    Ok(page) => page,
                    Err(error) => {
                        tracing::warn!(session_id = %session_id, error = %error, "pagination stopped");
                        break;
                    }
                };
                page_num += 1;
            }

            let Some(profile) = matched else {
                // done without a match
                session
                    .update_progress(PROGRESS_DISCOVERY_END, "profile discovery complete")
                    .await;
                yield CrawlEvent::Progress {
                    percent: PROGRESS_DISCOVERY_END,
                    step: "profile discovery complete".into(),
                };
                session.update_progress(100, "crawl complete").await;
                yield CrawlEvent::Completed {
                    session_id: session_id.clone(),
                    profiles_count: session.profile_count(),
                    collaborators_count: session.collaborator_count(),
                };
                return;
            };

            // stage 2: collaborator graph walk
            let step = format!("collecting collaborators for {}", profile.name);
            session.update_progress(PROGRESS_WALK_START, step.clone()).await;
            yield CrawlEvent::Progress {
                percent: PROGRESS_WALK_START,
                step,
            };

            let graph = match self.bounded("open graph", client.open_graph(&profile.url)).await {
                Ok(graph) => graph,
                Err(error) => {
                    tracing::error!(session_id = %session_id, error = %error, "graph walk failed");
                    session.set_error(error.to_string()).await;
                    yield CrawlEvent::Error {
                        message: error.to_string(),
                        session_id: session_id.clone(),
                    };
                    return;
                }
            };
            let nodes = match self.bounded("graph nodes", client.graph_nodes(&graph)).await {
                Ok(nodes) => nodes,
                Err(error) => {
                    tracing::error!(session_id = %session_id, error = %error, "graph walk failed");
                    session.set_error(error.to_string()).await;
                    yield CrawlEvent::Error {
                        message: error.to_string(),
                        session_id: session_id.clone(),
                    };
                    return;
                }
            };

            let total = nodes.len().saturating_sub(GRAPH_PLACEHOLDER_NODES);
            tracing::info!(session_id = %session_id, total, "walking collaboration graph");

            for (index, node) in nodes.iter().skip(GRAPH_PLACEHOLDER_NODES).enumerate() {
                let id = (index + 1) as u32;

                let label = match self.bounded("node label", client.node_label(node)).await {
                    Ok(label) => label,
                    Err(error) => {
                        tracing::warn!(
                            session_id = %session_id,
                            node = id,
                            error = %error,
                            "node label unreadable"
                        );
                        String::new()
                    }
                };
                let target = match self
                    .bounded("node target", client.resolve_node_target(node))
                    .await
                {
                    Ok(target) => target,
                    Err(error) => {
                        tracing::warn!(
                            session_id = %session_id,
                            node = id,
                            error = %error,
                            "node target unresolvable"
                        );
                        None
                    }
                };
                let target_url = target
                    .filter(|target| !target.trim().is_empty())
                    .and_then(|target| match Url::parse(target.trim()) {
                        Ok(url) => Some(url),
                        Err(error) => {
                            tracing::warn!(
                                session_id = %session_id,
                                node = id,
                                error = %error,
                                "node target is not a URL"
                            );
                            None
                        }
                    });

                let collaborator = match target_url {
                    None => extractor::extract_collaborator(&label, None, None, id),
                    Some(url) => {
                        match self.bounded("open detail", client.open_detail(&url)).await {
                            Ok(detail) => {
                                extractor::extract_collaborator(&label, Some(url), detail.as_ref(), id)
                            }
                            Err(error) => {
                                // One unreadable detail page degrades to a
                                // partial record, the walk goes on.
                                tracing::warn!(
                                    session_id = %session_id,
                                    node = id,
                                    error = %error,
                                    "detail fetch failed, keeping partial record"
                                );
                                extractor::partial_collaborator(&label, url, id)
                            }
                        }
                    }
                };

                session.add_collaborator(collaborator.clone()).await;
                let count = session.collaborator_count();
                let percent = walk_progress(count, total);
                session
                    .update_progress(
                        percent,
                        format!("collaborator {count}/{total}: {}", collaborator.name),
                    )
                    .await;
                yield CrawlEvent::CollaboratorAdded {
                    collaborator,
                    count,
                    total,
                    percent,
                };
            }

            session.update_progress(100, "crawl complete").await;
            yield CrawlEvent::Completed {
                session_id: session_id.clone(),
                profiles_count: session.profile_count(),
                collaborators_count: session.collaborator_count(),
            };
        }
    }

    /// Bound one client call with the configured per-wait ceiling.
    async fn bounded<V, E, F>(&self, step: &'static str, fut: F) -> Result<V, CrawlError>
    where
        F: Future<Output = Result<V, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        match tokio::time::timeout(self.config.navigation_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(CrawlError::Navigation {
                step,
                source: Box::new(source),
            }),
            Err(_) => Err(CrawlError::NavigationTimeout { step }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::StaticTaxonomy;
    use crate::types::DEFAULT_PHOTO_URL;

    #[test]
    fn discovery_progress_spans_the_band() {
        assert_eq!(discovery_progress(1, 50), 21);
        assert_eq!(discovery_progress(25, 50), 55);
        assert_eq!(discovery_progress(50, 50), 90);
        // Never leaves the band, even past the cap.
        assert_eq!(discovery_progress(80, 50), 90);
    }

    #[test]
    fn walk_progress_spans_its_band() {
        assert_eq!(walk_progress(0, 4), 50);
        assert_eq!(walk_progress(2, 4), 70);
        assert_eq!(walk_progress(4, 4), 90);
        assert_eq!(walk_progress(0, 0), 50);
    }

    fn labeled_profile(field: &str, specialty: &str) -> Profile {
        Profile {
            id: 1,
            name: "X".into(),
            title: String::new(),
            url: Url::parse("https://directory.example/profile/1").unwrap(),
            header: String::new(),
            field_label: field.into(),
            specialty_label: specialty.into(),
            keywords: Vec::new(),
            email: None,
            photo_url: DEFAULT_PHOTO_URL.into(),
        }
    }

    fn taxonomy() -> StaticTaxonomy {
        StaticTaxonomy::from_json(
            r#"[{"id": 1, "name": "Fen Bilimleri",
                 "specialties": [{"id": 10, "name": "Biyoloji"}, {"id": 11, "name": "Kimya"}]}]"#,
        )
        .unwrap()
    }

    #[test]
    fn field_filter_alone_ignores_specialty() {
        let request = SearchRequest::new("x").with_field(1);
        let filter = ResolvedFilter::resolve(&taxonomy(), &request);
        assert!(filter.keeps(&labeled_profile("Fen Bilimleri", "Biyoloji")));
        assert!(filter.keeps(&labeled_profile("Fen Bilimleri", "Fizik")));
        assert!(!filter.keeps(&labeled_profile("Mühendislik", "Biyoloji")));
    }

    #[test]
    fn specialty_filter_requires_one_match() {
        let request = SearchRequest::new("x").with_field(1).with_specialties([10, 11]);
        let filter = ResolvedFilter::resolve(&taxonomy(), &request);
        assert!(filter.keeps(&labeled_profile("Fen Bilimleri", "Kimya")));
        assert!(!filter.keeps(&labeled_profile("Fen Bilimleri", "Fizik")));
        assert!(!filter.keeps(&labeled_profile("Mühendislik", "Kimya")));
    }

    #[test]
    fn specialty_ids_without_field_are_ignored() {
        let request = SearchRequest::new("x").with_specialties([10]);
        let filter = ResolvedFilter::resolve(&taxonomy(), &request);
        assert!(filter.keeps(&labeled_profile("Mühendislik", "Fizik")));
    }

    #[test]
    fn unknown_field_id_disables_the_filter() {
        let request = SearchRequest::new("x").with_field(99).with_specialties([10]);
        let filter = ResolvedFilter::resolve(&taxonomy(), &request);
        assert!(filter.keeps(&labeled_profile("Mühendislik", "Fizik")));
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let request = SearchRequest::new("x").with_field(1);
        let filter = ResolvedFilter::resolve(&taxonomy(), &request);
        assert!(!filter.keeps(&labeled_profile("fen bilimleri", "Biyoloji")));
    }
}
