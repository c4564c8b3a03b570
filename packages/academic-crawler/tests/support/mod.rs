#![allow(dead_code)]

use std::sync::Arc;

use academic_crawler::testing::{ScriptedBrowser, ScriptedDirectory};
use academic_crawler::{
    CrawlConfig, CrawlEvent, CrawlHandle, CrawlSession, Crawler, MemorySessionStore,
    SearchRequest, StaticTaxonomy,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn taxonomy() -> StaticTaxonomy {
    StaticTaxonomy::from_json(
        r#"[
            {
                "id": 1,
                "name": "Fen Bilimleri",
                "specialties": [
                    { "id": 10, "name": "Biyoloji" },
                    { "id": 11, "name": "Kimya" }
                ]
            },
            { "id": 2, "name": "Mühendislik" }
        ]"#,
    )
    .unwrap()
}

pub fn session(id: &str) -> (Arc<MemorySessionStore>, Arc<CrawlSession>) {
    let store = Arc::new(MemorySessionStore::new());
    let session = CrawlSession::new(id, store.clone());
    (store, session)
}

/// Spawn a crawl over a scripted directory and hand back the pieces tests
/// assert on.
pub fn spawn_crawl(
    script: ScriptedDirectory,
    request: SearchRequest,
    config: CrawlConfig,
) -> (
    CrawlHandle,
    Arc<CrawlSession>,
    Arc<MemorySessionStore>,
    academic_crawler::testing::CallLog,
) {
    init_tracing();
    let browser = ScriptedBrowser::new(script);
    let call_log = browser.call_log();
    let (store, session) = session("test-session");
    let handle = Crawler::new(browser, taxonomy())
        .with_config(config)
        .spawn(request, session.clone());
    (handle, session, store, call_log)
}

/// Receive events until the stream ends, then join the crawl task.
pub async fn drain(mut handle: CrawlHandle) -> Vec<CrawlEvent> {
    let mut events = Vec::new();
    while let Some(event) = handle.next_event().await {
        events.push(event);
    }
    handle.join().await.unwrap();
    events
}

/// Every stream must end with its single terminal event, and progress
/// percentages must never decrease.
pub fn assert_stream_invariants(events: &[CrawlEvent]) {
    let terminal_count = events.iter().filter(|e| e.is_terminal()).count();
    assert_eq!(terminal_count, 1, "expected exactly one terminal event");
    assert!(
        events.last().is_some_and(|e| e.is_terminal()),
        "terminal event must come last"
    );

    let mut last_percent = 0u8;
    for event in events {
        let percent = match event {
            CrawlEvent::Progress { percent, .. }
            | CrawlEvent::ProfileAdded { percent, .. }
            | CrawlEvent::CollaboratorAdded { percent, .. } => *percent,
            _ => continue,
        };
        assert!(
            percent >= last_percent,
            "progress went backward: {last_percent} -> {percent}"
        );
        last_percent = percent;
    }
}

pub fn profiles_added(events: &[CrawlEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, CrawlEvent::ProfileAdded { .. }))
        .count()
}

pub fn collaborators_added(events: &[CrawlEvent]) -> Vec<academic_crawler::Collaborator> {
    events
        .iter()
        .filter_map(|e| match e {
            CrawlEvent::CollaboratorAdded { collaborator, .. } => Some(collaborator.clone()),
            _ => None,
        })
        .collect()
}
