//! Scripted fakes for exercising the orchestrator without a real
//! browser-automation driver.
//!
//! [`ScriptedDirectory`] is pure data: result pages, detail pages and one
//! collaboration graph, plus optional fault points that make a specific
//! call fail or stall until the orchestrator's wait ceiling fires.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::traits::{DetailRecord, DirectoryBrowser, DirectoryClient, RowRecord};

/// Long enough that only the orchestrator's ceiling can end the wait.
const STALL: Duration = Duration::from_secs(3600);

#[derive(Debug, Error)]
#[error("scripted failure in {0}")]
pub struct ScriptError(pub &'static str);

/// Selects one invocation of one client method.
#[derive(Debug, Clone, Copy)]
pub struct FaultPoint {
    pub method: &'static str,
    /// 1-based occurrence of the call.
    pub call: usize,
}

impl FaultPoint {
    pub fn first(method: &'static str) -> Self {
        Self { method, call: 1 }
    }

    pub fn nth(method: &'static str, call: usize) -> Self {
        Self { method, call }
    }

    fn hits(&self, method: &'static str, occurrence: usize) -> bool {
        self.method == method && self.call == occurrence
    }
}

/// Behavior of one detail URL in the script.
#[derive(Debug, Clone)]
pub enum DetailScript {
    Found(DetailRecord),
    /// The record was deleted upstream; `open_detail` resolves to `None`.
    Deleted,
    /// The fetch fails outright.
    Fails,
}

/// One graph node: a label plus the target URL selecting it exposes.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub label: String,
    pub target: Option<String>,
}

impl GraphNode {
    pub fn new(label: impl Into<String>, target: Option<&str>) -> Self {
        Self {
            label: label.into(),
            target: target.map(String::from),
        }
    }

    /// A leading self/placeholder node.
    pub fn placeholder() -> Self {
        Self {
            label: String::new(),
            target: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedDirectory {
    /// Candidate rows per result page.
    pub pages: Vec<Vec<RowRecord>>,
    /// Detail behavior keyed by URL; unknown URLs count as deleted.
    pub details: HashMap<String, DetailScript>,
    /// Graph nodes in rendered order, placeholders included.
    pub graph: Vec<GraphNode>,
    pub fail_on: Option<FaultPoint>,
    pub stall_on: Option<FaultPoint>,
}

#[derive(Default)]
struct CallState {
    log: Vec<String>,
    counts: HashMap<&'static str, usize>,
}

/// Handle onto the method-call log, for assertions after the crawl.
#[derive(Clone)]
pub struct CallLog(Arc<Mutex<CallState>>);

impl CallLog {
    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().log.clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.0
            .lock()
            .unwrap()
            .counts
            .get(method)
            .copied()
            .unwrap_or(0)
    }
}

async fn gate(
    script: &ScriptedDirectory,
    state: &Mutex<CallState>,
    method: &'static str,
) -> Result<(), ScriptError> {
    let occurrence = {
        let mut state = state.lock().unwrap();
        state.log.push(method.to_string());
        let count = state.counts.entry(method).or_insert(0);
        *count += 1;
        *count
    };
    if matches!(script.fail_on, Some(point) if point.hits(method, occurrence)) {
        return Err(ScriptError(method));
    }
    if matches!(script.stall_on, Some(point) if point.hits(method, occurrence)) {
        tokio::time::sleep(STALL).await;
    }
    Ok(())
}

pub struct ScriptedBrowser {
    script: Arc<ScriptedDirectory>,
    state: Arc<Mutex<CallState>>,
}

impl ScriptedBrowser {
    pub fn new(script: ScriptedDirectory) -> Self {
        Self {
            script: Arc::new(script),
            state: Arc::new(Mutex::new(CallState::default())),
        }
    }

    pub fn call_log(&self) -> CallLog {
        CallLog(self.state.clone())
    }
}

#[async_trait]
impl DirectoryBrowser for ScriptedBrowser {
    type Client = ScriptedClient;
    type Error = ScriptError;

    async fn acquire(&self) -> Result<ScriptedClient, ScriptError> {
        gate(&self.script, &self.state, "acquire").await?;
        Ok(ScriptedClient {
            script: self.script.clone(),
            state: self.state.clone(),
        })
    }
}

pub struct ScriptedClient {
    script: Arc<ScriptedDirectory>,
    state: Arc<Mutex<CallState>>,
}

#[async_trait]
impl DirectoryClient for ScriptedClient {
    type Page = usize;
    type Graph = ();
    type Node = GraphNode;
    type Error = ScriptError;

    async fn search(&self, _term: &str) -> Result<usize, ScriptError> {
        gate(&self.script, &self.state, "search").await?;
        Ok(0)
    }

    async fn current_rows(&self, page: &usize) -> Result<Vec<RowRecord>, ScriptError> {
        gate(&self.script, &self.state, "current_rows").await?;
        Ok(self.script.pages.get(*page).cloned().unwrap_or_default())
    }

    async fn has_next_page(&self, page: &usize) -> Result<bool, ScriptError> {
        gate(&self.script, &self.state, "has_next_page").await?;
        Ok(page + 1 < self.script.pages.len())
    }

    async fn goto_next_page(&self, page: usize) -> Result<usize, ScriptError> {
        gate(&self.script, &self.state, "goto_next_page").await?;
        Ok(page + 1)
    }

    async fn open_detail(&self, url: &Url) -> Result<Option<DetailRecord>, ScriptError> {
        gate(&self.script, &self.state, "open_detail").await?;
        match self.script.details.get(url.as_str()) {
            Some(DetailScript::Found(detail)) => Ok(Some(detail.clone())),
            Some(DetailScript::Deleted) | None => Ok(None),
            Some(DetailScript::Fails) => Err(ScriptError("open_detail")),
        }
    }

    async fn open_graph(&self, _url: &Url) -> Result<(), ScriptError> {
        gate(&self.script, &self.state, "open_graph").await
    }

    async fn graph_nodes(&self, _graph: &()) -> Result<Vec<GraphNode>, ScriptError> {
        gate(&self.script, &self.state, "graph_nodes").await?;
        Ok(self.script.graph.clone())
    }

    async fn node_label(&self, node: &GraphNode) -> Result<String, ScriptError> {
        gate(&self.script, &self.state, "node_label").await?;
        Ok(node.label.clone())
    }

    async fn resolve_node_target(&self, node: &GraphNode) -> Result<Option<String>, ScriptError> {
        gate(&self.script, &self.state, "resolve_node_target").await?;
        Ok(node.target.clone())
    }
}

/// Convenience row for scripted listings: the info cell carries title,
/// name, header, label line and a keyword line, the way listing markup
/// renders them.
pub fn listing_row(name: &str, url: &str, field: &str, specialty: &str, email: &str) -> RowRecord {
    RowRecord {
        name: name.into(),
        url: url.into(),
        info: format!(
            "PROFESÖR\n{name}\nÖRNEK ÜNİVERSİTESİ/FEN FAKÜLTESİ\n{field}   {specialty}\nkw1; kw2"
        ),
        field_label: field.into(),
        specialty_label: specialty.into(),
        email: email.into(),
        photo_url: None,
    }
}

/// Convenience detail fragment for scripted detail pages.
pub fn detail_record(title: &str, name: &str, label_line: &str, email: &str) -> DetailRecord {
    DetailRecord {
        info: format!("{title}\n{name}\nBAŞKA ÜNİVERSİTESİ"),
        label_line: label_line.into(),
        email: email.into(),
        photo_url: None,
    }
}
