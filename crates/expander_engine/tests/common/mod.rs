#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use expander_core::{
    DocumentView, DomError, MutationObserver, MutationRecord, ObserveOptions, ResourceId,
};
use expander_engine::{Expander, ExpanderConfig, FailureKind, FetchError, FetchedDocument, Fetcher};
use tokio::sync::Semaphore;

pub const CONTAINER: &str = r#"div[id=":5"] + div"#;
pub const PRIMARY_MARKER: &str = "vem";
pub const FALLBACK_MARKER: &str = ".ii.gt > div > div > br + br + a";
pub const BODY: &str = ".a3s";
pub const INBOX_VIEW: &str = "#inbox/FMfcgzGxyz";

pub fn message_url(msg: &str) -> String {
    format!("https://mail.google.com/mail/u/0/?ui=2&view=lg&msg={msg}")
}

pub fn message_page(font_html: &str) -> String {
    format!(
        r#"<html><body><div class="message"><div><font>{font_html}</font></div></div></body></html>"#
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

pub const ROOT: NodeId = NodeId(0);

#[derive(Debug, Default)]
struct FakeNode {
    parent: Option<NodeId>,
    selectors: Vec<String>,
    href: Option<String>,
    expanded: bool,
    html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffordanceRecord {
    pub target: NodeId,
    pub marker: NodeId,
    pub text: String,
    pub dismissed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AffordanceId(usize);

#[derive(Debug)]
struct ObserverRecord {
    container: NodeId,
    options: ObserveOptions,
    active: Rc<Cell<bool>>,
}

pub struct FakeObserver {
    active: Rc<Cell<bool>>,
}

impl MutationObserver for FakeObserver {
    fn disconnect(&mut self) {
        self.active.set(false);
    }
}

/// One message row as the host renders it: a target with a body region holding
/// the truncated preview and its marker.
#[derive(Debug, Clone, Copy)]
pub struct Message {
    pub target: NodeId,
    pub body: NodeId,
    pub marker: NodeId,
}

impl Message {
    pub fn record(&self) -> MutationRecord<NodeId> {
        MutationRecord::new(self.target)
    }
}

/// In-memory page. Selector matching is by exact string: every node lists the
/// selectors it answers to.
pub struct FakeDom {
    nodes: RefCell<Vec<FakeNode>>,
    fragment: RefCell<String>,
    affordances: RefCell<Vec<AffordanceRecord>>,
    observers: RefCell<Vec<ObserverRecord>>,
}

impl FakeDom {
    pub fn new(fragment: &str) -> Self {
        Self {
            nodes: RefCell::new(vec![FakeNode::default()]),
            fragment: RefCell::new(fragment.to_string()),
            affordances: RefCell::new(Vec::new()),
            observers: RefCell::new(Vec::new()),
        }
    }

    pub fn add(&self, parent: NodeId, selectors: &[&str]) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(FakeNode {
            parent: Some(parent),
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            ..FakeNode::default()
        });
        NodeId(nodes.len() - 1)
    }

    pub fn add_container(&self) -> NodeId {
        self.add(ROOT, &[CONTAINER])
    }

    pub fn add_message(&self, list: NodeId, href: &str) -> Message {
        self.add_message_with(list, href, PRIMARY_MARKER)
    }

    pub fn add_message_with(&self, list: NodeId, href: &str, marker_selector: &str) -> Message {
        let target = self.add(list, &["div.adn"]);
        let body = self.add(target, &[BODY]);
        self.nodes.borrow_mut()[body.0].html = "Preview text…".to_string();
        let marker = self.add(body, &[marker_selector]);
        self.nodes.borrow_mut()[marker.0].href = Some(href.to_string());
        Message {
            target,
            body,
            marker,
        }
    }

    pub fn set_href(&self, node: NodeId, href: Option<&str>) {
        self.nodes.borrow_mut()[node.0].href = href.map(str::to_string);
    }

    pub fn set_fragment(&self, fragment: &str) {
        *self.fragment.borrow_mut() = fragment.to_string();
    }

    pub fn detach(&self, node: NodeId) {
        self.nodes.borrow_mut()[node.0].parent = None;
    }

    pub fn is_expanded_node(&self, node: NodeId) -> bool {
        self.nodes.borrow()[node.0].expanded
    }

    pub fn html(&self, node: NodeId) -> String {
        self.nodes.borrow()[node.0].html.clone()
    }

    pub fn affordances(&self) -> Vec<AffordanceRecord> {
        self.affordances.borrow().clone()
    }

    pub fn affordances_for(&self, target: NodeId) -> Vec<AffordanceRecord> {
        self.affordances()
            .into_iter()
            .filter(|a| a.target == target)
            .collect()
    }

    pub fn active_observers(&self) -> Vec<(NodeId, ObserveOptions)> {
        self.observers
            .borrow()
            .iter()
            .filter(|o| o.active.get())
            .map(|o| (o.container, o.options))
            .collect()
    }

    fn is_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        let nodes = self.nodes.borrow();
        let mut current = nodes[node.0].parent;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = nodes[id.0].parent;
        }
        false
    }

    fn first_match(&self, subtree: NodeId, selector: &str) -> Option<NodeId> {
        let count = self.nodes.borrow().len();
        (0..count).map(NodeId).find(|&id| {
            self.nodes.borrow()[id.0]
                .selectors
                .iter()
                .any(|s| s == selector)
                && self.is_descendant(id, subtree)
        })
    }
}

impl DocumentView for FakeDom {
    type Node = NodeId;
    type Observer = FakeObserver;
    type Affordance = AffordanceId;

    fn location_fragment(&self) -> String {
        self.fragment.borrow().clone()
    }

    fn find_container(&self, selector: &str) -> Option<NodeId> {
        self.first_match(ROOT, selector)
    }

    fn observe(&self, container: &NodeId, options: ObserveOptions) -> FakeObserver {
        let active = Rc::new(Cell::new(true));
        self.observers.borrow_mut().push(ObserverRecord {
            container: *container,
            options,
            active: Rc::clone(&active),
        });
        FakeObserver { active }
    }

    fn find_marker(&self, subtree: &NodeId, selector: &str) -> Option<NodeId> {
        self.first_match(*subtree, selector)
    }

    fn marker_link(&self, marker: &NodeId) -> Option<String> {
        self.nodes.borrow()[marker.0].href.clone()
    }

    fn is_expanded(&self, node: &NodeId) -> bool {
        self.nodes.borrow()[node.0].expanded
    }

    fn mark_expanded(&self, node: &NodeId) {
        self.nodes.borrow_mut()[node.0].expanded = true;
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        *node == ROOT || self.is_descendant(*node, ROOT)
    }

    fn replace_body(
        &self,
        target: &NodeId,
        body_selector: &str,
        fragment_html: &str,
    ) -> Result<(), DomError> {
        let body = self
            .first_match(*target, body_selector)
            .ok_or_else(|| DomError::MissingRegion {
                selector: body_selector.to_string(),
            })?;
        self.nodes.borrow_mut()[body.0].html = fragment_html.to_string();
        Ok(())
    }

    fn show_progress(&self, target: &NodeId, marker: &NodeId, text: &str) -> AffordanceId {
        let mut affordances = self.affordances.borrow_mut();
        affordances.push(AffordanceRecord {
            target: *target,
            marker: *marker,
            text: text.to_string(),
            dismissed: false,
        });
        AffordanceId(affordances.len() - 1)
    }

    fn show_failure(&self, affordance: &AffordanceId, suffix: &str) {
        self.affordances.borrow_mut()[affordance.0].text.push_str(suffix);
    }

    fn dismiss(&self, affordance: &AffordanceId) {
        self.affordances.borrow_mut()[affordance.0].dismissed = true;
    }
}

/// Fetcher answering from per-URL queues. Optionally holds every request until
/// [`ScriptedFetcher::open_gate`] is called.
pub struct ScriptedFetcher {
    responses: Mutex<HashMap<String, VecDeque<Result<FetchedDocument, FetchError>>>>,
    calls: Mutex<Vec<String>>,
    gate: Option<Semaphore>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new()
        }
    }

    pub fn respond(&self, url: &str, result: Result<FetchedDocument, FetchError>) {
        self.responses
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(result);
    }

    pub fn respond_with_message(&self, url: &str, font_html: &str) {
        self.respond(url, Ok(FetchedDocument::new(url, message_page(font_html))));
    }

    pub fn fail(&self, url: &str, kind: FailureKind) {
        self.respond(url, Err(FetchError::new(kind, "scripted failure")));
    }

    pub fn open_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1_000);
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls().iter().filter(|u| u.as_str() == url).count()
    }
}

#[async_trait::async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, id: &ResourceId) -> Result<FetchedDocument, FetchError> {
        self.calls.lock().unwrap().push(id.to_string());
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.expect("gate closed");
        }
        self.responses
            .lock()
            .unwrap()
            .get_mut(id.as_str())
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(FetchError::new(
                    FailureKind::Network,
                    format!("no scripted response for {id}"),
                ))
            })
    }
}

pub fn expander(dom: FakeDom, fetcher: &Arc<ScriptedFetcher>) -> Expander<FakeDom> {
    expander_logging::initialize_for_tests();
    let fetcher: Arc<dyn Fetcher> = fetcher.clone();
    let expander = Expander::new(dom, fetcher, &ExpanderConfig::default()).unwrap();
    expander.start();
    expander
}

/// Lets spawned pipelines run until they block on something.
pub async fn run_pending() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
