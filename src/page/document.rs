//! Document model: elements, the element factory capability, attached nodes
//! and subtree mutation observers.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

pub type NodeId = u64;
pub type ObserverId = u64;

/// Where a node is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Head,
    Body,
}

/// Decides whether an attribute write on a detached element takes effect.
pub trait AttributeGuard: Send + Sync {
    fn permits(&self, tag: &str, name: &str, value: &str) -> bool;
}

/// A detached element, as returned by the element factory or by markup parsing.
#[derive(Clone)]
pub struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    guard: Option<Arc<dyn AttributeGuard>>,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("attributes", &self.attributes)
            .field("guarded", &self.guard.is_some())
            .finish()
    }
}

impl Element {
    /// Build an element directly, the way the markup parser does; no factory
    /// wrapper gets a chance to guard it.
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            guard: None,
        }
    }

    pub fn guarded(mut self, guard: Arc<dyn AttributeGuard>) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is_script(&self) -> bool {
        self.tag == "script"
    }

    /// Returns `false` when a guard silently dropped the write.
    pub fn set_attribute(&mut self, name: &str, value: &str) -> bool {
        if let Some(guard) = &self.guard
            && !guard.permits(&self.tag, name, value)
        {
            return false;
        }
        self.attributes
            .insert(name.to_ascii_lowercase(), value.to_string());
        true
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn src(&self) -> Option<&str> {
        self.attribute("src")
    }
}

/// `document.createElement`.
pub trait ElementFactory: Send + Sync {
    fn create_element(&self, tag: &str) -> Element;
}

/// The pristine browser factory.
pub struct NativeElementFactory;

impl ElementFactory for NativeElementFactory {
    fn create_element(&self, tag: &str) -> Element {
        Element::new(tag)
    }
}

/// Snapshot of a node attached to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedNode {
    pub id: NodeId,
    pub region: Region,
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
}

impl AttachedNode {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn src(&self) -> Option<&str> {
        self.attribute("src")
    }

    pub fn element_id(&self) -> Option<&str> {
        self.attribute("id")
    }

    pub fn is_script(&self) -> bool {
        self.tag == "script"
    }
}

/// Receives batches of newly attached nodes, one batch per observer tick.
pub trait MutationListener: Send + Sync {
    fn on_nodes_added(&self, document: &dyn Document, added: &[AttachedNode]);
}

pub trait Document: Send + Sync {
    fn append(&self, region: Region, element: Element) -> NodeId;

    fn remove(&self, node: NodeId) -> bool;

    fn node(&self, node: NodeId) -> Option<AttachedNode>;

    fn nodes(&self) -> Vec<AttachedNode>;

    /// Write an attribute on an attached node (property assignment; bypasses
    /// any factory guard).
    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> bool;

    fn observe_subtree(&self, listener: Arc<dyn MutationListener>) -> ObserverId;

    fn disconnect(&self, observer: ObserverId) -> bool;

    /// Run one observer tick: hand every queued record to every connected
    /// listener.
    fn deliver_mutations(&self);

    fn scripts(&self) -> Vec<AttachedNode> {
        self.nodes()
            .into_iter()
            .filter(AttachedNode::is_script)
            .collect()
    }

    fn find_by_element_id(&self, id: &str) -> Option<AttachedNode> {
        self.nodes()
            .into_iter()
            .find(|node| node.element_id() == Some(id))
    }
}

#[derive(Default)]
struct DocumentState {
    next_node: NodeId,
    next_observer: ObserverId,
    nodes: BTreeMap<NodeId, AttachedNode>,
    listeners: BTreeMap<ObserverId, Arc<dyn MutationListener>>,
    pending: Vec<AttachedNode>,
}

/// In-memory document used by tests and the simulator.
#[derive(Default)]
pub struct InMemoryDocument {
    state: Mutex<DocumentState>,
}

impl InMemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DocumentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn observer_count(&self) -> usize {
        self.lock().listeners.len()
    }
}

impl Document for InMemoryDocument {
    fn append(&self, region: Region, element: Element) -> NodeId {
        let mut state = self.lock();
        state.next_node += 1;
        let id = state.next_node;
        let node = AttachedNode {
            id,
            region,
            tag: element.tag,
            attributes: element.attributes,
        };
        if !state.listeners.is_empty() {
            state.pending.push(node.clone());
        }
        state.nodes.insert(id, node);
        id
    }

    fn remove(&self, node: NodeId) -> bool {
        self.lock().nodes.remove(&node).is_some()
    }

    fn node(&self, node: NodeId) -> Option<AttachedNode> {
        self.lock().nodes.get(&node).cloned()
    }

    fn nodes(&self) -> Vec<AttachedNode> {
        self.lock().nodes.values().cloned().collect()
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> bool {
        let mut state = self.lock();
        match state.nodes.get_mut(&node) {
            Some(attached) => {
                attached
                    .attributes
                    .insert(name.to_ascii_lowercase(), value.to_string());
                true
            }
            None => false,
        }
    }

    fn observe_subtree(&self, listener: Arc<dyn MutationListener>) -> ObserverId {
        let mut state = self.lock();
        state.next_observer += 1;
        let id = state.next_observer;
        state.listeners.insert(id, listener);
        id
    }

    fn disconnect(&self, observer: ObserverId) -> bool {
        let mut state = self.lock();
        let removed = state.listeners.remove(&observer).is_some();
        if state.listeners.is_empty() {
            state.pending.clear();
        }
        removed
    }

    fn deliver_mutations(&self) {
        let (records, listeners) = {
            let mut state = self.lock();
            if state.pending.is_empty() {
                return;
            }
            let records = std::mem::take(&mut state.pending);
            let listeners: Vec<_> = state.listeners.values().cloned().collect();
            (records, listeners)
        };
        for listener in listeners {
            listener.on_nodes_added(self, &records);
        }
    }
}
