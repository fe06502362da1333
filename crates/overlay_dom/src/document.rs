use std::sync::mpsc;

use ego_tree::{NodeId, Tree};
use scraper::node::Node;
use scraper::{ElementRef, Html};

use crate::watcher::{MutationBatch, MutationKind, MutationRecord, ObserveOptions};

pub type ObserverId = u64;

/// What one page element carries: tag name, class attribute, inline style,
/// and its own text content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementData {
    tag: String,
    classes: String,
    style: String,
    text: String,
}

impl ElementData {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_classes(mut self, classes: impl Into<String>) -> Self {
        self.classes = classes.into();
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn classes(&self) -> &str {
        &self.classes
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Exact class-token membership test.
    pub fn has_class(&self, token: &str) -> bool {
        self.classes.split_whitespace().any(|c| c == token)
    }
}

struct ObserverEntry {
    id: ObserverId,
    root: NodeId,
    options: ObserveOptions,
    queue: Vec<MutationRecord>,
    sink: mpsc::Sender<MutationBatch>,
}

/// A mutable element tree standing in for the host page's chat subtree.
///
/// Mutations made through the public mutators are routed, at mutation time,
/// into the record queue of every observer whose scope and options match.
/// Queued records are delivered as one batch per observer at the next
/// [`Document::flush`]; the flush boundary models the browser's own record
/// coalescing and is owned by the document, not by observers.
pub struct Document {
    tree: Tree<ElementData>,
    observers: Vec<ObserverEntry>,
    next_observer: ObserverId,
}

impl Document {
    pub fn new() -> Self {
        Self {
            tree: Tree::new(ElementData::new("body")),
            observers: Vec::new(),
            next_observer: 1,
        }
    }

    /// Seeds a document from an HTML fragment. Seeding records no
    /// mutations: nodes present before any observer attaches are exactly
    /// the messages the relay must never translate.
    pub fn from_html(html: &str) -> Self {
        let mut doc = Self::new();
        let fragment = Html::parse_fragment(html);
        let root = doc.root();
        for child in fragment.root_element().children() {
            doc.seed_node(root, child);
        }
        doc
    }

    fn seed_node(&mut self, parent: NodeId, node: ego_tree::NodeRef<'_, Node>) {
        match node.value() {
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(node) {
                    let data = ElementData::new(element.value().name())
                        .with_classes(element.value().attr("class").unwrap_or(""))
                        .with_style(element.value().attr("style").unwrap_or(""));
                    if let Some(id) = self.attach(parent, data, false) {
                        for child in element.children() {
                            self.seed_node(id, child);
                        }
                    }
                }
            }
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    if let Some(mut parent_mut) = self.tree.get_mut(parent) {
                        let value = parent_mut.value();
                        if value.text.is_empty() {
                            value.text = trimmed.to_string();
                        } else {
                            value.text.push(' ');
                            value.text.push_str(trimmed);
                        }
                    }
                }
            }
            _ => {
                for child in node.children() {
                    self.seed_node(parent, child);
                }
            }
        }
    }

    pub fn root(&self) -> NodeId {
        self.tree.root().id()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.tree.get(node).is_some()
    }

    pub fn element(&self, node: NodeId) -> Option<&ElementData> {
        self.tree.get(node).map(|n| n.value())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.tree.get(node)?.parent().map(|n| n.id())
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.tree.get(node)?.first_child().map(|n| n.id())
    }

    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.tree.get(node)?.last_child().map(|n| n.id())
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.tree.get(node)?.next_sibling().map(|n| n.id())
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.tree
            .get(node)
            .map(|n| n.children().map(|c| c.id()).collect())
            .unwrap_or_default()
    }

    /// Concatenated text of a node and its descendants, in document order.
    pub fn deep_text(&self, node: NodeId) -> String {
        let Some(node) = self.tree.get(node) else {
            return String::new();
        };
        let mut out = String::new();
        for descendant in node.descendants() {
            let text = descendant.value().text();
            if text.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(text);
        }
        out
    }

    /// All elements whose class attribute contains `marker` as a substring,
    /// in document order. This is the query primitive site adapters build
    /// their marker lookups on.
    pub fn find_by_marker(&self, marker: &str) -> Vec<NodeId> {
        self.tree
            .root()
            .descendants()
            .filter(|n| n.value().classes.contains(marker))
            .map(|n| n.id())
            .collect()
    }

    /// Appends a child element, emitting a child-list record targeting the
    /// parent. Returns `None` for a stale parent handle.
    pub fn append_child(&mut self, parent: NodeId, data: ElementData) -> Option<NodeId> {
        self.attach(parent, data, true)
    }

    /// Inserts a new element as the next sibling of `anchor`, emitting a
    /// child-list record targeting the anchor's parent. Returns `None` for
    /// a stale or parentless anchor; injecting next to a node that is gone
    /// is a tolerated no-op, never an error.
    pub fn insert_after(&mut self, anchor: NodeId, data: ElementData) -> Option<NodeId> {
        let parent = self.tree.get(anchor)?.parent()?.id();
        let mut anchor_mut = self.tree.get_mut(anchor)?;
        let id = anchor_mut.insert_after(data).id();
        self.enqueue(MutationKind::ChildList, parent, vec![id]);
        Some(id)
    }

    /// Replaces a node's text, emitting a character-data record.
    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) -> bool {
        match self.tree.get_mut(node) {
            Some(mut node_mut) => {
                node_mut.value().text = text.into();
                self.enqueue(MutationKind::CharacterData, node, Vec::new());
                true
            }
            None => false,
        }
    }

    /// Replaces a node's class attribute, emitting an attribute record.
    pub fn set_classes(&mut self, node: NodeId, classes: impl Into<String>) -> bool {
        match self.tree.get_mut(node) {
            Some(mut node_mut) => {
                node_mut.value().classes = classes.into();
                self.enqueue(MutationKind::Attributes, node, Vec::new());
                true
            }
            None => false,
        }
    }

    fn attach(&mut self, parent: NodeId, data: ElementData, record: bool) -> Option<NodeId> {
        let mut parent_mut = self.tree.get_mut(parent)?;
        let id = parent_mut.append(data).id();
        if record {
            self.enqueue(MutationKind::ChildList, parent, vec![id]);
        }
        Some(id)
    }

    fn enqueue(&mut self, kind: MutationKind, target: NodeId, added_nodes: Vec<NodeId>) {
        let record = MutationRecord {
            kind,
            target,
            added_nodes,
        };
        let tree = &self.tree;
        for entry in &mut self.observers {
            if entry.options.accepts(kind) && in_scope(tree, entry.root, target, entry.options.subtree)
            {
                entry.queue.push(record.clone());
            }
        }
    }

    pub(crate) fn register_observer(
        &mut self,
        root: NodeId,
        options: ObserveOptions,
        sink: mpsc::Sender<MutationBatch>,
    ) -> Option<ObserverId> {
        if !self.contains(root) {
            return None;
        }
        let id = self.next_observer;
        self.next_observer += 1;
        self.observers.push(ObserverEntry {
            id,
            root,
            options,
            queue: Vec::new(),
            sink,
        });
        Some(id)
    }

    pub(crate) fn unregister_observer(&mut self, id: ObserverId) {
        self.observers.retain(|entry| entry.id != id);
    }

    /// Number of live observer registrations; tests assert the
    /// one-observer-per-watcher invariant against this.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Delivers each observer's queued records as one batch. Observers with
    /// an empty queue get no callback for this flush.
    pub fn flush(&mut self) {
        for entry in &mut self.observers {
            if entry.queue.is_empty() {
                continue;
            }
            let batch = std::mem::take(&mut entry.queue);
            // A dropped receiver means the watcher is gone; nothing to do.
            let _ = entry.sink.send(batch);
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn in_scope(tree: &Tree<ElementData>, root: NodeId, target: NodeId, subtree: bool) -> bool {
    if target == root {
        return true;
    }
    if !subtree {
        return false;
    }
    tree.get(target)
        .map(|n| n.ancestors().any(|a| a.id() == root))
        .unwrap_or(false)
}
