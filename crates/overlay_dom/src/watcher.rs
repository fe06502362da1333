use std::sync::mpsc;

use ego_tree::NodeId;

use crate::document::{Document, ObserverId};

/// The mutation kinds an observer can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    ChildList,
    Attributes,
    CharacterData,
}

/// One mutation as delivered to observers. Transient: consumed per batch,
/// never retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub kind: MutationKind,
    pub target: NodeId,
    /// Newly inserted nodes, in insertion order. Empty for attribute and
    /// character-data records.
    pub added_nodes: Vec<NodeId>,
}

/// One coalesced observer callback's worth of records.
pub type MutationBatch = Vec<MutationRecord>;

/// Which mutations to observe. The default observes everything over the
/// full subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserveOptions {
    pub child_list: bool,
    pub attributes: bool,
    pub character_data: bool,
    pub subtree: bool,
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            child_list: true,
            attributes: true,
            character_data: true,
            subtree: true,
        }
    }
}

impl ObserveOptions {
    pub(crate) fn accepts(&self, kind: MutationKind) -> bool {
        match kind {
            MutationKind::ChildList => self.child_list,
            MutationKind::Attributes => self.attributes,
            MutationKind::CharacterData => self.character_data,
        }
    }
}

struct ActiveObservation {
    id: ObserverId,
    root: NodeId,
    rx: mpsc::Receiver<MutationBatch>,
}

/// A generic subtree observer handle.
///
/// Holds at most one live registration: re-observing disconnects the
/// previous one first, so repeated mounts never stack observers. A `None`
/// root is tolerated as a no-op; the caller re-observes once the root
/// exists.
pub struct MutationWatcher {
    options: ObserveOptions,
    active: Option<ActiveObservation>,
}

impl MutationWatcher {
    pub fn new() -> Self {
        Self::with_options(ObserveOptions::default())
    }

    pub fn with_options(options: ObserveOptions) -> Self {
        Self {
            options,
            active: None,
        }
    }

    pub fn observe(&mut self, doc: &mut Document, root: Option<NodeId>) {
        self.disconnect(doc);
        let Some(root) = root else {
            return;
        };
        let (tx, rx) = mpsc::channel();
        if let Some(id) = doc.register_observer(root, self.options, tx) {
            self.active = Some(ActiveObservation { id, root, rx });
        }
    }

    pub fn disconnect(&mut self, doc: &mut Document) {
        if let Some(active) = self.active.take() {
            doc.unregister_observer(active.id);
        }
    }

    pub fn is_observing(&self) -> bool {
        self.active.is_some()
    }

    pub fn observed_root(&self) -> Option<NodeId> {
        self.active.as_ref().map(|a| a.root)
    }

    /// Next delivered batch, if one is waiting.
    pub fn try_next_batch(&self) -> Option<MutationBatch> {
        self.active.as_ref()?.rx.try_recv().ok()
    }
}

impl Default for MutationWatcher {
    fn default() -> Self {
        Self::new()
    }
}
