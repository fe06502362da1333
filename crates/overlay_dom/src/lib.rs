//! Overlay dom: mutable page-tree substrate and mutation observation.
mod document;
mod watcher;

pub use document::{Document, ElementData, ObserverId};
pub use ego_tree::NodeId;
pub use watcher::{MutationBatch, MutationKind, MutationRecord, MutationWatcher, ObserveOptions};
