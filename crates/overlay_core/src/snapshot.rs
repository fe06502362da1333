/// Mutation kinds the watcher reports; mirrors the observation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    ChildList,
    Attributes,
    CharacterData,
}

/// What the relay runtime captured about one added node: its handle, its
/// class attribute, and the trimmed text found at the site's extraction
/// path. `text` is `None` when the node lacked the expected nested shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSnapshot<A> {
    pub node: A,
    pub classes: String,
    pub text: Option<String>,
}

/// One mutation record, snapshotted for the pure core. Consumed per batch,
/// never retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationSnapshot<A> {
    pub kind: MutationKind,
    pub target_classes: String,
    pub added: Vec<NodeSnapshot<A>>,
}
