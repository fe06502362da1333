pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg<A> {
    /// The site adapter resolved a non-null chat root; attach the watcher.
    ChatRootResolved,
    /// One coalesced batch of mutation records from the watcher.
    MutationBatch(Vec<crate::MutationSnapshot<A>>),
    /// The persisted feature flag changed (push-style watch callback).
    FeatureChanged(bool),
    /// A relay reply arrived. `None` means no translation was produced,
    /// which is a valid outcome, not an error.
    TranslationArrived {
        request_id: RequestId,
        reply: Option<String>,
    },
    /// The owning component is tearing down.
    Unmounted,
    /// Fallback for placeholder wiring.
    NoOp,
}
