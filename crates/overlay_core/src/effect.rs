#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect<A> {
    /// Attach the mutation watcher to the resolved chat root.
    Observe,
    /// Disconnect the mutation watcher.
    Disconnect,
    /// Dispatch one translation request over the relay channel.
    SendEnvelope {
        request_id: crate::RequestId,
        envelope: Envelope,
    },
    /// Inject a translated annotation as a sibling of its anchor node.
    InjectAnnotation {
        anchor: A,
        text: String,
        tint: &'static str,
    },
}

/// Discriminates inbound chat translation from outbound composition
/// translation. The serialized wire form lives in the engine crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    ChatMessage,
    InputMessage,
}

/// One translation request as the core sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub kind: EnvelopeKind,
    pub data: String,
    /// Target language for outbound messages; chat messages leave this
    /// unset and translate into the native display language.
    pub target: Option<String>,
}
