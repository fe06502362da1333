use overlay_core::{
    update, Effect, Envelope, EnvelopeKind, ExtractionStep, Msg, MutationKind, MutationSnapshot,
    NodeSnapshot, RelayState, RelayView, SiteProfile, ANNOTATION_MARKER,
};
use overlay_dom::{Document, ElementData, MutationRecord, MutationWatcher, NodeId};
use overlay_engine::{
    BackgroundEvent, BackgroundHandle, MessageKind, RelayEnvelope, SettingChange, SettingsStore,
    SettingsSubscription,
};
use overlay_logging::overlay_debug;

use crate::adapter::SiteChatAdapter;

/// One mounted relay instance for one site page.
///
/// Single-threaded and event-driven: the host calls [`pump`] once per
/// event-loop turn, which drains settings changes, delivered mutation
/// batches, and background replies through the pure core, then executes
/// whatever effects come back. Nothing here blocks on a translation;
/// replies land on a later pump, each next to its own message node.
///
/// [`pump`]: SiteTranslatorRelay::pump
pub struct SiteTranslatorRelay {
    adapter: Box<dyn SiteChatAdapter>,
    state: RelayState<NodeId>,
    watcher: MutationWatcher,
    chat_root: Option<NodeId>,
    background: BackgroundHandle,
    settings: SettingsSubscription,
    batch_seq: u64,
}

impl SiteTranslatorRelay {
    /// Mounts a relay. A page that has not rendered its chat widget yet is
    /// tolerated: the relay stays inert until [`remount`] finds the root.
    ///
    /// [`remount`]: SiteTranslatorRelay::remount
    pub fn mount(
        doc: &mut Document,
        profile: SiteProfile,
        adapter: Box<dyn SiteChatAdapter>,
        background: BackgroundHandle,
        settings: &SettingsStore,
    ) -> Self {
        // Subscribe before the initial read so no flag flip can fall
        // between the two.
        let subscription = settings.watch();
        let state = RelayState::new(profile, settings.translation_enabled());
        let mut relay = Self {
            adapter,
            state,
            watcher: MutationWatcher::new(),
            chat_root: None,
            background,
            settings: subscription,
            batch_seq: 0,
        };
        relay.resolve_root(doc);
        relay
    }

    /// Re-render: re-resolves the chat root, attaching the watcher if the
    /// widget appeared since mount, or re-attaching it if the root node
    /// was swapped out.
    pub fn remount(&mut self, doc: &mut Document) {
        self.resolve_root(doc);
    }

    /// One event-loop turn. Settings changes are applied first so batches
    /// drained in the same turn see the current flag value.
    pub fn pump(&mut self, doc: &mut Document) {
        while let Some(change) = self.settings.try_recv() {
            if let SettingChange::TranslationEnabled(active) = change {
                self.dispatch(doc, Msg::FeatureChanged(active));
            }
        }
        while let Some(batch) = self.watcher.try_next_batch() {
            self.batch_seq += 1;
            overlay_logging::set_batch_seq(self.batch_seq);
            let snapshots = self.snapshot_batch(doc, &batch);
            self.dispatch(doc, Msg::MutationBatch(snapshots));
        }
        while let Some(BackgroundEvent::Reply { request_id, text }) = self.background.try_recv() {
            self.dispatch(
                doc,
                Msg::TranslationArrived {
                    request_id,
                    reply: text,
                },
            );
        }
    }

    /// Tears the relay down: the observer disconnects and pending replies
    /// are dropped.
    pub fn unmount(&mut self, doc: &mut Document) {
        self.dispatch(doc, Msg::Unmounted);
    }

    pub fn view(&self) -> RelayView {
        self.state.view()
    }

    fn resolve_root(&mut self, doc: &mut Document) {
        let root = self.adapter.chat_root(doc);
        if root.is_none() || root == self.chat_root {
            return;
        }
        self.chat_root = root;
        if self.watcher.is_observing() {
            // Root identity changed while watching: re-run the observe
            // effect against the new root.
            self.watcher.observe(doc, self.chat_root);
        } else {
            self.dispatch(doc, Msg::ChatRootResolved);
        }
    }

    fn dispatch(&mut self, doc: &mut Document, msg: Msg<NodeId>) {
        let (state, effects) = update(self.state.clone(), msg);
        self.state = state;
        for effect in effects {
            self.run_effect(doc, effect);
        }
    }

    fn run_effect(&mut self, doc: &mut Document, effect: Effect<NodeId>) {
        match effect {
            Effect::Observe => self.watcher.observe(doc, self.chat_root),
            Effect::Disconnect => self.watcher.disconnect(doc),
            Effect::SendEnvelope {
                request_id,
                envelope,
            } => {
                overlay_debug!(
                    "relay dispatch batch={} request={} len={}",
                    overlay_logging::get_batch_seq(),
                    request_id,
                    envelope.data.len()
                );
                self.background.dispatch(request_id, &map_envelope(envelope));
            }
            Effect::InjectAnnotation { anchor, text, tint } => {
                let annotation = ElementData::new("div")
                    .with_classes(ANNOTATION_MARKER)
                    .with_style(format!("background-color: {tint}"))
                    .with_text(text);
                if doc.insert_after(anchor, annotation).is_none() {
                    // The message node is gone; dropping the annotation is
                    // the tolerated outcome.
                    overlay_debug!("skipped annotation for a detached message node");
                }
            }
        }
    }

    fn snapshot_batch(
        &self,
        doc: &Document,
        batch: &[MutationRecord],
    ) -> Vec<MutationSnapshot<NodeId>> {
        batch
            .iter()
            .map(|record| MutationSnapshot {
                kind: map_kind(record.kind),
                target_classes: classes_of(doc, record.target),
                added: record
                    .added_nodes
                    .iter()
                    .map(|&node| NodeSnapshot {
                        node,
                        classes: classes_of(doc, node),
                        text: self.extract_text(doc, node),
                    })
                    .collect(),
            })
            .collect()
    }

    /// Walks the site's fixed extraction path from a message container
    /// down to its text node. Nodes without the expected nested shape, and
    /// error banners, yield `None` and are skipped upstream.
    fn extract_text(&self, doc: &Document, node: NodeId) -> Option<String> {
        if self.adapter.is_error_node(doc, node) {
            return None;
        }
        let mut cursor = node;
        for step in self.state.profile().extraction_path {
            cursor = match step {
                ExtractionStep::FirstChild => doc.first_child(cursor)?,
                ExtractionStep::LastChild => doc.last_child(cursor)?,
            };
        }
        let text = doc.deep_text(cursor);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

fn classes_of(doc: &Document, node: NodeId) -> String {
    doc.element(node)
        .map(|e| e.classes().to_string())
        .unwrap_or_default()
}

fn map_kind(kind: overlay_dom::MutationKind) -> MutationKind {
    match kind {
        overlay_dom::MutationKind::ChildList => MutationKind::ChildList,
        overlay_dom::MutationKind::Attributes => MutationKind::Attributes,
        overlay_dom::MutationKind::CharacterData => MutationKind::CharacterData,
    }
}

fn map_envelope(envelope: Envelope) -> RelayEnvelope {
    RelayEnvelope {
        kind: match envelope.kind {
            EnvelopeKind::ChatMessage => MessageKind::ChatMessage,
            EnvelopeKind::InputMessage => MessageKind::InputMessage,
        },
        data: envelope.data,
        target: envelope.target,
    }
}
