use crate::{
    is_annotation, Effect, Envelope, EnvelopeKind, Msg, MutationKind, MutationSnapshot, RelayPhase,
    RelayState,
};

/// Pure update function: applies a message to relay state and returns any
/// effects for the runtime to execute.
pub fn update<A: Copy + PartialEq>(
    mut state: RelayState<A>,
    msg: Msg<A>,
) -> (RelayState<A>, Vec<Effect<A>>) {
    let effects = match msg {
        Msg::ChatRootResolved => {
            if state.phase() == RelayPhase::Idle {
                state.set_phase(RelayPhase::Watching);
                vec![Effect::Observe]
            } else {
                Vec::new()
            }
        }
        Msg::MutationBatch(records) => {
            if state.phase() != RelayPhase::Watching {
                return (state, Vec::new());
            }
            let mut effects = Vec::new();
            for record in records {
                if let Some(effect) = process_record(&mut state, record) {
                    effects.push(effect);
                }
            }
            effects
        }
        Msg::FeatureChanged(active) => {
            state.set_feature_active(active);
            Vec::new()
        }
        Msg::TranslationArrived { request_id, reply } => {
            let Some(anchor) = state.take_anchor(request_id) else {
                return (state, Vec::new());
            };
            match reply {
                // An empty reply counts as "no translation produced".
                Some(text) if !text.is_empty() => vec![Effect::InjectAnnotation {
                    anchor,
                    text,
                    tint: state.profile().tint,
                }],
                _ => Vec::new(),
            }
        }
        Msg::Unmounted => {
            let was_watching = state.phase() == RelayPhase::Watching;
            state.set_phase(RelayPhase::Unmounted);
            state.clear_pending();
            if was_watching {
                vec![Effect::Disconnect]
            } else {
                Vec::new()
            }
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Runs one record through the filter chain; at most one relay call comes
/// out. Malformed records fall through silently.
fn process_record<A: Copy + PartialEq>(
    state: &mut RelayState<A>,
    record: MutationSnapshot<A>,
) -> Option<Effect<A>> {
    if !record
        .target_classes
        .contains(state.profile().list_marker)
    {
        return None;
    }
    if record.kind != MutationKind::ChildList || !state.feature_active() {
        return None;
    }
    // The observed sites append exactly one message container per event.
    let first = record.added.first()?;
    if first.classes.contains(state.profile().notice_marker) {
        return None;
    }
    if is_annotation(&first.classes) {
        return None;
    }
    let text = first
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())?
        .to_string();

    let request_id = state.alloc_request();
    state.remember_anchor(request_id, first.node);
    Some(Effect::SendEnvelope {
        request_id,
        envelope: Envelope {
            kind: EnvelopeKind::ChatMessage,
            data: text,
            target: None,
        },
    })
}
