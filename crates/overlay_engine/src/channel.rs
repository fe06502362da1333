use std::sync::{mpsc, Arc};
use std::thread;

use overlay_logging::overlay_warn;
use serde::{Deserialize, Serialize};

use crate::TranslationController;

pub type RequestId = u64;

/// Wire discriminator, serialized exactly as the page↔background protocol
/// spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    #[serde(rename = "CHAT_MESSAGE")]
    ChatMessage,
    #[serde(rename = "INPUT_MESSAGE")]
    InputMessage,
}

/// One translation request as it crosses the privilege boundary:
/// `{ type, data, target? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayEnvelope {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

enum BackgroundCommand {
    Dispatch { request_id: RequestId, payload: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundEvent {
    /// The single reply for one dispatched request. `None` text means no
    /// translation was produced.
    Reply {
        request_id: RequestId,
        text: Option<String>,
    },
}

/// Handle to the privileged background context.
///
/// Dispatch is fire-and-forget: no retries, no timeouts, no serialization
/// of concurrent requests (each runs as its own task and replies
/// independently). A request that cannot be encoded, decoded, or delivered
/// never produces a reply — callers must treat non-settlement as a valid
/// outcome.
pub struct BackgroundHandle {
    cmd_tx: mpsc::Sender<BackgroundCommand>,
    event_rx: mpsc::Receiver<BackgroundEvent>,
}

impl BackgroundHandle {
    pub fn new(controller: TranslationController) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let controller = Arc::new(controller);

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            while let Ok(command) = cmd_rx.recv() {
                let controller = controller.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(controller.as_ref(), command, event_tx).await;
                });
            }
        });

        Self { cmd_tx, event_rx }
    }

    pub fn dispatch(&self, request_id: RequestId, envelope: &RelayEnvelope) {
        let payload = match serde_json::to_string(envelope) {
            Ok(payload) => payload,
            Err(err) => {
                overlay_warn!("failed to encode relay envelope: {}", err);
                return;
            }
        };
        let _ = self.cmd_tx.send(BackgroundCommand::Dispatch {
            request_id,
            payload,
        });
    }

    pub fn try_recv(&self) -> Option<BackgroundEvent> {
        self.event_rx.try_recv().ok()
    }
}

async fn handle_command(
    controller: &TranslationController,
    command: BackgroundCommand,
    event_tx: mpsc::Sender<BackgroundEvent>,
) {
    match command {
        BackgroundCommand::Dispatch {
            request_id,
            payload,
        } => {
            let envelope: RelayEnvelope = match serde_json::from_str(&payload) {
                Ok(envelope) => envelope,
                Err(err) => {
                    // Same observable outcome as an unreachable background
                    // context: the reply callback never fires.
                    overlay_warn!("dropping undecodable relay envelope: {}", err);
                    return;
                }
            };
            let text = match envelope.kind {
                MessageKind::ChatMessage => controller.handle_chat_message(&envelope.data).await,
                MessageKind::InputMessage => {
                    controller
                        .handle_input_message(&envelope.data, envelope.target.as_deref())
                        .await
                }
            };
            let _ = event_tx.send(BackgroundEvent::Reply { request_id, text });
        }
    }
}
