use axum::{
    debug_handler,
    extract::{
        Path, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::notify::{MembershipChanged, Notifier};

/// Streams membership-change events for one room so clients know to re-fetch
/// its state.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn room_ws(
    Path(room_id): Path<Uuid>,
    State(notifier): State<Notifier>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let rx = notifier.subscribe();
    ws.on_upgrade(move |stream| forward_changes(stream, rx, room_id))
}

async fn forward_changes(
    stream: WebSocket,
    mut rx: broadcast::Receiver<MembershipChanged>,
    room_id: Uuid,
) {
    let (mut sender, mut receiver) = stream.split();

    loop {
        tokio::select! {
            changed = rx.recv() => match changed {
                Ok(changed) if changed.room_id == room_id => {
                    let Ok(payload) = serde_json::to_string(&changed) else {
                        continue;
                    };
                    if sender.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(room = %room_id, skipped, "membership listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            msg = receiver.next() => {
                // Client hung up.
                if msg.is_none() {
                    break;
                }
            }
        }
    }
}
