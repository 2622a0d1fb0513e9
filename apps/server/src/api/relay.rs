use std::sync::Arc;

use crate::main_lib::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use cowchips_core::relay::{DonationRelay, RelayMessage};

async fn relay_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let relay = state.relay.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, relay))
}

async fn handle_socket(mut socket: WebSocket, relay: DonationRelay) {
    let mut subscription = relay.subscribe();
    let id = subscription.id();

    loop {
        tokio::select! {
            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<RelayMessage>(&text) {
                        Ok(message) => {
                            relay.handle_message(id, message);
                        }
                        Err(err) => {
                            tracing::debug!("Ignoring malformed relay message from {}: {}", id, err);
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::debug!("Relay subscriber {} errored: {}", id, err);
                    break;
                }
            },
            outbound = subscription.recv() => {
                let Some(message) = outbound else { break };
                let text = match serde_json::to_string(&message) {
                    Ok(text) => text,
                    Err(err) => {
                        tracing::error!("Failed to serialize relay message: {}", err);
                        continue;
                    }
                };
                if socket.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
        }
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/relay", get(relay_handler))
}
