//! The realtime WebSocket endpoint.
//!
//! Clients join and leave auction rooms with JSON messages; the server
//! forwards every event for joined rooms plus the globally broadcast
//! lifecycle events. Delivery is best-effort: a connection that lags far
//! enough to overflow its buffer is dropped and reconnects fresh.

use crate::AppState;
use crate::hub::EventHub;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt as _, StreamExt as _};
use sba_core::models::AuctionId;
use sba_core::ports::AuctionStore;
use std::collections::HashSet;
use tokio::sync::broadcast::error::RecvError;
use tracing::{Level, event};

/// Messages a client may send.
#[derive(serde::Deserialize)]
#[serde(tag = "type")]
enum ClientMessage {
    /// Subscribe to an auction's room.
    #[serde(rename = "join:auction", rename_all = "camelCase")]
    Join {
        /// The auction to follow.
        auction_id: AuctionId,
    },
    /// Unsubscribe from an auction's room.
    #[serde(rename = "leave:auction", rename_all = "camelCase")]
    Leave {
        /// The auction to stop following.
        auction_id: AuctionId,
    },
}

/// Upgrade the connection and hand it to the socket loop.
pub(crate) async fn upgrade<R: AuctionStore>(
    State(state): State<AppState<R>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.hub))
}

async fn handle_socket(socket: WebSocket, hub: EventHub) {
    let mut rx = hub.subscribe();
    let (mut sink, mut stream) = socket.split();
    let mut joined: HashSet<AuctionId> = HashSet::new();

    loop {
        tokio::select! {
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Join { auction_id }) => {
                                joined.insert(auction_id);
                            }
                            Ok(ClientMessage::Leave { auction_id }) => {
                                joined.remove(&auction_id);
                            }
                            Err(err) => {
                                event!(Level::DEBUG, err = %err, "ignoring malformed client message");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
            envelope = rx.recv() => {
                match envelope {
                    Ok(envelope) => {
                        if !envelope.global && !joined.contains(&envelope.auction_id) {
                            continue;
                        }
                        let Ok(text) = serde_json::to_string(&envelope.event) else {
                            continue;
                        };
                        if sink.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // the client fell behind; it will refetch on reconnect
                        event!(Level::DEBUG, skipped, "dropping lagged subscriber");
                        break;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }
}
