//! WebSocket plumbing: connection lifecycle, frame routing, shared state.
//!
//! One task per connection. Inbound binary frames are decoded prost
//! envelopes; outbound frames reach the task through a per-session mpsc
//! channel held in the connection registry, so the round driver and the
//! shutdown path can message any session without touching a socket.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use mapdart_server::session::SessionId;
use mapdart_server::{JoinOutcome, Server};
use mapdart_wire::{ClientPayload, ServerEnvelope, decode_client_frame, encode_frame};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};

/// Epoch milliseconds, the time unit the server edge expects.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// State shared by every connection task and the round driver.
pub struct AppState {
    pub server: RwLock<Server>,
    /// Per-session outbound channels. The registry holds a session's only
    /// sender, so removing it closes the connection once queued frames
    /// have been flushed.
    registry: RwLock<HashMap<SessionId, mpsc::UnboundedSender<Vec<u8>>>>,
}

impl AppState {
    pub fn new(server: Server) -> Self {
        Self {
            server: RwLock::new(server),
            registry: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register(&self, session_id: SessionId, tx: mpsc::UnboundedSender<Vec<u8>>) {
        self.registry.write().await.insert(session_id, tx);
    }

    pub async fn unregister(&self, session_id: SessionId) {
        self.registry.write().await.remove(&session_id);
    }

    /// Deliver a frame to one session; a send to a closing connection is
    /// silently dropped, disconnect cleanup handles the rest.
    pub async fn send_to(&self, session_id: SessionId, frame: Vec<u8>) {
        if let Some(tx) = self.registry.read().await.get(&session_id) {
            let _ = tx.send(frame);
        }
    }

    /// Deliver a frame to every connected session.
    pub async fn broadcast(&self, frame: Vec<u8>) {
        for tx in self.registry.read().await.values() {
            let _ = tx.send(frame.clone());
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

async fn index() -> &'static str {
    concat!("Mapdart gateway ", env!("CARGO_PKG_VERSION"))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sink, mut stream) = socket.split();

    debug!("client connected");

    // The first protocol frame must be a join request; the handshake runs
    // straight on the socket, before the session has an outbound channel.
    let session_id = loop {
        match stream.next().await {
            Some(Ok(Message::Binary(bytes))) => match decode_client_frame(&bytes) {
                Some(ClientPayload::Join(request)) => {
                    match state.server.write().await.join(&request, now_ms()) {
                        JoinOutcome::Admitted {
                            session_id,
                            ack,
                            metadata,
                        } => {
                            info!(session_id, username = %request.username, "player joined");
                            let ack_frame = encode_frame(&ServerEnvelope::join_ack(ack));
                            let meta_frame =
                                encode_frame(&ServerEnvelope::session_metadata(metadata));
                            if sink.send(Message::Binary(ack_frame)).await.is_err()
                                || sink.send(Message::Binary(meta_frame)).await.is_err()
                            {
                                state.server.write().await.disconnect_session(session_id);
                                return;
                            }
                            break session_id;
                        }
                        JoinOutcome::Rejected { kick } => {
                            warn!(username = %request.username, reason = %kick.message, "join rejected");
                            let frame = encode_frame(&ServerEnvelope::kick(kick));
                            let _ = sink.send(Message::Binary(frame)).await;
                            return;
                        }
                    }
                }
                Some(ClientPayload::Guess(_)) => {
                    debug!("guess before join dropped");
                }
                None => debug!("undecodable frame dropped"),
            },
            Some(Ok(Message::Close(_))) | None => {
                debug!("client disconnected before joining");
                return;
            }
            // Text, ping and pong frames carry no protocol messages.
            Some(Ok(_)) => {}
            Some(Err(err)) => {
                debug!(error = %err, "socket error");
                return;
            }
        }
    };

    // The registry now holds this session's only sender. A kick removes it,
    // which ends the outbound stream below once the kick frame has been
    // delivered.
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
    state.register(session_id, tx).await;

    loop {
        tokio::select! {
            outbound = rx.recv() => match outbound {
                Some(frame) => {
                    if sink.send(Message::Binary(frame)).await.is_err() {
                        break;
                    }
                }
                // Sender gone (kick or shutdown), queue fully drained.
                None => break,
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Binary(bytes))) => {
                    handle_frame(&state, session_id, &bytes).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    debug!(error = %err, "socket error");
                    break;
                }
            },
        }
    }

    state.unregister(session_id).await;
    state.server.write().await.disconnect_session(session_id);
    info!(session_id, "client disconnected");
}

/// Frames after the handshake: guesses, duplicate joins, garbage.
async fn handle_frame(state: &AppState, session_id: SessionId, bytes: &[u8]) {
    match decode_client_frame(bytes) {
        Some(ClientPayload::Guess(guess)) => {
            let verdict = state
                .server
                .write()
                .await
                .receive_guess(session_id, &guess, now_ms());
            if verdict.is_accepted() {
                debug!(session_id, "guess buffered");
            } else {
                debug!(session_id, ?verdict, "guess dropped");
            }
        }
        // Already joined; a repeat join is a no-op.
        Some(ClientPayload::Join(_)) => {}
        None => debug!("undecodable frame dropped"),
    }
}
