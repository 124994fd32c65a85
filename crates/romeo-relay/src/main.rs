//! Romeo WebSocket Relay Server
//!
//! Pairs peers in named rooms and forwards drawings and finger positions
//! between them. Nothing is stored: a peer joining late only sees what is
//! sent after it joined.
//!
//! ## Protocol
//!
//! Messages are JSON with the following format:
//! ```json
//! { "type": "join", "room": "romeo" }
//! { "type": "board", "board": { "strokes": [ ... ] } }
//! { "type": "touch", "x": 100.0, "y": 200.0 }
//! { "type": "touch_end" }
//! ```

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use romeo_core::{ClientMessage, ServerMessage};
use std::{collections::HashSet, net::SocketAddr, sync::Arc};
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 256;
const DEFAULT_ADDR: &str = "0.0.0.0:3030";

/// Room state
struct Room {
    /// Broadcast channel for this room
    tx: broadcast::Sender<(String, ServerMessage)>,
    /// Connected peer IDs
    peers: HashSet<String>,
}

impl Room {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            peers: HashSet::new(),
        }
    }
}

/// Shared application state
struct AppState {
    /// Active rooms
    rooms: DashMap<String, Room>,
}

impl AppState {
    fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Add peer to room
    fn join_room(
        &self,
        room_id: &str,
        peer_id: &str,
    ) -> (broadcast::Receiver<(String, ServerMessage)>, usize) {
        let mut room = self
            .rooms
            .entry(room_id.to_string())
            .or_insert_with(Room::new);
        room.peers.insert(peer_id.to_string());
        (room.tx.subscribe(), room.peers.len())
    }

    /// Remove peer from room
    fn leave_room(&self, room_id: &str, peer_id: &str) {
        if let Some(mut room) = self.rooms.get_mut(room_id) {
            room.peers.remove(peer_id);
            // Clean up empty rooms
            if room.peers.is_empty() {
                drop(room);
                self.rooms.remove(room_id);
            }
        }
    }

    fn peer_count(&self, room_id: &str) -> usize {
        self.rooms.get(room_id).map_or(0, |room| room.peers.len())
    }

    /// Broadcast message to room
    fn broadcast(&self, room_id: &str, from: &str, msg: ServerMessage) {
        if let Some(room) = self.rooms.get(room_id) {
            let _ = room.tx.send((from.to_string(), msg));
        }
    }
}

/// What to do with one client message.
#[derive(Debug)]
enum Action {
    Join(String),
    Leave,
    /// Forward to the other peers of the current room.
    Forward(ServerMessage),
    /// Answer the sender only.
    Reply(ServerMessage),
}

/// Turn a client message into the relay's reaction. Boards are checked before
/// they reach the other peer.
fn route(peer_id: &str, msg: ClientMessage) -> Action {
    match msg {
        ClientMessage::Join { room } => Action::Join(room),
        ClientMessage::Leave => Action::Leave,
        ClientMessage::Board { board } => match board.validate() {
            Ok(()) => Action::Forward(ServerMessage::Board {
                from: peer_id.to_string(),
                board,
            }),
            Err(e) => Action::Reply(ServerMessage::Error {
                message: format!("Invalid board: {}", e),
            }),
        },
        ClientMessage::Touch { x, y } => Action::Forward(ServerMessage::Touch {
            from: peer_id.to_string(),
            x,
            y,
        }),
        ClientMessage::TouchEnd => Action::Forward(ServerMessage::TouchEnd {
            from: peer_id.to_string(),
        }),
    }
}

fn encode(msg: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            warn!("Failed to encode server message: {}", e);
            None
        }
    }
}

fn listen_addr() -> SocketAddr {
    let configured = std::env::var("ROMEO_RELAY_ADDR").ok();
    let raw = configured.as_deref().unwrap_or(DEFAULT_ADDR);
    match raw.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Ignoring ROMEO_RELAY_ADDR={}: {}", raw, e);
            SocketAddr::from(([0, 0, 0, 0], 3030))
        }
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "romeo_relay=info,tower_http=info".into()),
        )
        .init();

    let state = Arc::new(AppState::new());

    let app = Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = listen_addr();
    info!("Romeo relay server listening on {}", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

/// Index page
async fn index() -> &'static str {
    "Romeo Relay Server - Connect via WebSocket at /ws"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

/// WebSocket upgrade handler
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let peer_id = Uuid::new_v4().to_string();
    info!("New connection: {}", peer_id);

    let (mut sender, mut receiver) = socket.split();
    let mut current_room: Option<String> = None;
    let mut room_rx: Option<broadcast::Receiver<(String, ServerMessage)>> = None;

    loop {
        tokio::select! {
            // Handle incoming messages from client
            msg = receiver.next() => {
                let text = match msg {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", peer_id, e);
                        break;
                    }
                };

                let action = match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(client_msg) => route(&peer_id, client_msg),
                    Err(e) => {
                        warn!("Invalid message from {}: {}", peer_id, e);
                        Action::Reply(ServerMessage::Error {
                            message: format!("Invalid message: {}", e),
                        })
                    }
                };

                match action {
                    Action::Join(room) => {
                        // Leave current room if any
                        if let Some(ref old_room) = current_room {
                            state.leave_room(old_room, &peer_id);
                            state.broadcast(old_room, &peer_id, ServerMessage::PeerLeft {
                                peer_id: peer_id.clone(),
                            });
                        }

                        let (rx, peer_count) = state.join_room(&room, &peer_id);
                        room_rx = Some(rx);
                        current_room = Some(room.clone());

                        let joined = ServerMessage::Joined { room: room.clone(), peer_count };
                        if let Some(reply) = encode(&joined) {
                            if sender.send(reply).await.is_err() {
                                break;
                            }
                        }

                        // Notify others
                        state.broadcast(&room, &peer_id, ServerMessage::PeerJoined {
                            peer_id: peer_id.clone(),
                        });
                        info!("Peer {} joined room {}", peer_id, room);
                    }
                    Action::Leave => {
                        if let Some(ref room) = current_room {
                            state.leave_room(room, &peer_id);
                            state.broadcast(room, &peer_id, ServerMessage::PeerLeft {
                                peer_id: peer_id.clone(),
                            });
                            info!("Peer {} left room {}", peer_id, room);
                        }
                        current_room = None;
                        room_rx = None;
                    }
                    Action::Forward(server_msg) => match current_room {
                        Some(ref room) => {
                            if let ServerMessage::Board { ref board, .. } = server_msg {
                                info!(
                                    "Forwarding board of {} strokes from {} to {} peers",
                                    board.len(),
                                    peer_id,
                                    state.peer_count(room).saturating_sub(1)
                                );
                            }
                            state.broadcast(room, &peer_id, server_msg);
                        }
                        None => warn!("Dropping message from {} outside any room", peer_id),
                    },
                    Action::Reply(server_msg) => {
                        if let Some(reply) = encode(&server_msg) {
                            let _ = sender.send(reply).await;
                        }
                    }
                }
            }

            // Handle broadcast messages from room
            msg = async {
                match &mut room_rx {
                    Some(rx) => rx.recv().await.ok(),
                    None => {
                        // No room joined, just wait forever
                        std::future::pending::<Option<(String, ServerMessage)>>().await
                    }
                }
            } => {
                if let Some((from, server_msg)) = msg {
                    // Don't echo back to sender
                    if from != peer_id {
                        if let Some(out) = encode(&server_msg) {
                            if sender.send(out).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        }
    }

    // Cleanup on disconnect
    if let Some(ref room) = current_room {
        state.leave_room(room, &peer_id);
        state.broadcast(room, &peer_id, ServerMessage::PeerLeft {
            peer_id: peer_id.clone(),
        });
    }
    info!("Connection closed: {}", peer_id);
}
