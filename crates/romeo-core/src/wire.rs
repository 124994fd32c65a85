//! Messages exchanged with the relay server.
//!
//! Both directions are JSON objects tagged by a `type` field, e.g.
//! `{"type":"join","room":"romeo"}` or `{"type":"touch","from":"…","x":1.0,"y":2.0}`.

use crate::board::Board;
use serde::{Deserialize, Serialize};

/// Messages sent to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join a room
    Join { room: String },
    /// Leave current room
    Leave,
    /// Send a drawing to the peer
    Board { board: Board },
    /// Local finger position for touch-through
    Touch { x: f64, y: f64 },
    /// Local finger lifted
    TouchEnd,
}

/// Messages received from the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirm room join
    Joined { room: String, peer_count: usize },
    /// Peer joined the room
    PeerJoined { peer_id: String },
    /// Peer left the room
    PeerLeft { peer_id: String },
    /// Drawing from another peer
    Board { from: String, board: Board },
    /// Finger position of another peer
    Touch { from: String, x: f64, y: f64 },
    /// Another peer lifted their finger
    TouchEnd { from: String },
    /// Error message
    Error { message: String },
}

impl ClientMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Events surfaced by the peer link, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerEvent {
    /// Connected to server
    Connected,
    /// Disconnected from server
    Disconnected,
    /// Joined a room
    JoinedRoom { room: String, peer_count: usize },
    /// A peer joined the room
    PeerJoined { peer_id: String },
    /// A peer left the room
    PeerLeft { peer_id: String },
    /// Received a board from a peer, not yet validated
    BoardReceived { from: String, board: Board },
    /// Peer finger moved
    TouchReceived { from: String, x: f64, y: f64 },
    /// Peer finger lifted
    TouchEnded { from: String },
    /// Error occurred
    Error { message: String },
}

impl From<ServerMessage> for PeerEvent {
    fn from(msg: ServerMessage) -> Self {
        match msg {
            ServerMessage::Joined { room, peer_count } => PeerEvent::JoinedRoom { room, peer_count },
            ServerMessage::PeerJoined { peer_id } => PeerEvent::PeerJoined { peer_id },
            ServerMessage::PeerLeft { peer_id } => PeerEvent::PeerLeft { peer_id },
            ServerMessage::Board { from, board } => PeerEvent::BoardReceived { from, board },
            ServerMessage::Touch { from, x, y } => PeerEvent::TouchReceived { from, x, y },
            ServerMessage::TouchEnd { from } => PeerEvent::TouchEnded { from },
            ServerMessage::Error { message } => PeerEvent::Error { message },
        }
    }
}

/// Parse a server message into a peer event.
pub fn decode_server_message(text: &str) -> Result<PeerEvent, serde_json::Error> {
    serde_json::from_str::<ServerMessage>(text).map(PeerEvent::from)
}
