//! Native peer link: a relay connection on a background thread.
//!
//! The socket lives on its own thread; messages cross to it over channels.
//! Incoming traffic is only surfaced through [`PeerLink::poll_events`], so the
//! thread that owns the session decides when remote boards are applied.

use crate::board::Board;
use crate::session::SendError;
use crate::wire::{ClientMessage, ConnectionState, PeerEvent, decode_server_message};
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use tungstenite::{Message, connect};
use url::Url;

/// Peer link errors.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Already connected")]
    AlreadyConnected,
    #[error("Not connected")]
    NotConnected,
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Invalid WebSocket URL scheme: {0}")]
    InvalidScheme(String),
    #[error("Encode failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    EmptyBoard(#[from] SendError),
    #[error("Link thread has stopped")]
    Closed,
}

/// Commands sent to the socket thread.
enum LinkCommand {
    Send(String),
    Close,
}

/// Connection to the relay server.
pub struct PeerLink {
    state: ConnectionState,
    events: Vec<PeerEvent>,
    cmd_tx: Option<Sender<LinkCommand>>,
    event_rx: Option<Receiver<PeerEvent>>,
    _thread: Option<JoinHandle<()>>,
}

impl PeerLink {
    /// Create a new disconnected link.
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            events: Vec::new(),
            cmd_tx: None,
            event_rx: None,
            _thread: None,
        }
    }

    /// Connect to the relay at `url` and join `room`.
    pub fn connect(&mut self, url: &str, room: &str) -> Result<(), LinkError> {
        if self.cmd_tx.is_some() {
            return Err(LinkError::AlreadyConnected);
        }

        let parsed = Url::parse(url)?;
        if parsed.scheme() != "ws" && parsed.scheme() != "wss" {
            return Err(LinkError::InvalidScheme(parsed.scheme().to_string()));
        }

        let join = ClientMessage::Join {
            room: room.to_string(),
        }
        .to_json()?;

        self.state = ConnectionState::Connecting;
        let (cmd_tx, cmd_rx) = channel::<LinkCommand>();
        let (event_tx, event_rx) = channel::<PeerEvent>();
        let url = url.to_string();

        // Queued before the thread starts, so it is the first frame on the socket.
        let _ = cmd_tx.send(LinkCommand::Send(join));

        let handle = thread::spawn(move || run_socket(&url, &cmd_rx, &event_tx));

        self.cmd_tx = Some(cmd_tx);
        self.event_rx = Some(event_rx);
        self._thread = Some(handle);
        Ok(())
    }

    /// Disconnect from the relay.
    pub fn disconnect(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(LinkCommand::Close);
        }
        self.event_rx = None;
        self._thread = None;
        self.state = ConnectionState::Disconnected;
    }

    /// Queue a message for the relay.
    pub fn send(&self, msg: &ClientMessage) -> Result<(), LinkError> {
        let tx = self.cmd_tx.as_ref().ok_or(LinkError::NotConnected)?;
        let json = msg.to_json()?;
        tx.send(LinkCommand::Send(json))
            .map_err(|_| LinkError::Closed)
    }

    /// Send a drawing to the peer. Empty boards are refused.
    pub fn send_board(&self, board: &Board) -> Result<(), LinkError> {
        if board.is_empty() {
            return Err(SendError::EmptyBoard.into());
        }
        self.send(&ClientMessage::Board {
            board: board.clone(),
        })
    }

    /// Share the local finger position, or `None` once it is lifted.
    pub fn send_touch(&self, position: Option<(f64, f64)>) -> Result<(), LinkError> {
        match position {
            Some((x, y)) => self.send(&ClientMessage::Touch { x, y }),
            None => self.send(&ClientMessage::TouchEnd),
        }
    }

    /// Drain events received since the last poll (non-blocking).
    pub fn poll_events(&mut self) -> Vec<PeerEvent> {
        if let Some(ref rx) = self.event_rx {
            while let Ok(event) = rx.try_recv() {
                match &event {
                    PeerEvent::Connected => self.state = ConnectionState::Connected,
                    PeerEvent::Disconnected => self.state = ConnectionState::Disconnected,
                    PeerEvent::Error { .. } => self.state = ConnectionState::Error,
                    _ => {}
                }
                self.events.push(event);
            }
        }

        std::mem::take(&mut self.events)
    }

    /// Get current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

impl Default for PeerLink {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PeerLink {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn run_socket(url: &str, cmd_rx: &Receiver<LinkCommand>, event_tx: &Sender<PeerEvent>) {
    log::info!("Peer link: connecting to {}", url);

    let (mut socket, response) = match connect(url) {
        Ok(connected) => connected,
        Err(e) => {
            log::error!("Peer link connection failed: {}", e);
            let _ = event_tx.send(PeerEvent::Error {
                message: format!("Connection failed: {}", e),
            });
            return;
        }
    };
    log::info!("Peer link connected, status: {}", response.status());
    let _ = event_tx.send(PeerEvent::Connected);

    if let tungstenite::stream::MaybeTlsStream::Plain(tcp) = socket.get_mut() {
        let _ = tcp.set_read_timeout(Some(Duration::from_millis(50)));
        let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
    }

    loop {
        match cmd_rx.try_recv() {
            Ok(LinkCommand::Send(msg)) => {
                log::debug!("Peer link sending {} bytes", msg.len());
                if let Err(e) = socket.send(Message::Text(msg)) {
                    log::error!("Peer link send error: {}", e);
                    break;
                }
            }
            Ok(LinkCommand::Close) => {
                log::info!("Peer link close requested");
                let _ = socket.close(None);
                break;
            }
            Err(TryRecvError::Disconnected) => {
                log::info!("Peer link command channel disconnected");
                break;
            }
            Err(TryRecvError::Empty) => {}
        }

        match socket.read() {
            Ok(Message::Text(txt)) => match decode_server_message(&txt) {
                Ok(event) => {
                    let _ = event_tx.send(event);
                }
                Err(e) => log::warn!("Failed to parse server message: {}", e),
            },
            Ok(Message::Ping(data)) => {
                let _ = socket.send(Message::Pong(data));
            }
            Ok(Message::Close(_)) => {
                log::info!("Peer link received close frame");
                break;
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e))
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(e) => {
                log::error!("Peer link read error: {}", e);
                break;
            }
        }
    }

    log::info!("Peer link thread exiting");
    let _ = event_tx.send(PeerEvent::Disconnected);
}
