//! Romeo Core Library
//!
//! Platform-agnostic stroke capture, timed replay and merge logic for Romeo
//! drawing messages. Rendering, input plumbing and UI affordances live outside
//! this crate; it only exposes board mutations, per-frame render payloads and
//! notification flags.

pub mod board;
pub mod clock;
pub mod config;
pub mod merge;
pub mod pending;
pub mod presence;
pub mod recorder;
pub mod replay;
pub mod session;
pub mod stroke;
pub mod touch_through;
pub mod wire;

#[cfg(all(feature = "native-link", not(target_arch = "wasm32")))]
pub mod link;

mod owner;

pub use board::{Board, BoardError};
pub use clock::ReplayClock;
pub use config::{ConfigError, LinkConfig, RomeoConfig};
pub use merge::{MergeDecision, MergePolicy, Presence};
pub use pending::{Indicator, PendingQueue};
pub use presence::{ActivityMonitor, PresenceConfig};
pub use recorder::{RecorderConfig, StrokeRecorder};
pub use replay::{Frame, PartialStroke, ReplayEngine, ReplayError, ReplayMode, ReplayState};
pub use session::{SendError, Session};
pub use stroke::{MalformedStrokeError, Stroke, StrokeColor, StrokeId};
pub use touch_through::{Owner, TouchThrough, TouchThroughConfig};
pub use wire::{ClientMessage, ConnectionState, PeerEvent, ServerMessage};

#[cfg(all(feature = "native-link", not(target_arch = "wasm32")))]
pub use link::{LinkError, PeerLink};
