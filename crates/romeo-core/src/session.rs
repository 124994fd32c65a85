//! Session controller.
//!
//! A [`Session`] owns everything one screen needs: the board, the recorder,
//! the main and overlay replays, the pending queue, the activity monitor and
//! the touch-through state. The host feeds it pointer events, peer events and
//! a clock, and asks it for frames.

use crate::board::{Board, BoardError};
use crate::config::RomeoConfig;
use crate::merge::{MergeDecision, MergePolicy, Presence};
use crate::owner::OwningThread;
use crate::pending::{Indicator, PendingQueue};
use crate::presence::ActivityMonitor;
use crate::recorder::StrokeRecorder;
use crate::replay::{Frame, ReplayEngine, ReplayError};
use crate::stroke::{Stroke, StrokeColor, StrokeId};
use crate::touch_through::{Owner, TouchThrough};
use crate::wire::PeerEvent;
use thiserror::Error;

/// Reasons a board cannot be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("no drawing to send")]
    EmptyBoard,
}

#[derive(Debug)]
pub struct Session {
    config: RomeoConfig,
    board: Board,
    recorder: StrokeRecorder,
    replay: ReplayEngine,
    overlay: ReplayEngine,
    overlay_visible: bool,
    pending: PendingQueue,
    activity: ActivityMonitor,
    touch: TouchThrough,
    owner: OwningThread,
}

impl Session {
    /// Create a session. The user counts as active at `now`.
    pub fn new(config: RomeoConfig, now: u64) -> Self {
        let mut recorder = StrokeRecorder::new(config.recorder.clone());
        recorder.set_color(config.default_color());
        let mut activity = ActivityMonitor::new(config.presence.clone());
        activity.touch(now);
        Self {
            recorder,
            activity,
            touch: TouchThrough::new(config.touch_through.clone()),
            config,
            board: Board::new(),
            replay: ReplayEngine::new(),
            overlay: ReplayEngine::new(),
            overlay_visible: false,
            pending: PendingQueue::new(),
            owner: OwningThread::new(),
        }
    }

    pub fn config(&self) -> &RomeoConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn replay(&self) -> &ReplayEngine {
        &self.replay
    }

    pub fn overlay(&self) -> &ReplayEngine {
        &self.overlay
    }

    pub fn pending(&self) -> &PendingQueue {
        &self.pending
    }

    pub fn touch_through(&self) -> &TouchThrough {
        &self.touch
    }

    pub fn touch_through_mut(&mut self) -> &mut TouchThrough {
        &mut self.touch
    }

    /// Check if the host should keep requesting frames.
    pub fn needs_redraw(&self) -> bool {
        self.replay.is_playing() || (self.overlay_visible && self.overlay.is_playing())
    }

    // --- Drawing ---

    /// Start a stroke. Ignored while the board is replaying.
    pub fn pointer_down(&mut self, x: f64, y: f64, now: u64) -> Option<StrokeId> {
        self.owner.check("Session::pointer_down");
        self.activity.touch(now);
        if self.replay.is_playing() {
            return None;
        }
        // A finished replay keeps its strokes; the new stroke appends to them.
        self.replay.cancel();
        Some(self.recorder.on_pointer_down(&mut self.board, x, y, now))
    }

    pub fn pointer_move(&mut self, x: f64, y: f64, now: u64) -> bool {
        self.owner.check("Session::pointer_move");
        self.activity.touch(now);
        if self.replay.is_playing() {
            return false;
        }
        self.recorder.on_pointer_move(&mut self.board, x, y, now)
    }

    pub fn pointer_up(&mut self, x: f64, y: f64, now: u64) -> Option<StrokeId> {
        self.owner.check("Session::pointer_up");
        self.activity.touch(now);
        if self.replay.is_playing() {
            return None;
        }
        self.recorder.on_pointer_up(&mut self.board, x, y, now)
    }

    pub fn set_color(&mut self, color: StrokeColor) {
        self.recorder.set_color(color);
    }

    pub fn set_base_thickness(&mut self, thickness: f64) {
        self.recorder.set_base_thickness(thickness);
    }

    /// Select a pen color from the configured palette.
    pub fn select_palette(&mut self, index: usize) -> Option<StrokeColor> {
        let color = self.config.palette.get(index).copied()?;
        self.recorder.set_color(color);
        Some(color)
    }

    /// Remove the most recent stroke. Ignored while the board is replaying.
    ///
    /// When this empties the board, a pending board takes its place.
    pub fn erase_last(&mut self, now: u64) -> Option<Stroke> {
        self.owner.check("Session::erase_last");
        if self.replay.is_playing() {
            return None;
        }
        self.recorder.abandon();
        let erased = self.board.erase_last();
        if erased.is_some() && self.board.is_empty() {
            self.board_emptied(now);
        }
        erased
    }

    /// Remove every stroke. Ignored while the board is replaying.
    pub fn erase_all(&mut self, now: u64) -> bool {
        self.owner.check("Session::erase_all");
        if self.replay.is_playing() {
            return false;
        }
        self.recorder.abandon();
        self.board.clear();
        self.board_emptied(now);
        true
    }

    fn board_emptied(&mut self, now: u64) {
        self.board.clear();
        self.replay.cancel();
        if let Some(board) = self.pending.take() {
            log::info!("Board emptied, promoting pending board");
            self.show_on_board(board, now);
        }
    }

    // --- Replay ---

    /// Replay the current board from its first stroke.
    pub fn animate(&mut self, now: u64) -> Result<(), ReplayError> {
        self.owner.check("Session::animate");
        self.activity.touch(now);
        if self.board.is_empty() {
            log::info!("Animate requested on an empty board");
            return Err(ReplayError::EmptyInput);
        }
        self.recorder.abandon();
        self.launch_board(None, now)
    }

    pub fn cancel_replay(&mut self) {
        self.owner.check("Session::cancel_replay");
        self.replay.cancel();
    }

    fn launch_board(&mut self, resume_from: Option<usize>, now: u64) -> Result<(), ReplayError> {
        let strokes = self.board.strokes().to_vec();
        match resume_from {
            Some(index) => self.replay.launch_resuming(strokes, index, now)?,
            None => self.replay.launch(strokes, now)?,
        }
        // Drawing after the replay continues its timeline.
        if let Some(clock) = self.replay.clock() {
            self.board.set_origin(clock.start_ms());
        }
        Ok(())
    }

    fn show_on_board(&mut self, board: Board, now: u64) {
        self.recorder.abandon();
        self.board = board;
        if let Err(e) = self.launch_board(None, now) {
            log::warn!("Could not replay board: {}", e);
        }
    }

    /// Render payload for the main board at `now`.
    ///
    /// The tick that finishes the replay also opens a pending board.
    pub fn frame(&mut self, now: u64) -> Frame<'_> {
        self.owner.check("Session::frame");
        if self.replay.is_playing() {
            self.replay.tick(now);
            if !self.replay.is_playing() {
                if let Some(board) = self.pending.take() {
                    log::info!("Replay finished, promoting pending board");
                    self.present(board, now);
                }
            }
            return self.replay.frame(now);
        }
        Frame::still(self.board.strokes(), self.replay.mode())
    }

    /// Render payload for the overlay, if it is shown.
    pub fn overlay_frame(&mut self, now: u64) -> Option<Frame<'_>> {
        self.owner.check("Session::overlay_frame");
        if !self.overlay_visible {
            return None;
        }
        Some(self.overlay.tick(now))
    }

    pub fn is_overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    /// Hide the overlay. Refused while it is still replaying.
    pub fn dismiss_overlay(&mut self) -> bool {
        self.owner.check("Session::dismiss_overlay");
        if self.overlay.is_playing() {
            return false;
        }
        self.overlay.cancel();
        self.overlay_visible = false;
        true
    }

    // --- Exchange ---

    /// The board to send to the peer.
    pub fn outgoing_board(&self) -> Result<&Board, SendError> {
        if self.board.is_empty() {
            Err(SendError::EmptyBoard)
        } else {
            Ok(&self.board)
        }
    }

    /// Replace the derived presence with an external signal, or clear it with `None`.
    pub fn set_presence(&mut self, presence: Option<Presence>) {
        self.activity.set_override(presence);
    }

    pub fn presence(&self, now: u64) -> Presence {
        self.activity.presence(now)
    }

    /// Merge a board received from the peer.
    ///
    /// A malformed board is refused before any state changes.
    pub fn receive_board(&mut self, incoming: Board, now: u64) -> Result<MergeDecision, BoardError> {
        self.owner.check("Session::receive_board");
        incoming.validate()?;

        let decision = MergePolicy::classify(&self.board, &incoming, self.activity.presence(now));
        log::info!(
            "Received board of {} strokes: {:?}",
            incoming.len(),
            decision
        );

        match decision {
            MergeDecision::ReplayNow => self.show_on_board(incoming, now),
            MergeDecision::Response { resume_from } => {
                self.recorder.abandon();
                self.board = incoming;
                if let Err(e) = self.launch_board(Some(resume_from), now) {
                    log::warn!("Could not replay response: {}", e);
                }
            }
            MergeDecision::QueuePending => {
                self.pending.store(incoming, Indicator::Message);
            }
            MergeDecision::QueueOverflow => {
                self.pending.store(incoming, Indicator::Overflow);
            }
            MergeDecision::Duplicate | MergeDecision::Rejected => {
                log::debug!("Ignoring incoming board");
            }
        }
        Ok(decision)
    }

    /// Decode a JSON board and merge it.
    pub fn receive_payload(&mut self, json: &str, now: u64) -> Result<MergeDecision, BoardError> {
        let board = Board::from_json(json)?;
        self.receive_board(board, now)
    }

    /// Show the pending board: on the main board when it is empty, otherwise
    /// in the overlay. Returns false when nothing was pending.
    pub fn open_pending(&mut self, now: u64) -> bool {
        self.owner.check("Session::open_pending");
        self.activity.touch(now);
        let Some(board) = self.pending.take() else {
            return false;
        };

        self.present(board, now);
        true
    }

    fn present(&mut self, board: Board, now: u64) {
        if self.board.is_empty() {
            self.show_on_board(board, now);
        } else {
            match self.overlay.launch(board.into_strokes(), now) {
                Ok(()) => self.overlay_visible = true,
                Err(e) => log::warn!("Could not replay pending board: {}", e),
            }
        }
    }

    pub fn is_message_pending(&self) -> bool {
        self.pending.is_message_pending()
    }

    pub fn is_overflow_pending(&self) -> bool {
        self.pending.is_overflow_pending()
    }

    /// Apply an event drained from the peer link.
    pub fn apply_peer_event(&mut self, event: PeerEvent, now: u64) {
        match event {
            PeerEvent::BoardReceived { from, board } => {
                if let Err(e) = self.receive_board(board, now) {
                    log::warn!("Dropping board from {}: {}", from, e);
                }
            }
            PeerEvent::TouchReceived { x, y, .. } => self.touch.press(Owner::Remote, x, y),
            PeerEvent::TouchEnded { .. } | PeerEvent::PeerLeft { .. } => {
                self.touch.lift(Owner::Remote)
            }
            PeerEvent::Error { message } => log::error!("Peer link error: {}", message),
            other => log::debug!("Peer event: {:?}", other),
        }
    }
}
