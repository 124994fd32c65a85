//! Stroke recorder: turns pointer events into timed strokes on a board.

use crate::board::Board;
use crate::owner::OwningThread;
use crate::stroke::{Stroke, StrokeColor, StrokeId};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Tunables for stroke capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Thickness of a stroke drawn without dwelling, before density scaling.
    pub base_thickness: f64,
    /// Display density multiplier applied to every thickness.
    pub density: f64,
    /// Dwell before the first move at which thickness reaches twice the base.
    pub max_dwell_ms: u64,
    /// Moves closer together than this are dropped.
    pub min_move_interval_ms: u64,
    /// Offset of the synthetic sample added to a tap.
    pub tap_offset: f64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            base_thickness: 15.0,
            density: 1.0,
            max_dwell_ms: 1_000,
            min_move_interval_ms: 30,
            tap_offset: 1.0,
        }
    }
}

/// Bookkeeping for the stroke under the pointer.
#[derive(Debug, Clone, Copy)]
struct OpenStroke {
    id: StrokeId,
    down_at: u64,
    last_accepted: u64,
    moved: bool,
}

/// Records pointer events into the last stroke of a board.
#[derive(Debug, Clone)]
pub struct StrokeRecorder {
    config: RecorderConfig,
    color: StrokeColor,
    base_thickness: f64,
    open: Option<OpenStroke>,
    owner: OwningThread,
}

impl Default for StrokeRecorder {
    fn default() -> Self {
        Self::new(RecorderConfig::default())
    }
}

impl StrokeRecorder {
    /// Create a new recorder.
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            base_thickness: config.base_thickness,
            config,
            color: StrokeColor::default(),
            open: None,
            owner: OwningThread::new(),
        }
    }

    /// Check if a stroke is currently open.
    pub fn is_recording(&self) -> bool {
        self.open.is_some()
    }

    pub fn color(&self) -> StrokeColor {
        self.color
    }

    /// Color applied to strokes started from now on.
    pub fn set_color(&mut self, color: StrokeColor) {
        self.color = color;
    }

    pub fn base_thickness(&self) -> f64 {
        self.base_thickness
    }

    /// Base thickness for strokes started from now on. Non-positive values are ignored.
    pub fn set_base_thickness(&mut self, thickness: f64) {
        if thickness.is_finite() && thickness > 0.0 {
            self.base_thickness = thickness;
        }
    }

    fn scaled_base(&self) -> f64 {
        self.base_thickness * self.config.density
    }

    /// Thickness for a stroke whose first move came `dwell_ms` after pointer-down.
    ///
    /// Scales linearly from 1x to 2x the base, saturating at `max_dwell_ms`.
    pub fn thickness_for_dwell(&self, dwell_ms: u64) -> f64 {
        let max = self.config.max_dwell_ms.max(1);
        let coeff = 1.0 + dwell_ms.min(max) as f64 / max as f64;
        self.scaled_base() * coeff
    }

    fn relative_time(board: &Board, now: u64) -> u64 {
        let origin = board.origin().unwrap_or(now as i64);
        (now as i64 - origin).max(0) as u64
    }

    /// Start a stroke. An empty board gets a fresh recording origin at `now`.
    pub fn on_pointer_down(&mut self, board: &mut Board, x: f64, y: f64, now: u64) -> StrokeId {
        self.owner.check("StrokeRecorder::on_pointer_down");

        if self.open.is_some() {
            log::debug!("Pointer down while a stroke is open, closing it first");
            self.on_pointer_up(board, x, y, now);
        }

        if board.is_empty() {
            board.clear();
            board.set_origin(now as i64);
        } else if board.origin().is_none() {
            // Continue the board's timeline after its last sample.
            let last = board.last_time().unwrap_or(0);
            board.set_origin(now as i64 - last as i64);
        }

        let time = Self::relative_time(board, now);
        let stroke = Stroke::begin(Point::new(x, y), time, self.color, self.scaled_base());
        let id = stroke.id();
        board.push(stroke);

        self.open = Some(OpenStroke {
            id,
            down_at: now,
            last_accepted: now,
            moved: false,
        });
        id
    }

    /// Extend the open stroke. Returns false when the move was dropped.
    pub fn on_pointer_move(&mut self, board: &mut Board, x: f64, y: f64, now: u64) -> bool {
        self.owner.check("StrokeRecorder::on_pointer_move");

        let Some(mut open) = self.open else {
            return false;
        };
        if now.saturating_sub(open.last_accepted) < self.config.min_move_interval_ms {
            return false;
        }

        let thickness = (!open.moved).then(|| self.thickness_for_dwell(now.saturating_sub(open.down_at)));
        let time = Self::relative_time(board, now);
        let Some(stroke) = Self::open_stroke(board, open.id) else {
            log::debug!("Open stroke {} vanished from the board", open.id);
            self.open = None;
            return false;
        };
        if let Some(thickness) = thickness {
            stroke.set_thickness(thickness);
        }
        stroke.push_sample(Point::new(x, y), time);

        open.moved = true;
        open.last_accepted = now;
        self.open = Some(open);
        true
    }

    /// Freeze the open stroke. A stroke that never moved receives a synthetic
    /// sample so it renders as a dot.
    pub fn on_pointer_up(&mut self, board: &mut Board, _x: f64, _y: f64, now: u64) -> Option<StrokeId> {
        self.owner.check("StrokeRecorder::on_pointer_up");

        let open = self.open.take()?;
        let time = Self::relative_time(board, now);
        let base = self.scaled_base();
        let offset = self.config.tap_offset;
        let stroke = Self::open_stroke(board, open.id)?;
        if !open.moved {
            stroke.set_thickness(base);
            let dot = stroke.last_point_offset(offset);
            stroke.push_sample(dot, time);
        }
        Some(open.id)
    }

    /// Drop the open stroke without touching the board.
    pub fn abandon(&mut self) {
        self.open = None;
    }

    fn open_stroke(board: &mut Board, id: StrokeId) -> Option<&mut Stroke> {
        board.last_mut().filter(|stroke| stroke.id() == id)
    }
}
