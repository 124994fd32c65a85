//! Timed replay of a stroke sequence.
//!
//! The engine is driven by the host's redraw loop: while it is playing, call
//! [`ReplayEngine::tick`] once per frame and hand the returned [`Frame`] to
//! the renderer. Ticks never fail and never rewind.

use crate::clock::{Cursor, ReplayClock, advance};
use crate::owner::OwningThread;
use crate::stroke::{MalformedStrokeError, Stroke};
use kurbo::BezPath;
use thiserror::Error;

/// Replay errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReplayError {
    #[error("no drawing to animate")]
    EmptyInput,
    #[error("resume index {index} is out of range for {len} strokes")]
    ResumeOutOfRange { index: usize, len: usize },
    #[error("stroke {index} is malformed: {source}")]
    Malformed {
        index: usize,
        source: MalformedStrokeError,
    },
}

/// Replay lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayMode {
    #[default]
    Idle,
    Playing,
    Done,
}

/// Snapshot of the engine for inspection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayState {
    pub mode: ReplayMode,
    pub current_stroke_index: usize,
    pub revealed_length: f64,
    pub start_time: Option<i64>,
    pub min_time: u64,
    pub max_time: u64,
}

/// The stroke currently being revealed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartialStroke<'a> {
    pub stroke: &'a Stroke,
    pub revealed_length: f64,
}

impl PartialStroke<'_> {
    /// The visible part of the stroke.
    pub fn path(&self) -> BezPath {
        self.stroke.path_up_to(self.revealed_length)
    }
}

/// Render payload for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<'a> {
    pub mode: ReplayMode,
    /// Strokes drawn in full.
    pub finished: &'a [Stroke],
    /// Stroke drawn up to its revealed length, if any.
    pub partial: Option<PartialStroke<'a>>,
    /// Progress in percent.
    pub progress: u8,
}

impl<'a> Frame<'a> {
    /// A frame that draws `strokes` in full.
    pub fn still(strokes: &'a [Stroke], mode: ReplayMode) -> Self {
        Self {
            mode,
            finished: strokes,
            partial: None,
            progress: if mode == ReplayMode::Done { 100 } else { 0 },
        }
    }

    /// Number of strokes with at least something drawn.
    pub fn visible_strokes(&self) -> usize {
        self.finished.len() + usize::from(self.partial.is_some())
    }
}

fn check_strokes(strokes: &[Stroke]) -> Result<(), ReplayError> {
    for (index, stroke) in strokes.iter().enumerate() {
        stroke
            .validate()
            .map_err(|source| ReplayError::Malformed { index, source })?;
    }
    Ok(())
}

/// Replays strokes paced by their recorded sample times.
#[derive(Debug, Default)]
pub struct ReplayEngine {
    mode: ReplayMode,
    strokes: Vec<Stroke>,
    clock: Option<ReplayClock>,
    cursor: Cursor,
    owner: OwningThread,
}

impl ReplayEngine {
    /// Create an idle engine.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ReplayMode {
        self.mode
    }

    /// Check if a replay is in flight and wants ticks.
    pub fn is_playing(&self) -> bool {
        self.mode == ReplayMode::Playing
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn clock(&self) -> Option<&ReplayClock> {
        self.clock.as_ref()
    }

    pub fn current_stroke_index(&self) -> usize {
        self.cursor.stroke
    }

    pub fn revealed_length(&self) -> f64 {
        self.cursor.revealed
    }

    pub fn state(&self) -> ReplayState {
        ReplayState {
            mode: self.mode,
            current_stroke_index: self.cursor.stroke,
            revealed_length: self.cursor.revealed,
            start_time: self.clock.map(|c| c.start_ms()),
            min_time: self.clock.map_or(0, |c| c.min_time()),
            max_time: self.clock.map_or(0, |c| c.max_time()),
        }
    }

    /// Progress in percent at `now`.
    pub fn progress(&self, now: u64) -> u8 {
        match (self.mode, self.clock) {
            (ReplayMode::Done, _) => 100,
            (ReplayMode::Playing, Some(clock)) => clock.progress(now),
            _ => 0,
        }
    }

    /// Replay `strokes` from the first one, with recorded time zero at `now`.
    pub fn launch(&mut self, strokes: Vec<Stroke>, now: u64) -> Result<(), ReplayError> {
        self.owner.check("ReplayEngine::launch");
        check_strokes(&strokes)?;
        let clock = ReplayClock::for_launch(&strokes, now).ok_or(ReplayError::EmptyInput)?;
        log::info!("Launching replay of {} strokes", strokes.len());
        self.start(strokes, clock, Cursor::default());
        Ok(())
    }

    /// Replay `strokes` from `index`, drawing the earlier ones immediately.
    ///
    /// The clock is placed so that stroke `index` begins at `now`, which keeps
    /// the recorded pacing of everything after it.
    pub fn launch_resuming(
        &mut self,
        strokes: Vec<Stroke>,
        index: usize,
        now: u64,
    ) -> Result<(), ReplayError> {
        self.owner.check("ReplayEngine::launch_resuming");
        if strokes.is_empty() {
            return Err(ReplayError::EmptyInput);
        }
        check_strokes(&strokes)?;
        let clock = ReplayClock::for_resume(&strokes, index, now).ok_or(
            ReplayError::ResumeOutOfRange {
                index,
                len: strokes.len(),
            },
        )?;
        log::info!("Resuming replay at stroke {} of {}", index, strokes.len());
        self.start(strokes, clock, Cursor::at_stroke(index));
        Ok(())
    }

    fn start(&mut self, strokes: Vec<Stroke>, clock: ReplayClock, cursor: Cursor) {
        self.strokes = strokes;
        self.clock = Some(clock);
        self.cursor = cursor;
        self.mode = ReplayMode::Playing;
    }

    /// Abandon the replay and return to idle.
    pub fn cancel(&mut self) {
        self.owner.check("ReplayEngine::cancel");
        if self.mode == ReplayMode::Playing {
            log::info!("Replay cancelled at stroke {}", self.cursor.stroke);
        }
        *self = Self {
            owner: self.owner.clone(),
            ..Self::default()
        };
    }

    /// Advance to `now` and return what to draw.
    pub fn tick(&mut self, now: u64) -> Frame<'_> {
        self.owner.check("ReplayEngine::tick");
        if self.mode == ReplayMode::Playing {
            if let Some(clock) = self.clock {
                if advance(&self.strokes, &mut self.cursor, clock.elapsed(now)) {
                    self.mode = ReplayMode::Done;
                    log::info!("Replay done");
                }
            }
        }
        self.frame(now)
    }

    /// Render payload for the current state without advancing.
    pub fn frame(&self, now: u64) -> Frame<'_> {
        if self.mode != ReplayMode::Playing {
            return Frame::still(&self.strokes, self.mode);
        }

        let index = self.cursor.stroke.min(self.strokes.len());
        let partial = self
            .strokes
            .get(index)
            .filter(|_| self.cursor.sample > 0)
            .map(|stroke| PartialStroke {
                stroke,
                revealed_length: self.cursor.revealed,
            });
        Frame {
            mode: self.mode,
            finished: &self.strokes[..index],
            partial,
            progress: self.progress(now),
        }
    }
}
