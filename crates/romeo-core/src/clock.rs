//! Replay clock: maps wall-clock time onto a board's recorded timeline.

use crate::stroke::Stroke;

/// Time origin and progress bounds of one replay.
///
/// `start_ms` is the wall-clock instant that corresponds to sample time zero.
/// It can be negative relative to the caller's clock when a replay resumes in
/// the middle of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayClock {
    start_ms: i64,
    min_time: u64,
    max_time: u64,
}

impl ReplayClock {
    pub fn new(start_ms: i64, min_time: u64, max_time: u64) -> Self {
        Self {
            start_ms,
            min_time,
            max_time: max_time.max(min_time),
        }
    }

    /// Clock for replaying `strokes` from the beginning, starting at `now`.
    pub fn for_launch(strokes: &[Stroke], now: u64) -> Option<Self> {
        let first = strokes.first()?;
        let last = strokes.last()?;
        Some(Self::new(now as i64, first.first_time(), last.last_time()))
    }

    /// Clock for replaying from `index`, placed so that stroke `index` starts at `now`.
    pub fn for_resume(strokes: &[Stroke], index: usize, now: u64) -> Option<Self> {
        let resumed = strokes.get(index)?;
        let last = strokes.last()?;
        let start = resumed.first_time();
        Some(Self::new(now as i64 - start as i64, start, last.last_time()))
    }

    pub fn start_ms(&self) -> i64 {
        self.start_ms
    }

    pub fn min_time(&self) -> u64 {
        self.min_time
    }

    pub fn max_time(&self) -> u64 {
        self.max_time
    }

    /// Milliseconds of recorded time reached at `now`, never negative.
    pub fn elapsed(&self, now: u64) -> u64 {
        (now as i64 - self.start_ms).max(0) as u64
    }

    /// Progress in percent between `min_time` and `max_time`.
    pub fn progress(&self, now: u64) -> u8 {
        if self.max_time == self.min_time {
            return 100;
        }
        let span = (self.max_time - self.min_time) as f64;
        let done = self.elapsed(now) as f64 - self.min_time as f64;
        (done / span * 100.0).clamp(0.0, 100.0) as u8
    }
}

/// Position of a replay within its stroke sequence.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cursor {
    /// Stroke being drawn.
    pub stroke: usize,
    /// Number of samples of that stroke already consumed.
    pub sample: usize,
    /// Arc length drawn so far along that stroke.
    pub revealed: f64,
}

impl Cursor {
    pub fn at_stroke(stroke: usize) -> Self {
        Self {
            stroke,
            sample: 0,
            revealed: 0.0,
        }
    }
}

/// Move `cursor` forward to `elapsed`. Returns true once every stroke is fully revealed.
///
/// The cursor only ever moves forward, and advancing twice to the same
/// `elapsed` leaves it where the first call put it.
pub fn advance(strokes: &[Stroke], cursor: &mut Cursor, elapsed: u64) -> bool {
    loop {
        let Some(stroke) = strokes.get(cursor.stroke) else {
            return true;
        };
        let times = stroke.sample_times();
        let lengths = stroke.sample_lengths();
        while cursor.sample < times.len() && times[cursor.sample] <= elapsed {
            cursor.revealed = cursor.revealed.max(lengths[cursor.sample]);
            cursor.sample += 1;
        }
        if cursor.sample < times.len() {
            return false;
        }
        if cursor.stroke + 1 >= strokes.len() {
            return true;
        }
        *cursor = Cursor::at_stroke(cursor.stroke + 1);
    }
}

/// Where a replay launched from the start would be after `elapsed` ms.
pub fn reveal_at(strokes: &[Stroke], elapsed: u64) -> (Cursor, bool) {
    let mut cursor = Cursor::default();
    let done = advance(strokes, &mut cursor, elapsed);
    (cursor, done)
}
