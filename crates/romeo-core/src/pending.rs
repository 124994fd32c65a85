//! Single-slot queue for a board waiting to be shown.

use crate::board::Board;

/// Which notification affordance a queued board raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// Arrived while the local board was empty and the user was away.
    Message,
    /// Arrived while an unrelated local board was on screen.
    Overflow,
}

/// Holds at most one deferred board. A newer board replaces the queued one.
#[derive(Debug, Clone, Default)]
pub struct PendingQueue {
    board: Option<Board>,
    indicator: Option<Indicator>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `board`, returning the board it replaces.
    pub fn store(&mut self, board: Board, indicator: Indicator) -> Option<Board> {
        let replaced = self.board.replace(board);
        if replaced.is_some() {
            log::debug!("Pending board replaced by a newer one");
        }
        self.indicator = Some(indicator);
        replaced
    }

    /// Remove the queued board and lower both indicators.
    pub fn take(&mut self) -> Option<Board> {
        self.indicator = None;
        self.board.take()
    }

    pub fn peek(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.board.is_none()
    }

    pub fn indicator(&self) -> Option<Indicator> {
        self.indicator
    }

    /// Check if the message indicator should be shown.
    pub fn is_message_pending(&self) -> bool {
        self.indicator == Some(Indicator::Message)
    }

    /// Check if the overflow indicator should be shown.
    pub fn is_overflow_pending(&self) -> bool {
        self.indicator == Some(Indicator::Overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::{Stroke, StrokeColor};
    use kurbo::Point;

    fn board() -> Board {
        Board::from_strokes(vec![Stroke::begin(Point::ZERO, 0, StrokeColor::RED, 15.0)])
    }

    #[test]
    fn test_last_writer_wins() {
        let mut queue = PendingQueue::new();
        let first = board();
        let second = board();
        assert!(queue.store(first.clone(), Indicator::Message).is_none());
        let replaced = queue.store(second.clone(), Indicator::Overflow);

        assert_eq!(replaced, Some(first));
        assert_eq!(queue.peek(), Some(&second));
        assert!(queue.is_overflow_pending());
        assert!(!queue.is_message_pending());
    }

    #[test]
    fn test_take_clears_indicators() {
        let mut queue = PendingQueue::new();
        queue.store(board(), Indicator::Message);
        assert!(queue.is_message_pending());
        assert!(queue.take().is_some());
        assert!(queue.is_empty());
        assert_eq!(queue.indicator(), None);
        assert!(queue.take().is_none());
    }
}
