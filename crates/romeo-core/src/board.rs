//! Board: the ordered set of strokes shown together.

use crate::stroke::{MalformedStrokeError, Stroke, StrokeId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons an incoming board is refused.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("board has no strokes")]
    Empty,
    #[error("stroke {index} is malformed: {source}")]
    Malformed {
        index: usize,
        #[source]
        source: MalformedStrokeError,
    },
    #[error("board could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// An ordered sequence of strokes sharing one recording origin.
///
/// The origin is the wall-clock millisecond that corresponds to sample time
/// zero. It is local bookkeeping and is not serialized: a received board gets
/// a fresh origin when it is replayed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Board {
    strokes: Vec<Stroke>,
    #[serde(skip)]
    origin: Option<i64>,
}

impl Board {
    /// Create a new empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a board from existing strokes.
    pub fn from_strokes(strokes: Vec<Stroke>) -> Self {
        Self {
            strokes,
            origin: None,
        }
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn into_strokes(self) -> Vec<Stroke> {
        self.strokes
    }

    /// Get the number of strokes.
    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    /// Check if the board is empty.
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Recording origin, if one has been established.
    pub fn origin(&self) -> Option<i64> {
        self.origin
    }

    pub(crate) fn set_origin(&mut self, origin: i64) {
        self.origin = Some(origin);
    }

    pub(crate) fn push(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
    }

    pub(crate) fn last_mut(&mut self) -> Option<&mut Stroke> {
        self.strokes.last_mut()
    }

    /// Remove the most recent stroke.
    pub fn erase_last(&mut self) -> Option<Stroke> {
        self.strokes.pop()
    }

    /// Clear all strokes and forget the origin.
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.origin = None;
    }

    /// Stroke identifiers in order.
    pub fn ids(&self) -> impl Iterator<Item = StrokeId> + '_ {
        self.strokes.iter().map(Stroke::id)
    }

    /// Latest sample time over all strokes.
    pub fn last_time(&self) -> Option<u64> {
        self.strokes.iter().map(Stroke::last_time).max()
    }

    /// True when every stroke of `self` appears, by id and position, at the
    /// start of `other`.
    pub fn is_prefix_of(&self, other: &Board) -> bool {
        self.len() <= other.len() && self.ids().zip(other.ids()).all(|(a, b)| a == b)
    }

    /// Check that the board is non-empty and every stroke is well formed.
    pub fn validate(&self) -> Result<(), BoardError> {
        if self.strokes.is_empty() {
            return Err(BoardError::Empty);
        }
        for (index, stroke) in self.strokes.iter().enumerate() {
            stroke
                .validate()
                .map_err(|source| BoardError::Malformed { index, source })?;
        }
        Ok(())
    }

    /// Serialize the board to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize a board from JSON. The result is not validated.
    pub fn from_json(json: &str) -> Result<Self, BoardError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::StrokeColor;
    use kurbo::Point;

    fn stroke_at(x: f64, time: u64) -> Stroke {
        let mut stroke = Stroke::begin(Point::new(x, 0.0), time, StrokeColor::BLACK, 15.0);
        stroke.push_sample(Point::new(x, 10.0), time + 30);
        stroke
    }

    #[test]
    fn test_erase_last_and_clear() {
        let mut board = Board::from_strokes(vec![stroke_at(0.0, 0), stroke_at(5.0, 100)]);
        board.set_origin(1_000);
        assert!(board.erase_last().is_some());
        assert_eq!(board.len(), 1);
        board.clear();
        assert!(board.is_empty());
        assert_eq!(board.origin(), None);
    }

    #[test]
    fn test_prefix_by_id() {
        let a = stroke_at(0.0, 0);
        let b = stroke_at(5.0, 100);
        let c = stroke_at(9.0, 200);
        let local = Board::from_strokes(vec![a.clone(), b.clone()]);
        let response = Board::from_strokes(vec![a.clone(), b, c.clone()]);
        let unrelated = Board::from_strokes(vec![a, c]);

        assert!(local.is_prefix_of(&response));
        assert!(!local.is_prefix_of(&unrelated));
        assert!(!response.is_prefix_of(&local));
    }

    #[test]
    fn test_validate_reports_stroke_index() {
        let mut bad = stroke_at(1.0, 0);
        bad.sample_lengths.pop();
        let board = Board::from_strokes(vec![stroke_at(0.0, 0), bad]);
        match board.validate() {
            Err(BoardError::Malformed { index, .. }) => assert_eq!(index, 1),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(matches!(Board::new().validate(), Err(BoardError::Empty)));
    }

    #[test]
    fn test_json_keeps_ids_and_drops_origin() {
        let mut board = Board::from_strokes(vec![stroke_at(0.0, 0)]);
        board.set_origin(42);
        let decoded = Board::from_json(&board.to_json().unwrap()).unwrap();
        assert_eq!(decoded.ids().collect::<Vec<_>>(), board.ids().collect::<Vec<_>>());
        assert_eq!(decoded.origin(), None);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(Board::from_json("{not json"), Err(BoardError::Decode(_))));
    }
}
