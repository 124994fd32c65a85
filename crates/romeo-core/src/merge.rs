//! Merge policy for boards arriving from a peer.
//!
//! Classification is pure: it looks at the local board, the incoming board
//! and the local user's presence, and says what the session should do. The
//! session carries the decision out.

use crate::board::Board;
use serde::{Deserialize, Serialize};

/// Whether the local user is around to watch an incoming board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Available,
    Away,
    #[default]
    Unknown,
}

impl Presence {
    /// Unknown presence is handled like Away.
    pub fn is_available(self) -> bool {
        self == Presence::Available
    }
}

/// What to do with an incoming board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    /// Local board is empty and the user is here: adopt and replay it.
    ReplayNow,
    /// Local board is empty but the user is away: queue it, raise the message indicator.
    QueuePending,
    /// Incoming board extends the local one: adopt it and animate the tail.
    Response { resume_from: usize },
    /// Incoming board is unrelated to the local one: queue it, raise the overflow indicator.
    QueueOverflow,
    /// Same strokes as the local board: ignore.
    Duplicate,
    /// Incoming board has no strokes: ignore.
    Rejected,
}

impl MergeDecision {
    /// Check if the decision leaves every piece of local state untouched.
    pub fn is_ignored(self) -> bool {
        matches!(self, MergeDecision::Duplicate | MergeDecision::Rejected)
    }
}

/// Decides how an incoming board relates to the local one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergePolicy;

impl MergePolicy {
    pub fn classify(local: &Board, incoming: &Board, presence: Presence) -> MergeDecision {
        if incoming.is_empty() {
            return MergeDecision::Rejected;
        }

        if local.is_empty() {
            return if presence.is_available() {
                MergeDecision::ReplayNow
            } else {
                MergeDecision::QueuePending
            };
        }

        if local.is_prefix_of(incoming) {
            if local.len() == incoming.len() {
                MergeDecision::Duplicate
            } else {
                MergeDecision::Response {
                    resume_from: local.len(),
                }
            }
        } else {
            MergeDecision::QueueOverflow
        }
    }
}
