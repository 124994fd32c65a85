//! Touch-through: shows where the peer's finger is and whether it meets ours.

use kurbo::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchThroughConfig {
    pub radius_x: f64,
    pub radius_y: f64,
}

impl Default for TouchThroughConfig {
    fn default() -> Self {
        Self {
            radius_x: 20.0,
            radius_y: 25.0,
        }
    }
}

/// Whose finger a position belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    Local,
    Remote,
}

/// Current finger positions of both participants.
#[derive(Debug, Clone, Default)]
pub struct TouchThrough {
    config: TouchThroughConfig,
    local: Option<Point>,
    remote: Option<Point>,
}

impl TouchThrough {
    pub fn new(config: TouchThroughConfig) -> Self {
        Self {
            config,
            local: None,
            remote: None,
        }
    }

    fn slot(&mut self, owner: Owner) -> &mut Option<Point> {
        match owner {
            Owner::Local => &mut self.local,
            Owner::Remote => &mut self.remote,
        }
    }

    /// Place or move `owner`'s finger.
    pub fn press(&mut self, owner: Owner, x: f64, y: f64) {
        *self.slot(owner) = Some(Point::new(x, y));
    }

    /// `owner` lifted their finger.
    pub fn lift(&mut self, owner: Owner) {
        *self.slot(owner) = None;
    }

    pub fn position(&self, owner: Owner) -> Option<Point> {
        match owner {
            Owner::Local => self.local,
            Owner::Remote => self.remote,
        }
    }

    /// Distance below which two fingers touch.
    pub fn contact_distance(&self) -> f64 {
        self.config.radius_x + self.config.radius_y
    }

    /// True when both fingers are down and close enough to touch.
    pub fn collides(&self) -> bool {
        match (self.local, self.remote) {
            (Some(a), Some(b)) => a.distance(b) < self.contact_distance(),
            _ => false,
        }
    }
}
