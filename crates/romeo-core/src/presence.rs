//! Local user activity tracking.

use crate::merge::Presence;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// The user counts as away after this long without interaction.
    pub inactivity_timeout_ms: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout_ms: 15_000,
        }
    }
}

/// Derives the user's presence from the time of their last interaction.
#[derive(Debug, Clone, Default)]
pub struct ActivityMonitor {
    config: PresenceConfig,
    last_activity: Option<u64>,
    override_presence: Option<Presence>,
}

impl ActivityMonitor {
    pub fn new(config: PresenceConfig) -> Self {
        Self {
            config,
            last_activity: None,
            override_presence: None,
        }
    }

    /// Record an interaction at `now`.
    pub fn touch(&mut self, now: u64) {
        self.last_activity = Some(self.last_activity.map_or(now, |last| last.max(now)));
    }

    pub fn last_activity(&self) -> Option<u64> {
        self.last_activity
    }

    /// Replace the derived presence with an external signal, or clear it with `None`.
    pub fn set_override(&mut self, presence: Option<Presence>) {
        self.override_presence = presence;
    }

    /// Presence at `now`.
    pub fn presence(&self, now: u64) -> Presence {
        if let Some(presence) = self.override_presence {
            return presence;
        }
        match self.last_activity {
            Some(last) if now.saturating_sub(last) < self.config.inactivity_timeout_ms => {
                Presence::Available
            }
            Some(_) => Presence::Away,
            None => Presence::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_marks_away() {
        let mut monitor = ActivityMonitor::default();
        assert_eq!(monitor.presence(0), Presence::Unknown);
        monitor.touch(1_000);
        assert_eq!(monitor.presence(15_999), Presence::Available);
        assert_eq!(monitor.presence(16_000), Presence::Away);
        monitor.touch(16_500);
        assert_eq!(monitor.presence(17_000), Presence::Available);
    }

    #[test]
    fn test_override_wins() {
        let mut monitor = ActivityMonitor::default();
        monitor.touch(0);
        monitor.set_override(Some(Presence::Away));
        assert_eq!(monitor.presence(1), Presence::Away);
        monitor.set_override(None);
        assert_eq!(monitor.presence(1), Presence::Available);
    }
}
