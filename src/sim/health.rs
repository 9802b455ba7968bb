//! Bounded hit-point pool with an edge-triggered death

use serde::{Deserialize, Serialize};

use crate::non_negative;

/// Smallest max health a track accepts
const MIN_MAX_HEALTH: f32 = 1e-3;

/// Hit points for one combatant.
///
/// `current` never leaves `[0, max]`. `alive` flips to false exactly once per
/// life and only [`HealthTrack::reset`] brings it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthTrack {
    max: f32,
    current: f32,
    alive: bool,
}

impl HealthTrack {
    pub fn new(max: f32) -> Self {
        let max = if max.is_nan() { MIN_MAX_HEALTH } else { max.max(MIN_MAX_HEALTH) };
        Self {
            max,
            current: max,
            alive: true,
        }
    }

    #[inline]
    pub fn max(&self) -> f32 {
        self.max
    }

    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Remaining health as a fraction of max (for health bars)
    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 { self.current / self.max } else { 0.0 }
    }

    /// Apply damage. Returns true only on the tick this damage kills.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.alive {
            return false;
        }
        self.current = (self.current - non_negative(amount)).max(0.0);
        if self.current <= 0.0 {
            self.alive = false;
            return true;
        }
        false
    }

    pub fn heal(&mut self, amount: f32) {
        if !self.alive {
            return;
        }
        self.current = (self.current + non_negative(amount)).min(self.max);
    }

    /// Start a new life at full health
    pub fn reset(&mut self) {
        self.alive = true;
        self.current = self.max;
    }
}
