//! Run lifecycle and the shared pausable clock

use serde::{Deserialize, Serialize};

/// Current phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Running,
    /// Game is paused
    Paused,
    /// Player died; only Retry leaves this phase
    GameOver,
}

/// Simulation clock shared by every timer.
///
/// Pause and game over set the scale to zero, which freezes cooldowns,
/// lifetimes and movement (and with movement, spawn cadence) in one place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    time_scale: f32,
    /// Scaled seconds since the run started
    elapsed: f64,
}

impl Default for SimClock {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            elapsed: 0.0,
        }
    }
}

impl SimClock {
    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Scale a raw frame delta and advance the clock by the result
    pub fn advance(&mut self, dt: f32) -> f32 {
        let scaled = crate::non_negative(dt) * self.time_scale;
        self.elapsed += scaled as f64;
        scaled
    }

    fn set_scale(&mut self, scale: f32) {
        self.time_scale = scale;
    }

    fn restart(&mut self) {
        *self = Self::default();
    }
}

/// Top-level run state machine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lifecycle {
    phase: GamePhase,
    clock: SimClock,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            phase: GamePhase::Running,
            clock: SimClock::default(),
        }
    }
}

impl Lifecycle {
    #[inline]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    #[inline]
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut SimClock {
        &mut self.clock
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    /// Running -> Paused. No-op in any other phase.
    pub fn pause(&mut self) -> bool {
        if self.phase != GamePhase::Running {
            return false;
        }
        self.phase = GamePhase::Paused;
        self.clock.set_scale(0.0);
        true
    }

    /// Paused -> Running. No-op in any other phase.
    pub fn resume(&mut self) -> bool {
        if self.phase != GamePhase::Paused {
            return false;
        }
        self.phase = GamePhase::Running;
        self.clock.set_scale(1.0);
        true
    }

    /// Enter game over. Returns true only the first time.
    pub fn trigger_game_over(&mut self) -> bool {
        if self.phase == GamePhase::GameOver {
            return false;
        }
        self.phase = GamePhase::GameOver;
        self.clock.set_scale(0.0);
        true
    }

    /// Back to a fresh running state (clock restarted)
    pub fn restart(&mut self) {
        self.phase = GamePhase::Running;
        self.clock.restart();
    }
}
