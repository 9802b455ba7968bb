//! Gate Runner - an endless-advance gate combat game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (health, power-ups, spawning, combat, lifecycle)
//! - `tuning`: Data-driven game balance

pub mod sim;
pub mod tuning;

pub use tuning::Tuning;

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Slack applied to cooldown/lifetime comparisons so accumulated f32 steps
    /// land on the intended tick (0.1 * 5 must count as 0.5)
    pub const TIMER_EPSILON: f32 = 1e-4;

    /// Player start position (the run origin)
    pub const PLAYER_ORIGIN: glam::Vec3 = glam::Vec3::ZERO;
    /// Height at which enemies stand
    pub const ENEMY_HEIGHT: f32 = 1.0;

    /// Hurtbox radii used by the in-memory scene for trigger overlaps
    pub const PLAYER_HURT_RADIUS: f32 = 0.5;
    pub const ENEMY_HURT_RADIUS: f32 = 0.5;
    pub const PROJECTILE_RADIUS: f32 = 0.1;
    pub const GATE_HALF_WIDTH: f32 = 1.0;
}

/// Direction the player advances in (world +X)
pub const FORWARD: Vec3 = Vec3::X;

/// Straight-line distance between two points
#[inline]
pub fn distance(a: Vec3, b: Vec3) -> f32 {
    a.distance(b)
}

/// Clamp a caller-supplied amount to a usable non-negative value.
///
/// Negative and NaN inputs become zero so a bad value never heals on a
/// damage call or drains on a heal call.
#[inline]
pub fn non_negative(amount: f32) -> f32 {
    if amount.is_nan() { 0.0 } else { amount.max(0.0) }
}
