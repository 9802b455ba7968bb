//! Ranged shots
//!
//! A projectile is aimed once, at the target's position when it spawns, and
//! never steers afterwards. It can be resolved by a trigger overlap or by the
//! proximity fallback; whichever comes first spends it, and a spent
//! projectile never deals damage again.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::world::{EntityHandle, Faction};
use crate::consts::TIMER_EPSILON;

/// Everything needed to loose one arrow
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    pub faction: Faction,
    pub origin: Vec3,
    /// Target position sampled at spawn time
    pub aim_at: Vec3,
    /// Target the proximity fallback tracks
    pub target: Option<EntityHandle>,
    pub speed: f32,
    pub damage: f32,
    /// Flight direction when `aim_at` coincides with `origin`
    pub facing: Vec3,
}

impl Shot {
    /// Unit flight direction: toward `aim_at`, else `facing`, else forward
    pub fn heading(&self) -> Vec3 {
        (self.aim_at - self.origin)
            .try_normalize()
            .or_else(|| self.facing.try_normalize())
            .unwrap_or(crate::FORWARD)
    }
}

/// A projectile in flight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub handle: EntityHandle,
    pub faction: Faction,
    pub origin: Vec3,
    pub position: Vec3,
    /// Unit heading frozen at spawn
    direction: Vec3,
    pub speed: f32,
    pub damage: f32,
    pub target: Option<EntityHandle>,
    /// Simulation time the projectile spawned at
    pub spawn_time: f64,
    /// Seconds in flight
    pub age: f32,
    pub lifetime: f32,
    spent: bool,
}

impl Projectile {
    pub fn new(handle: EntityHandle, shot: Shot, lifetime: f32, spawn_time: f64) -> Self {
        let direction = shot.heading();
        Self {
            handle,
            faction: shot.faction,
            origin: shot.origin,
            position: shot.origin,
            direction,
            speed: shot.speed,
            damage: shot.damage,
            target: shot.target,
            spawn_time,
            age: 0.0,
            lifetime,
            spent: false,
        }
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Move along the frozen heading
    pub fn advance(&mut self, dt: f32) {
        if self.spent {
            return;
        }
        self.position += self.direction * self.speed * dt;
        self.age += dt;
    }

    /// Proximity fallback test against the bound target's current position
    pub fn within_reach(&self, target_position: Vec3, radius: f32) -> bool {
        self.position.distance(target_position) < radius
    }

    pub fn is_expired(&self) -> bool {
        self.age + TIMER_EPSILON >= self.lifetime
    }

    #[inline]
    pub fn is_spent(&self) -> bool {
        self.spent
    }

    /// Consume the projectile. Yields its damage the first time only.
    pub fn spend(&mut self) -> Option<f32> {
        if self.spent {
            return None;
        }
        self.spent = true;
        Some(self.damage)
    }
}
