//! Data-driven game balance
//!
//! Loaded once at startup from an optional JSON file. Every field has a
//! default, so a partial file only overrides what it names.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// How a distance cadence moves its mark when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CadenceSnap {
    /// Mark jumps to the current position. A large jump in one tick fires
    /// once and skips the spawns it stepped over.
    #[default]
    Position,
    /// Mark advances by exact interval multiples, firing once per interval
    /// crossed.
    Interval,
}

impl CadenceSnap {
    pub fn as_str(&self) -> &'static str {
        match self {
            CadenceSnap::Position => "Position",
            CadenceSnap::Interval => "Interval",
        }
    }
}

/// Player base stats
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub max_health: f32,
    /// Forward speed (units per second)
    pub move_speed: f32,
    /// Damage per arrow before power-ups
    pub base_damage: f32,
    /// Arrows per second before power-ups
    pub base_attack_speed: f32,
    pub attack_range: f32,
    pub arrow_speed: f32,
    /// Arrow spawn point relative to the player
    pub muzzle_offset: [f32; 3],
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            move_speed: 5.0,
            base_damage: 10.0,
            base_attack_speed: 2.0,
            attack_range: 10.0,
            arrow_speed: 15.0,
            muzzle_offset: [0.5, 1.0, 0.0],
        }
    }
}

/// Enemy base stats and difficulty scaling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub base_health: f32,
    /// Extra health per enemy spawned before this one
    pub health_step: f32,
    /// Melee strike damage of the first enemy
    pub base_damage: f32,
    pub damage_step: f32,
    pub melee_range: f32,
    /// Seconds between melee strikes
    pub melee_cooldown: f32,
    /// How long a strike keeps the enemy in its attacking pose
    pub melee_window: f32,
    pub shooting_range: f32,
    /// Seconds between arrows
    pub shooting_cooldown: f32,
    pub arrow_speed: f32,
    pub arrow_damage: f32,
    pub muzzle_offset: [f32; 3],
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            base_health: 50.0,
            health_step: 25.0,
            base_damage: 20.0,
            damage_step: 5.0,
            melee_range: 5.0,
            melee_cooldown: 2.0,
            melee_window: 0.5,
            shooting_range: 8.0,
            shooting_cooldown: 3.0,
            arrow_speed: 10.0,
            arrow_damage: 15.0,
            muzzle_offset: [0.0, 1.0, 0.0],
        }
    }
}

/// Spawn cadence for gates, enemies and the ground strip
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// Distance travelled between gate pairs (and between enemies)
    pub interval: f32,
    /// How far past the arming mark a gate pair is placed
    pub ahead_offset: f32,
    /// Z offset of each gate from the lane center
    pub lateral_offset: f32,
    /// Pull-back from `ahead_offset` that puts an enemy between gate pairs
    pub between_gates_offset: f32,
    /// Z of the enemy lane
    pub enemy_lane_z: f32,
    pub snap: CadenceSnap,
    /// Ground segments kept alive around the player
    pub segment_count: u32,
    pub segment_length: f32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            interval: 30.0,
            ahead_offset: 50.0,
            lateral_offset: 5.0,
            between_gates_offset: 35.0,
            enemy_lane_z: 0.0,
            snap: CadenceSnap::Position,
            segment_count: 5,
            segment_length: 10.0,
        }
    }
}

/// Shared projectile rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    /// Seconds before an arrow that hit nothing disappears
    pub lifetime: f32,
    /// Fallback hit distance to the bound target
    pub proximity_radius: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            lifetime: 5.0,
            proximity_radius: 0.5,
        }
    }
}

/// Power level bounds and per-kind multiplier deltas
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpTuning {
    pub min_level: i32,
    pub max_level: i32,
    pub damage_delta: f32,
    pub speed_delta: f32,
}

impl Default for PowerUpTuning {
    fn default() -> Self {
        Self {
            min_level: -5,
            max_level: 5,
            damage_delta: 0.3,
            speed_delta: 0.2,
        }
    }
}

/// Post-combat reward roll
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardTuning {
    /// Chance (0-1) that a won encounter grants a boost instead of a debuff
    pub boost_chance: f32,
}

impl Default for RewardTuning {
    fn default() -> Self {
        Self { boost_chance: 0.6 }
    }
}

/// Complete balance sheet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub enemy: EnemyTuning,
    pub spawn: SpawnTuning,
    pub projectile: ProjectileTuning,
    pub power: PowerUpTuning,
    pub reward: RewardTuning,
}

impl Tuning {
    /// Parse a JSON balance sheet (missing fields take defaults)
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Tuning>(json).map(Tuning::sanitized)
    }

    /// Load from a file, falling back to defaults on any failure
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning from {}", path.display());
                    tuning
                }
                Err(e) => {
                    log::warn!("Invalid tuning file {}: {} - using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Cannot read tuning file {}: {} - using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Clamp values that would make a subsystem misbehave.
    ///
    /// Each correction is logged; nothing is rejected.
    pub fn sanitized(mut self) -> Self {
        let defaults = Tuning::default();

        positive(&mut self.player.max_health, defaults.player.max_health, "player.max_health");
        at_least_zero(&mut self.player.move_speed, "player.move_speed");
        at_least_zero(&mut self.player.base_damage, "player.base_damage");
        at_least_zero(&mut self.player.base_attack_speed, "player.base_attack_speed");
        at_least_zero(&mut self.player.attack_range, "player.attack_range");
        at_least_zero(&mut self.player.arrow_speed, "player.arrow_speed");

        positive(&mut self.enemy.base_health, defaults.enemy.base_health, "enemy.base_health");
        at_least_zero(&mut self.enemy.health_step, "enemy.health_step");
        at_least_zero(&mut self.enemy.base_damage, "enemy.base_damage");
        at_least_zero(&mut self.enemy.damage_step, "enemy.damage_step");
        at_least_zero(&mut self.enemy.melee_range, "enemy.melee_range");
        positive(&mut self.enemy.melee_cooldown, defaults.enemy.melee_cooldown, "enemy.melee_cooldown");
        at_least_zero(&mut self.enemy.melee_window, "enemy.melee_window");
        at_least_zero(&mut self.enemy.shooting_range, "enemy.shooting_range");
        positive(
            &mut self.enemy.shooting_cooldown,
            defaults.enemy.shooting_cooldown,
            "enemy.shooting_cooldown",
        );
        at_least_zero(&mut self.enemy.arrow_speed, "enemy.arrow_speed");
        at_least_zero(&mut self.enemy.arrow_damage, "enemy.arrow_damage");

        positive(&mut self.spawn.interval, defaults.spawn.interval, "spawn.interval");
        positive(
            &mut self.spawn.segment_length,
            defaults.spawn.segment_length,
            "spawn.segment_length",
        );

        at_least_zero(&mut self.projectile.lifetime, "projectile.lifetime");
        at_least_zero(&mut self.projectile.proximity_radius, "projectile.proximity_radius");

        if self.power.min_level > self.power.max_level {
            log::warn!(
                "power.min_level {} above max_level {} - swapping",
                self.power.min_level,
                self.power.max_level
            );
            std::mem::swap(&mut self.power.min_level, &mut self.power.max_level);
        }
        if self.power.min_level > 0 || self.power.max_level < 0 {
            let (min, max) = (self.power.min_level.min(0), self.power.max_level.max(0));
            log::warn!(
                "power level range [{}, {}] excludes the neutral level 0 - widening to [{}, {}]",
                self.power.min_level,
                self.power.max_level,
                min,
                max
            );
            self.power.min_level = min;
            self.power.max_level = max;
        }

        let chance = self.reward.boost_chance;
        if !(0.0..=1.0).contains(&chance) {
            let clamped = if chance.is_nan() { defaults.reward.boost_chance } else { chance.clamp(0.0, 1.0) };
            log::warn!("reward.boost_chance {} outside [0, 1] - using {}", chance, clamped);
            self.reward.boost_chance = clamped;
        }

        self
    }
}

fn positive(value: &mut f32, fallback: f32, name: &str) {
    if !(*value > 0.0) {
        log::warn!("{} must be positive (got {}) - using {}", name, value, fallback);
        *value = fallback;
    }
}

fn at_least_zero(value: &mut f32, name: &str) {
    if !(*value >= 0.0) {
        log::warn!("{} must not be negative (got {}) - using 0", name, value);
        *value = 0.0;
    }
}
