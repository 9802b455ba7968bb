//! Game state and core simulation types
//!
//! Everything the simulation owns for one run: player stats, the enemies and
//! projectiles it is tracking, the combat slot, spawn cadence and lifecycle.
//! Entities themselves live in the [`World`].

use std::collections::BTreeMap;

use glam::{Quat, Vec3};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::combat::{CombatSession, MovementLock, SessionEnd, SessionOutcome};
use super::health::HealthTrack;
use super::lifecycle::{GamePhase, Lifecycle};
use super::powerup::{CombatStats, PowerUpKind, PowerUpState, RewardTable};
use super::projectile::Projectile;
use super::scaling::{EncounterScaler, EnemyStats};
use super::spawn::{SpawnChannel, SpawnCoordinator};
use super::world::{EntityHandle, EntityKind, Faction, World};
use crate::consts::PLAYER_ORIGIN;
use crate::tuning::Tuning;

/// Things that happened during a tick, for observers (UI, audio, tests)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    GatesSpawned { left: EntityHandle, right: EntityHandle, x: f32 },
    EnemySpawned { enemy: EntityHandle, ordinal: u32, stats: EnemyStats },
    CombatStarted { session: u32, enemy: EntityHandle },
    /// A gate was crossed with no living enemy to fight
    EncounterAborted,
    CombatEnded { session: u32, outcome: SessionOutcome },
    ProjectileFired { projectile: EntityHandle, faction: Faction },
    ProjectileHit { projectile: EntityHandle, victim: EntityHandle, damage: f32 },
    ProjectileExpired { projectile: EntityHandle },
    MeleeStrike { enemy: EntityHandle, damage: f32 },
    EnemyDefeated { enemy: EntityHandle, ordinal: u32 },
    PowerUpApplied { kind: PowerUpKind, level: i32 },
    PlayerDied,
    GameOver,
    Paused,
    Resumed,
    Retried,
}

/// The player's combat loadout
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub handle: Option<EntityHandle>,
    pub health: HealthTrack,
    /// Only changed through `apply_power_up`/`reset_power` so `stats` stays in step
    power: PowerUpState,
    /// Derived from base stats and power multipliers
    pub stats: CombatStats,
    pub movement: MovementLock,
    base_damage: f32,
    base_attack_speed: f32,
}

impl Player {
    pub fn new(handle: Option<EntityHandle>, tuning: &Tuning) -> Self {
        let power = PowerUpState::new(&tuning.power);
        let stats = CombatStats::derive(tuning.player.base_damage, tuning.player.base_attack_speed, &power);
        Self {
            handle,
            health: HealthTrack::new(tuning.player.max_health),
            power,
            stats,
            movement: MovementLock::default(),
            base_damage: tuning.player.base_damage,
            base_attack_speed: tuning.player.base_attack_speed,
        }
    }

    pub fn power(&self) -> &PowerUpState {
        &self.power
    }

    /// Stack a power-up and recompute derived stats in the same step
    pub fn apply_power_up(&mut self, kind: PowerUpKind) {
        self.power.apply(kind);
        self.refresh_stats();
    }

    pub fn reset_power(&mut self) {
        self.power.reset();
        self.refresh_stats();
    }

    fn refresh_stats(&mut self) {
        self.stats = CombatStats::derive(self.base_damage, self.base_attack_speed, &self.power);
    }
}

/// An enemy the simulation tracks
#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub handle: EntityHandle,
    pub ordinal: u32,
    pub health: HealthTrack,
    pub stats: EnemyStats,
}

/// Two gates spawned together; crossing either consumes both
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatePair {
    pub left: EntityHandle,
    pub right: EntityHandle,
}

impl GatePair {
    pub fn contains(&self, gate: EntityHandle) -> bool {
        self.left == gate || self.right == gate
    }
}

/// Comparable summary of a run (for determinism checks and reports)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub time_ticks: u64,
    pub elapsed: f64,
    pub phase: GamePhase,
    pub player_position: [f32; 3],
    pub player_health: f32,
    pub power_level: i32,
    pub damage_multiplier: f32,
    pub speed_multiplier: f32,
    pub enemies_spawned: u32,
    pub enemies_alive: usize,
    pub gate_pairs_alive: usize,
    pub projectiles_alive: usize,
    pub in_combat: bool,
    pub kills: u32,
}

/// Complete simulation state for one run
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub tuning: Tuning,
    pub lifecycle: Lifecycle,
    pub player: Player,
    /// Live enemies (ordered by handle for determinism)
    pub enemies: BTreeMap<EntityHandle, Enemy>,
    pub gates: Vec<GatePair>,
    /// Projectiles in flight (ordered by handle for determinism)
    pub projectiles: BTreeMap<EntityHandle, Projectile>,
    pub combat: CombatSession,
    pub spawner: SpawnCoordinator,
    pub scaler: EncounterScaler,
    pub rewards: RewardTable,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Enemies killed this run
    pub kills: u32,
    /// Overlap events waiting for the hit-resolution step
    pub(crate) pending_overlaps: Vec<(EntityHandle, EntityHandle)>,
    /// Player death edge seen, game over not yet applied
    pub(crate) player_death_pending: bool,
    events: Vec<GameEvent>,
}

impl GameState {
    /// Create a run, spawning the player and the initial ground strip
    pub fn new<W: World>(tuning: Tuning, seed: u64, world: &mut W) -> Self {
        let handle = world.create_entity(EntityKind::Player, PLAYER_ORIGIN, Quat::IDENTITY);
        if handle.is_none() {
            log::warn!("No player factory bound - running without a player");
        }

        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            player: Player::new(handle, &tuning),
            lifecycle: Lifecycle::default(),
            enemies: BTreeMap::new(),
            gates: Vec::new(),
            projectiles: BTreeMap::new(),
            combat: CombatSession::new(),
            spawner: SpawnCoordinator::new(tuning.spawn.clone(), PLAYER_ORIGIN.x),
            scaler: EncounterScaler::new(&tuning.enemy),
            rewards: RewardTable::new(&tuning.reward),
            time_ticks: 0,
            kills: 0,
            pending_overlaps: Vec::new(),
            player_death_pending: false,
            events: Vec::new(),
            tuning,
        };

        state.extend_ground(world, PLAYER_ORIGIN.x);
        log::info!("Run started with seed {}", seed);
        state
    }

    #[inline]
    pub fn phase(&self) -> GamePhase {
        self.lifecycle.phase()
    }

    /// Player position as the world reports it
    pub fn player_position<W: World>(&self, world: &W) -> Option<Vec3> {
        self.player.handle.and_then(|h| world.position(h))
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Events since the last drain
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Lay ground segments up to the strip's reach, recycling the oldest
    pub(crate) fn extend_ground<W: World>(&mut self, world: &mut W, player_x: f32) {
        for position in self.spawner.plan_ground(player_x) {
            match world.create_entity(EntityKind::Ground, position, Quat::IDENTITY) {
                Some(segment) => {
                    if let Some(old) = self.spawner.push_ground(segment) {
                        world.destroy_entity(old);
                    }
                }
                None => {
                    self.spawner.disable(SpawnChannel::Ground);
                    break;
                }
            }
        }
    }

    /// Close the active session (if any) and report how it ended.
    ///
    /// Grants the pending reward on a win. Safe to call repeatedly.
    pub(crate) fn end_combat(&mut self, outcome: SessionOutcome) -> Option<SessionEnd> {
        let end = self.combat.finish(outcome, &mut self.player.movement)?;
        log::info!("Combat {} ended: {:?}", end.id, outcome);
        self.emit(GameEvent::CombatEnded {
            session: end.id,
            outcome,
        });
        if end.grant_reward {
            let kind = self.rewards.roll(&mut self.rng);
            self.player.apply_power_up(kind);
            log::info!(
                "Power-up applied: {}. Power level: {}",
                kind.as_str(),
                self.player.power().level()
            );
            self.emit(GameEvent::PowerUpApplied {
                kind,
                level: self.player.power().level(),
            });
        }
        Some(end)
    }

    /// Player death signal. Trips game over on the first call only.
    pub fn on_player_died(&mut self) {
        if self.lifecycle.trigger_game_over() {
            log::info!("Game over after {} kills", self.kills);
            self.end_combat(SessionOutcome::Defeat);
            self.emit(GameEvent::GameOver);
        } else {
            log::debug!("Death signal ignored: already game over");
        }
    }

    pub fn request_pause(&mut self) -> bool {
        let paused = self.lifecycle.pause();
        if paused {
            self.emit(GameEvent::Paused);
        }
        paused
    }

    pub fn request_resume(&mut self) -> bool {
        let resumed = self.lifecycle.resume();
        if resumed {
            self.emit(GameEvent::Resumed);
        }
        resumed
    }

    /// Restart the run in one step.
    ///
    /// Each collaborator that is missing is skipped with a warning; the rest
    /// of the reset still happens.
    pub fn retry<W: World>(&mut self, world: &mut W) {
        log::info!("Retry requested");
        self.lifecycle.restart();

        self.player.health.reset();
        self.player.reset_power();
        self.end_combat(SessionOutcome::Cancelled);
        // Nothing else may hold movement once the session slot is empty
        if let Some(holder) = self.player.movement.holder() {
            self.player.movement.release(holder);
        }

        for kind in EntityKind::PURGED_ON_RETRY {
            for handle in world.find_all_alive(kind) {
                world.destroy_entity(handle);
            }
        }
        self.enemies.clear();
        self.gates.clear();
        self.projectiles.clear();
        self.pending_overlaps.clear();
        self.player_death_pending = false;

        match self.player.handle {
            Some(player) if world.is_alive(player) => world.set_position(player, PLAYER_ORIGIN),
            _ => {
                log::warn!("Player entity missing on retry - respawning");
                self.player.handle = world.create_entity(EntityKind::Player, PLAYER_ORIGIN, Quat::IDENTITY);
                if self.player.handle.is_none() {
                    log::warn!("No player factory bound - running without a player");
                }
            }
        }

        for segment in self.spawner.reset(PLAYER_ORIGIN.x) {
            world.destroy_entity(segment);
        }
        self.extend_ground(world, PLAYER_ORIGIN.x);

        self.rng = Pcg32::seed_from_u64(self.seed);
        self.time_ticks = 0;
        self.kills = 0;
        self.emit(GameEvent::Retried);
    }

    pub fn snapshot<W: World>(&self, world: &W) -> RunSnapshot {
        let position = self.player_position(world).unwrap_or(PLAYER_ORIGIN);
        RunSnapshot {
            time_ticks: self.time_ticks,
            elapsed: self.lifecycle.clock().elapsed(),
            phase: self.phase(),
            player_position: position.to_array(),
            player_health: self.player.health.current(),
            power_level: self.player.power().level(),
            damage_multiplier: self.player.power().damage_multiplier(),
            speed_multiplier: self.player.power().speed_multiplier(),
            enemies_spawned: self.spawner.ordinal(),
            enemies_alive: self.enemies.len(),
            gate_pairs_alive: self.gates.len(),
            projectiles_alive: self.projectiles.len(),
            in_combat: self.combat.is_active(),
            kills: self.kills,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::scene::SceneWorld;

    #[test]
    fn test_new_spawns_player_and_ground() {
        let mut world = SceneWorld::new();
        let state = GameState::new(Tuning::default(), 1, &mut world);
        assert!(state.player.handle.is_some());
        assert_eq!(world.count(EntityKind::Player), 1);
        assert_eq!(world.count(EntityKind::Ground), 5);
        assert_eq!(state.phase(), GamePhase::Running);
    }

    #[test]
    fn test_power_up_recomputes_stats_immediately() {
        let mut world = SceneWorld::new();
        let mut state = GameState::new(Tuning::default(), 1, &mut world);
        state.player.apply_power_up(PowerUpKind::SpeedBoost);
        assert!((state.player.stats.attack_speed - 2.4).abs() < 1e-5);
        state.player.apply_power_up(PowerUpKind::DamageBoost);
        assert!((state.player.stats.damage - 13.0).abs() < 1e-5);
        state.player.reset_power();
        assert_eq!(state.player.stats.damage, 10.0);
        assert_eq!(state.player.stats.attack_speed, 2.0);
    }

    #[test]
    fn test_stats_track_every_power_change() {
        let mut world = SceneWorld::new();
        let mut state = GameState::new(Tuning::default(), 1, &mut world);
        for kind in [
            PowerUpKind::DamageBoost,
            PowerUpKind::DamageBoost,
            PowerUpKind::SpeedDebuff,
            PowerUpKind::DamageDebuff,
        ] {
            state.player.apply_power_up(kind);
            let power = state.player.power();
            assert!((state.player.stats.damage - 10.0 * power.damage_multiplier()).abs() < 1e-5);
            assert!((state.player.stats.attack_speed - 2.0 * power.speed_multiplier()).abs() < 1e-5);
        }
    }

    #[test]
    fn test_power_level_in_bounds_for_narrow_range() {
        let tuning = Tuning::from_json(r#"{ "power": { "min_level": 1, "max_level": 5 } }"#).unwrap();
        let mut world = SceneWorld::new();
        let mut state = GameState::new(tuning, 1, &mut world);
        let in_bounds = |state: &GameState| {
            let (min, max) = state.player.power().level_bounds();
            (min..=max).contains(&state.player.power().level())
        };
        assert!(in_bounds(&state));

        state.player.apply_power_up(PowerUpKind::SpeedDebuff);
        assert!(in_bounds(&state));
        state.on_player_died();
        state.retry(&mut world);
        assert!(in_bounds(&state));
    }

    #[test]
    fn test_second_death_signal_is_noop() {
        let mut world = SceneWorld::new();
        let mut state = GameState::new(Tuning::default(), 1, &mut world);
        state.on_player_died();
        state.on_player_died();
        let game_overs = state
            .events()
            .iter()
            .filter(|e| matches!(e, GameEvent::GameOver))
            .count();
        assert_eq!(game_overs, 1);
        assert_eq!(state.phase(), GamePhase::GameOver);
        assert!(!state.request_pause());
        assert!(!state.request_resume());
    }

    #[test]
    fn test_retry_purges_and_restores() {
        let mut world = SceneWorld::new();
        let mut state = GameState::new(Tuning::default(), 3, &mut world);
        let player = state.player.handle.unwrap();

        world.set_position(player, Vec3::new(42.0, 0.0, 0.0));
        world.create_entity(EntityKind::Enemy, Vec3::X, Quat::IDENTITY);
        world.create_entity(EntityKind::Gate, Vec3::X, Quat::IDENTITY);
        world.create_entity(EntityKind::Projectile(Faction::Enemy), Vec3::X, Quat::IDENTITY);
        state.player.health.take_damage(100.0);
        state.player.apply_power_up(PowerUpKind::DamageDebuff);
        state.on_player_died();

        state.retry(&mut world);

        assert_eq!(state.phase(), GamePhase::Running);
        assert_eq!(state.lifecycle.clock().time_scale(), 1.0);
        assert!(state.player.health.is_alive());
        assert_eq!(state.player.health.current(), 100.0);
        assert_eq!(state.player.power().level(), 0);
        assert_eq!(state.player.stats.damage, 10.0);
        assert_eq!(world.position(player), Some(Vec3::ZERO));
        assert_eq!(world.count(EntityKind::Enemy), 0);
        assert_eq!(world.count(EntityKind::Gate), 0);
        assert_eq!(world.count(EntityKind::Projectile(Faction::Enemy)), 0);
        assert_eq!(world.count(EntityKind::Ground), 5);
        assert_eq!(state.spawner.ordinal(), 0);
    }

    #[test]
    fn test_retry_survives_missing_player() {
        let mut world = SceneWorld::new();
        let mut state = GameState::new(Tuning::default(), 3, &mut world);
        let old = state.player.handle.unwrap();
        world.destroy_entity(old);

        state.retry(&mut world);
        let fresh = state.player.handle.unwrap();
        assert_ne!(fresh, old);
        assert_eq!(world.position(fresh), Some(Vec3::ZERO));

        // No player factory at all: reset still completes
        let mut bare = SceneWorld::new();
        bare.unbind(EntityKind::Player);
        let mut state = GameState::new(Tuning::default(), 3, &mut bare);
        state.on_player_died();
        state.retry(&mut bare);
        assert!(state.player.handle.is_none());
        assert_eq!(state.phase(), GamePhase::Running);
    }
}
