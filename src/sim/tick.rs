//! Simulation tick
//!
//! Advances the run by one step. Within a tick, mutation always happens in
//! this order:
//! 1. movement (player, projectiles)
//! 2. spawn cadence
//! 3. combat cadence (gate triggers, volleys, melee)
//! 4. hit resolution
//! 5. deaths and lifecycle transitions

use glam::{Quat, Vec3};

use super::combat::{CombatRules, SessionOutcome};
use super::health::HealthTrack;
use super::lifecycle::GamePhase;
use super::projectile::{Projectile, Shot};
use super::scaling::EnemyStats;
use super::spawn::{GatePlacement, SpawnChannel};
use super::state::{Enemy, GameEvent, GatePair, GameState};
use super::world::{Contact, EntityHandle, EntityKind, Faction, World};
use crate::{FORWARD, distance};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pause toggle
    pub pause: bool,
    /// Restart the run
    pub retry: bool,
}

/// Advance the game state by one timestep
pub fn tick<W: World>(state: &mut GameState, world: &mut W, input: &TickInput, dt: f32) {
    if input.retry {
        state.retry(world);
    }

    if input.pause {
        match state.phase() {
            GamePhase::Running => {
                state.request_pause();
            }
            GamePhase::Paused => {
                state.request_resume();
            }
            GamePhase::GameOver => {}
        }
    }

    if !state.lifecycle.is_running() {
        return;
    }
    let dt = state.lifecycle.clock_mut().advance(dt);
    if dt <= 0.0 {
        return;
    }
    state.time_ticks += 1;

    move_player(state, world, dt);
    move_projectiles(state, world, dt);
    run_spawns(state, world);
    poll_contacts(state, world);
    run_combat(state, world, dt);
    resolve_hits(state, world);
    resolve_deaths(state, world);
}

fn move_player<W: World>(state: &mut GameState, world: &mut W, dt: f32) {
    if state.player.movement.is_suspended() || !state.player.health.is_alive() {
        return;
    }
    let Some(handle) = state.player.handle else {
        return;
    };
    match world.position(handle) {
        Some(pos) => world.set_position(handle, pos + FORWARD * state.tuning.player.move_speed * dt),
        None => log::debug!("Player {:?} has no position; not moving", handle),
    }
}

fn move_projectiles<W: World>(state: &mut GameState, world: &mut W, dt: f32) {
    let mut vanished = Vec::new();
    for (handle, projectile) in state.projectiles.iter_mut() {
        if !world.is_alive(*handle) {
            vanished.push(*handle);
            continue;
        }
        projectile.advance(dt);
        world.set_position(*handle, projectile.position);
    }
    for handle in vanished {
        state.projectiles.remove(&handle);
    }
}

fn run_spawns<W: World>(state: &mut GameState, world: &mut W) {
    let Some(player_x) = state.player_position(&*world).map(|p| p.x) else {
        return;
    };

    let plan = state.spawner.plan(player_x);
    for placement in plan.gate_pairs {
        if state.spawn_gate_pair(world, placement).is_none() {
            break;
        }
    }
    for position in plan.enemies {
        let ordinal = state.spawner.ordinal();
        if state.on_enemy_spawn_requested(world, position, ordinal).is_none() {
            state.spawner.disable(SpawnChannel::Enemies);
            break;
        }
        state.spawner.claim_ordinal();
    }

    state.extend_ground(world, player_x);
}

fn poll_contacts<W: World>(state: &mut GameState, world: &mut W) {
    for contact in world.poll_contacts() {
        match contact {
            Contact::GateReached { player, gate } => state.on_gate_reached(world, player, gate),
            Contact::Overlap { projectile, other } => state.on_projectile_overlap(projectile, other),
        }
    }
}

fn run_combat<W: World>(state: &mut GameState, world: &mut W, dt: f32) {
    let Some((attacker, defender)) = state.combat.active().map(|s| (s.attacker, s.defender)) else {
        return;
    };

    let attacker_pos = world.position(attacker);
    let defender_pos = world.position(defender).filter(|_| state.enemies.contains_key(&defender));
    let (Some(attacker_pos), Some(defender_pos)) = (attacker_pos, defender_pos) else {
        log::warn!("Combat participant vanished - cancelling session");
        state.end_combat(SessionOutcome::Cancelled);
        return;
    };

    let rules = state.combat_rules();
    let actions = state
        .combat
        .update(dt, distance(attacker_pos, defender_pos), &rules);

    if actions.out_of_range {
        log::info!("Enemy out of range, ending combat");
        state.end_combat(SessionOutcome::OutOfRange);
        return;
    }

    if actions.player_fires {
        let shot = Shot {
            faction: Faction::Player,
            origin: attacker_pos + Vec3::from_array(state.tuning.player.muzzle_offset),
            aim_at: defender_pos,
            target: Some(defender),
            speed: state.tuning.player.arrow_speed,
            damage: state.player.stats.damage,
            facing: FORWARD,
        };
        state.fire_projectile(world, shot);
    }

    if actions.enemy_fires {
        let shot = Shot {
            faction: Faction::Enemy,
            origin: defender_pos + Vec3::from_array(state.tuning.enemy.muzzle_offset),
            aim_at: attacker_pos,
            target: Some(attacker),
            speed: state.tuning.enemy.arrow_speed,
            damage: state.tuning.enemy.arrow_damage,
            facing: -FORWARD,
        };
        state.fire_projectile(world, shot);
    }

    if actions.enemy_strikes {
        let damage = state.enemies.get(&defender).map_or(0.0, |e| e.stats.damage);
        log::debug!("Enemy {:?} strikes for {}", defender, damage);
        state.emit(GameEvent::MeleeStrike {
            enemy: defender,
            damage,
        });
        state.damage_player(damage);
    }
}

fn resolve_hits<W: World>(state: &mut GameState, world: &mut W) {
    // Trigger path
    for (projectile, other) in std::mem::take(&mut state.pending_overlaps) {
        let Some(faction) = state
            .projectiles
            .get(&projectile)
            .filter(|p| !p.is_spent())
            .map(|p| p.faction)
        else {
            continue;
        };
        match world.kind_of(other) {
            Some(kind) if kind.has_hurtbox() && kind.faction() == Some(faction.opponent()) => {
                state.apply_hit(projectile, other);
            }
            Some(EntityKind::Player) if faction == Faction::Player => {
                log::warn!("Player arrow hit the player - destroying it");
                if let Some(p) = state.projectiles.get_mut(&projectile) {
                    p.spend();
                }
            }
            _ => {}
        }
    }

    // Proximity fallback
    let radius = state.tuning.projectile.proximity_radius;
    let due: Vec<(EntityHandle, EntityHandle)> = state
        .projectiles
        .values()
        .filter(|p| !p.is_spent())
        .filter_map(|p| {
            let target = p.target?;
            let target_pos = world.position(target)?;
            (state.is_live_target(target) && p.within_reach(target_pos, radius)).then_some((p.handle, target))
        })
        .collect();
    for (projectile, target) in due {
        log::debug!("Projectile {:?} reached {:?} by proximity", projectile, target);
        state.apply_hit(projectile, target);
    }

    // Lifetime; a hit earlier this tick takes precedence
    let expired: Vec<EntityHandle> = state
        .projectiles
        .values()
        .filter(|p| !p.is_spent() && p.is_expired())
        .map(|p| p.handle)
        .collect();
    for handle in expired {
        if let Some(p) = state.projectiles.get_mut(&handle) {
            p.spend();
        }
        state.emit(GameEvent::ProjectileExpired { projectile: handle });
    }

    let spent: Vec<EntityHandle> = state
        .projectiles
        .values()
        .filter(|p| p.is_spent())
        .map(|p| p.handle)
        .collect();
    for handle in spent {
        state.projectiles.remove(&handle);
        world.destroy_entity(handle);
    }
}

fn resolve_deaths<W: World>(state: &mut GameState, world: &mut W) {
    if state.player_death_pending {
        state.player_death_pending = false;
        state.on_player_died();
    }

    let fallen: Vec<EntityHandle> = state
        .enemies
        .values()
        .filter(|e| !e.health.is_alive() || !world.is_alive(e.handle))
        .map(|e| e.handle)
        .collect();
    for handle in fallen {
        let Some(enemy) = state.enemies.remove(&handle) else {
            continue;
        };
        if enemy.health.is_alive() {
            log::debug!("Enemy {:?} removed by the world", handle);
            continue;
        }
        world.destroy_entity(handle);
        state.kills += 1;
        log::info!("Enemy defeated (ordinal {})", enemy.ordinal);
        state.emit(GameEvent::EnemyDefeated {
            enemy: handle,
            ordinal: enemy.ordinal,
        });
        if state.combat.defender() == Some(handle) {
            state.end_combat(SessionOutcome::Victory);
        }
    }
}

impl GameState {
    /// Ranges and cadences for the current player loadout
    pub fn combat_rules(&self) -> CombatRules {
        let enemy = &self.tuning.enemy;
        CombatRules {
            player_range: self.tuning.player.attack_range,
            player_interval: self.player.stats.shot_interval(),
            enemy_shoot_range: enemy.shooting_range,
            enemy_shoot_interval: (enemy.shooting_cooldown > 0.0).then_some(enemy.shooting_cooldown),
            melee_range: enemy.melee_range,
            melee_interval: (enemy.melee_cooldown > 0.0).then_some(enemy.melee_cooldown),
            melee_window: enemy.melee_window,
        }
    }

    /// Place a gate pair; disables gate spawning if the world cannot build gates
    pub fn spawn_gate_pair<W: World>(&mut self, world: &mut W, placement: GatePlacement) -> Option<GatePair> {
        let left = world.create_entity(EntityKind::Gate, placement.left, Quat::IDENTITY);
        let right = world.create_entity(EntityKind::Gate, placement.right, Quat::IDENTITY);
        let (Some(left), Some(right)) = (left, right) else {
            for gate in [left, right].into_iter().flatten() {
                world.destroy_entity(gate);
            }
            self.spawner.disable(SpawnChannel::Gates);
            return None;
        };
        let pair = GatePair { left, right };
        self.gates.push(pair);
        log::info!("Gates spawned at x={}", placement.left.x);
        self.emit(GameEvent::GatesSpawned {
            left,
            right,
            x: placement.left.x,
        });
        Some(pair)
    }

    /// Create an enemy with the stats for `ordinal`.
    ///
    /// Stats are applied before the enemy is tracked, so it never acts with
    /// default values. Returns None when the world has no enemy factory.
    pub fn on_enemy_spawn_requested<W: World>(
        &mut self,
        world: &mut W,
        position: Vec3,
        ordinal: u32,
    ) -> Option<EnemyStats> {
        let stats = self.scaler.stats(ordinal);
        let facing = Quat::from_rotation_y(std::f32::consts::PI);
        let handle = world.create_entity(EntityKind::Enemy, position, facing)?;
        self.enemies.insert(
            handle,
            Enemy {
                handle,
                ordinal,
                health: HealthTrack::new(stats.max_health),
                stats,
            },
        );
        log::info!(
            "Spawned enemy with {} health and {} damage (#{}) at {}",
            stats.max_health,
            stats.damage,
            ordinal + 1,
            position
        );
        self.emit(GameEvent::EnemySpawned {
            enemy: handle,
            ordinal,
            stats,
        });
        Some(stats)
    }

    /// The player crossed `gate`: consume its pair and fight the nearest
    /// living enemy, if there is one.
    pub fn on_gate_reached<W: World>(&mut self, world: &mut W, player: EntityHandle, gate: EntityHandle) {
        if self.player.handle != Some(player) {
            log::debug!("Gate {:?} reached by non-player {:?}", gate, player);
            return;
        }
        let Some(index) = self.gates.iter().position(|pair| pair.contains(gate)) else {
            log::debug!("Gate {:?} already consumed", gate);
            return;
        };
        let pair = self.gates.remove(index);
        world.destroy_entity(pair.left);
        world.destroy_entity(pair.right);

        if self.combat.is_active() {
            log::info!("Gate crossed while already in combat");
            return;
        }

        let Some(player_pos) = world.position(player) else {
            log::warn!("Player {:?} has no position; encounter skipped", player);
            return;
        };
        let nearest = self
            .enemies
            .values()
            .filter(|e| e.health.is_alive())
            .filter_map(|e| world.position(e.handle).map(|p| (e.handle, distance(player_pos, p))))
            .min_by(|a, b| a.1.total_cmp(&b.1));

        let Some((enemy, dist)) = nearest else {
            log::warn!("No enemy found for combat!");
            self.emit(GameEvent::EncounterAborted);
            return;
        };

        let rules = self.combat_rules();
        if let Some(session) = self.combat.begin(player, enemy, &rules, &mut self.player.movement) {
            log::info!("Combat {} started with enemy {:?} at distance {:.2}", session, enemy, dist);
            self.emit(GameEvent::CombatStarted { session, enemy });
        }
    }

    /// Trigger overlap reported by the world; resolved in the hit step
    pub fn on_projectile_overlap(&mut self, projectile: EntityHandle, other: EntityHandle) {
        self.pending_overlaps.push((projectile, other));
    }

    /// Spawn a projectile entity and start tracking it
    pub fn fire_projectile<W: World>(&mut self, world: &mut W, shot: Shot) -> Option<EntityHandle> {
        let rotation = Quat::from_rotation_arc(FORWARD, shot.heading());
        let Some(handle) = world.create_entity(EntityKind::Projectile(shot.faction), shot.origin, rotation) else {
            log::warn!("Cannot shoot: no projectile factory bound for {:?}", shot.faction);
            return None;
        };
        let projectile = Projectile::new(handle, shot, self.tuning.projectile.lifetime, self.lifecycle.clock().elapsed());
        log::debug!(
            "{:?} shot {:?} for {} damage",
            shot.faction,
            handle,
            projectile.damage
        );
        self.projectiles.insert(handle, projectile);
        self.emit(GameEvent::ProjectileFired {
            projectile: handle,
            faction: shot.faction,
        });
        Some(handle)
    }

    fn is_live_target(&self, target: EntityHandle) -> bool {
        if self.player.handle == Some(target) {
            return self.player.health.is_alive();
        }
        self.enemies.get(&target).is_some_and(|e| e.health.is_alive())
    }

    /// Spend `projectile` into `victim`. Does nothing if it was already spent.
    fn apply_hit(&mut self, projectile: EntityHandle, victim: EntityHandle) {
        let Some(damage) = self.projectiles.get_mut(&projectile).and_then(|p| p.spend()) else {
            return;
        };
        log::debug!("Projectile {:?} hit {:?} for {}", projectile, victim, damage);
        self.emit(GameEvent::ProjectileHit {
            projectile,
            victim,
            damage,
        });
        if self.player.handle == Some(victim) {
            self.damage_player(damage);
        } else if let Some(enemy) = self.enemies.get_mut(&victim) {
            enemy.health.take_damage(damage);
        }
    }

    fn damage_player(&mut self, damage: f32) {
        if self.player.health.take_damage(damage) {
            log::info!("Player died!");
            self.player_death_pending = true;
            self.emit(GameEvent::PlayerDied);
        }
    }
}
