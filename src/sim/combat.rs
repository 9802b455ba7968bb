//! Paired auto-attack exchange between the player and one enemy
//!
//! A session opens when the player crosses a gate and pairs with the nearest
//! living enemy. While it is active the player stands still; each side
//! attacks on its own cooldown while the other is in range. The session
//! closes when a side dies or the enemy drifts out of the player's range.

use serde::{Deserialize, Serialize};

use super::world::EntityHandle;
use crate::consts::TIMER_EPSILON;

/// Who may move the player.
///
/// A session suspends movement under its own id and only that id can hand
/// it back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementLock {
    holder: Option<u32>,
}

impl MovementLock {
    #[inline]
    pub fn is_suspended(&self) -> bool {
        self.holder.is_some()
    }

    pub fn holder(&self) -> Option<u32> {
        self.holder
    }

    fn suspend(&mut self, session: u32) -> bool {
        if self.holder.is_some() {
            return false;
        }
        self.holder = Some(session);
        true
    }

    /// Returns false (and keeps the lock) when `session` is not the holder
    pub fn release(&mut self, session: u32) -> bool {
        if self.holder == Some(session) {
            self.holder = None;
            true
        } else {
            false
        }
    }
}

/// Countdown to the next attack
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cooldown {
    remaining: f32,
}

impl Cooldown {
    /// Full cooldown; the first attack lands one interval from now
    pub fn primed(interval: Option<f32>) -> Self {
        Self {
            remaining: interval.unwrap_or(f32::INFINITY),
        }
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Run the clock down and report whether an attack goes off this tick.
    ///
    /// The countdown keeps running while out of range, so a target that
    /// steps back in is attacked at once if the cooldown already elapsed.
    pub fn tick(&mut self, dt: f32, interval: Option<f32>, in_range: bool) -> bool {
        let Some(interval) = interval else {
            self.remaining = f32::INFINITY;
            return false;
        };
        if self.remaining.is_infinite() {
            self.remaining = interval;
        }
        self.remaining = (self.remaining - dt).max(0.0);
        if in_range && self.remaining <= TIMER_EPSILON {
            self.remaining = interval;
            return true;
        }
        false
    }
}

/// Ranges and cadences for one tick of a session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatRules {
    pub player_range: f32,
    /// Seconds between player arrows (None while attack speed is zero or less)
    pub player_interval: Option<f32>,
    pub enemy_shoot_range: f32,
    pub enemy_shoot_interval: Option<f32>,
    pub melee_range: f32,
    pub melee_interval: Option<f32>,
    /// How long a melee strike holds the enemy in its attacking pose
    pub melee_window: f32,
}

/// What a session wants done this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CombatActions {
    pub player_fires: bool,
    pub enemy_fires: bool,
    pub enemy_strikes: bool,
    /// Defender left the player's range with both sides alive
    pub out_of_range: bool,
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionOutcome {
    /// Defender died
    Victory,
    /// Attacker died
    Defeat,
    /// Defender left the attacker's range
    OutOfRange,
    /// Run restarted mid-fight
    Cancelled,
}

/// The fight in progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSession {
    pub id: u32,
    pub attacker: EntityHandle,
    pub defender: EntityHandle,
    /// Seconds since the session opened
    pub elapsed: f32,
    player_volley: Cooldown,
    enemy_volley: Cooldown,
    enemy_melee: Cooldown,
    /// Session time at which the current melee strike ends
    attacking_until: Option<f32>,
    /// Set at open; the reward is granted on a win and cleared on any exit
    reward_pending: bool,
}

impl ActiveSession {
    /// Whether the defender is mid-strike
    pub fn enemy_attacking(&self) -> bool {
        self.attacking_until.is_some()
    }

    pub fn reward_pending(&self) -> bool {
        self.reward_pending
    }
}

/// Summary handed back when a session closes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEnd {
    pub id: u32,
    pub attacker: EntityHandle,
    pub defender: EntityHandle,
    pub outcome: SessionOutcome,
    /// True exactly when a power-up must be granted
    pub grant_reward: bool,
}

/// Combat session slot for the player (at most one active)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatSession {
    active: Option<ActiveSession>,
    next_id: u32,
}

impl CombatSession {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    pub fn defender(&self) -> Option<EntityHandle> {
        self.active.as_ref().map(|s| s.defender)
    }

    /// Open a session and suspend player movement.
    ///
    /// Returns the new session id, or None when one is already running.
    pub fn begin(
        &mut self,
        attacker: EntityHandle,
        defender: EntityHandle,
        rules: &CombatRules,
        movement: &mut MovementLock,
    ) -> Option<u32> {
        if self.active.is_some() {
            return None;
        }
        self.next_id += 1;
        let id = self.next_id;
        if !movement.suspend(id) {
            log::warn!("Movement already suspended by session {:?}", movement.holder());
        }
        self.active = Some(ActiveSession {
            id,
            attacker,
            defender,
            elapsed: 0.0,
            player_volley: Cooldown::primed(rules.player_interval),
            enemy_volley: Cooldown::primed(rules.enemy_shoot_interval),
            enemy_melee: Cooldown::primed(rules.melee_interval),
            attacking_until: None,
            reward_pending: true,
        });
        Some(id)
    }

    /// Advance timers given the current attacker/defender distance
    pub fn update(&mut self, dt: f32, distance: f32, rules: &CombatRules) -> CombatActions {
        let Some(session) = self.active.as_mut() else {
            return CombatActions::default();
        };

        session.elapsed += dt;
        if let Some(until) = session.attacking_until {
            if session.elapsed + TIMER_EPSILON >= until {
                session.attacking_until = None;
            }
        }

        if distance > rules.player_range {
            return CombatActions {
                out_of_range: true,
                ..Default::default()
            };
        }

        let player_fires = session.player_volley.tick(dt, rules.player_interval, true);
        let enemy_fires = session
            .enemy_volley
            .tick(dt, rules.enemy_shoot_interval, distance <= rules.enemy_shoot_range);
        let enemy_strikes = session
            .enemy_melee
            .tick(dt, rules.melee_interval, distance <= rules.melee_range);
        if enemy_strikes {
            session.attacking_until = Some(session.elapsed + rules.melee_window);
        }

        CombatActions {
            player_fires,
            enemy_fires,
            enemy_strikes,
            out_of_range: false,
        }
    }

    /// Close the session and give movement back. Idempotent: a second call
    /// (or a call while idle) returns None.
    pub fn finish(&mut self, outcome: SessionOutcome, movement: &mut MovementLock) -> Option<SessionEnd> {
        let session = self.active.take()?;
        movement.release(session.id);
        Some(SessionEnd {
            id: session.id,
            attacker: session.attacker,
            defender: session.defender,
            outcome,
            grant_reward: session.reward_pending && outcome == SessionOutcome::Victory,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> CombatRules {
        CombatRules {
            player_range: 10.0,
            player_interval: Some(0.5),
            enemy_shoot_range: 8.0,
            enemy_shoot_interval: Some(3.0),
            melee_range: 5.0,
            melee_interval: Some(2.0),
            melee_window: 0.5,
        }
    }

    fn open(session: &mut CombatSession, lock: &mut MovementLock) -> u32 {
        session
            .begin(EntityHandle(1), EntityHandle(2), &rules(), lock)
            .unwrap()
    }

    #[test]
    fn test_two_shots_per_second_at_attack_speed_two() {
        let mut session = CombatSession::new();
        let mut lock = MovementLock::default();
        open(&mut session, &mut lock);

        let mut shots_at = Vec::new();
        for i in 1..=10 {
            let actions = session.update(0.1, 9.0, &rules());
            if actions.player_fires {
                shots_at.push(i);
            }
        }
        assert_eq!(shots_at, vec![5, 10]);
    }

    #[test]
    fn test_fine_timestep_still_two_shots() {
        let mut session = CombatSession::new();
        let mut lock = MovementLock::default();
        open(&mut session, &mut lock);

        let shots = (0..120)
            .filter(|_| session.update(1.0 / 120.0, 9.0, &rules()).player_fires)
            .count();
        assert_eq!(shots, 2);
    }

    #[test]
    fn test_enemy_cadences_respect_their_ranges() {
        let mut session = CombatSession::new();
        let mut lock = MovementLock::default();
        open(&mut session, &mut lock);

        // Distance 9: inside player range, outside both enemy ranges
        let mut enemy_actions = 0;
        for _ in 0..40 {
            let a = session.update(0.1, 9.0, &rules());
            if a.enemy_fires || a.enemy_strikes {
                enemy_actions += 1;
            }
        }
        assert_eq!(enemy_actions, 0);

        // Cooldowns already elapsed, so stepping into range attacks at once
        let a = session.update(0.1, 4.0, &rules());
        assert!(a.enemy_fires);
        assert!(a.enemy_strikes);
    }

    #[test]
    fn test_melee_window_deadline() {
        let mut session = CombatSession::new();
        let mut lock = MovementLock::default();
        open(&mut session, &mut lock);

        for _ in 0..20 {
            session.update(0.1, 4.0, &rules());
        }
        assert!(session.active().unwrap().enemy_attacking());
        for _ in 0..5 {
            session.update(0.1, 4.0, &rules());
        }
        assert!(!session.active().unwrap().enemy_attacking());
    }

    #[test]
    fn test_out_of_range_reported() {
        let mut session = CombatSession::new();
        let mut lock = MovementLock::default();
        open(&mut session, &mut lock);
        let a = session.update(0.1, 10.5, &rules());
        assert!(a.out_of_range);
        assert!(!a.player_fires);
    }

    #[test]
    fn test_one_session_at_a_time() {
        let mut session = CombatSession::new();
        let mut lock = MovementLock::default();
        let first = open(&mut session, &mut lock);
        assert!(lock.is_suspended());
        assert!(
            session
                .begin(EntityHandle(1), EntityHandle(3), &rules(), &mut lock)
                .is_none()
        );
        assert_eq!(lock.holder(), Some(first));
    }

    #[test]
    fn test_only_owner_releases_movement() {
        let mut session = CombatSession::new();
        let mut lock = MovementLock::default();
        let id = open(&mut session, &mut lock);
        assert!(!lock.release(id + 7));
        assert!(lock.is_suspended());

        let end = session.finish(SessionOutcome::OutOfRange, &mut lock).unwrap();
        assert_eq!(end.id, id);
        assert!(!lock.is_suspended());
    }

    #[test]
    fn test_reward_only_on_victory_and_finish_idempotent() {
        let mut lock = MovementLock::default();

        let mut won = CombatSession::new();
        open(&mut won, &mut lock);
        assert!(won.active().unwrap().reward_pending());
        let end = won.finish(SessionOutcome::Victory, &mut lock).unwrap();
        assert!(end.grant_reward);
        assert!(won.finish(SessionOutcome::Victory, &mut lock).is_none());

        let mut fled = CombatSession::new();
        open(&mut fled, &mut lock);
        assert!(!fled.finish(SessionOutcome::OutOfRange, &mut lock).unwrap().grant_reward);

        let mut lost = CombatSession::new();
        open(&mut lost, &mut lock);
        assert!(!lost.finish(SessionOutcome::Defeat, &mut lock).unwrap().grant_reward);
    }

    #[test]
    fn test_disabled_bow_never_fires() {
        let mut cooldown = Cooldown::primed(None);
        for _ in 0..100 {
            assert!(!cooldown.tick(0.1, None, true));
        }
        // Re-enabled mid-fight: waits a full interval
        assert!(!cooldown.tick(0.1, Some(0.5), true));
        let fired = (0..5).filter(|_| cooldown.tick(0.1, Some(0.5), true)).count();
        assert_eq!(fired, 1);
    }
}
