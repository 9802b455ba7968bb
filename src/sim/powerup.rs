//! Stackable power-ups and debuffs
//!
//! The power level is a clamped summary of net boosts minus debuffs. The two
//! stat multipliers are separate running sums that keep drifting after the
//! level saturates; derived combat stats read the multipliers, not the level.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::tuning::{PowerUpTuning, RewardTuning};

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    DamageBoost,
    SpeedBoost,
    DamageDebuff,
    SpeedDebuff,
}

impl PowerUpKind {
    pub const BOOSTS: [PowerUpKind; 2] = [PowerUpKind::DamageBoost, PowerUpKind::SpeedBoost];
    pub const DEBUFFS: [PowerUpKind; 2] = [PowerUpKind::DamageDebuff, PowerUpKind::SpeedDebuff];

    /// Signed change to the power level
    pub fn level_delta(&self) -> i32 {
        if self.is_boost() { 1 } else { -1 }
    }

    pub fn is_boost(&self) -> bool {
        matches!(self, PowerUpKind::DamageBoost | PowerUpKind::SpeedBoost)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUpKind::DamageBoost => "DamageBoost",
            PowerUpKind::SpeedBoost => "SpeedBoost",
            PowerUpKind::DamageDebuff => "DamageDebuff",
            PowerUpKind::SpeedDebuff => "SpeedDebuff",
        }
    }
}

/// Accumulated power-ups for the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUpState {
    level: i32,
    damage_multiplier: f32,
    speed_multiplier: f32,
    min_level: i32,
    max_level: i32,
    damage_delta: f32,
    speed_delta: f32,
}

impl PowerUpState {
    pub fn new(tuning: &PowerUpTuning) -> Self {
        let min_level = tuning.min_level.min(tuning.max_level);
        let max_level = tuning.max_level.max(tuning.min_level);
        Self {
            level: 0_i32.clamp(min_level, max_level),
            damage_multiplier: 1.0,
            speed_multiplier: 1.0,
            min_level,
            max_level,
            damage_delta: tuning.damage_delta,
            speed_delta: tuning.speed_delta,
        }
    }

    #[inline]
    pub fn level(&self) -> i32 {
        self.level
    }

    #[inline]
    pub fn damage_multiplier(&self) -> f32 {
        self.damage_multiplier
    }

    #[inline]
    pub fn speed_multiplier(&self) -> f32 {
        self.speed_multiplier
    }

    pub fn level_bounds(&self) -> (i32, i32) {
        (self.min_level, self.max_level)
    }

    /// Stack one power-up. The multiplier delta always lands; the level is
    /// clamped afterwards.
    pub fn apply(&mut self, kind: PowerUpKind) {
        match kind {
            PowerUpKind::DamageBoost => self.damage_multiplier += self.damage_delta,
            PowerUpKind::SpeedBoost => self.speed_multiplier += self.speed_delta,
            PowerUpKind::DamageDebuff => self.damage_multiplier -= self.damage_delta,
            PowerUpKind::SpeedDebuff => self.speed_multiplier -= self.speed_delta,
        }
        self.level = (self.level + kind.level_delta()).clamp(self.min_level, self.max_level);
    }

    /// Back to neutral (level 0, or the nearest bound if 0 is outside them)
    pub fn reset(&mut self) {
        self.level = 0_i32.clamp(self.min_level, self.max_level);
        self.damage_multiplier = 1.0;
        self.speed_multiplier = 1.0;
    }

    /// Model slot for `model_count` player models, from most debuffed (0) to
    /// most boosted (`model_count - 1`)
    pub fn appearance_index(&self, model_count: usize) -> usize {
        if model_count == 0 {
            return 0;
        }
        let span = (self.max_level - self.min_level) as f32;
        if span <= 0.0 {
            return 0;
        }
        let normalized = (self.level - self.min_level) as f32 / span;
        let index = (normalized * (model_count - 1) as f32).round() as usize;
        index.min(model_count - 1)
    }
}

/// Player combat stats derived from base values and current multipliers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatStats {
    /// Damage per arrow
    pub damage: f32,
    /// Arrows per second
    pub attack_speed: f32,
}

impl CombatStats {
    /// Recompute from scratch (never accumulates onto previous values)
    pub fn derive(base_damage: f32, base_attack_speed: f32, power: &PowerUpState) -> Self {
        Self {
            damage: base_damage * power.damage_multiplier(),
            attack_speed: base_attack_speed * power.speed_multiplier(),
        }
    }

    /// Seconds between shots, or None when debuffs have stopped the bow
    pub fn shot_interval(&self) -> Option<f32> {
        (self.attack_speed > 0.0).then(|| 1.0 / self.attack_speed)
    }
}

/// Reward picker for a won encounter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardTable {
    boost_chance: f32,
}

impl RewardTable {
    pub fn new(tuning: &RewardTuning) -> Self {
        Self {
            boost_chance: tuning.boost_chance.clamp(0.0, 1.0),
        }
    }

    /// Pick the boost or debuff set by `boost_chance`, then uniformly within it
    pub fn roll<R: Rng>(&self, rng: &mut R) -> PowerUpKind {
        let set = if rng.random::<f32>() < self.boost_chance {
            &PowerUpKind::BOOSTS
        } else {
            &PowerUpKind::DEBUFFS
        };
        set[rng.random_range(0..set.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn state() -> PowerUpState {
        PowerUpState::new(&PowerUpTuning::default())
    }

    #[test]
    fn test_level_saturates_but_multiplier_keeps_growing() {
        let mut power = state();
        for _ in 0..10 {
            power.apply(PowerUpKind::DamageBoost);
        }
        assert_eq!(power.level(), 5);
        assert!((power.damage_multiplier() - 4.0).abs() < 1e-4);
        assert_eq!(power.speed_multiplier(), 1.0);
    }

    #[test]
    fn test_each_kind_touches_one_multiplier() {
        let mut power = state();
        power.apply(PowerUpKind::SpeedBoost);
        assert!((power.speed_multiplier() - 1.2).abs() < 1e-6);
        assert_eq!(power.damage_multiplier(), 1.0);

        power.apply(PowerUpKind::DamageDebuff);
        assert!((power.damage_multiplier() - 0.7).abs() < 1e-6);
        assert!((power.speed_multiplier() - 1.2).abs() < 1e-6);
        assert_eq!(power.level(), 0);

        power.apply(PowerUpKind::SpeedDebuff);
        assert_eq!(power.level(), -1);
        assert!((power.speed_multiplier() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_debuffs_drift_below_zero() {
        let mut power = state();
        for _ in 0..8 {
            power.apply(PowerUpKind::SpeedDebuff);
        }
        assert_eq!(power.level(), -5);
        assert!((power.speed_multiplier() - (1.0 - 8.0 * 0.2)).abs() < 1e-4);

        let stats = CombatStats::derive(10.0, 2.0, &power);
        assert!(stats.attack_speed < 0.0);
        assert_eq!(stats.shot_interval(), None);
    }

    #[test]
    fn test_reset_restores_neutral() {
        let mut power = state();
        power.apply(PowerUpKind::DamageBoost);
        power.apply(PowerUpKind::SpeedBoost);
        power.reset();
        assert_eq!(power, state());
    }

    #[test]
    fn test_derived_stats_recompute_from_base() {
        let mut power = state();
        power.apply(PowerUpKind::DamageBoost);
        power.apply(PowerUpKind::DamageBoost);
        let stats = CombatStats::derive(10.0, 2.0, &power);
        assert!((stats.damage - 16.0).abs() < 1e-4);
        assert_eq!(stats.attack_speed, 2.0);
        assert_eq!(stats.shot_interval(), Some(0.5));
    }

    #[test]
    fn test_level_starts_and_resets_within_bounds() {
        let tuning = PowerUpTuning {
            min_level: 1,
            max_level: 5,
            ..Default::default()
        };
        let mut power = PowerUpState::new(&tuning);
        assert_eq!(power.level(), 1);

        power.apply(PowerUpKind::DamageBoost);
        assert_eq!(power.level(), 2);
        power.reset();
        assert_eq!(power.level(), 1);
        assert_eq!(power.damage_multiplier(), 1.0);
    }

    #[test]
    fn test_appearance_index_spans_models() {
        let mut power = state();
        assert_eq!(power.appearance_index(3), 1);
        for _ in 0..5 {
            power.apply(PowerUpKind::DamageBoost);
        }
        assert_eq!(power.appearance_index(3), 2);
        for _ in 0..10 {
            power.apply(PowerUpKind::SpeedDebuff);
        }
        assert_eq!(power.appearance_index(3), 0);
        assert_eq!(power.appearance_index(0), 0);
    }

    #[test]
    fn test_reward_roll_respects_extremes() {
        let mut rng = Pcg32::seed_from_u64(7);
        let always = RewardTable::new(&RewardTuning { boost_chance: 1.0 });
        let never = RewardTable::new(&RewardTuning { boost_chance: 0.0 });
        for _ in 0..100 {
            assert!(always.roll(&mut rng).is_boost());
            assert!(!never.roll(&mut rng).is_boost());
        }
    }

    #[test]
    fn test_reward_roll_covers_both_kinds_in_set() {
        let mut rng = Pcg32::seed_from_u64(11);
        let table = RewardTable::new(&RewardTuning { boost_chance: 1.0 });
        let rolls: Vec<_> = (0..200).map(|_| table.roll(&mut rng)).collect();
        assert!(rolls.contains(&PowerUpKind::DamageBoost));
        assert!(rolls.contains(&PowerUpKind::SpeedBoost));
    }

    fn any_kind() -> impl Strategy<Value = PowerUpKind> {
        prop_oneof![
            Just(PowerUpKind::DamageBoost),
            Just(PowerUpKind::SpeedBoost),
            Just(PowerUpKind::DamageDebuff),
            Just(PowerUpKind::SpeedDebuff),
        ]
    }

    proptest! {
        #[test]
        fn prop_level_clamped_multipliers_unclamped(kinds in prop::collection::vec(any_kind(), 0..80)) {
            let mut power = state();
            let mut damage_net = 0i32;
            let mut speed_net = 0i32;
            for kind in &kinds {
                power.apply(*kind);
                match kind {
                    PowerUpKind::DamageBoost => damage_net += 1,
                    PowerUpKind::DamageDebuff => damage_net -= 1,
                    PowerUpKind::SpeedBoost => speed_net += 1,
                    PowerUpKind::SpeedDebuff => speed_net -= 1,
                }
                prop_assert!(power.level() >= -5 && power.level() <= 5);
            }
            prop_assert!((power.damage_multiplier() - (1.0 + damage_net as f32 * 0.3)).abs() < 1e-3);
            prop_assert!((power.speed_multiplier() - (1.0 + speed_net as f32 * 0.2)).abs() < 1e-3);
        }
    }
}
