//! Enemy difficulty scaling by spawn ordinal

use serde::{Deserialize, Serialize};

use crate::tuning::EnemyTuning;

/// Stats stamped onto a freshly spawned enemy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    pub max_health: f32,
    /// Melee strike damage
    pub damage: f32,
}

/// Linear difficulty curve over the zero-based enemy ordinal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EncounterScaler {
    pub base_health: f32,
    pub health_step: f32,
    pub base_damage: f32,
    pub damage_step: f32,
}

impl EncounterScaler {
    pub fn new(tuning: &EnemyTuning) -> Self {
        Self {
            base_health: tuning.base_health,
            health_step: tuning.health_step.max(0.0),
            base_damage: tuning.base_damage,
            damage_step: tuning.damage_step.max(0.0),
        }
    }

    pub fn stats(&self, ordinal: u32) -> EnemyStats {
        let n = ordinal as f32;
        EnemyStats {
            max_health: self.base_health + n * self.health_step,
            damage: self.base_damage + n * self.damage_step,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ordinal_zero_is_base() {
        let scaler = EncounterScaler::new(&EnemyTuning::default());
        assert_eq!(
            scaler.stats(0),
            EnemyStats {
                max_health: 50.0,
                damage: 20.0
            }
        );
    }

    #[test]
    fn test_third_ordinal_health() {
        let scaler = EncounterScaler::new(&EnemyTuning::default());
        let stats = scaler.stats(3);
        assert_eq!(stats.max_health, 125.0);
        assert_eq!(stats.damage, 35.0);
    }

    proptest! {
        #[test]
        fn prop_non_decreasing(n in 0u32..10_000, base_h in 1.0f32..500.0, step_h in 0.0f32..100.0) {
            let scaler = EncounterScaler {
                base_health: base_h,
                health_step: step_h,
                base_damage: 20.0,
                damage_step: 5.0,
            };
            let a = scaler.stats(n);
            let b = scaler.stats(n + 1);
            prop_assert!(b.max_health >= a.max_health);
            prop_assert!(b.damage >= a.damage);
        }
    }
}
