//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Driven by the caller's timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity handle)
//! - No engine dependencies; entities are reached through [`World`]

pub mod combat;
pub mod health;
pub mod lifecycle;
pub mod powerup;
pub mod projectile;
pub mod scaling;
pub mod scene;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod world;

pub use combat::{CombatRules, CombatSession, MovementLock, SessionOutcome};
pub use health::HealthTrack;
pub use lifecycle::{GamePhase, Lifecycle, SimClock};
pub use powerup::{CombatStats, PowerUpKind, PowerUpState, RewardTable};
pub use projectile::{Projectile, Shot};
pub use scaling::{EncounterScaler, EnemyStats};
pub use scene::SceneWorld;
pub use spawn::{SpawnChannel, SpawnCoordinator};
pub use state::{Enemy, GameEvent, GatePair, GameState, Player, RunSnapshot};
pub use tick::{TickInput, tick};
pub use world::{Contact, EntityHandle, EntityKind, Faction, World};
