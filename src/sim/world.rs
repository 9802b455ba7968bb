//! The entity world the simulation drives
//!
//! The world owns entity creation, destruction and transforms. The
//! simulation owns every timer and stat and talks to the world only through
//! this trait, so a renderer-backed scene and the headless [`SceneWorld`]
//! are interchangeable.
//!
//! [`SceneWorld`]: super::scene::SceneWorld

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Opaque entity id issued by the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityHandle(pub u32);

/// Side an entity fights for. Routes projectile damage and trigger filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Faction {
    Player,
    Enemy,
}

impl Faction {
    pub fn opponent(&self) -> Faction {
        match self {
            Faction::Player => Faction::Enemy,
            Faction::Enemy => Faction::Player,
        }
    }

    /// Entity kind of this faction's combatants
    pub fn body(&self) -> EntityKind {
        match self {
            Faction::Player => EntityKind::Player,
            Faction::Enemy => EntityKind::Enemy,
        }
    }
}

/// Entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Enemy,
    Gate,
    Projectile(Faction),
    /// Floor tile of the endless strip
    Ground,
}

impl EntityKind {
    /// Kinds removed when a run restarts
    pub const PURGED_ON_RETRY: [EntityKind; 4] = [
        EntityKind::Enemy,
        EntityKind::Gate,
        EntityKind::Projectile(Faction::Player),
        EntityKind::Projectile(Faction::Enemy),
    ];

    pub fn faction(&self) -> Option<Faction> {
        match self {
            EntityKind::Player => Some(Faction::Player),
            EntityKind::Enemy => Some(Faction::Enemy),
            EntityKind::Projectile(faction) => Some(*faction),
            EntityKind::Gate | EntityKind::Ground => None,
        }
    }

    /// Whether this kind carries a hurtbox projectiles can hit
    pub fn has_hurtbox(&self) -> bool {
        matches!(self, EntityKind::Player | EntityKind::Enemy)
    }
}

/// Trigger events detected by the world since the last poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Contact {
    /// The player crossed a gate's trigger plane
    GateReached {
        player: EntityHandle,
        gate: EntityHandle,
    },
    /// A projectile's trigger started overlapping another entity
    Overlap {
        projectile: EntityHandle,
        other: EntityHandle,
    },
}

/// Entity store consumed by the simulation
pub trait World {
    /// Instantiate an entity. `None` means no factory is bound for `kind`.
    fn create_entity(&mut self, kind: EntityKind, position: Vec3, rotation: Quat) -> Option<EntityHandle>;

    /// Remove an entity. Unknown handles are ignored.
    fn destroy_entity(&mut self, handle: EntityHandle);

    /// Live entities of a kind, in a stable order
    fn find_all_alive(&self, kind: EntityKind) -> Vec<EntityHandle>;

    fn position(&self, handle: EntityHandle) -> Option<Vec3>;

    fn set_position(&mut self, handle: EntityHandle, position: Vec3);

    fn kind_of(&self, handle: EntityHandle) -> Option<EntityKind>;

    /// Drain trigger events produced since the previous call
    fn poll_contacts(&mut self) -> Vec<Contact>;

    /// Live combatants of a faction
    fn find_faction(&self, faction: Faction) -> Vec<EntityHandle> {
        self.find_all_alive(faction.body())
    }

    fn is_alive(&self, handle: EntityHandle) -> bool {
        self.kind_of(handle).is_some()
    }
}
