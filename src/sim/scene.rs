//! Headless in-memory world
//!
//! Stands in for the engine scene in tests and the native runner. Trigger
//! detection is deliberately simple: gates are planes across the lane and
//! hurtboxes are spheres.

use std::collections::{BTreeMap, BTreeSet};

use glam::{Quat, Vec3};

use super::world::{Contact, EntityHandle, EntityKind, World};
use crate::consts::*;

/// An entity as the scene sees it
#[derive(Debug, Clone, PartialEq)]
pub struct SceneEntity {
    pub kind: EntityKind,
    pub position: Vec3,
    pub rotation: Quat,
}

/// Deterministic entity store (iteration by handle order)
#[derive(Debug, Clone)]
pub struct SceneWorld {
    entities: BTreeMap<EntityHandle, SceneEntity>,
    next_id: u32,
    /// Kinds whose factory is missing; creating them yields no handle
    unbound: BTreeSet<EntityKind>,
    /// Projectile/body pairs currently overlapping (trigger enter only fires once)
    touching: BTreeSet<(EntityHandle, EntityHandle)>,
    /// Gates already reported as crossed
    crossed: BTreeSet<EntityHandle>,
    /// Whether projectile overlaps are reported at all
    overlap_events: bool,
}

impl Default for SceneWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneWorld {
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            next_id: 1,
            unbound: BTreeSet::new(),
            touching: BTreeSet::new(),
            crossed: BTreeSet::new(),
            overlap_events: true,
        }
    }

    /// Simulate a scene with no prefab bound for `kind`
    pub fn unbind(&mut self, kind: EntityKind) {
        self.unbound.insert(kind);
    }

    /// Turn trigger overlap reporting on or off (gate crossings still report)
    pub fn set_overlap_events(&mut self, enabled: bool) {
        self.overlap_events = enabled;
    }

    pub fn entity(&self, handle: EntityHandle) -> Option<&SceneEntity> {
        self.entities.get(&handle)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities.values().filter(|e| e.kind == kind).count()
    }

    fn hurt_radius(kind: EntityKind) -> f32 {
        match kind {
            EntityKind::Player => PLAYER_HURT_RADIUS,
            EntityKind::Enemy => ENEMY_HURT_RADIUS,
            _ => 0.0,
        }
    }

    fn gate_crossings(&mut self) -> Vec<Contact> {
        let players: Vec<_> = self
            .entities
            .iter()
            .filter(|(_, e)| e.kind == EntityKind::Player)
            .map(|(h, e)| (*h, e.position))
            .collect();

        let mut contacts = Vec::new();
        for (gate, entity) in &self.entities {
            if entity.kind != EntityKind::Gate || self.crossed.contains(gate) {
                continue;
            }
            if let Some((player, _)) = players
                .iter()
                .find(|(_, pos)| pos.x + GATE_HALF_WIDTH >= entity.position.x)
            {
                contacts.push(Contact::GateReached {
                    player: *player,
                    gate: *gate,
                });
            }
        }
        for contact in &contacts {
            if let Contact::GateReached { gate, .. } = contact {
                self.crossed.insert(*gate);
            }
        }
        contacts
    }

    fn projectile_overlaps(&mut self) -> Vec<Contact> {
        let mut now_touching = BTreeSet::new();
        let mut contacts = Vec::new();

        for (projectile, p) in &self.entities {
            if !matches!(p.kind, EntityKind::Projectile(_)) {
                continue;
            }
            for (other, body) in &self.entities {
                if !body.kind.has_hurtbox() {
                    continue;
                }
                let reach = PROJECTILE_RADIUS + Self::hurt_radius(body.kind);
                if p.position.distance_squared(body.position) <= reach * reach {
                    let pair = (*projectile, *other);
                    if !self.touching.contains(&pair) {
                        contacts.push(Contact::Overlap {
                            projectile: *projectile,
                            other: *other,
                        });
                    }
                    now_touching.insert(pair);
                }
            }
        }

        self.touching = now_touching;
        contacts
    }
}

impl World for SceneWorld {
    fn create_entity(&mut self, kind: EntityKind, position: Vec3, rotation: Quat) -> Option<EntityHandle> {
        if self.unbound.contains(&kind) {
            return None;
        }
        let handle = EntityHandle(self.next_id);
        self.next_id += 1;
        self.entities.insert(
            handle,
            SceneEntity {
                kind,
                position,
                rotation,
            },
        );
        Some(handle)
    }

    fn destroy_entity(&mut self, handle: EntityHandle) {
        self.entities.remove(&handle);
        self.crossed.remove(&handle);
        self.touching.retain(|(a, b)| *a != handle && *b != handle);
    }

    fn find_all_alive(&self, kind: EntityKind) -> Vec<EntityHandle> {
        self.entities
            .iter()
            .filter(|(_, e)| e.kind == kind)
            .map(|(h, _)| *h)
            .collect()
    }

    fn position(&self, handle: EntityHandle) -> Option<Vec3> {
        self.entities.get(&handle).map(|e| e.position)
    }

    fn set_position(&mut self, handle: EntityHandle, position: Vec3) {
        if let Some(entity) = self.entities.get_mut(&handle) {
            entity.position = position;
        }
    }

    fn kind_of(&self, handle: EntityHandle) -> Option<EntityKind> {
        self.entities.get(&handle).map(|e| e.kind)
    }

    fn poll_contacts(&mut self) -> Vec<Contact> {
        let mut contacts = self.gate_crossings();
        if self.overlap_events {
            contacts.extend(self.projectile_overlaps());
        }
        contacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::world::Faction;

    #[test]
    fn test_create_find_destroy() {
        let mut scene = SceneWorld::new();
        let a = scene.create_entity(EntityKind::Enemy, Vec3::X, Quat::IDENTITY).unwrap();
        let b = scene.create_entity(EntityKind::Gate, Vec3::Y, Quat::IDENTITY).unwrap();
        assert_ne!(a, b);
        assert_eq!(scene.find_all_alive(EntityKind::Enemy), vec![a]);
        assert_eq!(scene.find_faction(Faction::Enemy), vec![a]);

        scene.destroy_entity(a);
        scene.destroy_entity(a);
        assert!(!scene.is_alive(a));
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_unbound_factory_yields_none() {
        let mut scene = SceneWorld::new();
        scene.unbind(EntityKind::Gate);
        assert!(scene.create_entity(EntityKind::Gate, Vec3::ZERO, Quat::IDENTITY).is_none());
        assert!(scene.create_entity(EntityKind::Enemy, Vec3::ZERO, Quat::IDENTITY).is_some());
    }

    #[test]
    fn test_gate_crossing_reported_once() {
        let mut scene = SceneWorld::new();
        let player = scene.create_entity(EntityKind::Player, Vec3::ZERO, Quat::IDENTITY).unwrap();
        let gate = scene
            .create_entity(EntityKind::Gate, Vec3::new(10.0, 0.0, 5.0), Quat::IDENTITY)
            .unwrap();

        assert!(scene.poll_contacts().is_empty());
        scene.set_position(player, Vec3::new(9.5, 0.0, 0.0));
        assert_eq!(scene.poll_contacts(), vec![Contact::GateReached { player, gate }]);
        scene.set_position(player, Vec3::new(12.0, 0.0, 0.0));
        assert!(scene.poll_contacts().is_empty());
    }

    #[test]
    fn test_overlap_is_enter_only() {
        let mut scene = SceneWorld::new();
        let enemy = scene
            .create_entity(EntityKind::Enemy, Vec3::new(5.0, 1.0, 0.0), Quat::IDENTITY)
            .unwrap();
        let arrow = scene
            .create_entity(
                EntityKind::Projectile(Faction::Player),
                Vec3::new(4.8, 1.0, 0.0),
                Quat::IDENTITY,
            )
            .unwrap();

        assert_eq!(
            scene.poll_contacts(),
            vec![Contact::Overlap {
                projectile: arrow,
                other: enemy
            }]
        );
        assert!(scene.poll_contacts().is_empty());

        scene.set_overlap_events(false);
        scene.set_position(arrow, Vec3::new(0.0, 1.0, 0.0));
        scene.set_position(arrow, Vec3::new(5.0, 1.0, 0.0));
        assert!(scene.poll_contacts().is_empty());
    }
}
