//! Distance-driven spawning
//!
//! Two cadences share one interval: gate pairs, and enemies placed between
//! consecutive gate pairs. The enemy cadence stays dormant until the player
//! first covers one interval. A third tracker keeps the ground strip laid
//! out ahead of the player.
//!
//! The coordinator only plans placements; the caller creates the entities
//! and reports back (unbound factories disable a single channel).

use std::collections::VecDeque;

use glam::Vec3;

use super::world::EntityHandle;
use crate::consts::ENEMY_HEIGHT;
use crate::tuning::{CadenceSnap, SpawnTuning};

/// Upper bound on catch-up spawns from a single position update
const MAX_CATCH_UP: u32 = 64;

/// Spawn channels that can be disabled independently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnChannel {
    Gates,
    Enemies,
    Ground,
}

/// "Every `interval` units travelled" tracker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceCadence {
    mark: f32,
}

impl DistanceCadence {
    pub fn new(mark: f32) -> Self {
        Self { mark }
    }

    pub fn mark(&self) -> f32 {
        self.mark
    }

    /// Fire for `position`, returning `(arming mark, trigger point)` for each
    /// spawn due.
    ///
    /// `Position` snaps the mark to the current position, so a jump across
    /// several intervals fires once. `Interval` walks the mark forward one
    /// interval at a time and fires for each crossing.
    pub fn fire(&mut self, position: f32, interval: f32, snap: CadenceSnap) -> Vec<(f32, f32)> {
        let mut due = Vec::new();
        match snap {
            CadenceSnap::Position => {
                if position >= self.mark + interval {
                    due.push((self.mark, position));
                    self.mark = position;
                }
            }
            CadenceSnap::Interval => {
                while position >= self.mark + interval && (due.len() as u32) < MAX_CATCH_UP {
                    let threshold = self.mark + interval;
                    due.push((self.mark, threshold));
                    self.mark = threshold;
                }
                if position >= self.mark + interval {
                    log::warn!(
                        "Spawn cadence fell {} intervals behind; dropping the rest",
                        ((position - self.mark) / interval).floor()
                    );
                    self.mark = position;
                }
            }
        }
        due
    }
}

/// Where a gate pair goes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatePlacement {
    pub left: Vec3,
    pub right: Vec3,
}

/// Placements due after a position update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnPlan {
    pub gate_pairs: Vec<GatePlacement>,
    pub enemies: Vec<Vec3>,
}

impl SpawnPlan {
    pub fn is_empty(&self) -> bool {
        self.gate_pairs.is_empty() && self.enemies.is_empty()
    }
}

/// Gate, enemy and ground cadence for one run
#[derive(Debug, Clone)]
pub struct SpawnCoordinator {
    tuning: SpawnTuning,
    origin_x: f32,
    gates: DistanceCadence,
    enemies: DistanceCadence,
    /// Enemy cadence is live once the first gate distance was reached
    enemies_armed: bool,
    /// Enemies spawned so far (drives difficulty)
    ordinal: u32,
    gates_enabled: bool,
    enemies_enabled: bool,
    ground_enabled: bool,
    ground: VecDeque<EntityHandle>,
    next_ground_x: f32,
}

impl SpawnCoordinator {
    pub fn new(tuning: SpawnTuning, origin_x: f32) -> Self {
        Self {
            origin_x,
            gates: DistanceCadence::new(origin_x),
            enemies: DistanceCadence::new(origin_x),
            enemies_armed: false,
            ordinal: 0,
            gates_enabled: true,
            enemies_enabled: true,
            ground_enabled: tuning.segment_count > 0,
            ground: VecDeque::new(),
            next_ground_x: origin_x,
            tuning,
        }
    }

    pub fn tuning(&self) -> &SpawnTuning {
        &self.tuning
    }

    /// Enemies spawned so far
    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub fn enemies_armed(&self) -> bool {
        self.enemies_armed
    }

    pub fn is_enabled(&self, channel: SpawnChannel) -> bool {
        match channel {
            SpawnChannel::Gates => self.gates_enabled,
            SpawnChannel::Enemies => self.enemies_enabled,
            SpawnChannel::Ground => self.ground_enabled,
        }
    }

    /// Switch a channel off after its factory turned out to be unbound
    pub fn disable(&mut self, channel: SpawnChannel) {
        if self.is_enabled(channel) {
            log::warn!("{:?} spawning disabled: no factory bound", channel);
        }
        match channel {
            SpawnChannel::Gates => self.gates_enabled = false,
            SpawnChannel::Enemies => self.enemies_enabled = false,
            SpawnChannel::Ground => self.ground_enabled = false,
        }
    }

    /// Claim the ordinal for the enemy about to spawn
    pub fn claim_ordinal(&mut self) -> u32 {
        let ordinal = self.ordinal;
        self.ordinal += 1;
        ordinal
    }

    /// Placements due now that the player stands at `player_x`
    pub fn plan(&mut self, player_x: f32) -> SpawnPlan {
        let interval = self.tuning.interval;
        let snap = self.tuning.snap;
        let mut plan = SpawnPlan::default();

        if self.gates_enabled {
            for (mark, _) in self.gates.fire(player_x, interval, snap) {
                let x = mark + self.tuning.ahead_offset;
                plan.gate_pairs.push(GatePlacement {
                    left: Vec3::new(x, 0.0, -self.tuning.lateral_offset),
                    right: Vec3::new(x, 0.0, self.tuning.lateral_offset),
                });
            }
        }

        if !self.enemies_armed {
            let first_gate = self.origin_x + interval;
            if player_x >= first_gate {
                self.enemies_armed = true;
                self.enemies = DistanceCadence::new(match snap {
                    CadenceSnap::Position => player_x,
                    CadenceSnap::Interval => first_gate,
                });
                log::info!("Player reached first gate distance, enemy spawning armed");
            }
        }
        if self.enemies_armed {
            // The cadence keeps its mark even while disabled so re-enabling
            // would not flood spawns; disabled just means nothing is placed
            let due = self.enemies.fire(player_x, interval, snap);
            if self.enemies_enabled {
                let ahead = self.tuning.ahead_offset - self.tuning.between_gates_offset;
                for (_, trigger) in due {
                    plan.enemies
                        .push(Vec3::new(trigger + ahead, ENEMY_HEIGHT, self.tuning.enemy_lane_z));
                }
            }
        }

        plan
    }

    /// Ground segment positions due to keep the strip ahead of the player
    pub fn plan_ground(&mut self, player_x: f32) -> Vec<Vec3> {
        if !self.ground_enabled {
            return Vec::new();
        }
        let len = self.tuning.segment_length;
        let reach = self.tuning.segment_count as f32 * len;
        let mut due = Vec::new();
        while player_x + reach > self.next_ground_x - len && due.len() <= self.tuning.segment_count as usize {
            due.push(Vec3::new(self.next_ground_x, 0.0, 0.0));
            self.next_ground_x += len;
        }
        due
    }

    /// Track a new ground segment, returning the oldest one to recycle
    pub fn push_ground(&mut self, handle: EntityHandle) -> Option<EntityHandle> {
        self.ground.push_back(handle);
        if self.ground.len() > self.tuning.segment_count as usize {
            self.ground.pop_front()
        } else {
            None
        }
    }

    pub fn ground_segments(&self) -> impl Iterator<Item = &EntityHandle> {
        self.ground.iter()
    }

    /// Clear cadences and the ordinal, handing back the ground segments the
    /// caller should destroy before laying a fresh strip
    pub fn reset(&mut self, origin_x: f32) -> Vec<EntityHandle> {
        self.origin_x = origin_x;
        self.gates = DistanceCadence::new(origin_x);
        self.enemies = DistanceCadence::new(origin_x);
        self.enemies_armed = false;
        self.ordinal = 0;
        self.next_ground_x = origin_x;
        self.ground.drain(..).collect()
    }
}
