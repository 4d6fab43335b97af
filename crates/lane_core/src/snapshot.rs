//! Client-facing world state.
//!
//! Snapshots are the only place floats appear. They are taken on a sub-rate
//! of ticks decided by [`SnapshotSchedule`]; the simulation itself never
//! looks at the schedule.

use serde::{Deserialize, Serialize};

use crate::archetype::ArchetypeId;
use crate::battlefield::Battlefield;
use crate::components::{AimTarget, Side, Tick, UnitAction, UnitId};
use crate::events::VisualEvent;
use crate::math::{Fixed, Vec2Fixed};

/// Decides which ticks are broadcast ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotSchedule {
    every: u64,
}

impl SnapshotSchedule {
    /// Broadcast every `every` ticks. Zero is treated as one.
    #[must_use]
    pub const fn every(every: u64) -> Self {
        Self {
            every: if every == 0 { 1 } else { every },
        }
    }

    /// Derive the stride from a simulation rate and a target snapshot rate.
    #[must_use]
    pub const fn from_rates(simulation_tps: u64, snapshot_tps: u64) -> Self {
        if snapshot_tps == 0 {
            return Self::every(simulation_tps);
        }
        Self::every(simulation_tps / snapshot_tps)
    }

    /// Ticks between broadcasts.
    #[must_use]
    pub const fn stride(&self) -> u64 {
        self.every
    }

    /// Whether `tick` is a broadcast tick.
    #[must_use]
    pub const fn should_send(&self, tick: Tick) -> bool {
        tick % self.every == 0
    }
}

impl Default for SnapshotSchedule {
    fn default() -> Self {
        Self::every(3)
    }
}

/// Client-side point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl From<Vec2Fixed> for Point {
    fn from(value: Vec2Fixed) -> Self {
        let (x, y) = value.to_f32_pair();
        Self { x, y }
    }
}

/// Health of both bases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseHealth {
    /// Left base.
    pub left: i32,
    /// Right base.
    pub right: i32,
}

/// What a unit is aiming at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AimRef {
    /// An enemy unit.
    Unit(UnitId),
    /// An enemy base.
    Base(Side),
}

impl From<AimTarget> for AimRef {
    fn from(value: AimTarget) -> Self {
        match value {
            AimTarget::Unit(id) => Self::Unit(id),
            AimTarget::Base(side) => Self::Base(side),
        }
    }
}

/// One unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    /// Unit id.
    pub id: UnitId,
    /// Archetype.
    pub archetype: ArchetypeId,
    /// Owning side.
    pub side: Side,
    /// Position.
    pub position: Point,
    /// Current health.
    pub health: i32,
    /// Archetype maximum health.
    pub max_health: i32,
    /// Action label.
    pub action: UnitAction,
    /// Channel target, for snipers mid-aim.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub aim: Option<AimRef>,
}

/// One projectile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    /// Projectile id.
    pub id: u64,
    /// Position.
    pub position: Point,
    /// Archetype that fired it.
    pub archetype: ArchetypeId,
}

/// One visual event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSnapshot {
    /// Area projectile detonation.
    AreaBlast {
        /// Impact point.
        position: Point,
        /// Blast radius.
        radius: f32,
        /// Archetype that fired.
        archetype: ArchetypeId,
    },
    /// Healer pulse.
    HealArea {
        /// Healer id.
        unit: UnitId,
        /// Healer position.
        position: Point,
        /// Heal radius.
        radius: f32,
    },
    /// Assassin dash.
    Teleport {
        /// Assassin id.
        unit: UnitId,
        /// Start point.
        from: Point,
        /// End point.
        to: Point,
    },
    /// Warden shield block.
    ShieldBlock {
        /// Warden id.
        unit: UnitId,
        /// Warden position.
        position: Point,
        /// Burst radius.
        radius: f32,
    },
    /// Juggernaut charge impact.
    ChargeImpact {
        /// Juggernaut id.
        unit: UnitId,
        /// Impact point.
        position: Point,
        /// Stun radius.
        radius: f32,
    },
}

fn radius(value: Fixed) -> f32 {
    value.to_num::<f32>()
}

impl From<VisualEvent> for EventSnapshot {
    fn from(event: VisualEvent) -> Self {
        match event {
            VisualEvent::AreaBlast {
                position,
                radius: r,
                archetype,
            } => Self::AreaBlast {
                position: position.into(),
                radius: radius(r),
                archetype,
            },
            VisualEvent::HealArea {
                unit,
                position,
                radius: r,
            } => Self::HealArea {
                unit,
                position: position.into(),
                radius: radius(r),
            },
            VisualEvent::Teleport { unit, from, to } => Self::Teleport {
                unit,
                from: from.into(),
                to: to.into(),
            },
            VisualEvent::ShieldBlock {
                unit,
                position,
                radius: r,
            } => Self::ShieldBlock {
                unit,
                position: position.into(),
                radius: radius(r),
            },
            VisualEvent::ChargeImpact {
                unit,
                position,
                radius: r,
            } => Self::ChargeImpact {
                unit,
                position: position.into(),
                radius: radius(r),
            },
        }
    }
}

/// World state shared by every recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Match id.
    pub match_id: String,
    /// Tick the snapshot was taken on.
    pub tick: Tick,
    /// Base health.
    pub bases: BaseHealth,
    /// Living units in id order.
    pub units: Vec<UnitSnapshot>,
    /// Projectiles in launch order.
    pub projectiles: Vec<ProjectileSnapshot>,
    /// Visual events since the previous snapshot.
    pub events: Vec<EventSnapshot>,
}

impl Snapshot {
    /// Capture the battlefield together with already-drained events.
    #[must_use]
    pub fn capture(match_id: &str, bf: &Battlefield, events: Vec<VisualEvent>) -> Self {
        let units = bf
            .units()
            .into_iter()
            .filter(|unit| unit.is_alive())
            .map(|unit| UnitSnapshot {
                id: unit.id,
                archetype: unit.archetype,
                side: unit.side,
                position: unit.position.into(),
                health: unit.health,
                max_health: bf.table().get(unit.archetype).health,
                action: unit.action,
                aim: unit.aim_target().map(AimRef::from),
            })
            .collect();

        let projectiles = bf
            .projectiles()
            .iter()
            .map(|projectile| ProjectileSnapshot {
                id: projectile.id,
                position: projectile.position.into(),
                archetype: projectile.origin_archetype,
            })
            .collect();

        Self {
            match_id: match_id.to_string(),
            tick: bf.now(),
            bases: BaseHealth {
                left: bf.base(Side::Left).health,
                right: bf.base(Side::Right).health,
            },
            units,
            projectiles,
            events: events.into_iter().map(EventSnapshot::from).collect(),
        }
    }

    /// Attach one recipient's private resource amount.
    #[must_use]
    pub fn for_player(&self, resource: Fixed) -> PlayerSnapshot {
        PlayerSnapshot {
            resource: resource.to_num::<f32>(),
            state: self.clone(),
        }
    }
}

/// Snapshot as delivered to one human player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Recipient's resource.
    pub resource: f32,
    /// Shared world state.
    pub state: Snapshot,
}
