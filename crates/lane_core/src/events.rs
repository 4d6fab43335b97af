//! Events produced by the simulation.
//!
//! [`VisualEvent`]s are cosmetic: they queue on the match and drain into the
//! next snapshot, at most once. [`TickEvents`] summarizes what happened in a
//! single tick for the caller driving the clock.

use serde::{Deserialize, Serialize};

use crate::archetype::ArchetypeId;
use crate::components::{Side, UnitId};
use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Cosmetic event for clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualEvent {
    /// An area projectile detonated.
    AreaBlast {
        /// Impact point.
        position: Vec2Fixed,
        /// Blast radius.
        #[serde(with = "fixed_serde")]
        radius: Fixed,
        /// Archetype that fired it.
        archetype: ArchetypeId,
    },
    /// A healer pulsed.
    HealArea {
        /// Healer id.
        unit: UnitId,
        /// Healer position.
        position: Vec2Fixed,
        /// Heal radius.
        #[serde(with = "fixed_serde")]
        radius: Fixed,
    },
    /// An assassin dashed.
    Teleport {
        /// Assassin id.
        unit: UnitId,
        /// Position before the dash.
        from: Vec2Fixed,
        /// Position after the dash.
        to: Vec2Fixed,
    },
    /// A warden shield absorbed its first hit.
    ShieldBlock {
        /// Warden id.
        unit: UnitId,
        /// Warden position.
        position: Vec2Fixed,
        /// Burst radius.
        #[serde(with = "fixed_serde")]
        radius: Fixed,
    },
    /// A juggernaut charge landed.
    ChargeImpact {
        /// Juggernaut id.
        unit: UnitId,
        /// Impact position.
        position: Vec2Fixed,
        /// Stun radius.
        #[serde(with = "fixed_serde")]
        radius: Fixed,
    },
}

/// Summary of one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickEvents {
    /// Units created this tick (bot spawns).
    pub spawned: Vec<UnitId>,
    /// Units swept at the start of this tick.
    pub removed: Vec<UnitId>,
    /// Base damage applied this tick, in application order.
    pub base_damage: Vec<(Side, i32)>,
    /// Set on the single tick a base falls.
    pub winner: Option<Side>,
}
