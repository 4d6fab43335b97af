//! Per-side match counters.

use serde::{Deserialize, Serialize};

use crate::components::Side;

/// Counters for one side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideStats {
    /// Units this side has spawned.
    pub units_spawned: u32,
    /// Units this side has lost.
    pub units_lost: u32,
    /// Damage this side has dealt to the enemy base.
    pub base_damage_dealt: i64,
}

/// Counters for both sides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStats {
    /// Left side.
    pub left: SideStats,
    /// Right side.
    pub right: SideStats,
}

impl MatchStats {
    /// Counters for one side.
    #[must_use]
    pub const fn side(&self, side: Side) -> &SideStats {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub(crate) fn side_mut(&mut self, side: Side) -> &mut SideStats {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}
