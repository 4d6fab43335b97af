//! Base damage and the win condition.
//!
//! A base reaching zero health is the only way a match ends. Every base hit,
//! melee or projectile, goes through [`damage_base`], which records the winner
//! the first time a base falls and ignores all later base damage. Base health
//! never drops below zero.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::battlefield::Battlefield;
use crate::components::Side;

/// Lifecycle of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    /// Created, clock not started.
    Waiting,
    /// Ticking.
    Active,
    /// A base fell.
    Ended {
        /// Side whose base survived.
        winner: Side,
    },
}

impl MatchStatus {
    /// Whether ticks and spawns are processed.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Outcome of a base hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseHit {
    /// Damage applied, base still standing.
    Damaged,
    /// This hit destroyed the base.
    Destroyed,
    /// The match was already decided; nothing happened.
    Ignored,
}

/// Damage `side`'s base.
pub(crate) fn damage_base(bf: &mut Battlefield, side: Side, amount: i32) -> BaseHit {
    if bf.is_over() || amount <= 0 {
        return BaseHit::Ignored;
    }

    let base = bf.base_mut(side);
    base.health = base.health.saturating_sub(amount).max(0);
    let remaining = base.health;

    bf.stats.side_mut(side.opponent()).base_damage_dealt += i64::from(amount);
    bf.tick_log.base_damage.push((side, amount));

    if remaining <= 0 {
        let winner = side.opponent();
        bf.winner = Some(winner);
        bf.tick_log.winner = Some(winner);
        info!(tick = bf.now, %winner, "base destroyed");
        BaseHit::Destroyed
    } else {
        BaseHit::Damaged
    }
}
