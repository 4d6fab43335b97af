//! Battle entity definitions.
//!
//! Units, bases and projectiles are plain data. Behavior lives in
//! [`crate::behavior`], [`crate::projectile`] and [`crate::combat`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::archetype::{ArchetypeId, Behavior};
use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Simulation time, counted in ticks since the match started.
pub type Tick = u64;

/// Unique identifier for units within a match. Never reused.
pub type UnitId = u64;

/// Unique identifier for projectiles within a match.
pub type ProjectileId = u64;

/// One of the two opposing ends of the lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Base on the left end, units advance toward +x.
    Left,
    /// Base on the right end, units advance toward -x.
    Right,
}

impl Side {
    /// Both sides, left first.
    pub const BOTH: [Self; 2] = [Self::Left, Self::Right];

    /// The opposing side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Sign of the advance direction along x.
    #[must_use]
    pub fn facing(self) -> Fixed {
        match self {
            Self::Left => Fixed::ONE,
            Self::Right => -Fixed::ONE,
        }
    }

    /// Index for per-side arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Right => "right",
        })
    }
}

/// Player identity as assigned by the lobby.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Create a player id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Action label reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitAction {
    /// Standing still.
    #[default]
    Idle,
    /// Moving.
    Walk,
    /// Attacking, healing, aiming or striking.
    Attack,
    /// Skipping turns until a stun expires.
    Stunned,
}

/// What a unit or projectile is locked on to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AimTarget {
    /// An enemy unit.
    Unit(UnitId),
    /// An enemy base.
    Base(Side),
}

/// Sniper channel state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SniperPhase {
    /// Reloading after a shot.
    Cooldown {
        /// First tick the sniper may search again.
        until: Tick,
    },
    /// Looking for something in range.
    Search,
    /// Channeling at a locked target.
    Aiming {
        /// Tick the channel started.
        started_at: Tick,
        /// Locked target.
        target: AimTarget,
    },
}

/// Warden shield state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShieldState {
    /// Will absorb the next damage instance.
    Intact,
    /// Absorbing everything until the window closes.
    Invulnerable {
        /// First tick damage applies again.
        until: Tick,
    },
    /// Gone for good.
    Spent,
}

/// Per-archetype transient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitState {
    /// No special state (melee, ranged, area, support).
    Basic,
    /// Dash-strike readiness.
    Assassin {
        /// First tick a dash may happen.
        dash_ready_at: Tick,
    },
    /// Channel/aim state.
    Sniper {
        /// Current phase.
        phase: SniperPhase,
        /// Unit fired at last, avoided when alternatives exist.
        last_target: Option<UnitId>,
    },
    /// Charge state.
    Juggernaut {
        /// Whether a charge is in progress.
        charging: bool,
        /// First tick a charge may start.
        charge_ready_at: Tick,
    },
    /// Shield state.
    Warden {
        /// Shield progression.
        shield: ShieldState,
    },
}

impl UnitState {
    /// Initial state for a freshly spawned unit with the given behavior.
    #[must_use]
    pub const fn for_behavior(behavior: &Behavior) -> Self {
        match behavior {
            Behavior::DashStrike { .. } => Self::Assassin { dash_ready_at: 0 },
            Behavior::Channel { .. } => Self::Sniper {
                phase: SniperPhase::Search,
                last_target: None,
            },
            Behavior::Charge { .. } => Self::Juggernaut {
                charging: false,
                charge_ready_at: 0,
            },
            Behavior::ShieldedCaster { .. } => Self::Warden {
                shield: ShieldState::Intact,
            },
            Behavior::Melee
            | Behavior::Ranged { .. }
            | Behavior::Area { .. }
            | Behavior::Support { .. } => Self::Basic,
        }
    }
}

/// A live combat unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Unique id.
    pub id: UnitId,
    /// Archetype the unit was stamped from.
    pub archetype: ArchetypeId,
    /// Owning side.
    pub side: Side,
    /// Current position.
    pub position: Vec2Fixed,
    /// Current health. The unit is dead at zero or below.
    pub health: i32,
    /// Tick of the last attack or heal.
    pub last_attack: Option<Tick>,
    /// Action label for snapshots.
    pub action: UnitAction,
    /// First tick the unit may act again after a stun.
    pub stunned_until: Tick,
    /// Archetype-specific state.
    pub state: UnitState,
}

impl Unit {
    /// Whether the unit still has health left.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Whether the unit is stunned at `now`.
    #[must_use]
    pub const fn is_stunned(&self, now: Tick) -> bool {
        now < self.stunned_until
    }

    /// Whether the attack cadence allows an attack at `now`.
    #[must_use]
    pub fn attack_ready(&self, now: Tick, interval: Tick) -> bool {
        self.last_attack
            .map_or(true, |last| now.saturating_sub(last) >= interval)
    }

    /// Target the sniper is channeling at, for snapshots.
    #[must_use]
    pub const fn aim_target(&self) -> Option<AimTarget> {
        match self.state {
            UnitState::Sniper {
                phase: SniperPhase::Aiming { target, .. },
                ..
            } => Some(target),
            _ => None,
        }
    }
}

/// A side's base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Base {
    /// Owning side.
    pub side: Side,
    /// Center of the base.
    pub position: Vec2Fixed,
    /// Strike radius, used like a unit's size.
    #[serde(with = "fixed_serde")]
    pub radius: Fixed,
    /// Remaining health.
    pub health: i32,
}

/// Where a projectile is headed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileAim {
    /// Re-aims at the unit each tick while it lives.
    Tracking {
        /// Tracked unit.
        target: UnitId,
        /// Position the unit was last seen at.
        last_known: Vec2Fixed,
    },
    /// Flies to a fixed point.
    Point(Vec2Fixed),
    /// Flies to an enemy base.
    Base {
        /// Targeted base.
        side: Side,
        /// Base position.
        point: Vec2Fixed,
    },
}

impl ProjectileAim {
    /// Current aim point.
    #[must_use]
    pub const fn point(&self) -> Vec2Fixed {
        match *self {
            Self::Tracking { last_known, .. } => last_known,
            Self::Point(point) | Self::Base { point, .. } => point,
        }
    }
}

/// A projectile in flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Projectile {
    /// Unique id.
    pub id: ProjectileId,
    /// Launch position.
    pub origin: Vec2Fixed,
    /// Current position.
    pub position: Vec2Fixed,
    /// Aim mode.
    pub aim: ProjectileAim,
    /// Travel per tick.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
    /// Damage dealt on impact.
    pub damage: i32,
    /// How the impact is resolved.
    pub impact: ImpactKind,
    /// Radius around the impact point that counts as a hit.
    #[serde(with = "fixed_serde")]
    pub hit_tolerance: Fixed,
    /// Side that fired it.
    pub side: Side,
    /// Archetype that fired it.
    pub origin_archetype: ArchetypeId,
    /// Unit that fired it.
    pub owner: UnitId,
    /// Tick after which the projectile expires without effect.
    pub expires_at: Tick,
}

/// How a projectile resolves on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImpactKind {
    /// Damages one enemy.
    Single,
    /// Damages every enemy in the radius.
    Blast {
        /// Blast radius around the impact point.
        #[serde(with = "fixed_serde")]
        radius: Fixed,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> Unit {
        Unit {
            id: 1,
            archetype: ArchetypeId::Soldier,
            side: Side::Left,
            position: Vec2Fixed::ZERO,
            health: 100,
            last_attack: None,
            action: UnitAction::Idle,
            stunned_until: 0,
            state: UnitState::Basic,
        }
    }

    #[test]
    fn opponent_is_involution() {
        for side in Side::BOTH {
            assert_eq!(side.opponent().opponent(), side);
            assert_ne!(side.opponent(), side);
        }
        assert_eq!(Side::Left.facing(), Fixed::ONE);
        assert_eq!(Side::Right.facing(), -Fixed::ONE);
    }

    #[test]
    fn attack_cadence_uses_elapsed_ticks() {
        let mut soldier = unit();
        assert!(soldier.attack_ready(0, 20));

        soldier.last_attack = Some(10);
        assert!(!soldier.attack_ready(29, 20));
        assert!(soldier.attack_ready(30, 20));
    }

    #[test]
    fn stun_expires_on_its_tick() {
        let mut soldier = unit();
        soldier.stunned_until = 15;
        assert!(soldier.is_stunned(14));
        assert!(!soldier.is_stunned(15));
    }

    #[test]
    fn initial_state_matches_behavior() {
        let table = crate::archetype::ArchetypeTable::standard();
        let sniper = table.get(ArchetypeId::Sniper);
        assert!(matches!(
            UnitState::for_behavior(&sniper.behavior),
            UnitState::Sniper {
                phase: SniperPhase::Search,
                last_target: None
            }
        ));
        let warden = table.get(ArchetypeId::Warden);
        assert_eq!(
            UnitState::for_behavior(&warden.behavior),
            UnitState::Warden {
                shield: ShieldState::Intact
            }
        );
        let archer = table.get(ArchetypeId::Archer);
        assert_eq!(UnitState::for_behavior(&archer.behavior), UnitState::Basic);
    }
}
