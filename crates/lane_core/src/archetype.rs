//! Archetype spec table: static combat and behavior parameters per unit type.
//!
//! Every unit is stamped from one [`ArchetypeSpec`]. The table is immutable
//! once a match starts; each match carries its own copy.
//!
//! # Data files
//!
//! The built-in [`ArchetypeTable::standard`] table can be replaced by a RON
//! file. Fixed-point values are stored as raw bits, like every other
//! serialized [`Fixed`]:
//!
//! ```ron
//! (archetypes: [
//!     (
//!         id: soldier,
//!         health: 100,
//!         damage: 12,
//!         range: 85899345920,   // 20.0
//!         ...
//!         behavior: Melee,
//!     ),
//! ])
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::components::Tick;
use crate::error::{GameError, Result};
use crate::math::{fixed_serde, Fixed};

/// Identifier of a unit archetype.
///
/// The wire name (`"soldier"`, `"mage"`, ...) is what clients send in spawn
/// requests and what snapshots report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchetypeId {
    /// Cheap melee line infantry.
    Soldier,
    /// Basic ranged unit.
    Archer,
    /// Melee tank.
    Knight,
    /// Area caster.
    Mage,
    /// Long-range area siege piece.
    Cannon,
    /// Support unit that heals nearby allies.
    Healer,
    /// Dash-strike hunter of backline units.
    Assassin,
    /// Channel/aim long-range single-target shooter.
    Sniper,
    /// Tank variant that charges and stuns on impact.
    Juggernaut,
    /// Mage variant whose first hit taken is absorbed by a shield.
    Warden,
}

impl ArchetypeId {
    /// All archetypes in table order.
    pub const ALL: [Self; 10] = [
        Self::Soldier,
        Self::Archer,
        Self::Knight,
        Self::Mage,
        Self::Cannon,
        Self::Healer,
        Self::Assassin,
        Self::Sniper,
        Self::Juggernaut,
        Self::Warden,
    ];

    /// Number of archetypes.
    pub const COUNT: usize = Self::ALL.len();

    /// Position of this archetype in [`Self::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Wire name of the archetype.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Soldier => "soldier",
            Self::Archer => "archer",
            Self::Knight => "knight",
            Self::Mage => "mage",
            Self::Cannon => "cannon",
            Self::Healer => "healer",
            Self::Assassin => "assassin",
            Self::Sniper => "sniper",
            Self::Juggernaut => "juggernaut",
            Self::Warden => "warden",
        }
    }

    /// Look up an archetype by wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }
}

impl fmt::Display for ArchetypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ArchetypeId {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
            .ok_or_else(|| GameError::InvalidArchetypeTable(format!("unknown archetype '{s}'")))
    }
}

/// Coarse behavior classification, used for targeting preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorCategory {
    /// Instant melee damage.
    Melee,
    /// Single-target projectile.
    Ranged,
    /// Blast-radius projectile.
    Area,
    /// Heals allies, never targets enemies.
    Support,
    /// Teleport strike.
    DashStrike,
    /// Wind-up then single heavy shot.
    Channel,
    /// Melee with a stunning charge.
    Charge,
    /// Area caster with a one-time shield.
    ShieldedCaster,
}

impl BehaviorCategory {
    /// Whether units of this category attack from range with projectiles.
    ///
    /// Assassins prefer these as dash targets.
    #[must_use]
    pub const fn is_ranged(self) -> bool {
        matches!(
            self,
            Self::Ranged | Self::Area | Self::Channel | Self::ShieldedCaster
        )
    }
}

/// Behavior profile with its category-specific parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    /// Default engagement, instant damage.
    Melee,
    /// Default engagement, damage through a tracking projectile.
    Ranged {
        /// Projectile travel per tick.
        #[serde(with = "fixed_serde")]
        projectile_speed: Fixed,
    },
    /// Default engagement, damage through a blast projectile.
    Area {
        /// Projectile travel per tick.
        #[serde(with = "fixed_serde")]
        projectile_speed: Fixed,
        /// Blast radius around the impact point.
        #[serde(with = "fixed_serde")]
        blast_radius: Fixed,
    },
    /// Heals wounded allies in radius.
    Support {
        /// Radius scanned for wounded allies.
        #[serde(with = "fixed_serde")]
        heal_radius: Fixed,
        /// Health restored to each ally per heal.
        heal_amount: i32,
    },
    /// Teleports next to a chosen enemy and strikes.
    DashStrike {
        /// Radius scanned for dash targets.
        #[serde(with = "fixed_serde")]
        observe_radius: Fixed,
        /// Damage of the dash strike.
        strike_damage: i32,
        /// Ticks between dashes.
        dash_cooldown: Tick,
    },
    /// Locks a target, channels, then fires one heavy shot.
    Channel {
        /// Channel duration in ticks.
        aim_ticks: Tick,
        /// Projectile travel per tick.
        #[serde(with = "fixed_serde")]
        projectile_speed: Fixed,
        /// Radius around the impact point in which a unit can be hit.
        #[serde(with = "fixed_serde")]
        hit_tolerance: Fixed,
    },
    /// Melee unit that periodically charges and stuns on impact.
    Charge {
        /// Movement per tick while charging.
        #[serde(with = "fixed_serde")]
        charge_speed: Fixed,
        /// Enemy must be this close for a charge to start.
        #[serde(with = "fixed_serde")]
        trigger_radius: Fixed,
        /// Impact stun radius.
        #[serde(with = "fixed_serde")]
        stun_radius: Fixed,
        /// Stun duration in ticks.
        stun_ticks: Tick,
        /// Distance enemies are pushed away on impact.
        #[serde(with = "fixed_serde")]
        knockback: Fixed,
        /// Ticks between charges.
        charge_cooldown: Tick,
    },
    /// Area caster whose first incoming hit is absorbed.
    ShieldedCaster {
        /// Projectile travel per tick.
        #[serde(with = "fixed_serde")]
        projectile_speed: Fixed,
        /// Blast radius around the impact point.
        #[serde(with = "fixed_serde")]
        blast_radius: Fixed,
        /// Invulnerability window after the shield breaks.
        invulnerable_ticks: Tick,
        /// Radius of the stun burst when the shield breaks.
        #[serde(with = "fixed_serde")]
        stun_radius: Fixed,
        /// Stun duration in ticks.
        stun_ticks: Tick,
        /// Distance enemies are pushed away by the burst.
        #[serde(with = "fixed_serde")]
        knockback: Fixed,
    },
}

impl Behavior {
    /// Category of this behavior.
    #[must_use]
    pub const fn category(&self) -> BehaviorCategory {
        match self {
            Self::Melee => BehaviorCategory::Melee,
            Self::Ranged { .. } => BehaviorCategory::Ranged,
            Self::Area { .. } => BehaviorCategory::Area,
            Self::Support { .. } => BehaviorCategory::Support,
            Self::DashStrike { .. } => BehaviorCategory::DashStrike,
            Self::Channel { .. } => BehaviorCategory::Channel,
            Self::Charge { .. } => BehaviorCategory::Charge,
            Self::ShieldedCaster { .. } => BehaviorCategory::ShieldedCaster,
        }
    }

    /// How the default engagement path delivers this unit's attacks.
    #[must_use]
    pub const fn delivery(&self) -> AttackDelivery {
        match *self {
            Self::Ranged { projectile_speed } => AttackDelivery::Projectile {
                speed: projectile_speed,
                blast_radius: None,
            },
            Self::Area {
                projectile_speed,
                blast_radius,
            }
            | Self::ShieldedCaster {
                projectile_speed,
                blast_radius,
                ..
            } => AttackDelivery::Projectile {
                speed: projectile_speed,
                blast_radius: Some(blast_radius),
            },
            Self::Channel {
                projectile_speed, ..
            } => AttackDelivery::Projectile {
                speed: projectile_speed,
                blast_radius: None,
            },
            Self::Melee | Self::Support { .. } | Self::DashStrike { .. } | Self::Charge { .. } => {
                AttackDelivery::Instant
            }
        }
    }
}

/// How an attack reaches its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackDelivery {
    /// Damage applies immediately.
    Instant,
    /// A projectile is spawned and resolves on impact.
    Projectile {
        /// Travel per tick.
        speed: Fixed,
        /// Blast radius, `None` for single-target shots.
        blast_radius: Option<Fixed>,
    },
}

/// Static per-archetype parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchetypeSpec {
    /// Archetype this spec describes.
    pub id: ArchetypeId,
    /// Starting and maximum health.
    pub health: i32,
    /// Damage per attack.
    pub damage: i32,
    /// Attack range, measured edge to edge.
    #[serde(with = "fixed_serde")]
    pub range: Fixed,
    /// Movement per tick.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
    /// Body radius.
    #[serde(with = "fixed_serde")]
    pub size: Fixed,
    /// Resource cost of one batch.
    pub cost: u32,
    /// Ticks between attacks (or heals).
    pub attack_interval: Tick,
    /// Maximum live units of this archetype per side.
    pub population_cap: u32,
    /// Units created per accepted spawn.
    pub batch_size: u32,
    /// Ticks a player must wait before spawning this archetype again.
    pub spawn_cooldown: Tick,
    /// Behavior profile and its parameters.
    pub behavior: Behavior,
}

impl ArchetypeSpec {
    /// Behavior category shortcut.
    #[must_use]
    pub const fn category(&self) -> BehaviorCategory {
        self.behavior.category()
    }
}

fn fx(value: f64) -> Fixed {
    Fixed::from_num(value)
}

/// Builder used for the standard table; keeps the table readable.
struct SpecRow {
    health: i32,
    damage: i32,
    range: f64,
    speed: f64,
    size: f64,
    cost: u32,
    attack_interval: Tick,
    population_cap: u32,
    batch_size: u32,
    spawn_cooldown: Tick,
}

impl SpecRow {
    fn build(self, id: ArchetypeId, behavior: Behavior) -> ArchetypeSpec {
        ArchetypeSpec {
            id,
            health: self.health,
            damage: self.damage,
            range: fx(self.range),
            speed: fx(self.speed),
            size: fx(self.size),
            cost: self.cost,
            attack_interval: self.attack_interval,
            population_cap: self.population_cap,
            batch_size: self.batch_size,
            spawn_cooldown: self.spawn_cooldown,
            behavior,
        }
    }
}

/// Light archetypes may be re-spawned after 2 s, heavy ones after 4 s.
const LIGHT_SPAWN_COOLDOWN: Tick = 40;
const HEAVY_SPAWN_COOLDOWN: Tick = 80;

/// Complete, validated archetype table.
///
/// Holds exactly one spec per [`ArchetypeId`], indexed by
/// [`ArchetypeId::index`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ArchetypeTableData")]
pub struct ArchetypeTable {
    archetypes: Vec<ArchetypeSpec>,
}

#[derive(Deserialize)]
struct ArchetypeTableData {
    archetypes: Vec<ArchetypeSpec>,
}

impl TryFrom<ArchetypeTableData> for ArchetypeTable {
    type Error = GameError;

    fn try_from(data: ArchetypeTableData) -> Result<Self> {
        Self::new(data.archetypes)
    }
}

impl ArchetypeTable {
    /// Build a table from a list of specs.
    ///
    /// # Errors
    ///
    /// Fails when an archetype is missing or listed twice, or when a spec
    /// has non-positive health, a zero cap or a zero batch.
    pub fn new(mut archetypes: Vec<ArchetypeSpec>) -> Result<Self> {
        archetypes.sort_by_key(|spec| spec.id.index());

        for (index, expected) in ArchetypeId::ALL.iter().enumerate() {
            match archetypes.get(index) {
                Some(spec) if spec.id == *expected => {}
                Some(spec) if index > 0 && spec.id == archetypes[index - 1].id => {
                    return Err(GameError::InvalidArchetypeTable(format!(
                        "archetype '{}' listed twice",
                        spec.id
                    )));
                }
                _ => {
                    return Err(GameError::InvalidArchetypeTable(format!(
                        "archetype '{expected}' missing"
                    )));
                }
            }
        }
        if archetypes.len() != ArchetypeId::COUNT {
            return Err(GameError::InvalidArchetypeTable(format!(
                "expected {} archetypes, found {}",
                ArchetypeId::COUNT,
                archetypes.len()
            )));
        }

        for spec in &archetypes {
            if spec.health <= 0 || spec.population_cap == 0 || spec.batch_size == 0 {
                return Err(GameError::InvalidArchetypeTable(format!(
                    "archetype '{}' needs positive health, cap and batch",
                    spec.id
                )));
            }
            if spec.attack_interval == 0 {
                return Err(GameError::InvalidArchetypeTable(format!(
                    "archetype '{}' has a zero attack interval",
                    spec.id
                )));
            }
        }

        Ok(Self { archetypes })
    }

    /// The built-in balance table.
    #[must_use]
    pub fn standard() -> Self {
        use ArchetypeId as A;

        let archetypes = vec![
            SpecRow {
                health: 100,
                damage: 12,
                range: 20.0,
                speed: 2.0,
                size: 10.0,
                cost: 30,
                attack_interval: 20,
                population_cap: 12,
                batch_size: 4,
                spawn_cooldown: LIGHT_SPAWN_COOLDOWN,
            }
            .build(A::Soldier, Behavior::Melee),
            SpecRow {
                health: 60,
                damage: 10,
                range: 150.0,
                speed: 1.6,
                size: 9.0,
                cost: 35,
                attack_interval: 30,
                population_cap: 10,
                batch_size: 3,
                spawn_cooldown: LIGHT_SPAWN_COOLDOWN,
            }
            .build(
                A::Archer,
                Behavior::Ranged {
                    projectile_speed: fx(12.0),
                },
            ),
            SpecRow {
                health: 320,
                damage: 18,
                range: 24.0,
                speed: 1.1,
                size: 14.0,
                cost: 55,
                attack_interval: 30,
                population_cap: 4,
                batch_size: 2,
                spawn_cooldown: HEAVY_SPAWN_COOLDOWN,
            }
            .build(A::Knight, Behavior::Melee),
            SpecRow {
                health: 70,
                damage: 18,
                range: 130.0,
                speed: 1.4,
                size: 9.0,
                cost: 50,
                attack_interval: 40,
                population_cap: 6,
                batch_size: 3,
                spawn_cooldown: LIGHT_SPAWN_COOLDOWN,
            }
            .build(
                A::Mage,
                Behavior::Area {
                    projectile_speed: fx(9.0),
                    blast_radius: fx(40.0),
                },
            ),
            SpecRow {
                health: 150,
                damage: 35,
                range: 220.0,
                speed: 0.8,
                size: 16.0,
                cost: 80,
                attack_interval: 60,
                population_cap: 3,
                batch_size: 1,
                spawn_cooldown: HEAVY_SPAWN_COOLDOWN,
            }
            .build(
                A::Cannon,
                Behavior::Area {
                    projectile_speed: fx(8.0),
                    blast_radius: fx(50.0),
                },
            ),
            SpecRow {
                health: 80,
                damage: 5,
                range: 20.0,
                speed: 1.4,
                size: 9.0,
                cost: 45,
                attack_interval: 30,
                population_cap: 4,
                batch_size: 2,
                spawn_cooldown: LIGHT_SPAWN_COOLDOWN,
            }
            .build(
                A::Healer,
                Behavior::Support {
                    heal_radius: fx(90.0),
                    heal_amount: 15,
                },
            ),
            SpecRow {
                health: 90,
                damage: 8,
                range: 18.0,
                speed: 2.6,
                size: 9.0,
                cost: 55,
                attack_interval: 20,
                population_cap: 4,
                batch_size: 3,
                spawn_cooldown: LIGHT_SPAWN_COOLDOWN,
            }
            .build(
                A::Assassin,
                Behavior::DashStrike {
                    observe_radius: fx(220.0),
                    strike_damage: 45,
                    dash_cooldown: 100,
                },
            ),
            SpecRow {
                health: 50,
                damage: 90,
                range: 300.0,
                speed: 1.0,
                size: 9.0,
                cost: 65,
                attack_interval: 60,
                population_cap: 3,
                batch_size: 1,
                spawn_cooldown: HEAVY_SPAWN_COOLDOWN,
            }
            .build(
                A::Sniper,
                Behavior::Channel {
                    aim_ticks: 30,
                    projectile_speed: fx(40.0),
                    hit_tolerance: fx(20.0),
                },
            ),
            SpecRow {
                health: 350,
                damage: 25,
                range: 24.0,
                speed: 1.0,
                size: 16.0,
                cost: 75,
                attack_interval: 30,
                population_cap: 3,
                batch_size: 1,
                spawn_cooldown: HEAVY_SPAWN_COOLDOWN,
            }
            .build(
                A::Juggernaut,
                Behavior::Charge {
                    charge_speed: fx(3.5),
                    trigger_radius: fx(200.0),
                    stun_radius: fx(60.0),
                    stun_ticks: 20,
                    knockback: fx(30.0),
                    charge_cooldown: 120,
                },
            ),
            SpecRow {
                health: 90,
                damage: 14,
                range: 120.0,
                speed: 1.2,
                size: 10.0,
                cost: 60,
                attack_interval: 40,
                population_cap: 4,
                batch_size: 2,
                spawn_cooldown: LIGHT_SPAWN_COOLDOWN,
            }
            .build(
                A::Warden,
                Behavior::ShieldedCaster {
                    projectile_speed: fx(9.0),
                    blast_radius: fx(35.0),
                    invulnerable_ticks: 40,
                    stun_radius: fx(70.0),
                    stun_ticks: 20,
                    knockback: fx(25.0),
                },
            ),
        ];

        Self { archetypes }
    }

    /// Parse a table from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] for malformed RON or an
    /// incomplete table.
    pub fn from_ron_str(source: &str, label: &str) -> Result<Self> {
        ron::from_str(source).map_err(|e| GameError::DataParseError {
            path: label.to_string(),
            message: e.to_string(),
        })
    }

    /// Render the table as pretty RON, suitable as a starting data file.
    ///
    /// # Errors
    ///
    /// Fails only if RON serialization fails.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::InvalidState(format!("failed to serialize table: {e}")))
    }

    /// Spec for an archetype.
    #[must_use]
    pub fn get(&self, id: ArchetypeId) -> &ArchetypeSpec {
        &self.archetypes[id.index()]
    }

    /// Look up a spec by wire name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&ArchetypeSpec> {
        ArchetypeId::from_name(name).map(|id| self.get(id))
    }

    /// Iterate specs in table order.
    pub fn iter(&self) -> impl Iterator<Item = &ArchetypeSpec> {
        self.archetypes.iter()
    }
}

impl Default for ArchetypeTable {
    fn default() -> Self {
        Self::standard()
    }
}
