//! Mutable battle state shared by every per-tick system.

use serde::{Deserialize, Serialize};

use crate::archetype::{ArchetypeSpec, ArchetypeTable};
use crate::components::{Base, Projectile, Side, Tick, Unit, UnitId};
use crate::config::MatchConfig;
use crate::events::{TickEvents, VisualEvent};
use crate::math::{Fixed, Vec2Fixed};
use crate::registry::UnitRegistry;
use crate::stats::MatchStats;

/// Everything the unit and projectile systems read and write during a tick.
///
/// Players, bots and the RNG live one level up in [`crate::simulation::Match`];
/// the systems never need them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Battlefield {
    pub(crate) now: Tick,
    pub(crate) config: MatchConfig,
    pub(crate) table: ArchetypeTable,
    pub(crate) registry: UnitRegistry,
    pub(crate) bases: [Base; 2],
    pub(crate) pending_events: Vec<VisualEvent>,
    pub(crate) winner: Option<Side>,
    pub(crate) stats: MatchStats,
    #[serde(skip)]
    pub(crate) tick_log: TickEvents,
}

impl Battlefield {
    /// Create an empty battlefield with both bases at full health.
    #[must_use]
    pub fn new(config: MatchConfig, table: ArchetypeTable) -> Self {
        let base = |side| Base {
            side,
            position: config.base_position(side),
            radius: config.base_radius,
            health: config.base_health,
        };
        Self {
            now: 0,
            bases: [base(Side::Left), base(Side::Right)],
            config,
            table,
            registry: UnitRegistry::new(),
            pending_events: Vec::new(),
            winner: None,
            stats: MatchStats::default(),
            tick_log: TickEvents::default(),
        }
    }

    /// Current tick.
    #[must_use]
    pub const fn now(&self) -> Tick {
        self.now
    }

    /// Match configuration.
    #[must_use]
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Archetype table in use.
    #[must_use]
    pub const fn table(&self) -> &ArchetypeTable {
        &self.table
    }

    /// A side's base.
    #[must_use]
    pub const fn base(&self, side: Side) -> &Base {
        &self.bases[side.index()]
    }

    pub(crate) fn base_mut(&mut self, side: Side) -> &mut Base {
        &mut self.bases[side.index()]
    }

    /// Winner, once a base has fallen.
    #[must_use]
    pub const fn winner(&self) -> Option<Side> {
        self.winner
    }

    /// Per-side counters.
    #[must_use]
    pub const fn stats(&self) -> &MatchStats {
        &self.stats
    }

    /// Unit by id, dead or alive.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.registry.get(id)
    }

    /// Units in ascending id order.
    #[must_use]
    pub fn units(&self) -> Vec<&Unit> {
        self.registry.sorted_units()
    }

    /// Projectiles in flight.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        self.registry.projectiles()
    }

    /// Visual events waiting for the next snapshot.
    #[must_use]
    pub fn pending_events(&self) -> &[VisualEvent] {
        &self.pending_events
    }

    /// Live units of one archetype on one side.
    #[must_use]
    pub fn population(&self, side: Side, archetype: crate::archetype::ArchetypeId) -> u32 {
        self.registry.population(side, archetype)
    }

    pub(crate) fn spec_of(&self, unit: &Unit) -> &ArchetypeSpec {
        self.table.get(unit.archetype)
    }

    pub(crate) fn clamp_to_field(&self, position: Vec2Fixed) -> Vec2Fixed {
        position.clamp(self.config.field_min(), self.config.field_max())
    }

    pub(crate) fn push_event(&mut self, event: VisualEvent) {
        self.pending_events.push(event);
    }

    pub(crate) fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    /// Body radius of a unit, zero if it is gone.
    pub(crate) fn size_of(&self, id: UnitId) -> Fixed {
        self.registry
            .get(id)
            .map_or(Fixed::ZERO, |unit| self.spec_of(unit).size)
    }
}
