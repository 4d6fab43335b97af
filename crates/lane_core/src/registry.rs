//! Per-match storage for live units and projectiles.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::archetype::ArchetypeId;
use crate::components::{Projectile, ProjectileId, Side, Unit, UnitId};

/// Live units and projectiles of one match.
///
/// Units sit in a `HashMap` for O(1) lookup by id; anything that iterates
/// goes through [`UnitRegistry::sorted_ids`] so the pass order is always
/// ascending id. Ids are handed out in increasing order, so insertion order
/// is id order and is kept in a side list that the sweep prunes.
/// Projectiles keep launch order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitRegistry {
    units: HashMap<UnitId, Unit>,
    order: Vec<UnitId>,
    projectiles: Vec<Projectile>,
    next_unit_id: UnitId,
    next_projectile_id: ProjectileId,
}

impl UnitRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            units: HashMap::new(),
            order: Vec::new(),
            projectiles: Vec::new(),
            next_unit_id: 1,
            next_projectile_id: 1,
        }
    }

    /// Insert a unit, assigning it the next id.
    pub fn insert_unit(&mut self, mut unit: Unit) -> UnitId {
        let id = self.next_unit_id;
        self.next_unit_id += 1;
        unit.id = id;
        self.units.insert(id, unit);
        self.order.push(id);
        id
    }

    /// Get a unit by id.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Get a mutable unit by id.
    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Get a unit only if it is still alive.
    #[must_use]
    pub fn get_alive(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id).filter(|unit| unit.is_alive())
    }

    /// All unit ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> &[UnitId] {
        &self.order
    }

    /// Owned copy of [`UnitRegistry::ids`], for passes that mutate units.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<UnitId> {
        self.order.clone()
    }

    /// Units in ascending id order.
    #[must_use]
    pub fn sorted_units(&self) -> Vec<&Unit> {
        self.order
            .iter()
            .filter_map(|id| self.units.get(id))
            .collect()
    }

    /// Iterate units in arbitrary order. Only for order-independent queries.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Number of stored units, dead ones included until the next sweep.
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Live units of one archetype on one side.
    #[must_use]
    pub fn population(&self, side: Side, archetype: ArchetypeId) -> u32 {
        self.units
            .values()
            .filter(|u| u.side == side && u.archetype == archetype && u.is_alive())
            .count() as u32
    }

    /// Remove every unit at or below zero health, returning them in id order.
    pub fn remove_dead(&mut self) -> Vec<Unit> {
        let units = &mut self.units;
        let mut removed = Vec::new();
        self.order.retain(|id| {
            let alive = units.get(id).is_some_and(|unit| unit.is_alive());
            if !alive {
                removed.extend(units.remove(id));
            }
            alive
        });
        removed
    }

    /// Queue a projectile, assigning it the next id.
    pub fn insert_projectile(&mut self, mut projectile: Projectile) -> ProjectileId {
        let id = self.next_projectile_id;
        self.next_projectile_id += 1;
        projectile.id = id;
        self.projectiles.push(projectile);
        id
    }

    /// Projectiles in launch order.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Take every projectile out for a resolution pass.
    pub fn take_projectiles(&mut self) -> Vec<Projectile> {
        std::mem::take(&mut self.projectiles)
    }

    /// Put surviving projectiles back after a pass, ahead of any launched
    /// during it.
    pub fn restore_projectiles(&mut self, mut survivors: Vec<Projectile>) {
        survivors.append(&mut self.projectiles);
        self.projectiles = survivors;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{UnitAction, UnitState};
    use crate::math::Vec2Fixed;

    fn unit(side: Side, archetype: ArchetypeId, health: i32) -> Unit {
        Unit {
            id: 0,
            archetype,
            side,
            position: Vec2Fixed::ZERO,
            health,
            last_attack: None,
            action: UnitAction::Idle,
            stunned_until: 0,
            state: UnitState::Basic,
        }
    }

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let mut registry = UnitRegistry::new();
        let a = registry.insert_unit(unit(Side::Left, ArchetypeId::Soldier, 10));
        let b = registry.insert_unit(unit(Side::Left, ArchetypeId::Soldier, 0));
        assert!(b > a);

        registry.remove_dead();
        let c = registry.insert_unit(unit(Side::Left, ArchetypeId::Soldier, 10));
        assert!(c > b);
        assert_eq!(registry.sorted_ids(), vec![a, c]);
    }

    #[test]
    fn population_counts_live_units_per_side() {
        let mut registry = UnitRegistry::new();
        registry.insert_unit(unit(Side::Left, ArchetypeId::Archer, 10));
        registry.insert_unit(unit(Side::Left, ArchetypeId::Archer, -5));
        registry.insert_unit(unit(Side::Right, ArchetypeId::Archer, 10));
        registry.insert_unit(unit(Side::Left, ArchetypeId::Mage, 10));

        assert_eq!(registry.population(Side::Left, ArchetypeId::Archer), 1);
        assert_eq!(registry.population(Side::Right, ArchetypeId::Archer), 1);
        assert_eq!(registry.population(Side::Right, ArchetypeId::Mage), 0);
    }

    #[test]
    fn remove_dead_returns_in_id_order() {
        let mut registry = UnitRegistry::new();
        for _ in 0..5 {
            registry.insert_unit(unit(Side::Right, ArchetypeId::Soldier, 0));
        }
        let removed: Vec<_> = registry.remove_dead().iter().map(|u| u.id).collect();
        assert_eq!(removed, vec![1, 2, 3, 4, 5]);
        assert_eq!(registry.unit_count(), 0);
    }

    #[test]
    fn id_order_survives_spawns_and_sweeps() {
        let mut registry = UnitRegistry::new();
        for health in [10, 0, 10, 0, 10] {
            registry.insert_unit(unit(Side::Left, ArchetypeId::Soldier, health));
        }
        registry.remove_dead();
        let late = registry.insert_unit(unit(Side::Right, ArchetypeId::Archer, 10));
        if let Some(first) = registry.get_mut(1) {
            first.health = 0;
        }
        registry.remove_dead();

        assert_eq!(registry.ids(), &[3, 5, late]);
        let scanned: Vec<_> = registry.sorted_units().iter().map(|u| u.id).collect();
        assert_eq!(scanned, registry.sorted_ids());
        assert_eq!(registry.unit_count(), 3);
    }
}
