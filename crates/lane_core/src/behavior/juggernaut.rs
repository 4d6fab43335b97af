//! Juggernaut charge.
//!
//! A ready juggernaut that is not yet in contact charges an enemy inside its
//! trigger radius at charge speed. The charge ends on contact or on reaching
//! base range with a stun-and-knockback burst; normal melee takes over on
//! later ticks.

use crate::archetype::ArchetypeSpec;
use crate::battlefield::Battlefield;
use crate::combat::stun_burst;
use crate::components::{Tick, UnitAction, UnitId, UnitState};
use crate::events::VisualEvent;
use crate::math::Fixed;
use crate::targeting::{
    advance_along_lane, enemy_base_in_range, move_toward, nearest_enemy, nearest_enemy_where,
    unit_in_range,
};

use super::engage::engage;

/// Charge parameters.
#[derive(Debug, Clone, Copy)]
pub struct Charge {
    /// Movement per tick while charging.
    pub speed: Fixed,
    /// Enemy must be this close for a charge to start.
    pub trigger_radius: Fixed,
    /// Impact radius.
    pub stun_radius: Fixed,
    /// Stun duration.
    pub stun_ticks: Tick,
    /// Push distance.
    pub knockback: Fixed,
    /// Ticks between charges.
    pub cooldown: Tick,
}

/// Run a juggernaut turn.
pub fn run(bf: &mut Battlefield, id: UnitId, spec: &ArchetypeSpec, charge: Charge) {
    let now = bf.now;
    let Some(unit) = bf.registry.get(id) else {
        return;
    };
    let UnitState::Juggernaut {
        charging,
        charge_ready_at,
    } = unit.state
    else {
        return;
    };
    let (side, position) = (unit.side, unit.position);

    if charging {
        charge_step(bf, id, spec, charge);
        return;
    }

    let in_contact = enemy_base_in_range(bf, position, side, spec.range)
        || nearest_enemy(bf, position, side)
            .is_some_and(|enemy| unit_in_range(bf, position, spec.range, enemy.id));
    let prey = nearest_enemy_where(bf, position, side, Some(charge.trigger_radius), |_| true);

    if now >= charge_ready_at && !in_contact && prey.is_some() {
        if let Some(unit) = bf.registry.get_mut(id) {
            unit.state = UnitState::Juggernaut {
                charging: true,
                charge_ready_at,
            };
        }
        charge_step(bf, id, spec, charge);
        return;
    }

    engage(bf, id, spec);
}

/// Move at charge speed and land the impact on contact.
fn charge_step(bf: &mut Battlefield, id: UnitId, spec: &ArchetypeSpec, charge: Charge) {
    let Some(unit) = bf.registry.get(id) else {
        return;
    };
    let (side, position) = (unit.side, unit.position);

    if contact(bf, id, spec) {
        impact(bf, id, charge);
        return;
    }

    match nearest_enemy(bf, position, side) {
        Some(enemy) => {
            let gap = enemy.distance - bf.size_of(enemy.id) - spec.range;
            move_toward(bf, id, enemy.position, charge.speed.min(gap));
        }
        None => advance_along_lane(bf, id, charge.speed),
    }

    if contact(bf, id, spec) {
        impact(bf, id, charge);
    }
}

fn contact(bf: &Battlefield, id: UnitId, spec: &ArchetypeSpec) -> bool {
    let Some(unit) = bf.registry.get(id) else {
        return false;
    };
    let (side, position) = (unit.side, unit.position);
    enemy_base_in_range(bf, position, side, spec.range)
        || nearest_enemy(bf, position, side)
            .is_some_and(|enemy| unit_in_range(bf, position, spec.range, enemy.id))
}

fn impact(bf: &mut Battlefield, id: UnitId, charge: Charge) {
    let now = bf.now;
    let Some(unit) = bf.registry.get_mut(id) else {
        return;
    };
    unit.state = UnitState::Juggernaut {
        charging: false,
        charge_ready_at: now.saturating_add(charge.cooldown),
    };
    unit.action = UnitAction::Attack;
    let (side, position) = (unit.side, unit.position);

    stun_burst(
        bf,
        position,
        side,
        charge.stun_radius,
        charge.stun_ticks,
        charge.knockback,
    );
    bf.push_event(VisualEvent::ChargeImpact {
        unit: id,
        position,
        radius: charge.stun_radius,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::{ArchetypeId, ArchetypeTable};
    use crate::behavior::act;
    use crate::components::{Side, Unit};
    use crate::config::MatchConfig;
    use crate::math::Vec2Fixed;

    fn battlefield() -> Battlefield {
        Battlefield::new(MatchConfig::default(), ArchetypeTable::standard())
    }

    fn place(bf: &mut Battlefield, archetype: ArchetypeId, side: Side, x: i32) -> UnitId {
        let spec = *bf.table.get(archetype);
        bf.registry.insert_unit(Unit {
            id: 0,
            archetype,
            side,
            position: Vec2Fixed::from_ints(x, 200),
            health: spec.health,
            last_attack: None,
            action: UnitAction::Idle,
            stunned_until: 0,
            state: UnitState::for_behavior(&spec.behavior),
        })
    }

    fn charging(bf: &Battlefield, id: UnitId) -> bool {
        matches!(
            bf.unit(id).map(|u| u.state),
            Some(UnitState::Juggernaut { charging: true, .. })
        )
    }

    #[test]
    fn charges_at_charge_speed_then_stuns_on_contact() {
        let mut bf = battlefield();
        let jugg = place(&mut bf, ArchetypeId::Juggernaut, Side::Left, 300);
        let enemy = place(&mut bf, ArchetypeId::Soldier, Side::Right, 380);

        act(&mut bf, jugg);
        assert!(charging(&bf, jugg));
        assert_eq!(bf.unit(jugg).unwrap().position.x, Fixed::from_num(303.5));

        let mut ticks = 0;
        while charging(&bf, jugg) && ticks < 50 {
            bf.now += 1;
            act(&mut bf, jugg);
            ticks += 1;
        }
        assert!(!charging(&bf, jugg));

        let victim = bf.unit(enemy).unwrap();
        assert!(victim.is_stunned(bf.now));
        assert_eq!(victim.health, 100, "impact deals no damage");
        assert!(victim.position.x > Fixed::from_num(380));
        assert!(bf
            .pending_events()
            .iter()
            .any(|e| matches!(e, VisualEvent::ChargeImpact { .. })));
    }

    #[test]
    fn no_charge_while_in_contact() {
        let mut bf = battlefield();
        let jugg = place(&mut bf, ArchetypeId::Juggernaut, Side::Left, 300);
        let enemy = place(&mut bf, ArchetypeId::Soldier, Side::Right, 330);

        act(&mut bf, jugg);

        assert!(!charging(&bf, jugg));
        assert_eq!(bf.unit(enemy).unwrap().health, 100 - 25);
    }

    #[test]
    fn no_charge_beyond_trigger_radius() {
        let mut bf = battlefield();
        let jugg = place(&mut bf, ArchetypeId::Juggernaut, Side::Left, 200);
        let _enemy = place(&mut bf, ArchetypeId::Soldier, Side::Right, 600);

        act(&mut bf, jugg);

        assert!(!charging(&bf, jugg));
        assert_eq!(bf.unit(jugg).unwrap().position.x, Fixed::from_num(201));
    }

    #[test]
    fn charge_waits_for_cooldown() {
        let mut bf = battlefield();
        let jugg = place(&mut bf, ArchetypeId::Juggernaut, Side::Left, 300);
        let _enemy = place(&mut bf, ArchetypeId::Soldier, Side::Right, 450);
        if let Some(unit) = bf.registry.get_mut(jugg) {
            unit.state = UnitState::Juggernaut {
                charging: false,
                charge_ready_at: 50,
            };
        }

        act(&mut bf, jugg);
        assert!(!charging(&bf, jugg));

        bf.now = 50;
        act(&mut bf, jugg);
        assert!(charging(&bf, jugg));
    }

    #[test]
    fn charge_ends_at_base_range_without_enemies() {
        let mut bf = battlefield();
        let jugg = place(&mut bf, ArchetypeId::Juggernaut, Side::Left, 870);
        if let Some(unit) = bf.registry.get_mut(jugg) {
            unit.state = UnitState::Juggernaut {
                charging: true,
                charge_ready_at: 0,
            };
        }
        bf.now = 10;

        // 873.5 is still 26.5 from the base edge.
        act(&mut bf, jugg);
        assert!(charging(&bf, jugg));
        assert_eq!(bf.unit(jugg).unwrap().position.x, Fixed::from_num(873.5));
        assert!(bf.pending_events().is_empty());

        bf.now = 11;
        act(&mut bf, jugg);
        let unit = bf.unit(jugg).unwrap();
        assert_eq!(unit.position.x, Fixed::from_num(877));
        assert_eq!(
            unit.state,
            UnitState::Juggernaut {
                charging: false,
                charge_ready_at: 11 + 120,
            }
        );
        assert_eq!(unit.action, UnitAction::Attack);
        assert!(bf.pending_events().iter().any(|e| matches!(
            e,
            VisualEvent::ChargeImpact { unit, .. } if *unit == jugg
        )));
    }
}
