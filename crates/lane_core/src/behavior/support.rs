//! Healer: pulse heals for wounded allies, siege pressure otherwise.

use crate::archetype::ArchetypeSpec;
use crate::battlefield::Battlefield;
use crate::combat::heal_unit;
use crate::components::{AimTarget, UnitAction, UnitId};
use crate::events::VisualEvent;
use crate::math::Fixed;
use crate::targeting::{advance_along_lane, enemy_base_in_range};

use super::engage::try_attack;

/// Run a healer turn. Healers never target enemy units.
pub fn run(
    bf: &mut Battlefield,
    id: UnitId,
    spec: &ArchetypeSpec,
    heal_radius: Fixed,
    heal_amount: i32,
) {
    let now = bf.now;
    let Some(healer) = bf.registry.get(id) else {
        return;
    };
    let (side, position) = (healer.side, healer.position);
    let radius_sq = heal_radius.saturating_mul(heal_radius);

    let wounded: Vec<UnitId> = bf
        .registry
        .sorted_units()
        .into_iter()
        .filter(|u| u.side == side && u.is_alive())
        .filter(|u| u.health < bf.spec_of(u).health)
        .filter(|u| u.position.distance_squared(position) <= radius_sq)
        .map(|u| u.id)
        .collect();

    if !wounded.is_empty() {
        let Some(healer) = bf.registry.get_mut(id) else {
            return;
        };
        if !healer.attack_ready(now, spec.attack_interval) {
            healer.action = UnitAction::Idle;
            return;
        }
        healer.last_attack = Some(now);
        healer.action = UnitAction::Attack;
        for ally in wounded {
            heal_unit(bf, ally, heal_amount);
        }
        bf.push_event(VisualEvent::HealArea {
            unit: id,
            position,
            radius: heal_radius,
        });
        return;
    }

    if enemy_base_in_range(bf, position, side, spec.range) {
        try_attack(bf, id, spec, AimTarget::Base(side.opponent()));
    } else {
        advance_along_lane(bf, id, spec.speed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::{ArchetypeId, ArchetypeTable, Behavior};
    use crate::behavior::act;
    use crate::components::{Side, Unit, UnitState};
    use crate::config::MatchConfig;
    use crate::math::Vec2Fixed;

    fn battlefield() -> Battlefield {
        Battlefield::new(MatchConfig::default(), ArchetypeTable::standard())
    }

    fn place(bf: &mut Battlefield, archetype: ArchetypeId, side: Side, x: i32, health: i32) -> UnitId {
        let spec = *bf.table.get(archetype);
        bf.registry.insert_unit(Unit {
            id: 0,
            archetype,
            side,
            position: Vec2Fixed::from_ints(x, 200),
            health,
            last_attack: None,
            action: UnitAction::Idle,
            stunned_until: 0,
            state: UnitState::for_behavior(&spec.behavior),
        })
    }

    fn heal_amount() -> i32 {
        match ArchetypeTable::standard().get(ArchetypeId::Healer).behavior {
            Behavior::Support { heal_amount, .. } => heal_amount,
            _ => unreachable!(),
        }
    }

    #[test]
    fn heals_wounded_allies_in_radius_including_self() {
        let mut bf = battlefield();
        let healer = place(&mut bf, ArchetypeId::Healer, Side::Left, 300, 50);
        let near = place(&mut bf, ArchetypeId::Soldier, Side::Left, 350, 40);
        let far = place(&mut bf, ArchetypeId::Soldier, Side::Left, 500, 40);
        let full = place(&mut bf, ArchetypeId::Soldier, Side::Left, 320, 100);

        act(&mut bf, healer);

        let amount = heal_amount();
        assert_eq!(bf.unit(healer).unwrap().health, 50 + amount);
        assert_eq!(bf.unit(near).unwrap().health, 40 + amount);
        assert_eq!(bf.unit(far).unwrap().health, 40);
        assert_eq!(bf.unit(full).unwrap().health, 100);
        assert!(matches!(bf.pending_events(), [VisualEvent::HealArea { .. }]));
    }

    #[test]
    fn holds_position_while_heal_on_cooldown() {
        let mut bf = battlefield();
        let healer = place(&mut bf, ArchetypeId::Healer, Side::Left, 300, 80);
        let _ally = place(&mut bf, ArchetypeId::Soldier, Side::Left, 320, 10);

        act(&mut bf, healer);
        bf.now = 1;
        act(&mut bf, healer);

        let unit = bf.unit(healer).unwrap();
        assert_eq!(unit.action, UnitAction::Idle);
        assert_eq!(unit.position, Vec2Fixed::from_ints(300, 200));
    }

    #[test]
    fn advances_and_ignores_enemies_when_nobody_is_hurt() {
        let mut bf = battlefield();
        let healer = place(&mut bf, ArchetypeId::Healer, Side::Left, 300, 80);
        let enemy = place(&mut bf, ArchetypeId::Soldier, Side::Right, 310, 100);

        act(&mut bf, healer);

        assert_eq!(bf.unit(enemy).unwrap().health, 100);
        let unit = bf.unit(healer).unwrap();
        assert_eq!(unit.action, UnitAction::Walk);
        assert!(unit.position.x > Fixed::from_num(300));
    }

    #[test]
    fn strikes_base_when_in_range() {
        let mut bf = battlefield();
        let healer = place(&mut bf, ArchetypeId::Healer, Side::Left, 890, 80);
        act(&mut bf, healer);
        assert_eq!(bf.base(Side::Right).health, 1000 - 5);
    }
}
