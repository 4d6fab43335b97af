//! Assassin dash-strike.
//!
//! With the dash ready, the assassin picks a victim inside its observation
//! radius, teleports next to it and strikes. Projectile-firing enemies are
//! preferred, farthest first; otherwise the nearest enemy of any kind. With
//! the dash cooling down it fights like a plain melee unit.

use crate::archetype::ArchetypeSpec;
use crate::battlefield::Battlefield;
use crate::combat::damage_unit;
use crate::components::{Tick, UnitAction, UnitId, UnitState};
use crate::events::VisualEvent;
use crate::math::{Fixed, Vec2Fixed};
use crate::targeting::{nearest_enemy_where, Candidate};

use super::engage::engage;

/// Dash parameters.
#[derive(Debug, Clone, Copy)]
pub struct Dash {
    /// Scan radius.
    pub observe_radius: Fixed,
    /// Strike damage.
    pub strike_damage: i32,
    /// Ticks between dashes.
    pub cooldown: Tick,
}

/// Run an assassin turn.
pub fn run(bf: &mut Battlefield, id: UnitId, spec: &ArchetypeSpec, dash: Dash) {
    let now = bf.now;
    let Some(unit) = bf.registry.get(id) else {
        return;
    };
    let ready = match unit.state {
        UnitState::Assassin { dash_ready_at } => now >= dash_ready_at,
        _ => false,
    };

    if ready {
        if let Some(victim) = pick_victim(bf, id, dash.observe_radius) {
            strike(bf, id, spec, victim, dash, now);
            return;
        }
    }

    engage(bf, id, spec);
}

/// Farthest projectile-firing enemy in radius, else the nearest enemy.
fn pick_victim(bf: &Battlefield, id: UnitId, radius: Fixed) -> Option<Candidate> {
    let unit = bf.registry.get(id)?;
    let (side, from) = (unit.side, unit.position);

    let mut farthest_ranged: Option<Candidate> = None;
    for enemy in bf.registry.sorted_units() {
        if enemy.side == side || !enemy.is_alive() || !bf.spec_of(enemy).category().is_ranged() {
            continue;
        }
        let distance = from.distance(enemy.position);
        if distance > radius {
            continue;
        }
        if farthest_ranged.map_or(true, |best| distance > best.distance) {
            farthest_ranged = Some(Candidate {
                id: enemy.id,
                position: enemy.position,
                distance,
            });
        }
    }

    farthest_ranged.or_else(|| nearest_enemy_where(bf, from, side, Some(radius), |_| true))
}

fn strike(
    bf: &mut Battlefield,
    id: UnitId,
    spec: &ArchetypeSpec,
    victim: Candidate,
    dash: Dash,
    now: Tick,
) {
    let contact = spec.size + bf.size_of(victim.id);
    let field_min = bf.config.field_min();
    let field_max = bf.config.field_max();
    let Some(unit) = bf.registry.get_mut(id) else {
        return;
    };

    let from = unit.position;
    let mut approach = (from - victim.position).normalize();
    if approach == Vec2Fixed::ZERO {
        approach = Vec2Fixed::new(-unit.side.facing(), Fixed::ZERO);
    }
    let to = (victim.position + approach.scale(contact)).clamp(field_min, field_max);

    unit.position = to;
    unit.action = UnitAction::Attack;
    unit.last_attack = Some(now);
    unit.state = UnitState::Assassin {
        dash_ready_at: now.saturating_add(dash.cooldown),
    };

    bf.push_event(VisualEvent::Teleport { unit: id, from, to });
    damage_unit(bf, victim.id, dash.strike_damage);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::{ArchetypeId, ArchetypeTable};
    use crate::behavior::act;
    use crate::components::{Side, Unit};
    use crate::config::MatchConfig;

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

    #[test]
    fn prefers_farthest_ranged_enemy() {
        let mut bf = battlefield();
        let assassin = place(&mut bf, ArchetypeId::Assassin, Side::Left, 300);
        let _soldier = place(&mut bf, ArchetypeId::Soldier, Side::Right, 340);
        let near_archer = place(&mut bf, ArchetypeId::Archer, Side::Right, 380);
        let far_mage = place(&mut bf, ArchetypeId::Mage, Side::Right, 480);
        let _out_of_reach = place(&mut bf, ArchetypeId::Cannon, Side::Right, 700);

        act(&mut bf, assassin);

        assert_eq!(bf.unit(far_mage).unwrap().health, 70 - 45);
        assert_eq!(bf.unit(near_archer).unwrap().health, 60);
        let unit = bf.unit(assassin).unwrap();
        assert!(unit.position.x < Fixed::from_num(480));
        assert!(unit.position.x > Fixed::from_num(450));
        assert!(matches!(bf.pending_events(), [VisualEvent::Teleport { .. }]));
    }

    #[test]
    fn falls_back_to_nearest_enemy_without_ranged_targets() {
        let mut bf = battlefield();
        let assassin = place(&mut bf, ArchetypeId::Assassin, Side::Left, 300);
        let near = place(&mut bf, ArchetypeId::Knight, Side::Right, 400);
        let far = place(&mut bf, ArchetypeId::Soldier, Side::Right, 450);

        act(&mut bf, assassin);

        assert_eq!(bf.unit(near).unwrap().health, 320 - 45);
        assert_eq!(bf.unit(far).unwrap().health, 100);
    }

    #[test]
    fn walks_in_melee_mode_while_dash_cools_down() {
        let mut bf = battlefield();
        let assassin = place(&mut bf, ArchetypeId::Assassin, Side::Left, 300);
        let archer = place(&mut bf, ArchetypeId::Archer, Side::Right, 400);

        act(&mut bf, assassin);
        let after_dash = bf.unit(archer).unwrap().health;
        assert_eq!(after_dash, 60 - 45);

        // Archer escapes out of melee range; a cooling assassin only walks.
        bf.registry.get_mut(archer).unwrap().position = Vec2Fixed::from_ints(500, 200);
        bf.now = 1;
        let before = bf.unit(assassin).unwrap().position;
        act(&mut bf, assassin);

        let unit = bf.unit(assassin).unwrap();
        assert_eq!(unit.action, UnitAction::Walk);
        assert!(unit.position.distance(before) <= Fixed::from_num(2.61));
        assert_eq!(bf.unit(archer).unwrap().health, after_dash);
    }

    #[test]
    fn nothing_in_observation_range_means_default_engagement() {
        let mut bf = battlefield();
        let assassin = place(&mut bf, ArchetypeId::Assassin, Side::Left, 100);
        let enemy = place(&mut bf, ArchetypeId::Archer, Side::Right, 800);

        act(&mut bf, assassin);

        assert_eq!(bf.unit(enemy).unwrap().health, 60);
        assert!(bf.pending_events().is_empty());
        assert_eq!(bf.unit(assassin).unwrap().action, UnitAction::Walk);
    }
}
