//! Damage application, stuns and knockback.
//!
//! Every source of unit damage (melee swings, projectiles, blasts, dash
//! strikes) ends in [`damage_unit`], so the warden shield is checked in
//! exactly one place.

use tracing::debug;

use crate::archetype::Behavior;
use crate::battlefield::Battlefield;
use crate::components::{ShieldState, Side, SniperPhase, UnitAction, UnitId, UnitState};
use crate::events::VisualEvent;
use crate::math::{Fixed, Vec2Fixed};

/// Result of a damage instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Health reduced, unit survives.
    Hit,
    /// Health reduced to zero or below by this hit.
    Killed,
    /// A shield or invulnerability window ate the hit.
    Absorbed,
    /// Target gone or already dead.
    Missed,
}

/// Apply `amount` damage to a unit, honoring shields.
pub fn damage_unit(bf: &mut Battlefield, target: UnitId, amount: i32) -> DamageOutcome {
    let now = bf.now;
    let Some(unit) = bf.registry.get_mut(target) else {
        return DamageOutcome::Missed;
    };
    if !unit.is_alive() {
        return DamageOutcome::Missed;
    }

    if let UnitState::Warden { shield } = &mut unit.state {
        match *shield {
            ShieldState::Intact => {
                let spec = *bf.table.get(unit.archetype);
                let Behavior::ShieldedCaster {
                    invulnerable_ticks,
                    stun_radius,
                    stun_ticks,
                    knockback,
                    ..
                } = spec.behavior
                else {
                    return apply(bf, target, amount);
                };
                *shield = ShieldState::Invulnerable {
                    until: now.saturating_add(invulnerable_ticks),
                };
                let (side, position) = (unit.side, unit.position);
                debug!(tick = now, unit = target, "shield absorbed hit");
                bf.push_event(VisualEvent::ShieldBlock {
                    unit: target,
                    position,
                    radius: stun_radius,
                });
                stun_burst(bf, position, side, stun_radius, stun_ticks, knockback);
                return DamageOutcome::Absorbed;
            }
            ShieldState::Invulnerable { until } if now < until => {
                return DamageOutcome::Absorbed;
            }
            ShieldState::Invulnerable { .. } => *shield = ShieldState::Spent,
            ShieldState::Spent => {}
        }
    }

    apply(bf, target, amount)
}

fn apply(bf: &mut Battlefield, target: UnitId, amount: i32) -> DamageOutcome {
    let Some(unit) = bf.registry.get_mut(target) else {
        return DamageOutcome::Missed;
    };
    unit.health = unit.health.saturating_sub(amount.max(0));
    if unit.is_alive() {
        return DamageOutcome::Hit;
    }

    let side = unit.side;
    let archetype = unit.archetype;
    bf.stats.side_mut(side).units_lost += 1;
    debug!(tick = bf.now, unit = target, %archetype, %side, "unit killed");
    DamageOutcome::Killed
}

/// Stun every living enemy of `source_side` within `radius` of `center` and
/// push each one `knockback` units directly away from it.
///
/// A stunned sniper loses its channel and a stunned juggernaut its charge.
pub fn stun_burst(
    bf: &mut Battlefield,
    center: Vec2Fixed,
    source_side: Side,
    radius: Fixed,
    stun_ticks: u64,
    knockback: Fixed,
) -> Vec<UnitId> {
    let stun_until = bf.now.saturating_add(stun_ticks);
    let radius_sq = radius.saturating_mul(radius);
    let victims: Vec<UnitId> = bf
        .registry
        .sorted_units()
        .into_iter()
        .filter(|u| u.side != source_side && u.is_alive())
        .filter(|u| u.position.distance_squared(center) <= radius_sq)
        .map(|u| u.id)
        .collect();

    let field_min = bf.config.field_min();
    let field_max = bf.config.field_max();
    for &id in &victims {
        let Some(unit) = bf.registry.get_mut(id) else {
            continue;
        };
        let mut away = (unit.position - center).normalize();
        if away == Vec2Fixed::ZERO {
            away = Vec2Fixed::new(source_side.facing(), Fixed::ZERO);
        }
        unit.position = (unit.position + away.scale(knockback)).clamp(field_min, field_max);
        unit.stunned_until = unit.stunned_until.max(stun_until);
        unit.action = UnitAction::Stunned;

        match &mut unit.state {
            UnitState::Sniper { phase, .. } if matches!(phase, SniperPhase::Aiming { .. }) => {
                *phase = SniperPhase::Search;
            }
            UnitState::Juggernaut { charging, .. } => *charging = false,
            _ => {}
        }
    }
    victims
}

/// Restore up to `amount` health, capped at the archetype maximum.
pub fn heal_unit(bf: &mut Battlefield, target: UnitId, amount: i32) {
    let Some(unit) = bf.registry.get_mut(target) else {
        return;
    };
    if !unit.is_alive() {
        return;
    }
    let max = bf.table.get(unit.archetype).health;
    unit.health = unit.health.saturating_add(amount).min(max);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::{ArchetypeId, ArchetypeTable};
    use crate::components::Unit;
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
    fn damage_kills_at_zero() {
        let mut bf = battlefield();
        let soldier = place(&mut bf, ArchetypeId::Soldier, Side::Left, 300);

        assert_eq!(damage_unit(&mut bf, soldier, 60), DamageOutcome::Hit);
        assert_eq!(damage_unit(&mut bf, soldier, 40), DamageOutcome::Killed);
        assert_eq!(damage_unit(&mut bf, soldier, 40), DamageOutcome::Missed);
        assert_eq!(bf.unit(soldier).map(|u| u.health), Some(0));
        assert_eq!(bf.stats().left.units_lost, 1);
    }

    #[test]
    fn shield_absorbs_first_hit_then_window_then_damage() {
        let mut bf = battlefield();
        let warden = place(&mut bf, ArchetypeId::Warden, Side::Left, 300);
        let enemy = place(&mut bf, ArchetypeId::Soldier, Side::Right, 320);
        let far_enemy = place(&mut bf, ArchetypeId::Soldier, Side::Right, 600);

        bf.now = 10;
        assert_eq!(damage_unit(&mut bf, warden, 50), DamageOutcome::Absorbed);
        assert_eq!(bf.unit(warden).map(|u| u.health), Some(90));
        assert_eq!(bf.pending_events().len(), 1);

        let stunned = bf.unit(enemy).cloned().unwrap();
        assert!(stunned.is_stunned(11));
        assert!(stunned.position.x > Fixed::from_num(320));
        assert!(!bf.unit(far_enemy).unwrap().is_stunned(11));

        bf.now = 30;
        assert_eq!(damage_unit(&mut bf, warden, 50), DamageOutcome::Absorbed);
        assert_eq!(bf.pending_events().len(), 1, "burst only on first absorption");

        bf.now = 50;
        assert_eq!(damage_unit(&mut bf, warden, 50), DamageOutcome::Hit);
        assert_eq!(bf.unit(warden).map(|u| u.health), Some(40));
        assert!(matches!(
            bf.unit(warden).map(|u| u.state),
            Some(UnitState::Warden {
                shield: ShieldState::Spent
            })
        ));
    }

    #[test]
    fn burst_aborts_sniper_channel() {
        let mut bf = battlefield();
        let sniper = place(&mut bf, ArchetypeId::Sniper, Side::Right, 310);
        if let Some(unit) = bf.registry.get_mut(sniper) {
            unit.state = UnitState::Sniper {
                phase: SniperPhase::Aiming {
                    started_at: 0,
                    target: crate::components::AimTarget::Base(Side::Left),
                },
                last_target: None,
            };
        }

        stun_burst(
            &mut bf,
            Vec2Fixed::from_ints(300, 200),
            Side::Left,
            Fixed::from_num(50),
            20,
            Fixed::from_num(10),
        );

        let unit = bf.unit(sniper).unwrap();
        assert_eq!(unit.aim_target(), None);
        assert_eq!(unit.stunned_until, 20);
    }

    #[test]
    fn knockback_is_clamped_to_field() {
        let mut bf = battlefield();
        let soldier = place(&mut bf, ArchetypeId::Soldier, Side::Right, 995);
        stun_burst(
            &mut bf,
            Vec2Fixed::from_ints(990, 200),
            Side::Left,
            Fixed::from_num(50),
            5,
            Fixed::from_num(30),
        );
        assert_eq!(
            bf.unit(soldier).map(|u| u.position.x),
            Some(Fixed::from_num(1000))
        );
    }

    #[test]
    fn heal_caps_at_archetype_health() {
        let mut bf = battlefield();
        let knight = place(&mut bf, ArchetypeId::Knight, Side::Left, 200);
        damage_unit(&mut bf, knight, 10);
        heal_unit(&mut bf, knight, 15);
        assert_eq!(bf.unit(knight).map(|u| u.health), Some(320));
    }

    #[test]
    fn extreme_amounts_saturate() {
        let mut bf = battlefield();
        let knight = place(&mut bf, ArchetypeId::Knight, Side::Left, 200);
        let soldier = place(&mut bf, ArchetypeId::Soldier, Side::Right, 220);

        damage_unit(&mut bf, knight, 10);
        heal_unit(&mut bf, knight, i32::MAX);
        assert_eq!(bf.unit(knight).map(|u| u.health), Some(320));

        bf.now = 10;
        stun_burst(
            &mut bf,
            Vec2Fixed::from_ints(200, 200),
            Side::Left,
            Fixed::from_num(50),
            u64::MAX,
            Fixed::ZERO,
        );
        assert_eq!(bf.unit(soldier).map(|u| u.stunned_until), Some(u64::MAX));

        assert_eq!(damage_unit(&mut bf, soldier, i32::MAX), DamageOutcome::Killed);
        assert!(bf.unit(soldier).is_some_and(|u| u.health < 0));
    }
}
