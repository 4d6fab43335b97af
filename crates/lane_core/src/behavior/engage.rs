//! Default engagement: base first, then nearest enemy, then lane advance.

use crate::archetype::{ArchetypeSpec, AttackDelivery};
use crate::battlefield::Battlefield;
use crate::combat::damage_unit;
use crate::components::{AimTarget, ImpactKind, ProjectileAim, UnitAction, UnitId};
use crate::projectile::{self, Shot, SINGLE_TARGET_TOLERANCE};
use crate::targeting::{
    advance_along_lane, enemy_base_in_range, move_toward, nearest_enemy, unit_in_range,
};
use crate::victory::damage_base;

/// Default per-tick engagement.
///
/// A unit already within striking range of the enemy base keeps hitting the
/// base even when an enemy unit is closer.
pub fn engage(bf: &mut Battlefield, id: UnitId, spec: &ArchetypeSpec) {
    let Some(unit) = bf.registry.get(id) else {
        return;
    };
    let (side, position) = (unit.side, unit.position);

    if enemy_base_in_range(bf, position, side, spec.range) {
        try_attack(bf, id, spec, AimTarget::Base(side.opponent()));
        return;
    }

    match nearest_enemy(bf, position, side) {
        Some(target) if unit_in_range(bf, position, spec.range, target.id) => {
            try_attack(bf, id, spec, AimTarget::Unit(target.id));
        }
        Some(target) => {
            let gap = target.distance - bf.size_of(target.id) - spec.range;
            move_toward(bf, id, target.position, spec.speed.min(gap));
        }
        None => advance_along_lane(bf, id, spec.speed),
    }
}

/// Attack `target` if the cadence allows. The unit shows the attack action
/// either way.
pub fn try_attack(bf: &mut Battlefield, id: UnitId, spec: &ArchetypeSpec, target: AimTarget) {
    let now = bf.now;
    let Some(unit) = bf.registry.get_mut(id) else {
        return;
    };
    unit.action = UnitAction::Attack;
    if !unit.attack_ready(now, spec.attack_interval) {
        return;
    }
    unit.last_attack = Some(now);
    deliver(bf, id, spec, target);
}

/// Deliver one attack: instant damage for melee, a projectile otherwise.
pub fn deliver(bf: &mut Battlefield, owner: UnitId, spec: &ArchetypeSpec, target: AimTarget) {
    match spec.behavior.delivery() {
        AttackDelivery::Instant => match target {
            AimTarget::Unit(victim) => {
                damage_unit(bf, victim, spec.damage);
            }
            AimTarget::Base(side) => {
                damage_base(bf, side, spec.damage);
            }
        },
        AttackDelivery::Projectile {
            speed,
            blast_radius,
        } => {
            let Some(shooter) = bf.registry.get(owner) else {
                return;
            };
            let (origin, side) = (shooter.position, shooter.side);
            let aim = match target {
                AimTarget::Unit(victim) => {
                    let Some(victim_unit) = bf.registry.get_alive(victim) else {
                        return;
                    };
                    ProjectileAim::Tracking {
                        target: victim,
                        last_known: victim_unit.position,
                    }
                }
                AimTarget::Base(base_side) => ProjectileAim::Base {
                    side: base_side,
                    point: bf.base(base_side).position,
                },
            };
            let impact = blast_radius.map_or(ImpactKind::Single, |radius| ImpactKind::Blast {
                radius,
            });
            projectile::launch(
                bf,
                Shot {
                    owner,
                    side,
                    archetype: spec.id,
                    origin,
                    aim,
                    speed,
                    damage: spec.damage,
                    impact,
                    hit_tolerance: SINGLE_TARGET_TOLERANCE,
                },
            );
        }
    }
}
