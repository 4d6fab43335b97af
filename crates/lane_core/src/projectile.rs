//! Projectile flight and impact resolution.
//!
//! A projectile resolves on the tick its remaining distance to the aim point
//! drops below one tick of travel. Tracking projectiles re-aim at their
//! target each tick while it lives and fly on to its last known position
//! once it dies.

use tracing::trace;

use crate::archetype::ArchetypeId;
use crate::battlefield::Battlefield;
use crate::combat::damage_unit;
use crate::components::{
    ImpactKind, Projectile, ProjectileAim, ProjectileId, Side, UnitId,
};
use crate::events::VisualEvent;
use crate::math::{Fixed, Vec2Fixed};
use crate::targeting::nearest_enemy_where;
use crate::victory::damage_base;

/// Hit tolerance for single-target shots from basic ranged units.
pub const SINGLE_TARGET_TOLERANCE: Fixed = Fixed::from_bits(20 << 32);

/// Parameters of a new projectile.
#[derive(Debug, Clone, Copy)]
pub struct Shot {
    /// Firing unit.
    pub owner: UnitId,
    /// Firing side.
    pub side: Side,
    /// Firing archetype.
    pub archetype: ArchetypeId,
    /// Launch point.
    pub origin: Vec2Fixed,
    /// Aim mode.
    pub aim: ProjectileAim,
    /// Travel per tick.
    pub speed: Fixed,
    /// Damage on impact.
    pub damage: i32,
    /// Impact kind.
    pub impact: ImpactKind,
    /// Hit tolerance around the impact point.
    pub hit_tolerance: Fixed,
}

/// Put a projectile in flight.
pub fn launch(bf: &mut Battlefield, shot: Shot) -> ProjectileId {
    let expires_at = bf.now.saturating_add(bf.config.projectile_lifetime);
    bf.registry.insert_projectile(Projectile {
        id: 0,
        origin: shot.origin,
        position: shot.origin,
        aim: shot.aim,
        speed: shot.speed,
        damage: shot.damage,
        impact: shot.impact,
        hit_tolerance: shot.hit_tolerance,
        side: shot.side,
        origin_archetype: shot.archetype,
        owner: shot.owner,
        expires_at,
    })
}

/// Advance every projectile one tick and resolve arrivals, in launch order.
///
/// Once the match is decided the remaining projectiles are left untouched.
pub fn advance_all(bf: &mut Battlefield) {
    let in_flight = bf.registry.take_projectiles();
    let mut survivors = Vec::with_capacity(in_flight.len());

    for mut projectile in in_flight {
        if bf.is_over() {
            survivors.push(projectile);
            continue;
        }
        if bf.now >= projectile.expires_at {
            trace!(projectile = projectile.id, "projectile expired");
            continue;
        }

        if let ProjectileAim::Tracking { target, last_known } = &mut projectile.aim {
            if let Some(unit) = bf.registry.get_alive(*target) {
                *last_known = unit.position;
            }
        }

        let aim_point = projectile.aim.point();
        if projectile.position.distance(aim_point) < projectile.speed {
            projectile.position = aim_point;
            resolve(bf, &projectile);
        } else {
            projectile.position = projectile.position.step_toward(aim_point, projectile.speed);
            survivors.push(projectile);
        }
    }

    bf.registry.restore_projectiles(survivors);
}

fn resolve(bf: &mut Battlefield, projectile: &Projectile) {
    let impact_point = projectile.position;
    match projectile.impact {
        ImpactKind::Blast { radius } => {
            let victims = enemies_within(bf, impact_point, projectile.side, radius);
            bf.push_event(VisualEvent::AreaBlast {
                position: impact_point,
                radius,
                archetype: projectile.origin_archetype,
            });
            if victims.is_empty() {
                base_fallback(bf, projectile);
            }
            for victim in victims {
                damage_unit(bf, victim, projectile.damage);
            }
        }
        ImpactKind::Single => {
            let tracked = match projectile.aim {
                ProjectileAim::Tracking { target, .. } => {
                    bf.registry.get_alive(target).map(|unit| unit.id)
                }
                _ => None,
            };
            let victim = tracked.or_else(|| {
                nearest_enemy_where(
                    bf,
                    impact_point,
                    projectile.side,
                    None,
                    |unit| {
                        impact_point.distance(unit.position) - bf.table.get(unit.archetype).size
                            <= projectile.hit_tolerance
                    },
                )
                .map(|candidate| candidate.id)
            });
            match victim {
                Some(victim) => {
                    damage_unit(bf, victim, projectile.damage);
                }
                None => base_fallback(bf, projectile),
            }
        }
    }
}

/// Living enemies of `side` whose body overlaps the circle, in id order.
fn enemies_within(bf: &Battlefield, center: Vec2Fixed, side: Side, radius: Fixed) -> Vec<UnitId> {
    bf.registry
        .sorted_units()
        .into_iter()
        .filter(|unit| unit.side != side && unit.is_alive())
        .filter(|unit| center.distance(unit.position) - bf.spec_of(unit).size <= radius)
        .map(|unit| unit.id)
        .collect()
}

/// Damage the targeted base when nothing else was hit and the impact landed
/// within its radius.
fn base_fallback(bf: &mut Battlefield, projectile: &Projectile) {
    let ProjectileAim::Base { side, .. } = projectile.aim else {
        return;
    };
    let base = bf.base(side);
    if projectile.position.distance(base.position) <= base.radius {
        damage_base(bf, side, projectile.damage);
    }
}
