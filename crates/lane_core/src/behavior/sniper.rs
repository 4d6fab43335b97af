//! Sniper channel/aim machine.
//!
//! ```text
//! COOLDOWN --(interval elapsed)--> SEARCH --(target found)--> AIMING
//!    ^                                ^                          |
//!    |                                +---(target died/stun)-----+
//!    +-----------------------(channel complete, fire)------------+
//! ```

use tracing::trace;

use crate::archetype::ArchetypeSpec;
use crate::battlefield::Battlefield;
use crate::components::{
    AimTarget, ImpactKind, ProjectileAim, SniperPhase, Tick, UnitAction, UnitId, UnitState,
};
use crate::math::Fixed;
use crate::projectile::{self, Shot};
use crate::targeting::{
    advance_along_lane, enemy_base_in_range, move_toward, nearest_enemy, nearest_enemy_where,
};

/// Channel parameters.
#[derive(Debug, Clone, Copy)]
pub struct Channel {
    /// Channel duration.
    pub aim_ticks: Tick,
    /// Shot travel per tick.
    pub projectile_speed: Fixed,
    /// Hit tolerance at the impact point.
    pub hit_tolerance: Fixed,
}

/// Run a sniper turn.
pub fn run(bf: &mut Battlefield, id: UnitId, spec: &ArchetypeSpec, channel: Channel) {
    let now = bf.now;
    let Some(unit) = bf.registry.get(id) else {
        return;
    };
    let UnitState::Sniper { phase, last_target } = unit.state else {
        return;
    };

    match phase {
        SniperPhase::Cooldown { until } if now < until => set_action(bf, id, UnitAction::Idle),
        SniperPhase::Cooldown { .. } | SniperPhase::Search => {
            search(bf, id, spec, last_target);
        }
        SniperPhase::Aiming { started_at, target } => {
            if !target_alive(bf, target) {
                trace!(tick = now, unit = id, "aim target lost");
                set_phase(bf, id, SniperPhase::Search);
                search(bf, id, spec, last_target);
                return;
            }
            if now.saturating_sub(started_at) >= channel.aim_ticks {
                fire(bf, id, spec, channel, target);
            } else {
                set_action(bf, id, UnitAction::Attack);
            }
        }
    }
}

fn target_alive(bf: &Battlefield, target: AimTarget) -> bool {
    match target {
        AimTarget::Unit(unit) => bf.registry.get_alive(unit).is_some(),
        AimTarget::Base(_) => !bf.is_over(),
    }
}

/// Lock onto the nearest enemy in range, avoiding the previous victim when
/// another enemy is in range, else the base. Walk when nothing is in range.
fn search(bf: &mut Battlefield, id: UnitId, spec: &ArchetypeSpec, last_target: Option<UnitId>) {
    let now = bf.now;
    let Some(unit) = bf.registry.get(id) else {
        return;
    };
    let (side, position) = (unit.side, unit.position);

    let in_range = |bf: &Battlefield, avoid: Option<UnitId>| {
        nearest_enemy_where(bf, position, side, None, |enemy| {
            Some(enemy.id) != avoid
                && position.distance(enemy.position) - bf.spec_of(enemy).size <= spec.range
        })
    };
    let view: &Battlefield = bf;
    let locked = in_range(view, last_target)
        .or_else(|| in_range(view, None))
        .map(|candidate| AimTarget::Unit(candidate.id))
        .or_else(|| {
            enemy_base_in_range(view, position, side, spec.range)
                .then_some(AimTarget::Base(side.opponent()))
        });

    if let Some(target) = locked {
        set_phase(
            bf,
            id,
            SniperPhase::Aiming {
                started_at: now,
                target,
            },
        );
        set_action(bf, id, UnitAction::Attack);
        return;
    }

    match nearest_enemy(bf, position, side) {
        Some(enemy) => {
            let gap = enemy.distance - bf.size_of(enemy.id) - spec.range;
            move_toward(bf, id, enemy.position, spec.speed.min(gap));
        }
        None => advance_along_lane(bf, id, spec.speed),
    }
}

fn fire(bf: &mut Battlefield, id: UnitId, spec: &ArchetypeSpec, channel: Channel, target: AimTarget) {
    let now = bf.now;
    let aim = match target {
        AimTarget::Unit(victim) => match bf.registry.get_alive(victim) {
            Some(unit) => ProjectileAim::Point(unit.position),
            None => return,
        },
        AimTarget::Base(side) => ProjectileAim::Base {
            side,
            point: bf.base(side).position,
        },
    };
    let Some(unit) = bf.registry.get_mut(id) else {
        return;
    };
    let (side, origin) = (unit.side, unit.position);
    unit.last_attack = Some(now);
    unit.action = UnitAction::Attack;
    unit.state = UnitState::Sniper {
        phase: SniperPhase::Cooldown {
            until: now.saturating_add(spec.attack_interval),
        },
        last_target: match target {
            AimTarget::Unit(victim) => Some(victim),
            AimTarget::Base(_) => None,
        },
    };

    projectile::launch(
        bf,
        Shot {
            owner: id,
            side,
            archetype: spec.id,
            origin,
            aim,
            speed: channel.projectile_speed,
            damage: spec.damage,
            impact: ImpactKind::Single,
            hit_tolerance: channel.hit_tolerance,
        },
    );
}

fn set_phase(bf: &mut Battlefield, id: UnitId, next: SniperPhase) {
    if let Some(unit) = bf.registry.get_mut(id) {
        if let UnitState::Sniper { phase, .. } = &mut unit.state {
            *phase = next;
        }
    }
}

fn set_action(bf: &mut Battlefield, id: UnitId, action: UnitAction) {
    if let Some(unit) = bf.registry.get_mut(id) {
        unit.action = action;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::{ArchetypeId, ArchetypeTable};
    use crate::behavior::act;
    use crate::components::{Side, Unit};
    use crate::config::MatchConfig;
    use crate::math::Vec2Fixed;

    const AIM_TICKS: Tick = 30;

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

    fn phase(bf: &Battlefield, id: UnitId) -> SniperPhase {
        match bf.unit(id).map(|u| u.state) {
            Some(UnitState::Sniper { phase, .. }) => phase,
            other => panic!("not a sniper: {other:?}"),
        }
    }

    fn run_until(bf: &mut Battlefield, id: UnitId, tick: Tick) {
        while bf.now < tick {
            bf.now += 1;
            act(bf, id);
        }
    }

    #[test]
    fn locks_channels_then_fires_once() {
        let mut bf = battlefield();
        let sniper = place(&mut bf, ArchetypeId::Sniper, Side::Left, 200);
        let target = place(&mut bf, ArchetypeId::Knight, Side::Right, 400);

        act(&mut bf, sniper);
        assert_eq!(
            phase(&bf, sniper),
            SniperPhase::Aiming {
                started_at: 0,
                target: AimTarget::Unit(target)
            }
        );
        assert_eq!(bf.unit(sniper).unwrap().aim_target(), Some(AimTarget::Unit(target)));

        run_until(&mut bf, sniper, AIM_TICKS - 1);
        assert!(bf.projectiles().is_empty());

        run_until(&mut bf, sniper, AIM_TICKS);
        assert_eq!(bf.projectiles().len(), 1);
        assert!(matches!(
            bf.projectiles()[0].aim,
            ProjectileAim::Point(point) if point == Vec2Fixed::from_ints(400, 200)
        ));
        assert!(matches!(phase(&bf, sniper), SniperPhase::Cooldown { until } if until == AIM_TICKS + 60));
    }

    #[test]
    fn target_death_aborts_without_firing() {
        let mut bf = battlefield();
        let sniper = place(&mut bf, ArchetypeId::Sniper, Side::Left, 200);
        let target = place(&mut bf, ArchetypeId::Soldier, Side::Right, 400);

        act(&mut bf, sniper);
        run_until(&mut bf, sniper, 10);
        bf.registry.get_mut(target).unwrap().health = 0;
        run_until(&mut bf, sniper, 11);

        assert!(bf.projectiles().is_empty());
        assert_eq!(phase(&bf, sniper), SniperPhase::Search);
        assert_eq!(bf.unit(sniper).unwrap().aim_target(), None);
    }

    #[test]
    fn abort_relocks_immediately_when_another_target_is_in_range() {
        let mut bf = battlefield();
        let sniper = place(&mut bf, ArchetypeId::Sniper, Side::Left, 200);
        let first = place(&mut bf, ArchetypeId::Soldier, Side::Right, 300);
        let second = place(&mut bf, ArchetypeId::Soldier, Side::Right, 420);

        act(&mut bf, sniper);
        assert_eq!(bf.unit(sniper).unwrap().aim_target(), Some(AimTarget::Unit(first)));

        bf.registry.get_mut(first).unwrap().health = -1;
        run_until(&mut bf, sniper, 1);
        assert_eq!(
            phase(&bf, sniper),
            SniperPhase::Aiming {
                started_at: 1,
                target: AimTarget::Unit(second)
            }
        );
    }

    #[test]
    fn prefers_a_different_target_after_firing() {
        let mut bf = battlefield();
        let sniper = place(&mut bf, ArchetypeId::Sniper, Side::Left, 200);
        let near = place(&mut bf, ArchetypeId::Knight, Side::Right, 300);
        let other = place(&mut bf, ArchetypeId::Knight, Side::Right, 450);

        act(&mut bf, sniper);
        run_until(&mut bf, sniper, AIM_TICKS);
        assert_eq!(bf.projectiles().len(), 1);

        run_until(&mut bf, sniper, AIM_TICKS + 60);
        assert_eq!(bf.unit(sniper).unwrap().aim_target(), Some(AimTarget::Unit(other)));
        assert_ne!(other, near);
    }

    #[test]
    fn aims_at_base_when_no_unit_is_in_range() {
        let mut bf = battlefield();
        let sniper = place(&mut bf, ArchetypeId::Sniper, Side::Left, 700);

        act(&mut bf, sniper);
        assert_eq!(
            bf.unit(sniper).unwrap().aim_target(),
            Some(AimTarget::Base(Side::Right))
        );
    }

    #[test]
    fn walks_when_nothing_is_in_range() {
        let mut bf = battlefield();
        let sniper = place(&mut bf, ArchetypeId::Sniper, Side::Left, 100);

        act(&mut bf, sniper);
        let unit = bf.unit(sniper).unwrap();
        assert_eq!(unit.action, UnitAction::Walk);
        assert_eq!(phase(&bf, sniper), SniperPhase::Search);
    }
}
