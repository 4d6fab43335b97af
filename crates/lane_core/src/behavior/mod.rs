//! Per-unit behavior machines.
//!
//! Every archetype starts from the default engagement in [`engage`]; the
//! specialized machines wrap or replace it:
//!
//! | Behavior | Module |
//! |----------|--------|
//! | melee, ranged, area, shielded caster | [`engage`] |
//! | support | [`support`] |
//! | dash-strike | [`assassin`] |
//! | channel/aim | [`sniper`] |
//! | charge | [`juggernaut`] |
//!
//! The shielded caster needs no machine of its own: its shield lives in
//! [`crate::combat::damage_unit`].

pub mod assassin;
pub mod engage;
pub mod juggernaut;
pub mod sniper;
pub mod support;

use crate::archetype::Behavior;
use crate::battlefield::Battlefield;
use crate::components::{UnitAction, UnitId};

/// Run one unit's turn.
///
/// Dead units (killed earlier in this pass) do nothing. Stunned units skip
/// the whole turn.
pub fn act(bf: &mut Battlefield, id: UnitId) {
    let now = bf.now;
    let Some(unit) = bf.registry.get_mut(id) else {
        return;
    };
    if !unit.is_alive() {
        return;
    }
    if unit.is_stunned(now) {
        unit.action = UnitAction::Stunned;
        return;
    }

    let spec = *bf.table.get(unit.archetype);
    match spec.behavior {
        Behavior::Melee
        | Behavior::Ranged { .. }
        | Behavior::Area { .. }
        | Behavior::ShieldedCaster { .. } => engage::engage(bf, id, &spec),
        Behavior::Support {
            heal_radius,
            heal_amount,
        } => support::run(bf, id, &spec, heal_radius, heal_amount),
        Behavior::DashStrike {
            observe_radius,
            strike_damage,
            dash_cooldown,
        } => assassin::run(
            bf,
            id,
            &spec,
            assassin::Dash {
                observe_radius,
                strike_damage,
                cooldown: dash_cooldown,
            },
        ),
        Behavior::Channel {
            aim_ticks,
            projectile_speed,
            hit_tolerance,
        } => sniper::run(
            bf,
            id,
            &spec,
            sniper::Channel {
                aim_ticks,
                projectile_speed,
                hit_tolerance,
            },
        ),
        Behavior::Charge {
            charge_speed,
            trigger_radius,
            stun_radius,
            stun_ticks,
            knockback,
            charge_cooldown,
        } => juggernaut::run(
            bf,
            id,
            &spec,
            juggernaut::Charge {
                speed: charge_speed,
                trigger_radius,
                stun_radius,
                stun_ticks,
                knockback,
                cooldown: charge_cooldown,
            },
        ),
    }
}
