//! Target selection, range checks and movement.
//!
//! Target scans walk units in ascending id order and only a strictly closer
//! candidate replaces the current best, so ties always go to the lowest id.
//! Ranges are edge to edge: the target's body radius (or the base radius) is
//! subtracted from the center distance.

use crate::battlefield::Battlefield;
use crate::components::{Side, UnitAction, UnitId};
use crate::math::{Fixed, Vec2Fixed};

/// A chosen enemy and its center distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// Enemy unit id.
    pub id: UnitId,
    /// Enemy position.
    pub position: Vec2Fixed,
    /// Center-to-center distance.
    pub distance: Fixed,
}

/// Nearest living enemy of `side`, optionally limited to `within` center
/// distance and filtered by `accept`.
pub fn nearest_enemy_where(
    bf: &Battlefield,
    from: Vec2Fixed,
    side: Side,
    within: Option<Fixed>,
    mut accept: impl FnMut(&crate::components::Unit) -> bool,
) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;
    for unit in bf.registry.ids().iter().filter_map(|&id| bf.registry.get(id)) {
        if unit.side == side || !unit.is_alive() || !accept(unit) {
            continue;
        }
        let distance = from.distance(unit.position);
        if within.is_some_and(|limit| distance > limit) {
            continue;
        }
        if best.map_or(true, |b| distance < b.distance) {
            best = Some(Candidate {
                id: unit.id,
                position: unit.position,
                distance,
            });
        }
    }
    best
}

/// Nearest living enemy of `side` anywhere on the field.
pub fn nearest_enemy(bf: &Battlefield, from: Vec2Fixed, side: Side) -> Option<Candidate> {
    nearest_enemy_where(bf, from, side, None, |_| true)
}

/// Whether `target` is within `range` of `from`, edge to edge.
pub fn unit_in_range(bf: &Battlefield, from: Vec2Fixed, range: Fixed, target: UnitId) -> bool {
    bf.registry.get_alive(target).is_some_and(|unit| {
        from.distance(unit.position) - bf.size_of(target) <= range
    })
}

/// Whether the base opposing `side` is within `range` of `from`.
pub fn enemy_base_in_range(bf: &Battlefield, from: Vec2Fixed, side: Side, range: Fixed) -> bool {
    let base = bf.base(side.opponent());
    from.distance(base.position) - base.radius <= range
}

/// Move a unit up to `step` toward `target`, clamped to the field.
pub fn move_toward(bf: &mut Battlefield, id: UnitId, target: Vec2Fixed, step: Fixed) {
    let field_min = bf.config.field_min();
    let field_max = bf.config.field_max();
    if let Some(unit) = bf.registry.get_mut(id) {
        unit.position = unit
            .position
            .step_toward(target, step)
            .clamp(field_min, field_max);
        unit.action = UnitAction::Walk;
    }
}

/// Advance a unit along the lane toward the enemy base, drifting back to the
/// lane center by a tenth of its offset per step.
pub fn advance_along_lane(bf: &mut Battlefield, id: UnitId, step: Fixed) {
    let center_y = bf.config.lane_center_y;
    let field_min = bf.config.field_min();
    let field_max = bf.config.field_max();
    let Some(unit) = bf.registry.get(id) else {
        return;
    };
    let base_x = bf.base(unit.side.opponent()).position.x;
    let side = unit.side;

    let Some(unit) = bf.registry.get_mut(id) else {
        return;
    };
    let remaining_x = (base_x - unit.position.x).abs();
    let dx = step.min(remaining_x) * side.facing();
    let dy = ((center_y - unit.position.y) / Fixed::from_num(10)).clamp(-step, step);

    unit.position = (unit.position + Vec2Fixed::new(dx, dy)).clamp(field_min, field_max);
    unit.action = UnitAction::Walk;
}
