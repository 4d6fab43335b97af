//! Per-match tunables: field geometry, bases, human economy, spawn placement.

use serde::{Deserialize, Serialize};

use crate::components::{Side, Tick};
use crate::error::{GameError, Result};
use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Match configuration.
///
/// Loaded from RON by the server (`MATCH_CONFIG_PATH`) or built with
/// [`MatchConfig::default`]. Fixed-point fields are stored as raw bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Field width (lane axis).
    #[serde(with = "fixed_serde")]
    pub field_width: Fixed,
    /// Field height.
    #[serde(with = "fixed_serde")]
    pub field_height: Fixed,
    /// Y coordinate of the lane center.
    #[serde(with = "fixed_serde")]
    pub lane_center_y: Fixed,
    /// Distance of each base center from its end of the field.
    #[serde(with = "fixed_serde")]
    pub base_inset: Fixed,
    /// Base strike radius.
    #[serde(with = "fixed_serde")]
    pub base_radius: Fixed,
    /// Starting base health.
    pub base_health: i32,
    /// Resource a human starts with.
    #[serde(with = "fixed_serde")]
    pub starting_resource: Fixed,
    /// Resource ceiling for every player.
    #[serde(with = "fixed_serde")]
    pub resource_capacity: Fixed,
    /// Human regeneration per tick.
    #[serde(with = "fixed_serde")]
    pub human_regen_per_tick: Fixed,
    /// Gap between the base edge and the spawn line.
    #[serde(with = "fixed_serde")]
    pub spawn_gap: Fixed,
    /// Extra x offset between consecutive units of one batch.
    #[serde(with = "fixed_serde")]
    pub spawn_stagger: Fixed,
    /// Maximum lateral offset from the lane center at spawn.
    pub spawn_jitter: i32,
    /// Ticks a projectile may fly before it expires.
    pub projectile_lifetime: Tick,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            field_width: Fixed::from_num(1000),
            field_height: Fixed::from_num(400),
            lane_center_y: Fixed::from_num(200),
            base_inset: Fixed::from_num(60),
            base_radius: Fixed::from_num(40),
            base_health: 1000,
            starting_resource: Fixed::from_num(50),
            resource_capacity: Fixed::from_num(100),
            human_regen_per_tick: Fixed::from_num(0.25),
            spawn_gap: Fixed::from_num(20),
            spawn_stagger: Fixed::from_num(12),
            spawn_jitter: 60,
            projectile_lifetime: 200,
        }
    }
}

impl MatchConfig {
    /// Parse a config from RON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] for malformed RON and
    /// [`GameError::InvalidState`] for impossible geometry.
    pub fn from_ron_str(source: &str, label: &str) -> Result<Self> {
        let config: Self = ron::from_str(source).map_err(|e| GameError::DataParseError {
            path: label.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the geometry leaves room for a lane.
    ///
    /// # Errors
    ///
    /// Fails when the bases overlap or sit outside the field, or when the
    /// economy has a non-positive capacity.
    pub fn validate(&self) -> Result<()> {
        let two = Fixed::from_num(2);
        if self.field_width <= Fixed::ZERO || self.field_height <= Fixed::ZERO {
            return Err(GameError::InvalidState("field must have positive size".into()));
        }
        if self.base_inset * two >= self.field_width {
            return Err(GameError::InvalidState("bases overlap".into()));
        }
        if self.lane_center_y < Fixed::ZERO || self.lane_center_y > self.field_height {
            return Err(GameError::InvalidState("lane center outside field".into()));
        }
        if self.base_health <= 0 || self.resource_capacity <= Fixed::ZERO {
            return Err(GameError::InvalidState(
                "base health and resource capacity must be positive".into(),
            ));
        }
        if self.starting_resource > self.resource_capacity {
            return Err(GameError::InvalidState(
                "starting resource exceeds capacity".into(),
            ));
        }
        Ok(())
    }

    /// Base center for a side.
    #[must_use]
    pub fn base_position(&self, side: Side) -> Vec2Fixed {
        let x = match side {
            Side::Left => self.base_inset,
            Side::Right => self.field_width - self.base_inset,
        };
        Vec2Fixed::new(x, self.lane_center_y)
    }

    /// Lower-left corner of the field.
    #[must_use]
    pub const fn field_min(&self) -> Vec2Fixed {
        Vec2Fixed::ZERO
    }

    /// Upper-right corner of the field.
    #[must_use]
    pub const fn field_max(&self) -> Vec2Fixed {
        Vec2Fixed::new(self.field_width, self.field_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_geometry() {
        let config = MatchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.base_position(Side::Left), Vec2Fixed::from_ints(60, 200));
        assert_eq!(config.base_position(Side::Right), Vec2Fixed::from_ints(940, 200));
    }

    #[test]
    fn partial_ron_uses_defaults() {
        let config = MatchConfig::from_ron_str("(base_health: 250)", "inline").unwrap();
        assert_eq!(config.base_health, 250);
        assert_eq!(config.field_width, Fixed::from_num(1000));
    }

    #[test]
    fn overlapping_bases_are_rejected() {
        let config = MatchConfig {
            base_inset: Fixed::from_num(600),
            ..MatchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn starting_resource_over_capacity_is_rejected() {
        let config = MatchConfig {
            starting_resource: Fixed::from_num(500),
            ..MatchConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
