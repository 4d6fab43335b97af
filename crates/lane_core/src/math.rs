//! Fixed-point math utilities for deterministic simulation.
//!
//! All battle simulation uses fixed-point arithmetic so that two servers fed
//! the same requests and seed produce bit-identical matches. Floats only
//! appear when a snapshot is converted for clients.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Scalar used by every simulation quantity: 32 integer bits, 32 fraction bits.
pub type Fixed = I32F32;

/// Point or direction on the battlefield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate (lane axis).
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate (across the lane).
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// `#[serde(with = "fixed_serde")]` helpers storing a [`Fixed`] as its raw
/// `i64` bits, so a value survives any format unchanged.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Write the raw bits.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Read the raw bits back.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        i64::deserialize(deserializer).map(Fixed::from_bits)
    }
}

impl Vec2Fixed {
    /// Vector from components.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from integer coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Squared distance, for comparisons that need no root.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        (self - other).dot(self - other)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        fixed_sqrt(self.distance_squared(other))
    }

    /// Dot product, saturating at the numeric bounds.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x
            .saturating_mul(other.x)
            .saturating_add(self.y.saturating_mul(other.y))
    }

    /// Vector length.
    #[must_use]
    pub fn length(self) -> Fixed {
        fixed_sqrt(self.dot(self))
    }

    /// Multiply both components by a scalar.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Unit-length direction, or zero for the zero vector.
    #[must_use]
    pub fn normalize(self) -> Self {
        match self.length() {
            len if len == Fixed::ZERO => Self::ZERO,
            len => Self::new(self.x / len, self.y / len),
        }
    }

    /// Move from `self` toward `target` by at most `step`, never overshooting.
    #[must_use]
    pub fn step_toward(self, target: Self, step: Fixed) -> Self {
        let remaining = self.distance(target);
        if remaining <= step {
            return target;
        }
        self + (target - self).normalize().scale(step)
    }

    /// Clamp both components into the given rectangle.
    #[must_use]
    pub fn clamp(self, min: Self, max: Self) -> Self {
        Self::new(self.x.clamp(min.x, max.x), self.y.clamp(min.y, max.y))
    }

    /// Convert to floats for client-facing output.
    #[must_use]
    pub fn to_f32_pair(self) -> (f32, f32) {
        (self.x.to_num::<f32>(), self.y.to_num::<f32>())
    }
}

/// Square root by bisection. Negative inputs yield zero.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let (mut below, mut above) = (Fixed::ZERO, value.max(Fixed::ONE));
    // 48 halvings take the bracket below the type's resolution.
    for _ in 0..48 {
        let guess = (below + above) >> 1u32;
        if guess.saturating_mul(guess) <= value {
            below = guess;
        } else {
            above = guess;
        }
    }
    below
}

macro_rules! componentwise {
    ($trait:ident, $method:ident, $op:tt) => {
        impl std::ops::$trait for Vec2Fixed {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self {
                Self::new(self.x $op rhs.x, self.y $op rhs.y)
            }
        }
    };
}

componentwise!(Add, add, +);
componentwise!(Sub, sub, -);

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Fixed, b: Fixed) -> bool {
        (a - b).abs() < Fixed::ONE / Fixed::from_num(1000)
    }

    #[test]
    fn pythagorean_distance() {
        let a = Vec2Fixed::from_ints(3, 0);
        let b = Vec2Fixed::from_ints(0, 4);
        // 3² + 4² = 25
        assert_eq!(a.distance_squared(b), Fixed::from_num(25));
        assert!(approx(a.distance(b), Fixed::from_num(5)));
    }

    #[test]
    fn repeated_math_is_bit_identical() {
        let third = |n: i32| Fixed::from_num(n) / Fixed::from_num(3);
        assert_eq!(third(1).to_bits(), third(1).to_bits());
        assert_eq!(fixed_sqrt(third(2)), fixed_sqrt(third(2)));
    }

    #[test]
    fn normalized_keeps_direction() {
        let norm = Vec2Fixed::from_ints(3, 4).normalize();
        assert!(approx(norm.length(), Fixed::ONE));
        assert!(approx(norm.x, Fixed::from_num(0.6)));
        assert!(approx(norm.y, Fixed::from_num(0.8)));
        assert_eq!(Vec2Fixed::ZERO.normalize(), Vec2Fixed::ZERO);
    }

    #[test]
    fn step_toward_does_not_overshoot() {
        let start = Vec2Fixed::ZERO;
        let target = Vec2Fixed::from_ints(10, 0);

        let step = start.step_toward(target, Fixed::from_num(4));
        assert!(approx(step.x, Fixed::from_num(4)));
        assert_eq!(step.y, Fixed::ZERO);

        let arrived = Vec2Fixed::from_ints(9, 0).step_toward(target, Fixed::from_num(4));
        assert_eq!(arrived, target);
    }

    #[test]
    fn sqrt_of_field_scale_values() {
        // Field diagonal scale distances must stay precise.
        let root = fixed_sqrt(Fixed::from_num(1_000_000));
        assert!(approx(root, Fixed::from_num(1000)));
    }

    #[test]
    fn clamp_to_field() {
        let v = Vec2Fixed::from_ints(-5, 500);
        let clamped = v.clamp(Vec2Fixed::ZERO, Vec2Fixed::from_ints(100, 100));
        assert_eq!(clamped, Vec2Fixed::from_ints(0, 100));
    }
}
