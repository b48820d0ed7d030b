//! # Block Positions
//!
//! Integer cell positions and their packed 64-bit form.
//!
//! ## Packing
//!
//! ```text
//!  63            38 37            12 11        0
//! ┌────────────────┬────────────────┬───────────┐
//! │   x (26 bits)  │   z (26 bits)  │ y (12 bits)│
//! └────────────────┴────────────────┴───────────┘
//! ```
//!
//! Every field is two's complement, so `from_long` sign-extends each one.
//! Inside the packing range the mapping is a bijection; outside it the
//! unchecked `as_long` wraps, which is why `try_as_long` exists.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bits used for the X coordinate.
pub const BITS_X: u32 = 26;
/// Bits used for the Z coordinate.
pub const BITS_Z: u32 = 26;
/// Bits used for the Y coordinate.
pub const BITS_Y: u32 = 64 - BITS_X - BITS_Z;

const MASK_X: i64 = (1 << BITS_X) - 1;
const MASK_Y: i64 = (1 << BITS_Y) - 1;
const MASK_Z: i64 = (1 << BITS_Z) - 1;

const SHIFT_Z: u32 = BITS_Y;
const SHIFT_X: u32 = BITS_Y + BITS_Z;

/// Smallest encodable X/Z coordinate.
pub const MIN_HORIZONTAL: i32 = -(1 << (BITS_X - 1));
/// Largest encodable X/Z coordinate.
pub const MAX_HORIZONTAL: i32 = (1 << (BITS_X - 1)) - 1;
/// Smallest encodable Y coordinate.
pub const MIN_VERTICAL: i32 = -(1 << (BITS_Y - 1));
/// Largest encodable Y coordinate.
pub const MAX_VERTICAL: i32 = (1 << (BITS_Y - 1)) - 1;

/// Axis of a position, used in range errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// East/west.
    X,
    /// Up/down.
    Y,
    /// North/south.
    Z,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => f.write_str("x"),
            Self::Y => f.write_str("y"),
            Self::Z => f.write_str("z"),
        }
    }
}

/// Errors from checked position packing.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionError {
    /// A coordinate does not fit in its packed field.
    #[error("{axis} coordinate {value} is outside the packable range")]
    OutOfRange {
        /// Offending axis.
        axis: Axis,
        /// Offending value.
        value: i32,
    },
}

/// Position of a single cell in a partition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate (height).
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl BlockPos {
    /// The origin.
    pub const ORIGIN: Self = Self::new(0, 0, 0);

    /// Creates a new position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns true if every coordinate fits the packing range.
    #[inline]
    #[must_use]
    pub const fn is_packable(self) -> bool {
        self.x >= MIN_HORIZONTAL
            && self.x <= MAX_HORIZONTAL
            && self.z >= MIN_HORIZONTAL
            && self.z <= MAX_HORIZONTAL
            && self.y >= MIN_VERTICAL
            && self.y <= MAX_VERTICAL
    }

    /// Packs the position into a single `i64`.
    ///
    /// Coordinates outside the packing range wrap; use [`Self::try_as_long`]
    /// when the input is untrusted.
    #[inline]
    #[must_use]
    pub const fn as_long(self) -> i64 {
        ((self.x as i64 & MASK_X) << SHIFT_X)
            | ((self.z as i64 & MASK_Z) << SHIFT_Z)
            | (self.y as i64 & MASK_Y)
    }

    /// Packs the position, rejecting coordinates that would wrap.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError::OutOfRange`] naming the first offending axis.
    pub const fn try_as_long(self) -> Result<i64, PositionError> {
        if self.x < MIN_HORIZONTAL || self.x > MAX_HORIZONTAL {
            return Err(PositionError::OutOfRange { axis: Axis::X, value: self.x });
        }
        if self.y < MIN_VERTICAL || self.y > MAX_VERTICAL {
            return Err(PositionError::OutOfRange { axis: Axis::Y, value: self.y });
        }
        if self.z < MIN_HORIZONTAL || self.z > MAX_HORIZONTAL {
            return Err(PositionError::OutOfRange { axis: Axis::Z, value: self.z });
        }
        Ok(self.as_long())
    }

    /// Unpacks a position produced by [`Self::as_long`].
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_long(packed: i64) -> Self {
        // Shift each field to the top of the word, then arithmetic-shift back
        // down so the sign bit of the field is extended.
        let x = (packed << (64 - SHIFT_X - BITS_X)) >> (64 - BITS_X);
        let z = (packed << (64 - SHIFT_Z - BITS_Z)) >> (64 - BITS_Z);
        let y = (packed << (64 - BITS_Y)) >> (64 - BITS_Y);
        Self::new(x as i32, y as i32, z as i32)
    }

    /// Returns this position moved by the given deltas, wrapping on overflow.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x.wrapping_add(dx), self.y.wrapping_add(dy), self.z.wrapping_add(dz))
    }
}

impl From<(i32, i32, i32)> for BlockPos {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_packs_to_zero() {
        assert_eq!(BlockPos::ORIGIN.as_long(), 0);
        assert_eq!(BlockPos::from_long(0), BlockPos::ORIGIN);
    }

    #[test]
    fn test_round_trip_extremes() {
        let corners = [
            BlockPos::new(MIN_HORIZONTAL, MIN_VERTICAL, MIN_HORIZONTAL),
            BlockPos::new(MAX_HORIZONTAL, MAX_VERTICAL, MAX_HORIZONTAL),
            BlockPos::new(MIN_HORIZONTAL, MAX_VERTICAL, MAX_HORIZONTAL),
            BlockPos::new(MAX_HORIZONTAL, MIN_VERTICAL, MIN_HORIZONTAL),
            BlockPos::new(-1, -1, -1),
            BlockPos::new(1, 2, 3),
        ];
        for pos in corners {
            assert_eq!(BlockPos::from_long(pos.as_long()), pos, "{pos}");
        }
    }

    #[test]
    fn test_round_trip_sweep() {
        for x in (-300..300).step_by(37) {
            for y in (-2048..2048).step_by(129) {
                for z in (-300..300).step_by(41) {
                    let pos = BlockPos::new(x * 997, y, z * 1013);
                    assert_eq!(BlockPos::from_long(pos.as_long()), pos);
                }
            }
        }
    }

    #[test]
    fn test_neighbours_do_not_collide() {
        let base = BlockPos::new(10, 64, -10);
        let packed = base.as_long();
        for (dx, dy, dz) in [(1, 0, 0), (-1, 0, 0), (0, 1, 0), (0, -1, 0), (0, 0, 1), (0, 0, -1)] {
            assert_ne!(base.offset(dx, dy, dz).as_long(), packed);
        }
    }

    #[test]
    fn test_offset_wraps_at_i32_bounds() {
        let edge = BlockPos::new(i32::MAX, 0, i32::MIN);
        assert_eq!(edge.offset(1, -1, -1), BlockPos::new(i32::MIN, -1, i32::MAX));
    }

    #[test]
    fn test_try_as_long_rejects_out_of_range() {
        let too_high = BlockPos::new(0, MAX_VERTICAL + 1, 0);
        assert_eq!(
            too_high.try_as_long(),
            Err(PositionError::OutOfRange { axis: Axis::Y, value: MAX_VERTICAL + 1 })
        );
        let too_far = BlockPos::new(MIN_HORIZONTAL - 1, 0, 0);
        assert!(matches!(
            too_far.try_as_long(),
            Err(PositionError::OutOfRange { axis: Axis::X, .. })
        ));
        assert!(!too_far.is_packable());
        assert_eq!(BlockPos::new(5, 6, 7).try_as_long(), Ok(BlockPos::new(5, 6, 7).as_long()));
    }
}
