//! Weight module - signed timeline distances with infinity sentinels

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;

/// A signed distance on the shared timeline.
///
/// Weights label constraint-graph edges and interval bounds. They are
/// totally ordered, support addition and sign inversion, and carry
/// distinguished positive and negative infinity sentinels so that an
/// unspecified bound can be represented without constraining anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weight {
    /// Less than every finite weight.
    NegInfinity,
    /// A finite distance.
    Finite(i64),
    /// Greater than every finite weight.
    PosInfinity,
}

impl Weight {
    /// The zero distance.
    pub const ZERO: Weight = Weight::Finite(0);

    /// Whether this weight is finite.
    pub fn is_finite(self) -> bool {
        matches!(self, Weight::Finite(_))
    }

    /// The finite value, if any.
    pub fn finite(self) -> Option<i64> {
        match self {
            Weight::Finite(v) => Some(v),
            _ => None,
        }
    }

    /// Add two weights. Infinities absorb finite addends.
    ///
    /// Returns `None` for the indeterminate sum of opposite infinities and
    /// for finite overflow.
    pub fn checked_add(self, other: Weight) -> Option<Weight> {
        match (self, other) {
            (Weight::PosInfinity, Weight::NegInfinity)
            | (Weight::NegInfinity, Weight::PosInfinity) => None,
            (Weight::PosInfinity, _) | (_, Weight::PosInfinity) => Some(Weight::PosInfinity),
            (Weight::NegInfinity, _) | (_, Weight::NegInfinity) => Some(Weight::NegInfinity),
            (Weight::Finite(a), Weight::Finite(b)) => a.checked_add(b).map(Weight::Finite),
        }
    }

    /// Add two weights.
    ///
    /// # Panics
    /// Panics on the indeterminate sum of opposite infinities or on finite
    /// overflow.
    pub fn add(self, other: Weight) -> Weight {
        self.checked_add(other)
            .expect("indeterminate or overflowing weight sum")
    }

    /// Invert the sign of this weight. Infinities swap.
    pub fn invert_sign(self) -> Weight {
        match self {
            Weight::NegInfinity => Weight::PosInfinity,
            Weight::Finite(v) => Weight::Finite(-v),
            Weight::PosInfinity => Weight::NegInfinity,
        }
    }

    /// The smaller of two weights.
    pub fn min(self, other: Weight) -> Weight {
        std::cmp::min(self, other)
    }

    /// The larger of two weights.
    pub fn max(self, other: Weight) -> Weight {
        std::cmp::max(self, other)
    }
}

impl From<i64> for Weight {
    fn from(v: i64) -> Self {
        Weight::Finite(v)
    }
}

impl Neg for Weight {
    type Output = Weight;

    fn neg(self) -> Weight {
        self.invert_sign()
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weight::NegInfinity => write!(f, "-inf"),
            Weight::Finite(v) => write!(f, "{}", v),
            Weight::PosInfinity => write!(f, "+inf"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(Weight::NegInfinity < Weight::Finite(i64::MIN));
        assert!(Weight::Finite(i64::MAX) < Weight::PosInfinity);
        assert!(Weight::Finite(-1) < Weight::ZERO);
    }

    #[test]
    fn test_add_absorbs_infinity() {
        assert_eq!(
            Weight::PosInfinity.add(Weight::Finite(5)),
            Weight::PosInfinity
        );
        assert_eq!(
            Weight::Finite(-3).add(Weight::NegInfinity),
            Weight::NegInfinity
        );
    }

    #[test]
    fn test_opposite_infinities_are_indeterminate() {
        assert_eq!(Weight::PosInfinity.checked_add(Weight::NegInfinity), None);
        assert_eq!(Weight::NegInfinity.checked_add(Weight::PosInfinity), None);
    }

    #[test]
    fn test_invert_sign() {
        assert_eq!(Weight::Finite(7).invert_sign(), Weight::Finite(-7));
        assert_eq!(Weight::PosInfinity.invert_sign(), Weight::NegInfinity);
        assert_eq!(Weight::NegInfinity.invert_sign(), Weight::PosInfinity);
    }

    #[test]
    fn test_display() {
        assert_eq!(Weight::Finite(42).to_string(), "42");
        assert_eq!(Weight::PosInfinity.to_string(), "+inf");
        assert_eq!(Weight::NegInfinity.to_string(), "-inf");
    }
}
