//! Interval module - time spans with specified numeric bounds

use crate::weight::Weight;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Specified bounds for constructing an [`Interval`] without concrete
/// endpoint positions.
///
/// Any bound left as `None` is unconstrained and becomes the appropriate
/// infinity. Minimum duration defaults to zero: a finish never precedes
/// its start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntervalBounds {
    /// Earliest allowed start.
    pub min_start: Option<Weight>,
    /// Latest allowed start.
    pub max_start: Option<Weight>,
    /// Earliest allowed finish.
    pub min_finish: Option<Weight>,
    /// Latest allowed finish.
    pub max_finish: Option<Weight>,
    /// Smallest allowed duration.
    pub min_duration: Option<Weight>,
    /// Largest allowed duration.
    pub max_duration: Option<Weight>,
}

/// An immutable time span on the shared timeline.
///
/// An interval has an optional concrete start and finish position plus six
/// *specified* bounds (minimum/maximum start, finish, and duration). A
/// concrete position pins the corresponding pair of bounds to that value;
/// unspecified bounds are the non-constraining infinities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    start: Option<i64>,
    finish: Option<i64>,
    min_start: Weight,
    max_start: Weight,
    min_finish: Weight,
    max_finish: Weight,
    min_duration: Weight,
    max_duration: Weight,
}

impl Interval {
    /// Create a zero-length interval at a single timeline position.
    pub fn point(at: i64) -> Self {
        Self {
            start: Some(at),
            finish: Some(at),
            min_start: Weight::Finite(at),
            max_start: Weight::Finite(at),
            min_finish: Weight::Finite(at),
            max_finish: Weight::Finite(at),
            min_duration: Weight::ZERO,
            max_duration: Weight::ZERO,
        }
    }

    /// Create an interval with concrete start and finish positions.
    ///
    /// Returns an error if `finish` precedes `start`.
    pub fn closed(start: i64, finish: i64) -> Result<Self, String> {
        if finish < start {
            return Err(format!(
                "finish {} precedes start {}",
                finish, start
            ));
        }
        let duration = Weight::Finite(finish - start);
        Ok(Self {
            start: Some(start),
            finish: Some(finish),
            min_start: Weight::Finite(start),
            max_start: Weight::Finite(start),
            min_finish: Weight::Finite(finish),
            max_finish: Weight::Finite(finish),
            min_duration: duration,
            max_duration: duration,
        })
    }

    /// Create an interval from specified bounds only.
    ///
    /// Returns an error if any minimum exceeds its finite maximum, or if a
    /// negative duration is specified.
    pub fn with_bounds(bounds: IntervalBounds) -> Result<Self, String> {
        let min_start = bounds.min_start.unwrap_or(Weight::NegInfinity);
        let max_start = bounds.max_start.unwrap_or(Weight::PosInfinity);
        let min_finish = bounds.min_finish.unwrap_or(Weight::NegInfinity);
        let max_finish = bounds.max_finish.unwrap_or(Weight::PosInfinity);
        let min_duration = bounds.min_duration.unwrap_or(Weight::ZERO);
        let max_duration = bounds.max_duration.unwrap_or(Weight::PosInfinity);

        check_bounds(min_start, max_start, "start")?;
        check_bounds(min_finish, max_finish, "finish")?;
        check_bounds(min_duration, max_duration, "duration")?;
        if min_duration < Weight::ZERO && min_duration.is_finite() {
            return Err(format!("negative minimum duration {}", min_duration));
        }

        Ok(Self {
            start: None,
            finish: None,
            min_start,
            max_start,
            min_finish,
            max_finish,
            min_duration,
            max_duration,
        })
    }

    /// The concrete start position, if pinned.
    pub fn start(&self) -> Option<i64> {
        self.start
    }

    /// The concrete finish position, if pinned.
    pub fn finish(&self) -> Option<i64> {
        self.finish
    }

    /// Earliest allowed start.
    pub fn min_start(&self) -> Weight {
        self.min_start
    }

    /// Latest allowed start.
    pub fn max_start(&self) -> Weight {
        self.max_start
    }

    /// Earliest allowed finish.
    pub fn min_finish(&self) -> Weight {
        self.min_finish
    }

    /// Latest allowed finish.
    pub fn max_finish(&self) -> Weight {
        self.max_finish
    }

    /// Smallest allowed duration.
    pub fn min_duration(&self) -> Weight {
        self.min_duration
    }

    /// Largest allowed duration.
    pub fn max_duration(&self) -> Weight {
        self.max_duration
    }
}

fn check_bounds(min: Weight, max: Weight, what: &str) -> Result<(), String> {
    if min.is_finite() && max.is_finite() && min > max {
        Err(format!("minimum {} {} exceeds maximum {}", what, min, max))
    } else {
        Ok(())
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.finish) {
            (Some(s), Some(e)) => write!(f, "[{}, {}]", s, e),
            _ => write!(
                f,
                "[start {}..{}, finish {}..{}]",
                self.min_start, self.max_start, self.min_finish, self.max_finish
            ),
        }
    }
}
