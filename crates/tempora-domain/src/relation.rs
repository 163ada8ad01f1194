//! Relation module - pairwise distance constraints between intervals

use crate::interval::Interval;
use crate::weight::Weight;
use serde::{Deserialize, Serialize};

/// A temporal relation between two intervals, expressed as bounds on the
/// four pairwise endpoint distances.
///
/// For a relation tested as `relation.holds_between(lhs, rhs)`, each span
/// is the distance from an endpoint of `lhs` to an endpoint of `rhs`
/// (right minus left). A bound left as `None` does not constrain.
///
/// Bounds are evaluated conservatively: a minimum bound is satisfied when
/// the smallest feasible span already meets it, a maximum bound when the
/// largest feasible span stays under it. For intervals with concrete
/// endpoints the feasible span collapses to a single distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Minimum distance from `lhs` start to `rhs` start.
    pub min_span_starts: Option<Weight>,
    /// Maximum distance from `lhs` start to `rhs` start.
    pub max_span_starts: Option<Weight>,
    /// Minimum distance from `lhs` start to `rhs` finish.
    pub min_span_start_finish: Option<Weight>,
    /// Maximum distance from `lhs` start to `rhs` finish.
    pub max_span_start_finish: Option<Weight>,
    /// Minimum distance from `lhs` finish to `rhs` start.
    pub min_span_finish_start: Option<Weight>,
    /// Maximum distance from `lhs` finish to `rhs` start.
    pub max_span_finish_start: Option<Weight>,
    /// Minimum distance from `lhs` finish to `rhs` finish.
    pub min_span_finishes: Option<Weight>,
    /// Maximum distance from `lhs` finish to `rhs` finish.
    pub max_span_finishes: Option<Weight>,
}

impl Relation {
    /// The relation that holds when `lhs` lies inside `rhs`: the `rhs`
    /// start is at or before the `lhs` start and the `rhs` finish is at or
    /// after the `lhs` finish.
    pub fn contained_in() -> Self {
        Self {
            max_span_starts: Some(Weight::ZERO),
            min_span_finishes: Some(Weight::ZERO),
            ..Default::default()
        }
    }

    /// The relation that holds when `lhs` finishes at or before `rhs`
    /// starts.
    pub fn before() -> Self {
        Self {
            min_span_finish_start: Some(Weight::ZERO),
            ..Default::default()
        }
    }

    /// The relation that holds when `lhs` finishes at or before `rhs`
    /// starts, with the gap between them bounded.
    pub fn before_within(max_gap: Weight) -> Self {
        Self {
            min_span_finish_start: Some(Weight::ZERO),
            max_span_finish_start: Some(max_gap),
            ..Default::default()
        }
    }

    /// Whether this relation holds between the two intervals.
    pub fn holds_between(&self, lhs: &Interval, rhs: &Interval) -> bool {
        span_satisfies(
            self.min_span_starts,
            self.max_span_starts,
            lhs.min_start(),
            lhs.max_start(),
            rhs.min_start(),
            rhs.max_start(),
        ) && span_satisfies(
            self.min_span_start_finish,
            self.max_span_start_finish,
            lhs.min_start(),
            lhs.max_start(),
            rhs.min_finish(),
            rhs.max_finish(),
        ) && span_satisfies(
            self.min_span_finish_start,
            self.max_span_finish_start,
            lhs.min_finish(),
            lhs.max_finish(),
            rhs.min_start(),
            rhs.max_start(),
        ) && span_satisfies(
            self.min_span_finishes,
            self.max_span_finishes,
            lhs.min_finish(),
            lhs.max_finish(),
            rhs.min_finish(),
            rhs.max_finish(),
        )
    }
}

/// Test one endpoint-pair span against its optional bounds.
///
/// The feasible span from an `lhs` endpoint in `[from_min, from_max]` to an
/// `rhs` endpoint in `[to_min, to_max]` is `[to_min - from_max,
/// to_max - from_min]`.
fn span_satisfies(
    min_bound: Option<Weight>,
    max_bound: Option<Weight>,
    from_min: Weight,
    from_max: Weight,
    to_min: Weight,
    to_max: Weight,
) -> bool {
    if let Some(min) = min_bound {
        let smallest = match to_min.checked_add(from_max.invert_sign()) {
            Some(w) => w,
            None => return false,
        };
        if smallest < min {
            return false;
        }
    }
    if let Some(max) = max_bound {
        let largest = match to_max.checked_add(from_min.invert_sign()) {
            Some(w) => w,
            None => return false,
        };
        if largest > max {
            return false;
        }
    }
    true
}
