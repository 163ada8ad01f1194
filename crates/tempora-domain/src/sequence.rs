//! Sequence and Segment - ordered same-kind proposition runs

use crate::interval::{Interval, IntervalBounds};
use crate::proposition::{KindId, Proposition};
use crate::weight::Weight;

/// An ordered, key-scoped list of propositions drawn from a fixed set of
/// kinds.
///
/// Ordering is by interval start (earliest first) with ties broken by
/// insertion order; the sort is stable so equal starts keep their
/// arrival sequence.
#[derive(Debug, Clone)]
pub struct Sequence {
    kinds: Vec<KindId>,
    items: Vec<Proposition>,
}

impl Sequence {
    /// Create an empty sequence over the given kinds.
    pub fn new(kinds: Vec<KindId>) -> Self {
        Self {
            kinds,
            items: Vec::new(),
        }
    }

    /// Create a sequence from propositions, sorting them into temporal
    /// order.
    pub fn from_propositions(kinds: Vec<KindId>, mut items: Vec<Proposition>) -> Self {
        items.sort_by_key(|p| start_key(p));
        Self { kinds, items }
    }

    /// The kinds this sequence draws from.
    pub fn kinds(&self) -> &[KindId] {
        &self.kinds
    }

    /// Append a proposition, keeping temporal order.
    pub fn push(&mut self, proposition: Proposition) {
        let key = start_key(&proposition);
        // Stable position: after every item with an equal-or-earlier start.
        let at = self.items.partition_point(|p| start_key(p) <= key);
        self.items.insert(at, proposition);
    }

    /// The propositions in temporal order.
    pub fn items(&self) -> &[Proposition] {
        &self.items
    }

    /// Number of propositions.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over the propositions in temporal order.
    pub fn iter(&self) -> std::slice::Iter<'_, Proposition> {
        self.items.iter()
    }
}

fn start_key(p: &Proposition) -> Weight {
    p.interval
        .as_ref()
        .map(|i| i.min_start())
        .unwrap_or(Weight::NegInfinity)
}

/// A non-empty view over a [`Sequence`] with a derived overall interval.
#[derive(Debug, Clone)]
pub struct Segment {
    sequence: Sequence,
}

impl Segment {
    /// Wrap a sequence. Returns an error for an empty sequence.
    pub fn new(sequence: Sequence) -> Result<Self, String> {
        if sequence.is_empty() {
            Err("a segment requires at least one proposition".to_string())
        } else {
            Ok(Self { sequence })
        }
    }

    /// The underlying sequence.
    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    /// The propositions in temporal order.
    pub fn items(&self) -> &[Proposition] {
        self.sequence.items()
    }

    /// Number of propositions.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Always false: segments are non-empty by construction.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The first proposition in temporal order.
    pub fn first(&self) -> &Proposition {
        &self.sequence.items()[0]
    }

    /// The last proposition in temporal order.
    pub fn last(&self) -> &Proposition {
        let items = self.sequence.items();
        &items[items.len() - 1]
    }

    /// The minimal enclosing interval: earliest member start to latest
    /// member finish.
    pub fn interval(&self) -> Interval {
        let mut min_start = Weight::PosInfinity;
        let mut max_finish = Weight::NegInfinity;
        for p in self.sequence.iter() {
            if let Some(iv) = &p.interval {
                min_start = min_start.min(iv.min_start());
                max_finish = max_finish.max(iv.max_finish());
            }
        }
        match (min_start.finite(), max_finish.finite()) {
            (Some(s), Some(f)) if s <= f => {
                Interval::closed(s, f).expect("enclosing endpoints are ordered")
            }
            _ => Interval::with_bounds(IntervalBounds {
                min_start: Some(min_start),
                max_start: Some(min_start),
                min_finish: Some(max_finish),
                max_finish: Some(max_finish),
                ..Default::default()
            })
            .unwrap_or_else(|_| Interval::point(0)),
        }
    }
}
