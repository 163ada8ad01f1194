//! Snapshot module - versioned serializable proposition records
//!
//! Snapshots are the explicit wire/storage form of a proposition: a
//! versioned record with a fixed field order and explicit null markers for
//! the optional interval and endpoints. Readers reject snapshots from an
//! unknown schema version instead of guessing.

use crate::interval::{Interval, IntervalBounds};
use crate::proposition::{Category, KindId, Proposition, UniqueId};
use crate::value::Value;
use crate::weight::Weight;
use serde::{Deserialize, Serialize};

/// The current snapshot schema version.
pub const SCHEMA_VERSION: u16 = 1;

/// The serialized form of an [`Interval`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalSnapshot {
    /// Concrete start position; `None` when unbounded.
    pub start: Option<i64>,
    /// Concrete finish position; `None` when unbounded.
    pub finish: Option<i64>,
    /// Specified minimum start.
    pub min_start: Weight,
    /// Specified maximum start.
    pub max_start: Weight,
    /// Specified minimum finish.
    pub min_finish: Weight,
    /// Specified maximum finish.
    pub max_finish: Weight,
    /// Specified minimum duration.
    pub min_duration: Weight,
    /// Specified maximum duration.
    pub max_duration: Weight,
}

impl From<&Interval> for IntervalSnapshot {
    fn from(interval: &Interval) -> Self {
        Self {
            start: interval.start(),
            finish: interval.finish(),
            min_start: interval.min_start(),
            max_start: interval.max_start(),
            min_finish: interval.min_finish(),
            max_finish: interval.max_finish(),
            min_duration: interval.min_duration(),
            max_duration: interval.max_duration(),
        }
    }
}

impl IntervalSnapshot {
    fn restore(&self) -> Result<Interval, String> {
        match (self.start, self.finish) {
            (Some(s), Some(f)) => Interval::closed(s, f),
            _ => Interval::with_bounds(IntervalBounds {
                min_start: Some(self.min_start),
                max_start: Some(self.max_start),
                min_finish: Some(self.min_finish),
                max_finish: Some(self.max_finish),
                min_duration: Some(self.min_duration),
                max_duration: Some(self.max_duration),
            }),
        }
    }
}

/// One named property in snapshot order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySnapshot {
    /// The property name.
    pub name: String,
    /// The property value.
    pub value: Value,
}

/// One named reference list in snapshot order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSnapshot {
    /// The reference name.
    pub name: String,
    /// The referenced proposition ids, in order.
    pub targets: Vec<UniqueId>,
}

/// A versioned, order-stable serialized proposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropositionSnapshot {
    /// Schema version this snapshot was written with.
    pub version: u16,
    /// The proposition kind.
    pub kind: KindId,
    /// The proposition identity.
    pub unique_id: UniqueId,
    /// The structural category.
    pub category: Category,
    /// The temporal extent; `None` for constants.
    pub interval: Option<IntervalSnapshot>,
    /// Properties in name order.
    pub properties: Vec<PropertySnapshot>,
    /// Reference lists in name order.
    pub references: Vec<ReferenceSnapshot>,
}

impl From<&Proposition> for PropositionSnapshot {
    fn from(p: &Proposition) -> Self {
        Self {
            version: SCHEMA_VERSION,
            kind: p.kind.clone(),
            unique_id: p.unique_id.clone(),
            category: p.category,
            interval: p.interval.as_ref().map(IntervalSnapshot::from),
            properties: p
                .properties
                .iter()
                .map(|(name, value)| PropertySnapshot {
                    name: name.clone(),
                    value: value.clone(),
                })
                .collect(),
            references: p
                .references
                .iter()
                .map(|(name, targets)| ReferenceSnapshot {
                    name: name.clone(),
                    targets: targets.clone(),
                })
                .collect(),
        }
    }
}

impl PropositionSnapshot {
    /// Restore the proposition this snapshot was taken from.
    ///
    /// Returns an error for an unknown schema version or an interval that
    /// no longer validates.
    pub fn restore(&self) -> Result<Proposition, String> {
        if self.version != SCHEMA_VERSION {
            return Err(format!(
                "unsupported snapshot schema version {} (expected {})",
                self.version, SCHEMA_VERSION
            ));
        }
        let mut p = Proposition::bare(self.kind.clone(), self.unique_id.clone(), self.category);
        if let Some(snapshot) = &self.interval {
            p.interval = Some(snapshot.restore()?);
        }
        for property in &self.properties {
            p.properties
                .insert(property.name.clone(), property.value.clone());
        }
        for reference in &self.references {
            p.references
                .insert(reference.name.clone(), reference.targets.clone());
        }
        Ok(p)
    }
}
