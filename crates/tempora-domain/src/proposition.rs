//! Proposition module - the fundamental unit of temporal knowledge

use crate::interval::Interval;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a proposition kind (e.g. a measured parameter type or a
/// derived abstraction type).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KindId(String);

impl KindId {
    /// Create a kind id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for KindId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for KindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The system a proposition's identifier is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SourceSystem {
    /// Produced by pattern evaluation rather than observed.
    Derived,
    /// Observed by the named data source.
    DataSource(String),
    /// Origin unknown.
    Unknown,
}

impl fmt::Display for SourceSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSystem::Derived => write!(f, "derived"),
            SourceSystem::DataSource(id) => write!(f, "source:{}", id),
            SourceSystem::Unknown => write!(f, "unknown"),
        }
    }
}

/// A globally unique, source-system-scoped proposition identifier.
///
/// Two propositions with identical content but different unique ids are
/// distinct facts; all derivation bookkeeping is keyed on this identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UniqueId {
    /// The scoping source system.
    pub source_system: SourceSystem,
    /// The identifier within that source system.
    pub local_id: String,
}

impl UniqueId {
    /// Create an identifier scoped to a source system.
    pub fn new(source_system: SourceSystem, local_id: impl Into<String>) -> Self {
        Self {
            source_system,
            local_id: local_id.into(),
        }
    }

    /// Generate a fresh identifier for a derived proposition.
    ///
    /// UUIDv7 keeps derived ids chronologically sortable without any
    /// coordination.
    pub fn new_derived() -> Self {
        Self {
            source_system: SourceSystem::Derived,
            local_id: uuid::Uuid::now_v7().to_string(),
        }
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source_system, self.local_id)
    }
}

/// The structural category of a proposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// A leaf-level, directly observed time-stamped value.
    PrimitiveParameter,
    /// An observed occurrence with an interval.
    Event,
    /// A derived proposition computed from patterns over others.
    AbstractParameter,
    /// A derived bounding temporal window.
    Context,
    /// An observation with no temporal component.
    Constant,
}

/// An observed or derived temporal fact.
///
/// Propositions are immutable once asserted into a working memory; the
/// only sanctioned mutation is the controlled retract/replace performed by
/// pattern evaluation. Equality and hashing are identity-based: two
/// propositions are the same fact iff their unique ids match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposition {
    /// The proposition's kind.
    pub kind: KindId,
    /// The proposition's identity.
    pub unique_id: UniqueId,
    /// The structural category.
    pub category: Category,
    /// The temporal extent, absent for constants.
    pub interval: Option<Interval>,
    /// Named property values. Insertion order is irrelevant; the ordered
    /// map keeps snapshots deterministic.
    pub properties: BTreeMap<String, Value>,
    /// Named, ordered lists of related proposition ids.
    pub references: BTreeMap<String, Vec<UniqueId>>,
}

impl Proposition {
    /// Create a proposition with no interval, properties, or references.
    pub fn bare(kind: KindId, unique_id: UniqueId, category: Category) -> Self {
        Self {
            kind,
            unique_id,
            category,
            interval: None,
            properties: BTreeMap::new(),
            references: BTreeMap::new(),
        }
    }

    /// Attach an interval.
    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Attach a property value.
    pub fn with_property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Get a property value by name.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Record a named reference list. Duplicate targets are dropped while
    /// preserving first-seen order.
    pub fn with_reference(mut self, name: impl Into<String>, targets: Vec<UniqueId>) -> Self {
        let mut seen = Vec::with_capacity(targets.len());
        for t in targets {
            if !seen.contains(&t) {
                seen.push(t);
            }
        }
        self.references.insert(name.into(), seen);
        self
    }

    /// Get a reference list by name.
    pub fn reference(&self, name: &str) -> &[UniqueId] {
        self.references.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether this proposition was produced by pattern evaluation.
    pub fn is_derived(&self) -> bool {
        self.unique_id.source_system == SourceSystem::Derived
    }
}

/// Identity-based equality: same fact iff same unique id.
impl PartialEq for Proposition {
    fn eq(&self, other: &Self) -> bool {
        self.unique_id == other.unique_id
    }
}

impl Eq for Proposition {}

impl std::hash::Hash for Proposition {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.unique_id.hash(state);
    }
}

impl fmt::Display for Proposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.unique_id)?;
        if let Some(interval) = &self.interval {
            write!(f, " @ {}", interval)?;
        }
        Ok(())
    }
}
