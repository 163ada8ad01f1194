//! Pattern definitions supplied by a knowledge source

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::HashMap;
use tempora_domain::{KindId, Relation, Value};

/// Derives a new proposition kind by running an algorithm over sliding
/// windows of one primitive-parameter kind, optionally bounded by a
/// context kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowLevelAbstractionDefinition {
    /// The derived kind.
    pub id: KindId,
    /// The primitive-parameter kind the windows are drawn from.
    pub abstracted_from: KindId,
    /// The algorithm resolved against the algorithm source.
    pub algorithm_id: String,
    /// Optional context kind that bounds the windows.
    #[serde(default)]
    pub context_id: Option<KindId>,
    /// Smallest window the algorithm is offered.
    #[serde(default = "default_min_values")]
    pub minimum_number_of_values: usize,
    /// Largest window the algorithm is offered; unbounded when absent.
    #[serde(default)]
    pub maximum_number_of_values: Option<usize>,
    /// Named parameters handed to the algorithm.
    #[serde(default)]
    pub algorithm_params: BTreeMap<String, Value>,
}

fn default_min_values() -> usize {
    1
}

/// Derives copies of the propositions occupying an index window of a
/// temporally sorted list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceDefinition {
    /// The derived kind.
    pub id: KindId,
    /// The kind being sliced.
    pub abstracted_from: KindId,
    /// Lower limit of the range (inclusive). A negative value counts
    /// from the end and flips the sort to descending.
    #[serde(default)]
    pub min_index: i32,
    /// Upper limit of the range (exclusive).
    #[serde(default = "default_max_index")]
    pub max_index: i32,
    /// Merge the selected propositions into one derived proposition
    /// spanning their enclosing interval instead of copying each.
    #[serde(default)]
    pub merged_interval: bool,
}

fn default_max_index() -> i32 {
    i32::MAX
}

/// Marks a context kind whose adjacent windows are merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextDefinition {
    /// The combinable context kind.
    pub id: KindId,
}

/// Derives an abstraction from an ordered chain of kinds where every
/// consecutive pair satisfies its relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequentialPatternDefinition {
    /// The derived kind.
    pub id: KindId,
    /// The chain of kinds, in order.
    pub elements: Vec<KindId>,
    /// One relation per consecutive element pair.
    pub relations: Vec<Relation>,
}

/// A declarative temporal pattern, tagged by the action it triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PatternDefinition {
    /// Sliding-window abstraction over a primitive parameter.
    LowLevelAbstraction(LowLevelAbstractionDefinition),
    /// Index-window extraction.
    Slice(SliceDefinition),
    /// Combinable context windows.
    Context(ContextDefinition),
    /// Ordered chain of related propositions.
    SequentialPattern(SequentialPatternDefinition),
}

impl PatternDefinition {
    /// The kind this definition derives (or, for contexts, governs).
    pub fn id(&self) -> &KindId {
        match self {
            PatternDefinition::LowLevelAbstraction(d) => &d.id,
            PatternDefinition::Slice(d) => &d.id,
            PatternDefinition::Context(d) => &d.id,
            PatternDefinition::SequentialPattern(d) => &d.id,
        }
    }

    /// Validate the definition's internal consistency.
    pub fn validate(&self) -> Result<(), EngineError> {
        match self {
            PatternDefinition::LowLevelAbstraction(d) => {
                if d.minimum_number_of_values == 0 {
                    return Err(invalid(&d.id, "minimum_number_of_values must be at least 1"));
                }
                if let Some(max) = d.maximum_number_of_values {
                    if max < d.minimum_number_of_values {
                        return Err(invalid(
                            &d.id,
                            "maximum_number_of_values is below the minimum",
                        ));
                    }
                }
                if d.algorithm_id.is_empty() {
                    return Err(invalid(&d.id, "algorithm_id is empty"));
                }
                Ok(())
            }
            PatternDefinition::Slice(d) => {
                if d.min_index < 0 && d.max_index > 0 {
                    return Err(invalid(
                        &d.id,
                        "a negative min_index requires a non-positive max_index",
                    ));
                }
                if d.min_index >= 0 && d.max_index < d.min_index {
                    return Err(invalid(&d.id, "max_index is below min_index"));
                }
                Ok(())
            }
            PatternDefinition::Context(_) => Ok(()),
            PatternDefinition::SequentialPattern(d) => {
                if d.elements.len() < 2 {
                    return Err(invalid(&d.id, "a chain requires at least two elements"));
                }
                if d.relations.len() != d.elements.len() - 1 {
                    return Err(invalid(
                        &d.id,
                        "expected one relation per consecutive element pair",
                    ));
                }
                Ok(())
            }
        }
    }
}

fn invalid(id: &KindId, reason: &str) -> EngineError {
    EngineError::InvalidDefinition {
        id: id.to_string(),
        reason: reason.to_string(),
    }
}

/// Supplies pattern definitions, resolved once before a query starts.
pub trait KnowledgeSource {
    /// Error type for knowledge-source reads.
    type Error: std::fmt::Display;

    /// Read every pattern definition for the query.
    fn read_definitions(&self) -> Result<Vec<PatternDefinition>, Self::Error>;
}

/// The resolved, validated set of definitions for one query.
///
/// Handed to the results handler at start so destinations can interpret
/// the kinds they are about to receive.
#[derive(Debug, Clone, Default)]
pub struct DefinitionCache {
    order: Vec<KindId>,
    by_id: HashMap<KindId, PatternDefinition>,
}

impl DefinitionCache {
    /// Build a cache, validating every definition.
    ///
    /// Duplicate ids and malformed definitions are initialization errors.
    pub fn new(definitions: Vec<PatternDefinition>) -> Result<Self, EngineError> {
        let mut cache = Self::default();
        for definition in definitions {
            definition.validate()?;
            let id = definition.id().clone();
            if cache.by_id.insert(id.clone(), definition).is_some() {
                return Err(EngineError::InvalidDefinition {
                    id: id.to_string(),
                    reason: "duplicate definition id".to_string(),
                });
            }
            cache.order.push(id);
        }
        Ok(cache)
    }

    /// Look up a definition by derived kind.
    pub fn get(&self, id: &KindId) -> Option<&PatternDefinition> {
        self.by_id.get(id)
    }

    /// Iterate definitions in declaration order.
    pub fn definitions(&self) -> impl Iterator<Item = &PatternDefinition> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice(min_index: i32, max_index: i32) -> PatternDefinition {
        PatternDefinition::Slice(SliceDefinition {
            id: KindId::from("first-two"),
            abstracted_from: KindId::from("hr"),
            min_index,
            max_index,
            merged_interval: false,
        })
    }

    #[test]
    fn test_slice_validation() {
        assert!(slice(0, 2).validate().is_ok());
        assert!(slice(-2, 0).validate().is_ok());
        assert!(slice(-2, 1).validate().is_err());
        assert!(slice(3, 1).validate().is_err());
    }

    #[test]
    fn test_chain_validation() {
        let bad = PatternDefinition::SequentialPattern(SequentialPatternDefinition {
            id: KindId::from("chain"),
            elements: vec![KindId::from("a"), KindId::from("b")],
            relations: vec![],
        });
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_cache_rejects_duplicates() {
        let result = DefinitionCache::new(vec![slice(0, 2), slice(0, 3)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cache_preserves_order() {
        let cache = DefinitionCache::new(vec![
            slice(0, 2),
            PatternDefinition::Context(ContextDefinition {
                id: KindId::from("window"),
            }),
        ])
        .unwrap();
        let ids: Vec<_> = cache.definitions().map(|d| d.id().to_string()).collect();
        assert_eq!(ids, vec!["first-two", "window"]);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_low_level_serde_defaults() {
        let json = r#"{
            "LowLevelAbstraction": {
                "id": "hr-high",
                "abstracted_from": "hr",
                "algorithm_id": "state"
            }
        }"#;
        let parsed: PatternDefinition = serde_json::from_str(json).unwrap();
        match parsed {
            PatternDefinition::LowLevelAbstraction(d) => {
                assert_eq!(d.minimum_number_of_values, 1);
                assert_eq!(d.maximum_number_of_values, None);
                assert!(d.context_id.is_none());
            }
            other => panic!("unexpected definition: {:?}", other),
        }
    }
}
