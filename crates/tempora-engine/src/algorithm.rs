//! Algorithm seam - the domain computations behind low-level abstraction

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;
use tempora_domain::{Segment, Value};
use thiserror::Error;

/// Error reported by an algorithm evaluating a segment.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct AlgorithmError(pub String);

/// A domain computation over a segment of same-kind propositions.
///
/// `compute` returns `Ok(Some(value))` when the segment matches and
/// produces the abstraction's value, `Ok(None)` when the segment simply
/// does not match, and `Err` for a genuine runtime failure (scoped to the
/// key being processed).
pub trait Algorithm: Send + Sync {
    /// The registry id of this algorithm.
    fn id(&self) -> &str;

    /// Evaluate a segment under the definition's parameters.
    fn compute(
        &self,
        segment: &Segment,
        params: &BTreeMap<String, Value>,
    ) -> Result<Option<Value>, AlgorithmError>;
}

/// Resolves algorithm ids to implementations before a query starts.
pub trait AlgorithmSource {
    /// Error type for algorithm-source reads.
    type Error: std::fmt::Display;

    /// Resolve an algorithm id; `None` if the id is unknown.
    fn read_algorithm(&self, id: &str) -> Result<Option<Arc<dyn Algorithm>>, Self::Error>;
}

/// The built-in algorithm registry: `min`, `max`, and `state`.
pub struct BuiltinAlgorithms {
    registry: HashMap<String, Arc<dyn Algorithm>>,
}

impl BuiltinAlgorithms {
    /// Create the registry with the built-in algorithms.
    pub fn new() -> Self {
        let mut registry: HashMap<String, Arc<dyn Algorithm>> = HashMap::new();
        registry.insert("min".to_string(), Arc::new(MinAlgorithm));
        registry.insert("max".to_string(), Arc::new(MaxAlgorithm));
        registry.insert("state".to_string(), Arc::new(StateAlgorithm));
        Self { registry }
    }

    /// Register an additional algorithm, replacing any previous one with
    /// the same id.
    pub fn register(&mut self, algorithm: Arc<dyn Algorithm>) {
        self.registry.insert(algorithm.id().to_string(), algorithm);
    }
}

impl Default for BuiltinAlgorithms {
    fn default() -> Self {
        Self::new()
    }
}

impl AlgorithmSource for BuiltinAlgorithms {
    type Error = AlgorithmError;

    fn read_algorithm(&self, id: &str) -> Result<Option<Arc<dyn Algorithm>>, Self::Error> {
        Ok(self.registry.get(id).cloned())
    }
}

/// Numeric values of every proposition in the segment, or `None` when a
/// member carries no numeric `value` property.
fn segment_numbers(segment: &Segment) -> Option<Vec<f64>> {
    segment
        .items()
        .iter()
        .map(|p| p.property("value").and_then(Value::as_number))
        .collect()
}

/// Matches every all-numeric segment with the smallest member value.
struct MinAlgorithm;

impl Algorithm for MinAlgorithm {
    fn id(&self) -> &str {
        "min"
    }

    fn compute(
        &self,
        segment: &Segment,
        _params: &BTreeMap<String, Value>,
    ) -> Result<Option<Value>, AlgorithmError> {
        Ok(segment_numbers(segment)
            .map(|ns| Value::Number(ns.iter().copied().fold(f64::INFINITY, f64::min))))
    }
}

/// Matches every all-numeric segment with the largest member value.
struct MaxAlgorithm;

impl Algorithm for MaxAlgorithm {
    fn id(&self) -> &str {
        "max"
    }

    fn compute(
        &self,
        segment: &Segment,
        _params: &BTreeMap<String, Value>,
    ) -> Result<Option<Value>, AlgorithmError> {
        Ok(segment_numbers(segment)
            .map(|ns| Value::Number(ns.iter().copied().fold(f64::NEG_INFINITY, f64::max))))
    }
}

/// Matches segments whose numeric values all fall between the
/// `min_threshold` and `max_threshold` parameters, producing the nominal
/// `value` parameter (or `true` when none is configured).
struct StateAlgorithm;

impl Algorithm for StateAlgorithm {
    fn id(&self) -> &str {
        "state"
    }

    fn compute(
        &self,
        segment: &Segment,
        params: &BTreeMap<String, Value>,
    ) -> Result<Option<Value>, AlgorithmError> {
        let min = threshold(params, "min_threshold", f64::NEG_INFINITY)?;
        let max = threshold(params, "max_threshold", f64::INFINITY)?;
        if min > max {
            return Err(AlgorithmError(format!(
                "min_threshold {} exceeds max_threshold {}",
                min, max
            )));
        }
        let numbers = match segment_numbers(segment) {
            Some(ns) => ns,
            None => return Ok(None),
        };
        if numbers.iter().all(|n| *n >= min && *n <= max) {
            Ok(Some(match params.get("value") {
                Some(v) => v.clone(),
                None => Value::Boolean(true),
            }))
        } else {
            Ok(None)
        }
    }
}

fn threshold(
    params: &BTreeMap<String, Value>,
    name: &str,
    default: f64,
) -> Result<f64, AlgorithmError> {
    match params.get(name) {
        None => Ok(default),
        Some(v) => v
            .as_number()
            .ok_or_else(|| AlgorithmError(format!("parameter '{}' must be numeric", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempora_domain::{
        Category, Interval, KindId, Proposition, Sequence, SourceSystem, UniqueId,
    };

    fn segment(values: &[f64]) -> Segment {
        let props = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                Proposition::bare(
                    KindId::from("hr"),
                    UniqueId::new(SourceSystem::DataSource("t".to_string()), i.to_string()),
                    Category::PrimitiveParameter,
                )
                .with_interval(Interval::point(i as i64))
                .with_property("value", Value::Number(*v))
            })
            .collect();
        Segment::new(Sequence::from_propositions(vec![KindId::from("hr")], props)).unwrap()
    }

    #[test]
    fn test_min_max() {
        let seg = segment(&[3.0, 1.0, 2.0]);
        let none = BTreeMap::new();
        let source = BuiltinAlgorithms::new();
        let min = source.read_algorithm("min").unwrap().unwrap();
        let max = source.read_algorithm("max").unwrap().unwrap();
        assert_eq!(min.compute(&seg, &none).unwrap(), Some(Value::Number(1.0)));
        assert_eq!(max.compute(&seg, &none).unwrap(), Some(Value::Number(3.0)));
    }

    #[test]
    fn test_state_thresholds() {
        let source = BuiltinAlgorithms::new();
        let state = source.read_algorithm("state").unwrap().unwrap();
        let mut params = BTreeMap::new();
        params.insert("min_threshold".to_string(), Value::Number(90.0));
        params.insert("value".to_string(), Value::from("high"));

        let high = segment(&[95.0, 102.0]);
        assert_eq!(
            state.compute(&high, &params).unwrap(),
            Some(Value::from("high"))
        );

        let mixed = segment(&[95.0, 60.0]);
        assert_eq!(state.compute(&mixed, &params).unwrap(), None);
    }

    #[test]
    fn test_state_rejects_bad_params() {
        let source = BuiltinAlgorithms::new();
        let state = source.read_algorithm("state").unwrap().unwrap();
        let mut params = BTreeMap::new();
        params.insert("min_threshold".to_string(), Value::from("not-a-number"));
        assert!(state.compute(&segment(&[1.0]), &params).is_err());
    }

    #[test]
    fn test_unknown_id_resolves_to_none() {
        let source = BuiltinAlgorithms::new();
        assert!(source.read_algorithm("nope").unwrap().is_none());
    }
}
