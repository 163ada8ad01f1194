//! Low-level sliding-window abstraction

use crate::algorithm::Algorithm;
use crate::definitions::LowLevelAbstractionDefinition;
use crate::error::EngineError;
use crate::fact_store::WorkingMemory;
use std::sync::Arc;
use tempora_domain::{
    Category, Proposition, Relation, Segment, Sequence, UniqueId, Value,
};
use tracing::debug;

/// Runs a domain algorithm over sliding windows of one primitive
/// parameter kind, optionally bounded by context windows.
///
/// With a bounding context kind, the parameter sequence is partitioned
/// into maximal contiguous runs that fall inside each context's interval
/// and the algorithm is applied separately within each run; without one,
/// the whole sequence is processed once. Every derived abstraction is
/// recorded as a forward/backward derivation of each input it consumed.
pub struct LowLevelAbstractionAction {
    def: LowLevelAbstractionDefinition,
    algorithm: Arc<dyn Algorithm>,
}

impl LowLevelAbstractionAction {
    /// Build the action around its resolved algorithm.
    pub fn new(def: LowLevelAbstractionDefinition, algorithm: Arc<dyn Algorithm>) -> Self {
        Self { def, algorithm }
    }

    /// The definition this action fires for.
    pub fn definition(&self) -> &LowLevelAbstractionDefinition {
        &self.def
    }

    /// Evaluate against the working memory. Returns how many
    /// abstractions were derived.
    pub fn fire(&self, wm: &mut WorkingMemory) -> Result<usize, EngineError> {
        let parameters: Vec<Proposition> = wm
            .facts()
            .all_of_kind(&self.def.abstracted_from)
            .into_iter()
            .filter(|p| p.interval.is_some())
            .cloned()
            .collect();
        if parameters.is_empty() {
            return Ok(0);
        }
        let sequence = Sequence::from_propositions(
            vec![self.def.abstracted_from.clone()],
            parameters,
        );

        match &self.def.context_id {
            None => self.process_subsequence(wm, sequence.items().to_vec()),
            Some(context_kind) => {
                let contexts = Sequence::from_propositions(
                    vec![context_kind.clone()],
                    wm.facts()
                        .all_of_kind(context_kind)
                        .into_iter()
                        .filter(|p| p.interval.is_some())
                        .cloned()
                        .collect(),
                );
                let membership = Relation::contained_in();
                let items = sequence.items();
                let mut derived = 0;
                let mut i = 0;
                for context in contexts.iter() {
                    let context_interval =
                        context.interval.as_ref().expect("filtered above");
                    let mut run: Vec<Proposition> = Vec::new();
                    while i < items.len() {
                        let interval = items[i].interval.as_ref().expect("filtered above");
                        if membership.holds_between(interval, context_interval) {
                            run.push(items[i].clone());
                            i += 1;
                        } else if run.is_empty() {
                            // Not yet inside this context's window.
                            i += 1;
                        } else {
                            // Left the window; the item may belong to a
                            // later context.
                            break;
                        }
                    }
                    if !run.is_empty() {
                        derived += self.process_subsequence(wm, run)?;
                    }
                }
                Ok(derived)
            }
        }
    }

    /// Slide the algorithm's window over one contiguous run.
    ///
    /// The window starts at the minimum width and extends while the
    /// algorithm keeps matching (up to the maximum width); the inputs of
    /// a matched window are consumed.
    fn process_subsequence(
        &self,
        wm: &mut WorkingMemory,
        items: Vec<Proposition>,
    ) -> Result<usize, EngineError> {
        let n = items.len();
        let min_width = self.def.minimum_number_of_values;
        let max_width = self.def.maximum_number_of_values.unwrap_or(n);
        let mut derived = 0;
        let mut i = 0;
        while i + min_width <= n {
            match self.compute(&items[i..i + min_width])? {
                None => i += 1,
                Some(first) => {
                    let mut value = first;
                    let mut j = i + min_width;
                    while j < n && (j - i) < max_width {
                        match self.compute(&items[i..=j])? {
                            Some(extended) => {
                                value = extended;
                                j += 1;
                            }
                            None => break,
                        }
                    }
                    if self.emit(wm, &items[i..j], value)? {
                        derived += 1;
                    }
                    i = j;
                }
            }
        }
        Ok(derived)
    }

    fn compute(&self, window: &[Proposition]) -> Result<Option<Value>, EngineError> {
        let sequence = Sequence::from_propositions(
            vec![self.def.abstracted_from.clone()],
            window.to_vec(),
        );
        let segment = Segment::new(sequence).map_err(EngineError::Interval)?;
        self.algorithm
            .compute(&segment, &self.def.algorithm_params)
            .map_err(|e| EngineError::AlgorithmFailure {
                id: self.def.algorithm_id.clone(),
                reason: e.to_string(),
            })
    }

    fn emit(
        &self,
        wm: &mut WorkingMemory,
        consumed: &[Proposition],
        value: Value,
    ) -> Result<bool, EngineError> {
        let sources: Vec<UniqueId> = consumed.iter().map(|p| p.unique_id.clone()).collect();
        if wm.has_derivation_of(&self.def.id, &sources) {
            return Ok(false);
        }
        let sequence = Sequence::from_propositions(
            vec![self.def.abstracted_from.clone()],
            consumed.to_vec(),
        );
        let segment = Segment::new(sequence).map_err(EngineError::Interval)?;
        let abstraction = Proposition::bare(
            self.def.id.clone(),
            UniqueId::new_derived(),
            Category::AbstractParameter,
        )
        .with_interval(segment.interval())
        .with_property("value", value)
        .with_reference("abstractedFrom", sources.clone());
        debug!(kind = %self.def.id, inputs = sources.len(), "derived abstraction");
        wm.assert_derived(abstraction, &sources);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::{AlgorithmSource, BuiltinAlgorithms};
    use std::collections::BTreeMap;
    use tempora_domain::{Interval, KindId, SourceSystem};

    fn hr(local: &str, at: i64, value: f64) -> Proposition {
        Proposition::bare(
            KindId::from("hr"),
            UniqueId::new(SourceSystem::DataSource("t".to_string()), local),
            Category::PrimitiveParameter,
        )
        .with_interval(Interval::point(at))
        .with_property("value", Value::Number(value))
    }

    fn window(local: &str, start: i64, finish: i64) -> Proposition {
        Proposition::bare(
            KindId::from("window"),
            UniqueId::new(SourceSystem::DataSource("t".to_string()), local),
            Category::Context,
        )
        .with_interval(Interval::closed(start, finish).unwrap())
    }

    fn high_state_action(context_id: Option<KindId>) -> LowLevelAbstractionAction {
        let mut params = BTreeMap::new();
        params.insert("min_threshold".to_string(), Value::Number(100.0));
        params.insert("value".to_string(), Value::from("high"));
        let def = LowLevelAbstractionDefinition {
            id: KindId::from("hr-high"),
            abstracted_from: KindId::from("hr"),
            algorithm_id: "state".to_string(),
            context_id,
            minimum_number_of_values: 1,
            maximum_number_of_values: None,
            algorithm_params: params,
        };
        let algorithm = BuiltinAlgorithms::new()
            .read_algorithm("state")
            .unwrap()
            .unwrap();
        LowLevelAbstractionAction::new(def, algorithm)
    }

    #[test]
    fn test_unbounded_window_extends_over_matching_run() {
        let mut wm = WorkingMemory::with_facts(vec![
            hr("1", 0, 80.0),
            hr("2", 1, 110.0),
            hr("3", 2, 120.0),
            hr("4", 3, 70.0),
            hr("5", 4, 130.0),
        ]);
        let action = high_state_action(None);
        let derived = action.fire(&mut wm).unwrap();
        assert_eq!(derived, 2);

        let abstractions = wm.facts().all_of_kind(&KindId::from("hr-high"));
        assert_eq!(abstractions.len(), 2);
        let first = abstractions[0];
        assert_eq!(first.interval.unwrap().start(), Some(1));
        assert_eq!(first.interval.unwrap().finish(), Some(2));
        assert_eq!(first.property("value"), Some(&Value::from("high")));
        // Provenance covers both consumed inputs.
        assert_eq!(
            wm.derivations().backward_of(&first.unique_id).len(),
            2
        );
    }

    #[test]
    fn test_refire_derives_nothing_new() {
        let mut wm = WorkingMemory::with_facts(vec![hr("1", 0, 110.0)]);
        let action = high_state_action(None);
        assert_eq!(action.fire(&mut wm).unwrap(), 1);
        assert_eq!(action.fire(&mut wm).unwrap(), 0);
    }

    #[test]
    fn test_contexts_partition_the_sequence() {
        let mut wm = WorkingMemory::with_facts(vec![
            hr("1", 1, 110.0),
            hr("2", 2, 115.0),
            hr("3", 11, 120.0),
            window("w1", 0, 5),
            window("w2", 10, 15),
        ]);
        let action = high_state_action(Some(KindId::from("window")));
        let derived = action.fire(&mut wm).unwrap();
        // One run inside each window; the runs are never joined even
        // though the values all match.
        assert_eq!(derived, 2);
        let abstractions = wm.facts().all_of_kind(&KindId::from("hr-high"));
        let spans: Vec<_> = abstractions
            .iter()
            .map(|p| {
                let iv = p.interval.unwrap();
                (iv.start().unwrap(), iv.finish().unwrap())
            })
            .collect();
        assert!(spans.contains(&(1, 2)));
        assert!(spans.contains(&(11, 11)));
    }

    #[test]
    fn test_parameters_outside_every_context_are_ignored() {
        let mut wm = WorkingMemory::with_facts(vec![
            hr("1", 100, 110.0),
            window("w1", 0, 5),
        ]);
        let action = high_state_action(Some(KindId::from("window")));
        assert_eq!(action.fire(&mut wm).unwrap(), 0);
        assert!(wm.facts().all_of_kind(&KindId::from("hr-high")).is_empty());
    }
}
