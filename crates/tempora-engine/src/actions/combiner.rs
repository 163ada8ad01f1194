//! Context combiner - merges adjacent context windows

use crate::definitions::ContextDefinition;
use crate::error::EngineError;
use crate::fact_store::WorkingMemory;
use tempora_domain::{Category, Proposition, Segment, Sequence, UniqueId};
use tracing::debug;

/// Merges pairs of adjacent contexts of one kind into a single context
/// spanning both, re-pointing the provenance of the originals at the
/// replacement.
///
/// Two contexts are adjacent when the later one starts no later than the
/// earlier one finishes (they touch or overlap). Merging repeats until no
/// adjacent pair remains, so a chain of touching windows collapses into
/// one.
pub struct ContextCombinerAction {
    def: ContextDefinition,
}

impl ContextCombinerAction {
    /// Build the action for a combinable context kind.
    pub fn new(def: ContextDefinition) -> Self {
        Self { def }
    }

    /// The definition this action fires for.
    pub fn definition(&self) -> &ContextDefinition {
        &self.def
    }

    /// Merge until no adjacent pair remains. Returns how many merges
    /// happened.
    pub fn fire(&self, wm: &mut WorkingMemory) -> Result<usize, EngineError> {
        let mut combined = 0;
        while let Some((first, second)) = self.find_adjacent_pair(wm) {
            self.combine(wm, first, second)?;
            combined += 1;
        }
        Ok(combined)
    }

    fn find_adjacent_pair(&self, wm: &WorkingMemory) -> Option<(Proposition, Proposition)> {
        let contexts = Sequence::from_propositions(
            vec![self.def.id.clone()],
            wm.facts()
                .all_of_kind(&self.def.id)
                .into_iter()
                .filter(|p| p.interval.is_some())
                .cloned()
                .collect(),
        );
        let items = contexts.items();
        for pair in items.windows(2) {
            let earlier = pair[0].interval.as_ref().expect("filtered above");
            let later = pair[1].interval.as_ref().expect("filtered above");
            if later.min_start() <= earlier.max_finish() {
                return Some((pair[0].clone(), pair[1].clone()));
            }
        }
        None
    }

    /// Build the replacement context over both originals' minimal
    /// enclosing interval, retract the originals, and reattach the
    /// provenance.
    ///
    /// Only backward edges need reattaching: forward derivations from a
    /// context do not yet exist at combination time.
    fn combine(
        &self,
        wm: &mut WorkingMemory,
        first: Proposition,
        second: Proposition,
    ) -> Result<(), EngineError> {
        let sequence = Sequence::from_propositions(
            vec![self.def.id.clone()],
            vec![first.clone(), second.clone()],
        );
        let segment = Segment::new(sequence).map_err(EngineError::Interval)?;
        let result = Proposition::bare(
            self.def.id.clone(),
            UniqueId::new_derived(),
            Category::Context,
        )
        .with_interval(segment.interval());
        debug!(kind = %self.def.id, replacement = %result.unique_id, "combined contexts");

        wm.facts_mut().retract(&first.unique_id);
        wm.facts_mut().retract(&second.unique_id);
        wm.facts_mut().insert(result.clone());

        let first_backward = wm.derivations_mut().retract_backward(&first.unique_id);
        let second_backward = wm.derivations_mut().retract_backward(&second.unique_id);
        for source in first_backward {
            wm.derivations_mut()
                .replace_forward(&source, &first.unique_id, &result.unique_id);
            wm.derivations_mut()
                .assert_backward(&result.unique_id, &source);
        }
        for source in second_backward {
            wm.derivations_mut()
                .replace_forward(&source, &second.unique_id, &result.unique_id);
            wm.derivations_mut()
                .assert_backward(&result.unique_id, &source);
        }
        Ok(())
    }
}
