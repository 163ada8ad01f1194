//! Sequential pattern - ordered chains of related propositions

use crate::definitions::SequentialPatternDefinition;
use crate::error::EngineError;
use crate::fact_store::WorkingMemory;
use tempora_domain::{Category, Proposition, Segment, Sequence, UniqueId};
use tracing::debug;

/// Derives an abstraction from every chain of propositions matching the
/// definition's ordered element kinds, where each consecutive pair
/// satisfies its relation.
///
/// Chains are matched greedily in temporal order: for every candidate
/// first element, each later position takes the earliest not-yet-used
/// proposition of its kind that satisfies the relation to its
/// predecessor. The derived abstraction spans the chain's minimal
/// enclosing interval and is recorded as a derivation of every element.
pub struct SequentialPatternAction {
    def: SequentialPatternDefinition,
}

impl SequentialPatternAction {
    /// Build the action for a sequential pattern definition.
    pub fn new(def: SequentialPatternDefinition) -> Self {
        Self { def }
    }

    /// The definition this action fires for.
    pub fn definition(&self) -> &SequentialPatternDefinition {
        &self.def
    }

    /// Evaluate against the working memory. Returns how many chains were
    /// derived.
    pub fn fire(&self, wm: &mut WorkingMemory) -> Result<usize, EngineError> {
        let candidates: Vec<Vec<Proposition>> = self
            .def
            .elements
            .iter()
            .map(|kind| {
                Sequence::from_propositions(
                    vec![kind.clone()],
                    wm.facts()
                        .all_of_kind(kind)
                        .into_iter()
                        .filter(|p| p.interval.is_some())
                        .cloned()
                        .collect(),
                )
                .items()
                .to_vec()
            })
            .collect();
        if candidates.iter().any(Vec::is_empty) {
            return Ok(0);
        }

        let mut derived = 0;
        for first in &candidates[0] {
            if let Some(chain) = self.extend_chain(first, &candidates) {
                if self.emit(wm, &chain)? {
                    derived += 1;
                }
            }
        }
        Ok(derived)
    }

    /// Greedily complete a chain starting from `first`, or `None` if some
    /// position has no satisfying proposition.
    fn extend_chain(
        &self,
        first: &Proposition,
        candidates: &[Vec<Proposition>],
    ) -> Option<Vec<Proposition>> {
        let mut chain = vec![first.clone()];
        for (position, relation) in self.def.relations.iter().enumerate() {
            let previous = chain.last().expect("chain is never empty");
            let previous_interval = previous.interval.as_ref()?;
            let next = candidates[position + 1].iter().find(|candidate| {
                if chain.iter().any(|c| c.unique_id == candidate.unique_id) {
                    return false;
                }
                match &candidate.interval {
                    Some(interval) => relation.holds_between(previous_interval, interval),
                    None => false,
                }
            })?;
            chain.push(next.clone());
        }
        Some(chain)
    }

    fn emit(&self, wm: &mut WorkingMemory, chain: &[Proposition]) -> Result<bool, EngineError> {
        let sources: Vec<UniqueId> = chain.iter().map(|p| p.unique_id.clone()).collect();
        if wm.has_derivation_of(&self.def.id, &sources) {
            return Ok(false);
        }
        let kinds = self.def.elements.clone();
        let sequence = Sequence::from_propositions(kinds, chain.to_vec());
        let segment = Segment::new(sequence).map_err(EngineError::Interval)?;
        let abstraction = Proposition::bare(
            self.def.id.clone(),
            UniqueId::new_derived(),
            Category::AbstractParameter,
        )
        .with_interval(segment.interval())
        .with_reference("elements", sources.clone());
        debug!(kind = %self.def.id, length = sources.len(), "derived sequential pattern");
        wm.assert_derived(abstraction, &sources);
        Ok(true)
    }
}
