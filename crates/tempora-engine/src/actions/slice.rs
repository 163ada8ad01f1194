//! Slice extractor - copies the propositions in an index window

use crate::definitions::SliceDefinition;
use crate::error::EngineError;
use crate::fact_store::WorkingMemory;
use tempora_domain::{Category, Proposition, Segment, Sequence, UniqueId};
use tracing::debug;

/// Copies the propositions occupying a configured index window of the
/// temporally sorted source list into working memory as derived facts.
///
/// A non-negative `min_index` selects `[min_index, max_index)` of the
/// ascending sort. A negative `min_index` counts from the end: the sort
/// flips to descending and the window becomes the descending indices
/// `[-max_index - 1, -min_index - 1)`, so `(-2, 0)` selects exactly the
/// last element.
pub struct SliceAction {
    def: SliceDefinition,
}

impl SliceAction {
    /// Build the action for a slice definition.
    pub fn new(def: SliceDefinition) -> Self {
        Self { def }
    }

    /// The definition this action fires for.
    pub fn definition(&self) -> &SliceDefinition {
        &self.def
    }

    /// Evaluate against the working memory. Returns how many derived
    /// facts were created.
    pub fn fire(&self, wm: &mut WorkingMemory) -> Result<usize, EngineError> {
        let sorted = Sequence::from_propositions(
            vec![self.def.abstracted_from.clone()],
            wm.facts()
                .all_of_kind(&self.def.abstracted_from)
                .into_iter()
                .filter(|p| p.interval.is_some())
                .cloned()
                .collect(),
        );
        let mut items = sorted.items().to_vec();
        let (lo, hi) = if self.def.min_index < 0 {
            items.reverse();
            let lo = (-(self.def.max_index as i64) - 1).max(0) as usize;
            let hi = (-(self.def.min_index as i64) - 1).max(0) as usize;
            (lo, hi)
        } else {
            (self.def.min_index as usize, self.def.max_index as usize)
        };
        let hi = hi.min(items.len());
        if lo >= hi {
            return Ok(0);
        }
        let selected = &items[lo..hi];

        if self.def.merged_interval {
            self.emit_merged(wm, selected)
        } else {
            let mut derived = 0;
            for source in selected {
                if self.emit_copy(wm, source)? {
                    derived += 1;
                }
            }
            Ok(derived)
        }
    }

    fn emit_copy(
        &self,
        wm: &mut WorkingMemory,
        source: &Proposition,
    ) -> Result<bool, EngineError> {
        let source_uid = source.unique_id.clone();
        if wm.has_derivation_of(&self.def.id, std::slice::from_ref(&source_uid)) {
            return Ok(false);
        }
        let mut copy = Proposition::bare(
            self.def.id.clone(),
            UniqueId::new_derived(),
            Category::AbstractParameter,
        )
        .with_reference("sliceOf", vec![source_uid.clone()]);
        copy.interval = source.interval;
        copy.properties = source.properties.clone();
        debug!(kind = %self.def.id, source = %source_uid, "derived slice copy");
        wm.assert_derived(copy, &[source_uid]);
        Ok(true)
    }

    fn emit_merged(
        &self,
        wm: &mut WorkingMemory,
        selected: &[Proposition],
    ) -> Result<usize, EngineError> {
        let sources: Vec<UniqueId> = selected.iter().map(|p| p.unique_id.clone()).collect();
        if wm.has_derivation_of(&self.def.id, &sources) {
            return Ok(0);
        }
        let sequence = Sequence::from_propositions(
            vec![self.def.abstracted_from.clone()],
            selected.to_vec(),
        );
        let segment = Segment::new(sequence).map_err(EngineError::Interval)?;
        let merged = Proposition::bare(
            self.def.id.clone(),
            UniqueId::new_derived(),
            Category::AbstractParameter,
        )
        .with_interval(segment.interval())
        .with_reference("sliceOf", sources.clone());
        debug!(kind = %self.def.id, inputs = sources.len(), "derived merged slice");
        wm.assert_derived(merged, &sources);
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempora_domain::{Interval, KindId, SourceSystem};

    fn obs(local: &str, at: i64) -> Proposition {
        Proposition::bare(
            KindId::from("hr"),
            UniqueId::new(SourceSystem::DataSource("t".to_string()), local),
            Category::PrimitiveParameter,
        )
        .with_interval(Interval::point(at))
    }

    fn memory() -> WorkingMemory {
        WorkingMemory::with_facts(vec![
            obs("1", 1),
            obs("2", 2),
            obs("3", 3),
            obs("4", 4),
            obs("5", 5),
        ])
    }

    fn slice(min_index: i32, max_index: i32, merged: bool) -> SliceAction {
        SliceAction::new(SliceDefinition {
            id: KindId::from("sliced"),
            abstracted_from: KindId::from("hr"),
            min_index,
            max_index,
            merged_interval: merged,
        })
    }

    fn derived_positions(wm: &WorkingMemory) -> Vec<i64> {
        wm.facts()
            .all_of_kind(&KindId::from("sliced"))
            .iter()
            .map(|p| p.interval.unwrap().start().unwrap())
            .collect()
    }

    #[test]
    fn test_ascending_window() {
        let mut wm = memory();
        assert_eq!(slice(1, 3, false).fire(&mut wm).unwrap(), 2);
        assert_eq!(derived_positions(&wm), vec![2, 3]);
    }

    #[test]
    fn test_negative_indices_select_from_the_end() {
        let mut wm = memory();
        assert_eq!(slice(-2, 0, false).fire(&mut wm).unwrap(), 1);
        assert_eq!(derived_positions(&wm), vec![5]);
    }

    #[test]
    fn test_window_is_clamped_to_the_list() {
        let mut wm = memory();
        assert_eq!(slice(3, i32::MAX, false).fire(&mut wm).unwrap(), 2);
        assert_eq!(derived_positions(&wm), vec![4, 5]);
    }

    #[test]
    fn test_refire_derives_nothing_new() {
        let mut wm = memory();
        let action = slice(0, 2, false);
        assert_eq!(action.fire(&mut wm).unwrap(), 2);
        assert_eq!(action.fire(&mut wm).unwrap(), 0);
    }

    #[test]
    fn test_merged_interval_spans_the_selection() {
        let mut wm = memory();
        assert_eq!(slice(1, 4, true).fire(&mut wm).unwrap(), 1);
        let merged = wm.facts().all_of_kind(&KindId::from("sliced"));
        assert_eq!(merged.len(), 1);
        let interval = merged[0].interval.unwrap();
        assert_eq!((interval.start(), interval.finish()), (Some(2), Some(4)));
        assert_eq!(wm.derivations().backward_of(&merged[0].unique_id).len(), 3);
    }

    #[test]
    fn test_empty_selection_is_a_no_op() {
        let mut wm = memory();
        assert_eq!(slice(7, 9, false).fire(&mut wm).unwrap(), 0);
    }
}
