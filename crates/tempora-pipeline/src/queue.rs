//! Queue messages and the per-key result transport unit

use std::collections::HashMap;
use tempora_domain::{Proposition, UniqueId};
use tempora_engine::WorkingMemory;

/// Derivation edges keyed by proposition identity.
pub type DerivationMap = HashMap<UniqueId, Vec<UniqueId>>;

/// One key's finalized results, created by the processing stage and
/// owned by the delivery stage until handed to the results handler.
#[derive(Debug, Clone)]
pub struct QueueObject {
    /// The key this result belongs to.
    pub key_id: String,
    /// Every finalized proposition, observed and derived.
    pub propositions: Vec<Proposition>,
    /// Source-to-derived provenance edges.
    pub forward_derivations: DerivationMap,
    /// Derived-to-source provenance edges.
    pub backward_derivations: DerivationMap,
    /// Resolution map from identity to proposition for reference
    /// following.
    pub references: HashMap<UniqueId, Proposition>,
}

impl QueueObject {
    /// Package a key's working memory into its transport form, releasing
    /// the working memory.
    pub fn package(key_id: impl Into<String>, wm: WorkingMemory) -> Self {
        let propositions: Vec<Proposition> = wm.facts().propositions().cloned().collect();
        let references = propositions
            .iter()
            .map(|p| (p.unique_id.clone(), p.clone()))
            .collect();
        Self {
            key_id: key_id.into(),
            forward_derivations: wm.derivations().forward_map().clone(),
            backward_derivations: wm.derivations().backward_map().clone(),
            propositions,
            references,
        }
    }
}

/// A work-queue message: a key's batch or the end-of-stream sentinel.
#[derive(Debug)]
pub(crate) enum WorkItem {
    /// One key's observed propositions.
    Batch {
        /// The key.
        key_id: String,
        /// The key's batch, in source order.
        propositions: Vec<Proposition>,
    },
    /// The poison pill: no further batches will arrive.
    Done,
}

/// A result-queue message: a finished key or the end-of-stream sentinel.
#[derive(Debug)]
pub(crate) enum ResultItem {
    /// One key's finished results.
    Result(Box<QueueObject>),
    /// The poison pill: no further results will arrive.
    Done,
}
