//! Working-memory fact store - a per-key arena of propositions

use crate::derivations::DerivationGraph;
use crate::error::EngineError;
use std::collections::HashMap;
use tempora_constraint::ConstraintNetwork;
use tempora_domain::{KindId, Proposition, UniqueId};

/// An arena of propositions indexed by unique id and by kind.
///
/// Retract-and-replace is an explicit two-step: retract removes the old
/// index entries, insert adds the new ones. Iteration order is insertion
/// order.
#[derive(Debug, Clone, Default)]
pub struct FactStore {
    arena: Vec<Option<Proposition>>,
    by_uid: HashMap<UniqueId, usize>,
    by_kind: HashMap<KindId, Vec<usize>>,
}

impl FactStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a proposition. Returns false (without mutating) if a fact
    /// with the same unique id is already present.
    pub fn insert(&mut self, proposition: Proposition) -> bool {
        if self.by_uid.contains_key(&proposition.unique_id) {
            return false;
        }
        let slot = self.arena.len();
        self.by_uid.insert(proposition.unique_id.clone(), slot);
        self.by_kind
            .entry(proposition.kind.clone())
            .or_default()
            .push(slot);
        self.arena.push(Some(proposition));
        true
    }

    /// Remove a proposition by identity, returning it.
    pub fn retract(&mut self, uid: &UniqueId) -> Option<Proposition> {
        let slot = self.by_uid.remove(uid)?;
        let proposition = self.arena[slot].take()?;
        if let Some(slots) = self.by_kind.get_mut(&proposition.kind) {
            slots.retain(|s| *s != slot);
        }
        Some(proposition)
    }

    /// Look up a proposition by identity.
    pub fn get(&self, uid: &UniqueId) -> Option<&Proposition> {
        let slot = *self.by_uid.get(uid)?;
        self.arena[slot].as_ref()
    }

    /// Whether a fact with this identity is present.
    pub fn contains(&self, uid: &UniqueId) -> bool {
        self.by_uid.contains_key(uid)
    }

    /// All propositions of one kind, in insertion order.
    pub fn all_of_kind(&self, kind: &KindId) -> Vec<&Proposition> {
        self.by_kind
            .get(kind)
            .map(|slots| {
                slots
                    .iter()
                    .filter_map(|slot| self.arena[*slot].as_ref())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All propositions of any of the given kinds, in insertion order.
    pub fn all_of_kinds(&self, kinds: &[KindId]) -> Vec<&Proposition> {
        self.propositions()
            .filter(|p| kinds.contains(&p.kind))
            .collect()
    }

    /// Iterate over live propositions in insertion order.
    pub fn propositions(&self) -> impl Iterator<Item = &Proposition> {
        self.arena.iter().filter_map(Option::as_ref)
    }

    /// Number of live propositions.
    pub fn len(&self) -> usize {
        self.by_uid.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.by_uid.is_empty()
    }
}

/// One key's working set: the fact store plus its derivation graph.
///
/// Created for a key's batch, consumed when the batch's results are
/// packaged; nothing in it outlives the key.
#[derive(Debug, Clone, Default)]
pub struct WorkingMemory {
    facts: FactStore,
    derivations: DerivationGraph,
}

impl WorkingMemory {
    /// Create an empty working memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the working memory with a key's observed propositions.
    pub fn with_facts(propositions: Vec<Proposition>) -> Self {
        let mut wm = Self::new();
        for p in propositions {
            wm.facts.insert(p);
        }
        wm
    }

    /// The fact store.
    pub fn facts(&self) -> &FactStore {
        &self.facts
    }

    /// Mutable access to the fact store.
    pub fn facts_mut(&mut self) -> &mut FactStore {
        &mut self.facts
    }

    /// The derivation graph.
    pub fn derivations(&self) -> &DerivationGraph {
        &self.derivations
    }

    /// Mutable access to the derivation graph.
    pub fn derivations_mut(&mut self) -> &mut DerivationGraph {
        &mut self.derivations
    }

    /// Assert a derived proposition, recording a derivation edge from
    /// every source it was computed from.
    pub fn assert_derived(&mut self, proposition: Proposition, sources: &[UniqueId]) -> bool {
        let uid = proposition.unique_id.clone();
        if !self.facts.insert(proposition) {
            return false;
        }
        for source in sources {
            self.derivations.assert_forward(source, &uid);
        }
        true
    }

    /// Whether some fact of `kind` was already derived from every one of
    /// `sources`. Keeps repeated evaluation passes from deriving the same
    /// abstraction twice.
    pub fn has_derivation_of(&self, kind: &KindId, sources: &[UniqueId]) -> bool {
        let mut candidates: Option<Vec<&UniqueId>> = None;
        for source in sources {
            let derived = self.derivations.forward_of(source);
            let next: Vec<&UniqueId> = match &candidates {
                None => derived.iter().collect(),
                Some(prev) => derived.iter().filter(|d| prev.contains(d)).collect(),
            };
            if next.is_empty() {
                return false;
            }
            candidates = Some(next);
        }
        candidates
            .unwrap_or_default()
            .iter()
            .any(|uid| self.facts.get(uid).is_some_and(|p| &p.kind == kind))
    }

    /// Remove every fact of the given kinds plus everything transitively
    /// derived from them, returning the removed propositions.
    pub fn remove_by_kind(&mut self, kinds: &[KindId]) -> Vec<Proposition> {
        let seeds: Vec<UniqueId> = self
            .facts
            .propositions()
            .filter(|p| kinds.contains(&p.kind))
            .map(|p| p.unique_id.clone())
            .collect();
        let removed = self.derivations.cascade_remove_forward(seeds);
        let mut out = Vec::with_capacity(removed.len());
        for uid in removed {
            if let Some(p) = self.facts.retract(&uid) {
                out.push(p);
            }
        }
        out
    }

    /// Remove exactly the given facts, scrubbing them from the derivation
    /// graph.
    pub fn remove_all(&mut self, uids: &[UniqueId]) -> Vec<Proposition> {
        self.derivations.remove_all(uids);
        uids.iter().filter_map(|uid| self.facts.retract(uid)).collect()
    }

    /// Validate every temporal fact's interval constraints in one
    /// constraint network.
    ///
    /// Returns the per-key inconsistency error when the combined network
    /// has a negative cycle.
    pub fn validate_consistency(&self) -> Result<(), EngineError> {
        let mut network: ConstraintNetwork<UniqueId> = ConstraintNetwork::new();
        for p in self.facts.propositions() {
            if let Some(interval) = &p.interval {
                network.add_interval(p.unique_id.clone(), interval);
            }
        }
        if network.is_consistent() {
            Ok(())
        } else {
            Err(EngineError::Constraint(
                tempora_constraint::ConstraintError::Inconsistent,
            ))
        }
    }
}
