//! Derivation graph - provenance edges between propositions

use std::collections::{HashMap, HashSet, VecDeque};
use tempora_domain::UniqueId;

/// In-memory provenance store for one key's processing.
///
/// Forward edges run from a source proposition to the facts derived from
/// it; backward edges run from a derived fact to its sources. Both maps
/// are keyed by proposition identity ([`UniqueId`]), never by content.
///
/// The assertion and replacement operations keep the two maps mirrored:
/// `backward[d]` contains `s` iff `forward[s]` contains `d`. The retract
/// operations are the deliberate exception - they return and clear one
/// side as the first half of a retract-and-replace two-step, and the
/// caller restores the mirror by re-pointing the other side.
#[derive(Debug, Clone, Default)]
pub struct DerivationGraph {
    forward: HashMap<UniqueId, Vec<UniqueId>>,
    backward: HashMap<UniqueId, Vec<UniqueId>>,
}

impl DerivationGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `derived` was derived from `source`.
    pub fn assert_forward(&mut self, source: &UniqueId, derived: &UniqueId) {
        insert_unique(self.forward.entry(source.clone()).or_default(), derived);
        insert_unique(self.backward.entry(derived.clone()).or_default(), source);
    }

    /// Record that `derived` was derived from `source`, derived-first.
    pub fn assert_backward(&mut self, derived: &UniqueId, source: &UniqueId) {
        self.assert_forward(source, derived);
    }

    /// Everything derived from `p`.
    pub fn forward_of(&self, p: &UniqueId) -> &[UniqueId] {
        self.forward.get(p).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Everything `p` was derived from.
    pub fn backward_of(&self, p: &UniqueId) -> &[UniqueId] {
        self.backward.get(p).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Return and clear the facts derived from `p`.
    pub fn retract_forward(&mut self, p: &UniqueId) -> Vec<UniqueId> {
        self.forward.remove(p).unwrap_or_default()
    }

    /// Return and clear the sources `p` was derived from.
    pub fn retract_backward(&mut self, p: &UniqueId) -> Vec<UniqueId> {
        self.backward.remove(p).unwrap_or_default()
    }

    /// In `forward[source]`, replace `old_derived` with `new_derived`
    /// (set semantics: no duplicate is created if `new_derived` is
    /// already present), mirroring the change in the backward map.
    pub fn replace_forward(
        &mut self,
        source: &UniqueId,
        old_derived: &UniqueId,
        new_derived: &UniqueId,
    ) {
        if let Some(derived) = self.forward.get_mut(source) {
            derived.retain(|d| d != old_derived);
            insert_unique(derived, new_derived);
        }
        if let Some(sources) = self.backward.get_mut(old_derived) {
            sources.retain(|s| s != source);
        }
        insert_unique(self.backward.entry(new_derived.clone()).or_default(), source);
    }

    /// Remove the propositions from both maps, both as keys and as edge
    /// members.
    pub fn remove_all(&mut self, uids: &[UniqueId]) {
        let removing: HashSet<&UniqueId> = uids.iter().collect();
        for uid in uids {
            self.forward.remove(uid);
            self.backward.remove(uid);
        }
        for edges in self.forward.values_mut() {
            edges.retain(|e| !removing.contains(e));
        }
        for edges in self.backward.values_mut() {
            edges.retain(|e| !removing.contains(e));
        }
    }

    /// Remove the seeds and everything transitively derived from them,
    /// sweeping both maps. Returns the full removed set, seeds included.
    pub fn cascade_remove_forward(
        &mut self,
        seeds: impl IntoIterator<Item = UniqueId>,
    ) -> HashSet<UniqueId> {
        let mut removed: HashSet<UniqueId> = HashSet::new();
        let mut queue: VecDeque<UniqueId> = seeds.into_iter().collect();
        while let Some(uid) = queue.pop_front() {
            if !removed.insert(uid.clone()) {
                continue;
            }
            if let Some(derived) = self.forward.remove(&uid) {
                queue.extend(derived);
            }
        }
        for uid in &removed {
            self.backward.remove(uid);
        }
        for edges in self.forward.values_mut() {
            edges.retain(|e| !removed.contains(e));
        }
        for edges in self.backward.values_mut() {
            edges.retain(|e| !removed.contains(e));
        }
        removed
    }

    /// The full forward map.
    pub fn forward_map(&self) -> &HashMap<UniqueId, Vec<UniqueId>> {
        &self.forward
    }

    /// The full backward map.
    pub fn backward_map(&self) -> &HashMap<UniqueId, Vec<UniqueId>> {
        &self.backward
    }

    /// Check the mirror invariant; used by tests.
    pub fn is_mirrored(&self) -> bool {
        self.forward.iter().all(|(s, ds)| {
            ds.iter()
                .all(|d| self.backward.get(d).is_some_and(|ss| ss.contains(s)))
        }) && self.backward.iter().all(|(d, ss)| {
            ss.iter()
                .all(|s| self.forward.get(s).is_some_and(|ds| ds.contains(d)))
        })
    }
}

fn insert_unique(edges: &mut Vec<UniqueId>, uid: &UniqueId) {
    if !edges.contains(uid) {
        edges.push(uid.clone());
    }
}
