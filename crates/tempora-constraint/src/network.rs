//! Temporal constraint network - the STP solver surface

use crate::bellman_ford::{shortest_distances, Mode};
use crate::graph::{DistanceGraph, Node};
use std::collections::HashMap;
use std::hash::Hash;
use tempora_domain::{Interval, Relation, Weight};
use thiserror::Error;

/// Errors surfaced by constraint-network queries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstraintError {
    /// The distance graph contains a negative-weight cycle: the interval
    /// constraints are jointly unsatisfiable.
    #[error("inconsistent constraint network: negative cycle detected")]
    Inconsistent,
}

/// A temporal constraint network over keyed intervals.
///
/// Each interval contributes a start and a finish node plus six edges
/// against the fixed time-zero node encoding its specified bounds; a
/// [`Relation`] between two intervals contributes up to eight more edges
/// between their endpoint pairs. Derived quantities are cached until the
/// next mutation.
///
/// Every operation takes `&mut self`: the exclusive borrow is the
/// mutual-exclusion unit, and callers sharing a network across threads
/// wrap it in a `Mutex`.
#[derive(Debug, Clone)]
pub struct ConstraintNetwork<K: Clone + Eq + Hash> {
    graph: DistanceGraph<K>,
    intervals: Vec<K>,
    calc_min_start: Option<Weight>,
    calc_max_start: Option<Weight>,
    calc_min_finish: Option<Weight>,
    calc_max_finish: Option<Weight>,
    calc_min_duration: Option<Weight>,
    calc_max_duration: Option<Weight>,
    dists_from_zero_source: Option<HashMap<Node<K>, Weight>>,
    dists_from_zero_destination: Option<HashMap<Node<K>, Weight>>,
}

impl<K: Clone + Eq + Hash> ConstraintNetwork<K> {
    /// Create an empty network containing only the time-zero node.
    pub fn new() -> Self {
        let mut graph = DistanceGraph::new();
        graph.add_node(Node::TimeZero);
        Self {
            graph,
            intervals: Vec::new(),
            calc_min_start: None,
            calc_max_start: None,
            calc_min_finish: None,
            calc_max_finish: None,
            calc_min_duration: None,
            calc_max_duration: None,
            dists_from_zero_source: None,
            dists_from_zero_destination: None,
        }
    }

    /// Drop every interval and relation.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.graph.add_node(Node::TimeZero);
        self.intervals.clear();
        self.invalidate();
    }

    /// Whether an interval is registered under the key.
    pub fn contains(&self, key: &K) -> bool {
        self.graph.contains_node(&Node::Start(key.clone()))
            && self.graph.contains_node(&Node::Finish(key.clone()))
    }

    /// Number of registered intervals.
    pub fn interval_count(&self) -> usize {
        self.intervals.len()
    }

    /// Add an interval under a key.
    ///
    /// Returns false (and leaves the network untouched) if the key is
    /// already registered. Unspecified bounds arrive as ±∞ weights and do
    /// not constrain the graph.
    pub fn add_interval(&mut self, key: K, interval: &Interval) -> bool {
        if self.contains(&key) {
            return false;
        }
        let start = Node::Start(key.clone());
        let finish = Node::Finish(key.clone());
        self.graph.add_node(start.clone());
        self.graph.add_node(finish.clone());

        self.graph
            .set_edge(&start, &finish, interval.max_duration());
        self.graph
            .set_edge(&finish, &start, interval.min_duration().invert_sign());

        self.graph
            .set_edge(&Node::TimeZero, &start, interval.max_start());
        self.graph
            .set_edge(&start, &Node::TimeZero, interval.min_start().invert_sign());

        self.graph
            .set_edge(&Node::TimeZero, &finish, interval.max_finish());
        self.graph
            .set_edge(&finish, &Node::TimeZero, interval.min_finish().invert_sign());

        self.intervals.push(key);
        self.invalidate();
        true
    }

    /// Remove an interval and every edge touching its nodes.
    ///
    /// Returns false if the key was never added; state is unchanged in
    /// that case, though caches are invalidated regardless.
    pub fn remove_interval(&mut self, key: &K) -> bool {
        self.invalidate();
        let start = Node::Start(key.clone());
        if !self.graph.remove_node(&start) {
            return false;
        }
        let removed_finish = self.graph.remove_node(&Node::Finish(key.clone()));
        debug_assert!(removed_finish, "interval nodes are added in pairs");
        self.intervals.retain(|k| k != key);
        true
    }

    /// Constrain two registered intervals with a relation, adding an edge
    /// for every specified span bound.
    ///
    /// Returns false if the keys are equal or either is unregistered.
    pub fn add_relation(&mut self, lhs: &K, rhs: &K, relation: &Relation) -> bool {
        if lhs == rhs || !self.contains(lhs) || !self.contains(rhs) {
            return false;
        }
        let spans = [
            (
                Node::Start(lhs.clone()),
                Node::Start(rhs.clone()),
                relation.min_span_starts,
                relation.max_span_starts,
            ),
            (
                Node::Start(lhs.clone()),
                Node::Finish(rhs.clone()),
                relation.min_span_start_finish,
                relation.max_span_start_finish,
            ),
            (
                Node::Finish(lhs.clone()),
                Node::Start(rhs.clone()),
                relation.min_span_finish_start,
                relation.max_span_finish_start,
            ),
            (
                Node::Finish(lhs.clone()),
                Node::Finish(rhs.clone()),
                relation.min_span_finishes,
                relation.max_span_finishes,
            ),
        ];
        for (from, to, min, max) in spans {
            if let Some(max) = max {
                self.graph.set_edge(&from, &to, max);
            }
            if let Some(min) = min {
                self.graph.set_edge(&to, &from, min.invert_sign());
            }
        }
        self.invalidate();
        true
    }

    /// Remove every edge between two intervals' endpoint pairs.
    ///
    /// Returns false if the keys are equal or either is unregistered.
    pub fn remove_relation(&mut self, lhs: &K, rhs: &K) -> bool {
        if lhs == rhs || !self.contains(lhs) || !self.contains(rhs) {
            return false;
        }
        let l_start = Node::Start(lhs.clone());
        let l_finish = Node::Finish(lhs.clone());
        let r_start = Node::Start(rhs.clone());
        let r_finish = Node::Finish(rhs.clone());

        self.graph.remove_edge(&l_start, &r_start);
        self.graph.remove_edge(&l_start, &r_finish);
        self.graph.remove_edge(&r_start, &l_start);
        self.graph.remove_edge(&r_start, &l_finish);
        self.graph.remove_edge(&l_finish, &r_start);
        self.graph.remove_edge(&l_finish, &r_finish);
        self.graph.remove_edge(&r_finish, &l_start);
        self.graph.remove_edge(&r_finish, &l_finish);

        self.invalidate();
        true
    }

    /// Whether the network is consistent: the distance graph has no
    /// negative-weight cycle reachable by relaxation from time zero.
    pub fn is_consistent(&mut self) -> bool {
        shortest_distances(&Node::TimeZero, &self.graph, Mode::Source).is_some()
    }

    /// The earliest feasible start across all registered intervals.
    pub fn minimum_start(&mut self) -> Result<Weight, ConstraintError> {
        if self.calc_min_start.is_none() {
            self.ensure_destination_distances()?;
            let dists = self.dists_from_zero_destination.as_ref().expect("cached");
            let mut result = Weight::NegInfinity;
            for key in &self.intervals {
                result = result.max(dists[&Node::Start(key.clone())]);
            }
            self.calc_min_start = Some(result.invert_sign());
        }
        Ok(self.calc_min_start.expect("just computed"))
    }

    /// The tightest latest-start bound across all registered intervals.
    pub fn maximum_start(&mut self) -> Result<Weight, ConstraintError> {
        if self.calc_max_start.is_none() {
            self.ensure_source_distances()?;
            let dists = self.dists_from_zero_source.as_ref().expect("cached");
            let mut result = Weight::PosInfinity;
            for key in &self.intervals {
                result = result.min(dists[&Node::Start(key.clone())]);
            }
            self.calc_max_start = Some(result);
        }
        Ok(self.calc_max_start.expect("just computed"))
    }

    /// The tightest earliest-finish bound across all registered intervals.
    pub fn minimum_finish(&mut self) -> Result<Weight, ConstraintError> {
        if self.calc_min_finish.is_none() {
            self.ensure_destination_distances()?;
            let dists = self.dists_from_zero_destination.as_ref().expect("cached");
            let mut result = Weight::PosInfinity;
            for key in &self.intervals {
                result = result.min(dists[&Node::Finish(key.clone())]);
            }
            self.calc_min_finish = Some(result.invert_sign());
        }
        Ok(self.calc_min_finish.expect("just computed"))
    }

    /// The latest feasible finish across all registered intervals.
    pub fn maximum_finish(&mut self) -> Result<Weight, ConstraintError> {
        if self.calc_max_finish.is_none() {
            self.ensure_source_distances()?;
            let dists = self.dists_from_zero_source.as_ref().expect("cached");
            let mut result = Weight::NegInfinity;
            for key in &self.intervals {
                result = result.max(dists[&Node::Finish(key.clone())]);
            }
            self.calc_max_finish = Some(result);
        }
        Ok(self.calc_max_finish.expect("just computed"))
    }

    /// The smallest feasible start-to-finish distance over all interval
    /// pairs.
    ///
    /// Requires a shortest-path run from every finish node, so it is
    /// computed independently of the cached time-zero passes.
    pub fn minimum_duration(&mut self) -> Result<Weight, ConstraintError> {
        if self.calc_min_duration.is_none() {
            let mut min = Weight::PosInfinity;
            for i in &self.intervals {
                let dists =
                    shortest_distances(&Node::Finish(i.clone()), &self.graph, Mode::Source)
                        .ok_or(ConstraintError::Inconsistent)?;
                for j in &self.intervals {
                    min = min.min(dists[&Node::Start(j.clone())]);
                }
            }
            self.calc_min_duration = Some(min.invert_sign());
        }
        Ok(self.calc_min_duration.expect("just computed"))
    }

    /// The largest feasible start-to-finish distance over all interval
    /// pairs.
    pub fn maximum_duration(&mut self) -> Result<Weight, ConstraintError> {
        if self.calc_max_duration.is_none() {
            let mut max = Weight::ZERO;
            for i in &self.intervals {
                let dists =
                    shortest_distances(&Node::Start(i.clone()), &self.graph, Mode::Source)
                        .ok_or(ConstraintError::Inconsistent)?;
                for j in &self.intervals {
                    max = max.max(dists[&Node::Finish(j.clone())]);
                }
            }
            self.calc_max_duration = Some(max);
        }
        Ok(self.calc_max_duration.expect("just computed"))
    }

    fn ensure_source_distances(&mut self) -> Result<(), ConstraintError> {
        if self.dists_from_zero_source.is_none() {
            let dists = shortest_distances(&Node::TimeZero, &self.graph, Mode::Source)
                .ok_or(ConstraintError::Inconsistent)?;
            self.dists_from_zero_source = Some(dists);
        }
        Ok(())
    }

    fn ensure_destination_distances(&mut self) -> Result<(), ConstraintError> {
        if self.dists_from_zero_destination.is_none() {
            let dists = shortest_distances(&Node::TimeZero, &self.graph, Mode::Destination)
                .ok_or(ConstraintError::Inconsistent)?;
            self.dists_from_zero_destination = Some(dists);
        }
        Ok(())
    }

    fn invalidate(&mut self) {
        self.calc_min_start = None;
        self.calc_max_start = None;
        self.calc_min_finish = None;
        self.calc_max_finish = None;
        self.calc_min_duration = None;
        self.calc_max_duration = None;
        self.dists_from_zero_source = None;
        self.dists_from_zero_destination = None;
    }
}

impl<K: Clone + Eq + Hash> Default for ConstraintNetwork<K> {
    fn default() -> Self {
        Self::new()
    }
}
