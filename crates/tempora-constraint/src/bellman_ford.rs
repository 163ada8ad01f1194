//! Bellman-Ford shortest distances with negative-cycle detection

use crate::graph::{DistanceGraph, Node};
use std::collections::HashMap;
use std::hash::Hash;
use tempora_domain::Weight;

/// Which direction paths are measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Distances from the source node to every node.
    Source,
    /// Distances from every node to the source node (paths followed
    /// against edge direction).
    Destination,
}

/// Compute single-source shortest distances over the distance graph.
///
/// Edges of weight +∞ impose no constraint and never tighten a distance.
/// Returns `None` when a negative-weight cycle is reachable through the
/// relaxation, meaning the constraints are jointly unsatisfiable.
pub fn shortest_distances<K: Clone + Eq + Hash>(
    source: &Node<K>,
    graph: &DistanceGraph<K>,
    mode: Mode,
) -> Option<HashMap<Node<K>, Weight>> {
    let mut dist: HashMap<Node<K>, Weight> = graph
        .nodes()
        .map(|n| (n.clone(), Weight::PosInfinity))
        .collect();
    if !dist.contains_key(source) {
        return Some(dist);
    }
    dist.insert(source.clone(), Weight::ZERO);

    let passes = graph.node_count().saturating_sub(1);
    for _ in 0..passes {
        if !relax_pass(graph, mode, &mut dist) {
            break;
        }
    }

    // One more improving pass means a negative cycle.
    if relax_pass(graph, mode, &mut dist) {
        None
    } else {
        Some(dist)
    }
}

/// Run one relaxation pass. Returns true if any distance improved.
fn relax_pass<K: Clone + Eq + Hash>(
    graph: &DistanceGraph<K>,
    mode: Mode,
    dist: &mut HashMap<Node<K>, Weight>,
) -> bool {
    let mut improved = false;
    for (from, to, weight) in graph.edges() {
        if weight == Weight::PosInfinity {
            continue;
        }
        let (tail, head) = match mode {
            Mode::Source => (from, to),
            Mode::Destination => (to, from),
        };
        let tail_dist = dist[tail];
        if tail_dist == Weight::PosInfinity {
            continue;
        }
        let candidate = match tail_dist.checked_add(weight) {
            Some(w) => w,
            None => continue,
        };
        if candidate < dist[head] {
            dist.insert(head.clone(), candidate);
            improved = true;
        }
    }
    improved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(Node<&'static str>, Node<&'static str>, i64)]) -> DistanceGraph<&'static str> {
        let mut g = DistanceGraph::new();
        for (from, to, w) in edges {
            g.add_node(from.clone());
            g.add_node(to.clone());
            g.set_edge(from, to, Weight::Finite(*w));
        }
        g
    }

    #[test]
    fn test_source_mode_distances() {
        let g = graph(&[
            (Node::TimeZero, Node::Start("a"), 5),
            (Node::Start("a"), Node::Finish("a"), 3),
            (Node::TimeZero, Node::Finish("a"), 100),
        ]);
        let d = shortest_distances(&Node::TimeZero, &g, Mode::Source).unwrap();
        assert_eq!(d[&Node::Start("a")], Weight::Finite(5));
        assert_eq!(d[&Node::Finish("a")], Weight::Finite(8));
    }

    #[test]
    fn test_destination_mode_follows_reversed_edges() {
        let g = graph(&[
            (Node::Start("a"), Node::TimeZero, 7),
            (Node::Finish("a"), Node::Start("a"), 2),
        ]);
        let d = shortest_distances(&Node::TimeZero, &g, Mode::Destination).unwrap();
        assert_eq!(d[&Node::Start("a")], Weight::Finite(7));
        assert_eq!(d[&Node::Finish("a")], Weight::Finite(9));
    }

    #[test]
    fn test_negative_cycle_detected() {
        let g = graph(&[
            (Node::TimeZero, Node::Start("a"), 1),
            (Node::Start("a"), Node::Finish("a"), -5),
            (Node::Finish("a"), Node::Start("a"), 2),
        ]);
        assert!(shortest_distances(&Node::TimeZero, &g, Mode::Source).is_none());
    }

    #[test]
    fn test_unreachable_nodes_stay_infinite() {
        let mut g = graph(&[(Node::TimeZero, Node::Start("a"), 1)]);
        g.add_node(Node::Start("b"));
        let d = shortest_distances(&Node::TimeZero, &g, Mode::Source).unwrap();
        assert_eq!(d[&Node::Start("b")], Weight::PosInfinity);
    }

    #[test]
    fn test_infinite_edges_do_not_constrain() {
        let mut g = graph(&[(Node::TimeZero, Node::Start("a"), 4)]);
        g.add_node(Node::Start("b"));
        g.set_edge(&Node::TimeZero, &Node::Start("b"), Weight::PosInfinity);
        let d = shortest_distances(&Node::TimeZero, &g, Mode::Source).unwrap();
        assert_eq!(d[&Node::Start("b")], Weight::PosInfinity);
        assert_eq!(d[&Node::Start("a")], Weight::Finite(4));
    }
}
