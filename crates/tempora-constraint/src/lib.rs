//! Tempora Constraint Layer
//!
//! Solves the Simple Temporal Problem (STP) for a set of intervals and
//! their pairwise relations, following Dechter et al., "Temporal
//! Constraint Networks" (Artif. Intell. 1991;49:61-95). Intervals become
//! start/finish nodes in a weighted directed distance graph anchored at a
//! fixed time-zero node; consistency is the absence of a negative-weight
//! cycle, and the tightest feasible bounds fall out of shortest-path
//! computations over that graph.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bellman_ford;
pub mod graph;
pub mod network;

pub use bellman_ford::{shortest_distances, Mode};
pub use graph::{DistanceGraph, Node};
pub use network::{ConstraintError, ConstraintNetwork};
