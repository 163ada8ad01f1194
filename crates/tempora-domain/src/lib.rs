//! Tempora Domain Layer
//!
//! This crate contains the core value objects for Tempora's temporal
//! reasoning: weights, intervals, interval relations, propositions, and
//! the sequences/segments that pattern evaluation operates on. It carries
//! almost no external dependencies and defines no I/O; infrastructure
//! implementations live in the other crates.
//!
//! ## Key Concepts
//!
//! - **Weight**: a totally ordered timeline distance with ±∞ sentinels
//! - **Interval**: a time span with optional concrete endpoints and
//!   specified start/finish/duration bounds
//! - **Relation**: pairwise distance constraints between two intervals'
//!   endpoints
//! - **Proposition**: an observed or derived temporal fact with identity,
//!   properties, and references
//! - **Sequence/Segment**: ordered same-kind proposition runs and their
//!   minimal enclosing interval

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod interval;
pub mod proposition;
pub mod relation;
pub mod sequence;
pub mod snapshot;
pub mod value;
pub mod weight;

// Re-exports for convenience
pub use interval::{Interval, IntervalBounds};
pub use proposition::{Category, KindId, Proposition, SourceSystem, UniqueId};
pub use relation::Relation;
pub use sequence::{Segment, Sequence};
pub use snapshot::{PropositionSnapshot, SCHEMA_VERSION};
pub use value::Value;
pub use weight::Weight;
