//! Tempora Engine Layer
//!
//! The per-key inference engine: a working-memory fact store, the
//! derivation provenance graph, declarative pattern definitions with
//! their algorithm seam, and the pattern evaluator whose actions turn
//! matched patterns into derived propositions.
//!
//! Pattern matching is explicit: definitions compile into tagged actions
//! (low-level abstraction, context combination, slice, sequential
//! pattern) that read the fact store directly and record every derivation
//! in the [`DerivationGraph`]. There is no embedded rule engine.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod actions;
pub mod algorithm;
pub mod definitions;
pub mod derivations;
pub mod error;
pub mod evaluator;
pub mod fact_store;

pub use algorithm::{Algorithm, AlgorithmError, AlgorithmSource, BuiltinAlgorithms};
pub use definitions::{
    ContextDefinition, DefinitionCache, KnowledgeSource, LowLevelAbstractionDefinition,
    PatternDefinition, SequentialPatternDefinition, SliceDefinition,
};
pub use derivations::DerivationGraph;
pub use error::EngineError;
pub use evaluator::{Action, PatternEvaluator};
pub use fact_store::{FactStore, WorkingMemory};
