//! Error types for the engine

use tempora_constraint::ConstraintError;
use thiserror::Error;

/// Errors raised while compiling definitions or evaluating patterns.
///
/// Definition and algorithm-resolution failures only occur while
/// compiling an evaluator and are fatal to the whole query; everything
/// else is a per-key processing error.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A pattern definition referenced an algorithm id the algorithm
    /// source cannot resolve.
    #[error("unknown algorithm '{0}'")]
    UnknownAlgorithm(String),

    /// The algorithm source itself failed.
    #[error("algorithm source error: {0}")]
    AlgorithmSource(String),

    /// A pattern definition is malformed.
    #[error("invalid pattern definition '{id}': {reason}")]
    InvalidDefinition {
        /// The offending definition id.
        id: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An algorithm failed while evaluating a segment.
    #[error("algorithm '{id}' failed: {reason}")]
    AlgorithmFailure {
        /// The failing algorithm id.
        id: String,
        /// The failure reported by the algorithm.
        reason: String,
    },

    /// The key's interval constraints are jointly unsatisfiable.
    #[error(transparent)]
    Constraint(#[from] ConstraintError),

    /// An interval could not be constructed during derivation.
    #[error("interval error: {0}")]
    Interval(String),

    /// Pattern evaluation kept deriving new facts past the pass limit.
    #[error("evaluation did not converge after {0} passes")]
    NonConvergent(usize),
}
