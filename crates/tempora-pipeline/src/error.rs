//! Error types and the per-query failure report

use tempora_engine::EngineError;
use thiserror::Error;

/// Initialization failures that abort a query before any stage spawns.
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// The configuration failed validation.
    #[error("invalid executor configuration: {0}")]
    Config(String),

    /// The knowledge source could not supply definitions.
    #[error("knowledge source error: {0}")]
    Knowledge(String),

    /// Definitions failed validation or an algorithm could not be
    /// resolved.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// What went wrong while a pipeline was running.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The data source failed mid-stream; no further keys can be read.
    #[error("error reading from the data source: {0}")]
    Read(String),

    /// One key's evaluation failed; only that key's result is dropped.
    #[error("error processing key '{key}': {reason}")]
    Processing {
        /// The key whose batch was abandoned.
        key: String,
        /// The failure.
        reason: String,
    },

    /// The results handler reported a processing failure; the pipeline
    /// stops taking input.
    #[error("results handler failed: {0}")]
    Handler(String),

    /// The results handler failed to close; collected but never fatal.
    #[error("results handler failed to close: {0}")]
    HandlerClose(String),
}

/// A failure collected while running one query.
///
/// Failures are never thrown across stage boundaries; each stage
/// collects its own and the executor reports them together after all
/// stages join.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("query '{query_id}': {kind}")]
pub struct QueryError {
    /// The query the failure belongs to.
    pub query_id: String,
    /// What went wrong.
    pub kind: FailureKind,
}

impl QueryError {
    /// Build a failure for a query.
    pub fn new(query_id: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            query_id: query_id.into(),
            kind,
        }
    }
}

/// The outcome of one query run.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    /// Keys whose evaluation completed.
    pub keys_processed: usize,
    /// Keys whose results reached the handler.
    pub keys_delivered: usize,
    /// Every failure collected across the three stages.
    pub failures: Vec<QueryError>,
}

impl ExecutionReport {
    /// Whether the query completed with zero collected failures.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}
