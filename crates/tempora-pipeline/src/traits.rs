//! Seams to the pipeline's external collaborators

use crate::queue::QueueObject;
use tempora_domain::Proposition;
use tempora_engine::DefinitionCache;

/// A lazy, finite, key-grouped source of proposition batches.
///
/// The producer pulls batches one at a time; a source is not restartable
/// mid-query, and a read error aborts the producer.
pub trait DataSource {
    /// Error type for source reads.
    type Error: std::fmt::Display;

    /// Pull the next `(key, batch)` pair, or `None` at end of stream.
    fn read_next(&mut self) -> Result<Option<(String, Vec<Proposition>)>, Self::Error>;
}

/// The destination for finished per-key results.
///
/// The pipeline drives the four-call contract in order: `start` once,
/// `handle_result` per key, `finish` once at a normal end of stream, and
/// `close` exactly once regardless of how the pipeline terminates. Any
/// `handle_result` error is a processing failure and aborts the whole
/// pipeline; retrying transient trouble is the handler's own business.
pub trait ResultsHandler {
    /// Error type for handler operations.
    type Error: std::fmt::Display;

    /// Prepare the handler; receives the resolved definitions so the
    /// destination can interpret the kinds it is about to see.
    fn start(&mut self, cache: &DefinitionCache) -> Result<(), Self::Error>;

    /// Deliver one key's finalized propositions and derivations.
    fn handle_result(&mut self, result: QueueObject) -> Result<(), Self::Error>;

    /// Flush after the last result of a normally-ended stream.
    fn finish(&mut self) -> Result<(), Self::Error>;

    /// Release resources. Invoked exactly once on every termination
    /// path.
    fn close(&mut self) -> Result<(), Self::Error>;
}
