//! In-memory endpoints - a vector-backed source and a collecting handler
//!
//! These are real implementations of the pipeline seams, useful both for
//! embedding Tempora without a database and for tests.

use crate::queue::QueueObject;
use crate::traits::{DataSource, ResultsHandler};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use tempora_domain::Proposition;
use tempora_engine::DefinitionCache;

/// A data source over a pre-built list of key-grouped batches.
#[derive(Debug, Default)]
pub struct InMemoryDataSource {
    batches: VecDeque<(String, Vec<Proposition>)>,
}

impl InMemoryDataSource {
    /// Create a source that yields the batches in order.
    pub fn new(batches: Vec<(String, Vec<Proposition>)>) -> Self {
        Self {
            batches: batches.into(),
        }
    }
}

impl DataSource for InMemoryDataSource {
    type Error = Infallible;

    fn read_next(&mut self) -> Result<Option<(String, Vec<Proposition>)>, Self::Error> {
        Ok(self.batches.pop_front())
    }
}

/// Everything a [`CollectingResultsHandler`] has observed.
#[derive(Debug, Default)]
pub struct CollectedResults {
    /// Delivered per-key results, in delivery order.
    pub results: Vec<QueueObject>,
    /// How many times `start` ran.
    pub start_calls: usize,
    /// How many times `finish` ran.
    pub finish_calls: usize,
    /// How many times `close` ran.
    pub close_calls: usize,
}

/// A results handler that keeps every delivered result in memory.
///
/// The handler itself moves into the pipeline; clone the shared
/// collection with [`CollectingResultsHandler::collected`] first to
/// inspect the outcome afterwards.
#[derive(Debug, Clone, Default)]
pub struct CollectingResultsHandler {
    collected: Arc<Mutex<CollectedResults>>,
}

impl CollectingResultsHandler {
    /// Create an empty collecting handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared collection this handler writes into.
    pub fn collected(&self) -> Arc<Mutex<CollectedResults>> {
        Arc::clone(&self.collected)
    }
}

impl ResultsHandler for CollectingResultsHandler {
    type Error = Infallible;

    fn start(&mut self, _cache: &DefinitionCache) -> Result<(), Self::Error> {
        self.collected.lock().expect("collector poisoned").start_calls += 1;
        Ok(())
    }

    fn handle_result(&mut self, result: QueueObject) -> Result<(), Self::Error> {
        self.collected
            .lock()
            .expect("collector poisoned")
            .results
            .push(result);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        self.collected.lock().expect("collector poisoned").finish_calls += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        self.collected.lock().expect("collector poisoned").close_calls += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_source_yields_in_order_then_ends() {
        let mut source = InMemoryDataSource::new(vec![
            ("k1".to_string(), vec![]),
            ("k2".to_string(), vec![]),
        ]);
        assert_eq!(source.read_next().unwrap().unwrap().0, "k1");
        assert_eq!(source.read_next().unwrap().unwrap().0, "k2");
        assert!(source.read_next().unwrap().is_none());
    }

    #[test]
    fn test_collector_counts_lifecycle_calls() {
        let mut handler = CollectingResultsHandler::new();
        let collected = handler.collected();
        handler.start(&DefinitionCache::default()).unwrap();
        handler.finish().unwrap();
        handler.close().unwrap();
        let snapshot = collected.lock().unwrap();
        assert_eq!(snapshot.start_calls, 1);
        assert_eq!(snapshot.finish_calls, 1);
        assert_eq!(snapshot.close_calls, 1);
        assert!(snapshot.results.is_empty());
    }
}
