//! End-to-end pipeline tests: real executor, in-memory endpoints.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempora_domain::{
    Category, Interval, KindId, Proposition, Segment, SourceSystem, UniqueId, Value,
};
use tempora_engine::{
    Algorithm, AlgorithmError, BuiltinAlgorithms, DefinitionCache, KnowledgeSource,
    LowLevelAbstractionDefinition, PatternDefinition,
};
use tempora_pipeline::{
    CollectingResultsHandler, DataSource, Executor, ExecutorConfig, ExecutorError, FailureKind,
    InMemoryDataSource, Query, QueueObject, ResultsHandler,
};

fn hr(key: &str, n: u32, at: i64, value: f64) -> Proposition {
    Proposition::bare(
        KindId::from("hr"),
        UniqueId::new(
            SourceSystem::DataSource("icu".to_string()),
            format!("{}-{}", key, n),
        ),
        Category::PrimitiveParameter,
    )
    .with_interval(Interval::point(at))
    .with_property("value", Value::Number(value))
}

fn batch(key: &str, values: &[(i64, f64)]) -> (String, Vec<Proposition>) {
    (
        key.to_string(),
        values
            .iter()
            .enumerate()
            .map(|(i, (at, v))| hr(key, i as u32, *at, *v))
            .collect(),
    )
}

/// Knowledge source over a fixed definition list.
struct StaticKnowledge(Vec<PatternDefinition>);

impl KnowledgeSource for StaticKnowledge {
    type Error = String;

    fn read_definitions(&self) -> Result<Vec<PatternDefinition>, Self::Error> {
        Ok(self.0.clone())
    }
}

fn hr_high_definition(algorithm_id: &str) -> PatternDefinition {
    let mut params = BTreeMap::new();
    params.insert("min_threshold".to_string(), Value::Number(100.0));
    params.insert("value".to_string(), Value::from("high"));
    PatternDefinition::LowLevelAbstraction(LowLevelAbstractionDefinition {
        id: KindId::from("hr-high"),
        abstracted_from: KindId::from("hr"),
        algorithm_id: algorithm_id.to_string(),
        context_id: None,
        minimum_number_of_values: 1,
        maximum_number_of_values: None,
        algorithm_params: params,
    })
}

#[tokio::test]
async fn test_three_keys_all_succeed() {
    let source = InMemoryDataSource::new(vec![
        batch("k1", &[(0, 110.0), (1, 120.0)]),
        batch("k2", &[(0, 80.0)]),
        batch("k3", &[(0, 130.0)]),
    ]);
    let handler = CollectingResultsHandler::new();
    let collected = handler.collected();

    let executor = Executor::new(ExecutorConfig::default()).unwrap();
    let report = executor
        .execute(
            Query::new("q1"),
            source,
            &StaticKnowledge(vec![hr_high_definition("state")]),
            &BuiltinAlgorithms::new(),
            handler,
        )
        .await
        .unwrap();

    assert!(report.is_success(), "failures: {:?}", report.failures);
    assert_eq!(report.keys_processed, 3);
    assert_eq!(report.keys_delivered, 3);

    let collected = collected.lock().unwrap();
    assert_eq!(collected.close_calls, 1);
    assert_eq!(collected.finish_calls, 1);
    assert_eq!(collected.start_calls, 1);
    let keys: Vec<_> = collected.results.iter().map(|r| r.key_id.clone()).collect();
    // FIFO through the linear pipeline preserves key order end to end.
    assert_eq!(keys, vec!["k1", "k2", "k3"]);

    // k1's sustained high run became a single derived abstraction with
    // full provenance.
    let k1 = &collected.results[0];
    let highs: Vec<_> = k1
        .propositions
        .iter()
        .filter(|p| p.kind == KindId::from("hr-high"))
        .collect();
    assert_eq!(highs.len(), 1);
    assert_eq!(
        k1.backward_derivations[&highs[0].unique_id].len(),
        2,
        "abstraction derives from both observations"
    );
    assert!(k1.references.contains_key(&highs[0].unique_id));

    // k2 never crossed the threshold.
    let k2 = &collected.results[1];
    assert!(k2
        .propositions
        .iter()
        .all(|p| p.kind != KindId::from("hr-high")));
}

/// A source whose gated key only becomes available once the shared abort
/// flag is raised - a deterministic stand-in for a slow source read
/// overtaken by the pipeline abort.
struct GatedSource {
    batches: VecDeque<(String, Vec<Proposition>)>,
    gated_key: String,
    abort_flag: Arc<AtomicBool>,
    reads: Arc<Mutex<Vec<String>>>,
}

impl DataSource for GatedSource {
    type Error = String;

    fn read_next(&mut self) -> Result<Option<(String, Vec<Proposition>)>, Self::Error> {
        if let Some((next_key, _)) = self.batches.front() {
            if *next_key == self.gated_key {
                for _ in 0..500 {
                    if self.abort_flag.load(Ordering::SeqCst) {
                        return Ok(None);
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
            }
        }
        match self.batches.pop_front() {
            Some((key, propositions)) => {
                self.reads.lock().unwrap().push(key.clone());
                Ok(Some((key, propositions)))
            }
            None => Ok(None),
        }
    }
}

/// A handler that rejects one key's results as a processing failure.
struct FailingHandler {
    fail_on: String,
    failed: Arc<AtomicBool>,
    delivered: Arc<Mutex<Vec<String>>>,
    close_calls: Arc<Mutex<usize>>,
    finish_calls: Arc<Mutex<usize>>,
}

impl ResultsHandler for FailingHandler {
    type Error = String;

    fn start(&mut self, _cache: &DefinitionCache) -> Result<(), Self::Error> {
        Ok(())
    }

    fn handle_result(&mut self, result: QueueObject) -> Result<(), Self::Error> {
        if result.key_id == self.fail_on {
            self.failed.store(true, Ordering::SeqCst);
            return Err(format!("destination rejected key '{}'", result.key_id));
        }
        self.delivered.lock().unwrap().push(result.key_id);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        *self.finish_calls.lock().unwrap() += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        *self.close_calls.lock().unwrap() += 1;
        Ok(())
    }
}

#[tokio::test]
async fn test_handler_failure_aborts_pipeline_early() {
    let abort_flag = Arc::new(AtomicBool::new(false));
    let reads = Arc::new(Mutex::new(Vec::new()));
    let source = GatedSource {
        batches: VecDeque::from(vec![
            batch("k1", &[(0, 110.0)]),
            batch("k2", &[(0, 120.0)]),
            batch("k3", &[(0, 130.0)]),
        ]),
        gated_key: "k3".to_string(),
        abort_flag: abort_flag.clone(),
        reads: reads.clone(),
    };
    let delivered = Arc::new(Mutex::new(Vec::new()));
    let close_calls = Arc::new(Mutex::new(0));
    let finish_calls = Arc::new(Mutex::new(0));
    let handler = FailingHandler {
        fail_on: "k2".to_string(),
        failed: abort_flag,
        delivered: delivered.clone(),
        close_calls: close_calls.clone(),
        finish_calls: finish_calls.clone(),
    };

    let executor = Executor::new(ExecutorConfig::default()).unwrap();
    let report = executor
        .execute(
            Query::new("q2"),
            source,
            &StaticKnowledge(vec![]),
            &BuiltinAlgorithms::new(),
            handler,
        )
        .await
        .unwrap();

    // Exactly one failure: the handler's.
    assert_eq!(report.failures.len(), 1, "failures: {:?}", report.failures);
    assert!(matches!(report.failures[0].kind, FailureKind::Handler(_)));

    // Key 1 made it through; key 3 was never read from the source.
    assert_eq!(*delivered.lock().unwrap(), vec!["k1".to_string()]);
    assert_eq!(
        *reads.lock().unwrap(),
        vec!["k1".to_string(), "k2".to_string()]
    );

    // close() still ran, exactly once; finish() belongs to the normal
    // path only.
    assert_eq!(*close_calls.lock().unwrap(), 1);
    assert_eq!(*finish_calls.lock().unwrap(), 0);
}

/// A source that fails mid-stream.
struct FailingSource {
    batches: VecDeque<(String, Vec<Proposition>)>,
}

impl DataSource for FailingSource {
    type Error = String;

    fn read_next(&mut self) -> Result<Option<(String, Vec<Proposition>)>, Self::Error> {
        match self.batches.pop_front() {
            Some(batch) => Ok(Some(batch)),
            None => Err("connection lost".to_string()),
        }
    }
}

#[tokio::test]
async fn test_read_error_is_fatal_but_drains_cleanly() {
    let source = FailingSource {
        batches: VecDeque::from(vec![batch("k1", &[(0, 110.0)])]),
    };
    let handler = CollectingResultsHandler::new();
    let collected = handler.collected();

    let executor = Executor::new(ExecutorConfig::default()).unwrap();
    let report = executor
        .execute(
            Query::new("q3"),
            source,
            &StaticKnowledge(vec![]),
            &BuiltinAlgorithms::new(),
            handler,
        )
        .await
        .unwrap();

    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0].kind, FailureKind::Read(_)));
    assert_eq!(report.keys_delivered, 1);

    // The delivery stage drained to its sentinel: finish and close both
    // ran despite the fatal read.
    let collected = collected.lock().unwrap();
    assert_eq!(collected.results.len(), 1);
    assert_eq!(collected.finish_calls, 1);
    assert_eq!(collected.close_calls, 1);
}

/// An algorithm that fails on a poison observation value.
struct ExplodingAlgorithm;

impl Algorithm for ExplodingAlgorithm {
    fn id(&self) -> &str {
        "explode-on-666"
    }

    fn compute(
        &self,
        segment: &Segment,
        _params: &BTreeMap<String, Value>,
    ) -> Result<Option<Value>, AlgorithmError> {
        for p in segment.items() {
            if p.property("value").and_then(Value::as_number) == Some(666.0) {
                return Err(AlgorithmError("encountered poison value".to_string()));
            }
        }
        Ok(Some(Value::Boolean(true)))
    }
}

#[tokio::test]
async fn test_per_key_failure_drops_only_that_key() {
    let source = InMemoryDataSource::new(vec![
        batch("k1", &[(0, 110.0)]),
        batch("k2", &[(0, 666.0)]),
        batch("k3", &[(0, 130.0)]),
    ]);
    let handler = CollectingResultsHandler::new();
    let collected = handler.collected();

    let mut algorithms = BuiltinAlgorithms::new();
    algorithms.register(Arc::new(ExplodingAlgorithm));

    let executor = Executor::new(ExecutorConfig::default()).unwrap();
    let report = executor
        .execute(
            Query::new("q4"),
            source,
            &StaticKnowledge(vec![hr_high_definition("explode-on-666")]),
            &algorithms,
            handler,
        )
        .await
        .unwrap();

    assert_eq!(report.failures.len(), 1);
    match &report.failures[0].kind {
        FailureKind::Processing { key, .. } => assert_eq!(key, "k2"),
        other => panic!("unexpected failure kind: {:?}", other),
    }
    assert_eq!(report.keys_processed, 2);

    let collected = collected.lock().unwrap();
    let keys: Vec<_> = collected.results.iter().map(|r| r.key_id.clone()).collect();
    assert_eq!(keys, vec!["k1", "k3"]);
    assert_eq!(collected.close_calls, 1);
}

#[tokio::test]
async fn test_unknown_algorithm_aborts_before_the_pipeline_starts() {
    let source = InMemoryDataSource::new(vec![batch("k1", &[(0, 110.0)])]);
    let handler = CollectingResultsHandler::new();
    let collected = handler.collected();

    let executor = Executor::new(ExecutorConfig::default()).unwrap();
    let result = executor
        .execute(
            Query::new("q5"),
            source,
            &StaticKnowledge(vec![hr_high_definition("no-such-algorithm")]),
            &BuiltinAlgorithms::new(),
            handler,
        )
        .await;

    assert!(matches!(result, Err(ExecutorError::Engine(_))));
    // Nothing ran: the handler was never started or closed.
    let collected = collected.lock().unwrap();
    assert_eq!(collected.start_calls, 0);
    assert_eq!(collected.close_calls, 0);
}
