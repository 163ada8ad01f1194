//! The three-stage query executor

use crate::config::ExecutorConfig;
use crate::error::{ExecutionReport, ExecutorError, FailureKind, QueryError};
use crate::query::Query;
use crate::queue::{QueueObject, ResultItem, WorkItem};
use crate::traits::{DataSource, ResultsHandler};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempora_domain::Proposition;
use tempora_engine::{
    AlgorithmSource, DefinitionCache, EngineError, KnowledgeSource, PatternEvaluator,
    WorkingMemory,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Runs queries as a three-stage pipeline: producer, processing stage,
/// and result-delivery stage, connected by two bounded queues.
///
/// Exactly one task runs per stage. A full queue blocks its writer,
/// which is the pipeline's only backpressure; streams end with an
/// explicit sentinel; cancellation is cooperative and propagates forward
/// only (the delivery stage interrupts the producer on a fatal handler
/// error, and a dropped downstream receiver stops its upstream cleanly).
pub struct Executor {
    config: ExecutorConfig,
}

impl Executor {
    /// Create an executor, validating the configuration.
    pub fn new(config: ExecutorConfig) -> Result<Self, ExecutorError> {
        config.validate().map_err(ExecutorError::Config)?;
        Ok(Self { config })
    }

    /// Run one query to completion.
    ///
    /// Definition resolution and evaluator compilation happen before any
    /// stage spawns; their failures return `Err` and nothing runs.
    /// Runtime failures are collected into the report instead - the
    /// query processes as many keys as possible before the first
    /// pipeline-fatal condition.
    pub async fn execute<D, K, A, H>(
        &self,
        query: Query,
        data_source: D,
        knowledge_source: &K,
        algorithm_source: &A,
        results_handler: H,
    ) -> Result<ExecutionReport, ExecutorError>
    where
        D: DataSource + Send + 'static,
        K: KnowledgeSource,
        A: AlgorithmSource,
        H: ResultsHandler + Send + 'static,
        <H as ResultsHandler>::Error: Send,
    {
        let definitions = knowledge_source
            .read_definitions()
            .map_err(|e| ExecutorError::Knowledge(e.to_string()))?;
        let cache = DefinitionCache::new(definitions)?;
        let evaluator = PatternEvaluator::compile(&cache, algorithm_source)?;
        info!(query = %query, definitions = cache.len(), "starting query pipeline");

        let (work_tx, work_rx) = mpsc::channel(self.config.work_queue_capacity);
        let (result_tx, result_rx) = mpsc::channel(self.config.result_queue_capacity);
        let interrupt = Arc::new(AtomicBool::new(false));

        let producer = spawn_producer(query.id.clone(), data_source, work_tx, interrupt.clone());
        let processor = spawn_processor(
            query.id.clone(),
            evaluator,
            self.config.max_evaluation_passes,
            work_rx,
            result_tx,
        );
        let deliverer = spawn_deliverer(query.id.clone(), results_handler, cache, result_rx, interrupt);

        let mut report = ExecutionReport::default();
        match producer.await {
            Ok(failures) => report.failures.extend(failures),
            Err(e) => report.failures.push(QueryError::new(
                &query.id,
                FailureKind::Read(format!("producer task failed: {}", e)),
            )),
        }
        match processor.await {
            Ok((failures, processed)) => {
                report.failures.extend(failures);
                report.keys_processed = processed;
            }
            Err(e) => report.failures.push(QueryError::new(
                &query.id,
                FailureKind::Processing {
                    key: "<processing stage>".to_string(),
                    reason: format!("task failed: {}", e),
                },
            )),
        }
        match deliverer.await {
            Ok((failures, delivered)) => {
                report.failures.extend(failures);
                report.keys_delivered = delivered;
            }
            Err(e) => report.failures.push(QueryError::new(
                &query.id,
                FailureKind::Handler(format!("delivery task failed: {}", e)),
            )),
        }

        info!(
            query = %query,
            keys_processed = report.keys_processed,
            keys_delivered = report.keys_delivered,
            failures = report.failures.len(),
            "query pipeline finished"
        );
        Ok(report)
    }
}

/// The producer: pulls key-grouped batches from the source and pushes
/// them onto the work queue, then pushes the sentinel once on every exit
/// path.
///
/// The source is a synchronous pull iterator, so the producer runs on
/// the blocking pool; the interrupt flag is observed before each read.
fn spawn_producer<D>(
    query_id: String,
    mut source: D,
    work_tx: mpsc::Sender<WorkItem>,
    interrupt: Arc<AtomicBool>,
) -> JoinHandle<Vec<QueryError>>
where
    D: DataSource + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut failures = Vec::new();
        let mut batches = 0usize;
        loop {
            if interrupt.load(Ordering::SeqCst) {
                debug!("producer interrupted; stopping reads");
                break;
            }
            match source.read_next() {
                Ok(Some((key_id, propositions))) => {
                    debug!(key = %key_id, size = propositions.len(), "read batch");
                    let item = WorkItem::Batch {
                        key_id,
                        propositions,
                    };
                    if work_tx.blocking_send(item).is_err() {
                        // Downstream hung up; treated as interruption.
                        break;
                    }
                    batches += 1;
                }
                Ok(None) => break,
                Err(e) => {
                    failures.push(QueryError::new(&query_id, FailureKind::Read(e.to_string())));
                    break;
                }
            }
        }
        let _ = work_tx.blocking_send(WorkItem::Done);
        debug!(batches, "producer finished");
        failures
    })
}

/// The processing stage: pops batches until the sentinel, runs pattern
/// evaluation per key, and pushes each key's packaged result.
///
/// A per-key failure drops only that key; the stage continues with the
/// next batch. The key's working memory is created and released inside
/// the iteration, so nothing leaks into the next key.
fn spawn_processor(
    query_id: String,
    evaluator: PatternEvaluator,
    max_passes: usize,
    mut work_rx: mpsc::Receiver<WorkItem>,
    result_tx: mpsc::Sender<ResultItem>,
) -> JoinHandle<(Vec<QueryError>, usize)> {
    tokio::spawn(async move {
        let mut failures = Vec::new();
        let mut processed = 0usize;
        while let Some(item) = work_rx.recv().await {
            let (key_id, propositions) = match item {
                WorkItem::Done => break,
                WorkItem::Batch {
                    key_id,
                    propositions,
                } => (key_id, propositions),
            };
            match process_key(&evaluator, &key_id, propositions, max_passes) {
                Ok(queue_object) => {
                    if result_tx
                        .send(ResultItem::Result(Box::new(queue_object)))
                        .await
                        .is_err()
                    {
                        debug!("delivery stage hung up; stopping");
                        break;
                    }
                    processed += 1;
                }
                Err(e) => {
                    warn!(key = %key_id, error = %e, "abandoning key");
                    failures.push(QueryError::new(
                        &query_id,
                        FailureKind::Processing {
                            key: key_id,
                            reason: e.to_string(),
                        },
                    ));
                }
            }
        }
        let _ = result_tx.send(ResultItem::Done).await;
        debug!(processed, "processing stage finished");
        (failures, processed)
    })
}

fn process_key(
    evaluator: &PatternEvaluator,
    key_id: &str,
    propositions: Vec<Proposition>,
    max_passes: usize,
) -> Result<QueueObject, EngineError> {
    let mut wm = WorkingMemory::with_facts(propositions);
    evaluator.evaluate(&mut wm, max_passes)?;
    wm.validate_consistency()?;
    Ok(QueueObject::package(key_id, wm))
}

/// The result-delivery stage: drives the handler's four-call contract.
///
/// A `handle_result` failure is recorded, interrupts the producer, and
/// stops consumption - the single condition that aborts the pipeline
/// early. `close` runs exactly once no matter how the stage terminates;
/// a close failure is collected but never interrupts anything.
fn spawn_deliverer<H>(
    query_id: String,
    mut handler: H,
    cache: DefinitionCache,
    mut result_rx: mpsc::Receiver<ResultItem>,
    interrupt: Arc<AtomicBool>,
) -> JoinHandle<(Vec<QueryError>, usize)>
where
    H: ResultsHandler + Send + 'static,
    <H as ResultsHandler>::Error: Send,
{
    tokio::spawn(async move {
        let mut failures = Vec::new();
        let mut delivered = 0usize;
        match handler.start(&cache) {
            Err(e) => {
                failures.push(QueryError::new(
                    &query_id,
                    FailureKind::Handler(e.to_string()),
                ));
                interrupt.store(true, Ordering::SeqCst);
            }
            Ok(()) => {
                while let Some(item) = result_rx.recv().await {
                    match item {
                        ResultItem::Done => {
                            if let Err(e) = handler.finish() {
                                failures.push(QueryError::new(
                                    &query_id,
                                    FailureKind::Handler(e.to_string()),
                                ));
                                interrupt.store(true, Ordering::SeqCst);
                            }
                            break;
                        }
                        ResultItem::Result(queue_object) => {
                            let key = queue_object.key_id.clone();
                            match handler.handle_result(*queue_object) {
                                Ok(()) => {
                                    debug!(key = %key, "result delivered");
                                    delivered += 1;
                                }
                                Err(e) => {
                                    warn!(
                                        key = %key,
                                        error = %e,
                                        "results handler failed; interrupting producer"
                                    );
                                    failures.push(QueryError::new(
                                        &query_id,
                                        FailureKind::Handler(e.to_string()),
                                    ));
                                    interrupt.store(true, Ordering::SeqCst);
                                    break;
                                }
                            }
                        }
                    }
                }
            }
        }
        if let Err(e) = handler.close() {
            failures.push(QueryError::new(
                &query_id,
                FailureKind::HandlerClose(e.to_string()),
            ));
        }
        debug!(delivered, "delivery stage finished");
        (failures, delivered)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = ExecutorConfig::default();
        config.result_queue_capacity = 0;
        assert!(matches!(
            Executor::new(config),
            Err(ExecutorError::Config(_))
        ));
    }
}
