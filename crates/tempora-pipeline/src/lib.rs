//! Tempora Pipeline Layer
//!
//! Per-query concurrent orchestration: a producer streams key-grouped
//! proposition batches from a data source, a processing stage runs
//! pattern evaluation over each key's working memory, and a
//! result-delivery stage hands finished per-key results to a results
//! handler. The stages are connected by two bounded queues whose
//! capacity is the system's only backpressure mechanism, streams end
//! with an explicit sentinel, and cancellation is cooperative.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod endpoints;
pub mod error;
pub mod executor;
pub mod query;
pub mod queue;
pub mod traits;

pub use config::ExecutorConfig;
pub use endpoints::{CollectedResults, CollectingResultsHandler, InMemoryDataSource};
pub use error::{ExecutionReport, ExecutorError, FailureKind, QueryError};
pub use executor::Executor;
pub use query::Query;
pub use queue::{DerivationMap, QueueObject};
pub use traits::{DataSource, ResultsHandler};
