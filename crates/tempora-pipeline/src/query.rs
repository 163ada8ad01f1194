//! Query identity

use std::fmt;

/// Names one run of the pipeline; carried into every collected failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// The query's identifier.
    pub id: String,
}

impl Query {
    /// Create a query.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}
