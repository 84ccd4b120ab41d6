//! Query queue
//!
//! The controller owns its [`QuerySource`] and is the only party that moves
//! its cursor, through [`QuerySource::consume_current_query`].

use crate::error::{Error, Result};
use crate::types::Query;
use std::path::Path;

/// Ordered source of search queries
pub trait QuerySource: Send {
    /// Query at the cursor, or None once every query is consumed
    fn next_query(&self) -> Option<Query>;

    /// Advance past the current query
    fn consume_current_query(&mut self);

    /// Whether every query has been consumed
    fn all_queries_completed(&self) -> bool;
}

/// In-memory query queue with a forward-only cursor
#[derive(Clone, Debug, Default)]
pub struct QueryQueue {
    queries: Vec<Query>,
    cursor: usize,
}

impl QueryQueue {
    /// Create a queue from search terms, skipping blank ones
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queries = terms
            .into_iter()
            .map(Into::into)
            .map(|term| term.trim().to_string())
            .filter(|term| !term.is_empty())
            .map(Query)
            .collect();
        Self { queries, cursor: 0 }
    }

    /// Parse a query list: one query per line, `#` comments and blank lines skipped
    pub fn parse(content: &str) -> Self {
        Self::new(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#')),
        )
    }

    /// Read a query list from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read query file {}: {e}", path.display()),
            key: Some("query_file".to_string()),
        })?;
        Ok(Self::parse(&content))
    }

    /// Append more queries at the end of the queue
    pub fn extend(&mut self, other: QueryQueue) {
        self.queries.extend(other.queries);
    }

    /// Total number of queries, consumed or not
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Whether the queue was created without any query
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Number of queries consumed so far
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl QuerySource for QueryQueue {
    fn next_query(&self) -> Option<Query> {
        self.queries.get(self.cursor).cloned()
    }

    fn consume_current_query(&mut self) {
        if self.cursor < self.queries.len() {
            self.cursor += 1;
        }
        tracing::trace!(
            consumed = self.cursor,
            total = self.queries.len(),
            "query consumed"
        );
    }

    fn all_queries_completed(&self) -> bool {
        self.cursor >= self.queries.len()
    }
}
