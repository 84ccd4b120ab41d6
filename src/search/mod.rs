//! Network search collaborator
//!
//! The orchestration loop only sees the [`SearchClient`] trait. The protocol
//! behind it is the implementation's business; [`HttpSearchClient`] talks to a
//! JSON search endpoint.
//!
//! ## Usage
//!
//! ```no_run
//! use search_dl::search::{HttpSearchClient, SearchClient};
//! use search_dl::Query;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpSearchClient::new("http://127.0.0.1:8080".parse()?)?;
//!     let hits = client
//!         .search(&Query::from("artist album"), Duration::from_millis(2000))
//!         .await?;
//!     println!("{} raw hits", hits.len());
//!     Ok(())
//! }
//! ```

mod http;

pub use http::HttpSearchClient;

use crate::error::Result;
use crate::types::{Query, RawSearchResult};
use async_trait::async_trait;
use std::time::Duration;

/// Performs one search against the network service
///
/// The timeout is enforced by the implementation, not by the caller.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Search for `query`, giving up after `timeout`
    async fn search(&self, query: &Query, timeout: Duration) -> Result<RawSearchResult>;
}
