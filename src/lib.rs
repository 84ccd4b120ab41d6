//! # search-dl
//!
//! Queue-driven search, select and download loop.
//!
//! A [`SearchController`] takes one query at a time from a [`QuerySource`],
//! searches it through a [`SearchClient`], filters and groups the hits by
//! owner with a [`ResultFilter`], and then either reports the top owner
//! (non-interactive mode) or lets the operator pick one through a
//! [`SelectionPrompt`] and hands that owner's files to a
//! [`DownloadCoordinator`]. Empty results move straight on to the next query.
//!
//! ## Quick Start
//!
//! ```no_run
//! use search_dl::{
//!     Config, DownloadManager, HttpSearchClient, HttpTransfer, QueryQueue, SearchController,
//!     Services, TerminalPrompt,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let base_url = config.server.url()?;
//!
//!     let downloads = DownloadManager::new(
//!         Arc::new(HttpTransfer::new(base_url.clone())?),
//!         config.download.destination.clone(),
//!         config.download.max_concurrent,
//!     );
//!     let services = Services {
//!         search: Arc::new(HttpSearchClient::new(base_url)?),
//!         downloads: Arc::new(downloads.clone()),
//!         prompt: Arc::new(TerminalPrompt::default()),
//!     };
//!
//!     let queries = QueryQueue::new(["artist - album"]);
//!     let mut controller = SearchController::new(config.search, Box::new(queries), services);
//!     let outcome = controller.run().await?;
//!     println!("{outcome:?}");
//!
//!     downloads.settled().await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Orchestration state machine
pub mod controller;
/// Download coordination and transfer backends
pub mod download;
/// Error types
pub mod error;
/// Result filtering and grouping
pub mod filter;
/// Operator selection prompt
pub mod prompt;
/// Query queue
pub mod query;
/// Network search client
pub mod search;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::{Config, DownloadConfig, Mode, SearchConfig, ServerConfig};
pub use controller::{CycleState, Outcome, SearchController, Services};
pub use download::{DownloadCoordinator, DownloadLog, DownloadManager, HttpTransfer, Transfer};
pub use error::{DownloadError, Error, Result};
pub use filter::ResultFilter;
pub use prompt::{SelectionPrompt, TerminalPrompt};
pub use query::{QueryQueue, QuerySource};
pub use search::{HttpSearchClient, SearchClient};
pub use types::{Event, FileDescriptor, FilesByOwner, Query, RawSearchResult};

/// Wait for SIGTERM or SIGINT (Ctrl+C elsewhere).
pub async fn wait_for_shutdown() {
    let signal = termination_signal().await;
    tracing::info!(signal, "shutting down");
}

/// Wait for the download manager to settle, or for a termination signal.
///
/// Returns `true` if every transfer finished before a signal arrived.
pub async fn wait_for_downloads(downloads: &DownloadManager) -> bool {
    tokio::select! {
        _ = downloads.settled() => true,
        signal = termination_signal() => {
            tracing::warn!(signal, in_flight = downloads.in_flight(), "interrupted while downloads were running");
            false
        }
    }
}

/// Resolves with the name of the first termination signal received.
///
/// A signal that cannot be registered is logged and never fires.
#[cfg(unix)]
async fn termination_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    let listen = |kind: SignalKind, name: &'static str| {
        let stream = signal(kind)
            .inspect_err(|e| tracing::warn!(signal = name, error = %e, "cannot listen for signal"))
            .ok();
        async move {
            match stream {
                Some(mut stream) => {
                    stream.recv().await;
                    name
                }
                None => std::future::pending().await,
            }
        }
    };

    tokio::select! {
        name = listen(SignalKind::terminate(), "SIGTERM") => name,
        name = listen(SignalKind::interrupt(), "SIGINT") => name,
    }
}

#[cfg(not(unix))]
async fn termination_signal() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    "Ctrl+C"
}
