//! Command line arguments and config merging.

use clap::{ArgAction, Parser};
use search_dl::{
    Config, DownloadCoordinator, DownloadManager, Error, Mode, Outcome, QueryQueue, Result,
    wait_for_downloads, wait_for_shutdown,
};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

/// Exit code for startup failures (bad config, no queries)
pub const EXIT_STARTUP: u8 = 2;

/// Search a queue of queries, pick results, and download them.
#[derive(Parser, Debug, Clone)]
#[command(name = "search-dl", version, about)]
pub struct Args {
    /// Search queries, handled in order
    pub queries: Vec<String>,

    /// File with one query per line (`#` starts a comment)
    #[arg(long, short = 'f')]
    pub query_file: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, short = 'c', env = "SEARCH_DL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Search timeout in milliseconds
    #[arg(long, short = 't')]
    pub timeout: Option<u64>,

    /// Report the top result and exit instead of prompting
    #[arg(long)]
    pub no_prompt: bool,

    /// Minimum MP3 bitrate in kbps
    #[arg(long, short = 'q')]
    pub quality: Option<u32>,

    /// File selection mode
    #[arg(long, short = 'm', value_enum)]
    pub mode: Option<Mode>,

    /// Directory downloads are written to
    #[arg(long, short = 'd')]
    pub destination: Option<PathBuf>,

    /// Base URL of the search service
    #[arg(long, env = "SEARCH_DL_SERVER")]
    pub server: Option<String>,

    /// Maximum concurrent transfers
    #[arg(long)]
    pub max_concurrent: Option<usize>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Load the config file (if any), then apply command line overrides
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut Config) {
        if let Some(ms) = self.timeout {
            config.search.timeout = Duration::from_millis(ms);
        }
        if self.no_prompt {
            config.search.interactive = false;
        }
        if let Some(quality) = self.quality {
            config.search.quality = quality;
        }
        if let Some(mode) = self.mode {
            config.search.mode = mode;
        }
        if let Some(destination) = &self.destination {
            config.download.destination = destination.clone();
        }
        if let Some(server) = &self.server {
            config.server.base_url = server.clone();
        }
        if let Some(max) = self.max_concurrent {
            config.download.max_concurrent = max;
        }
    }

    /// Positional queries first, then the query file
    pub fn query_queue(&self) -> Result<QueryQueue> {
        let mut queue = QueryQueue::new(self.queries.iter().cloned());
        if let Some(path) = &self.query_file {
            queue.extend(QueryQueue::from_file(path)?);
        }
        if queue.is_empty() {
            return Err(Error::config(
                "queries",
                "no queries given; pass them as arguments or with --query-file",
            ));
        }
        Ok(queue)
    }
}

/// Exit code for a run that ended before or inside the controller
pub fn exit_status(result: Result<u8>) -> u8 {
    result.unwrap_or_else(|e| {
        tracing::error!(error = %e, "search-dl could not start");
        EXIT_STARTUP
    })
}

/// Turn the controller's outcome into an exit code
///
/// The top owner goes to `out`. After every download was submitted this
/// waits for the transfers to settle, and a halted run waits for a signal.
pub async fn finish(outcome: Outcome, downloads: &DownloadManager, out: &mut impl Write) -> u8 {
    if let Outcome::TopResult { owner, .. } = &outcome {
        if let Err(e) = writeln!(out, "{owner}") {
            tracing::warn!(error = %e, "could not write top result");
        }
    }
    if let Some(code) = outcome.exit_code() {
        return u8::try_from(code).unwrap_or(1);
    }

    match outcome {
        Outcome::AllSubmitted => {
            let settled = wait_for_downloads(downloads).await;
            // Lines recorded by transfers that finished after the loop's flush
            downloads.flush_log();
            let (succeeded, failed) = downloads.summary();
            tracing::info!(succeeded, failed, settled, "done");
        }
        Outcome::Halted { query, reason } => {
            tracing::warn!(
                query = %query,
                reason = %reason,
                "no further progress; press Ctrl+C to exit"
            );
            wait_for_shutdown().await;
        }
        Outcome::TopResult { .. } | Outcome::Exhausted => {}
    }
    0
}
