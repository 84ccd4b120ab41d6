//! Search → filter → select → download orchestration.
//!
//! [`SearchController`] drives one query at a time through its collaborators.
//! Every transition is driven by an awaited result (a search response or an
//! operator choice) and returns the next [`CycleState`]; [`SearchController::run`]
//! dispatches states in a flat loop until it reaches [`CycleState::Done`].
//!
//! At most one search or prompt is outstanding at any time.


use crate::config::SearchConfig;
use crate::download::DownloadCoordinator;
use crate::error::{Error, Result};
use crate::filter::ResultFilter;
use crate::prompt::SelectionPrompt;
use crate::query::QuerySource;
use crate::search::SearchClient;
use crate::types::{Event, FilesByOwner};
use std::sync::Arc;

/// External collaborators of the controller
#[derive(Clone)]
pub struct Services {
    /// Network search
    pub search: Arc<dyn SearchClient>,
    /// Background downloads
    pub downloads: Arc<dyn DownloadCoordinator>,
    /// Operator prompt (only used in interactive mode)
    pub prompt: Arc<dyn SelectionPrompt>,
}

/// How a run ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Non-interactive mode found results; nothing was downloaded
    TopResult {
        /// First owner of the filtered grouping
        owner: String,
        /// Number of owners in the filtered grouping
        results: usize,
    },
    /// The last query produced no results
    Exhausted,
    /// Every query was handled and every chosen download was submitted
    ///
    /// Transfers may still be running; the download coordinator owns them.
    AllSubmitted,
    /// A cycle stopped without consuming its query and nothing was retried
    Halted {
        /// Query whose cycle stopped
        query: String,
        /// Why it stopped
        reason: String,
    },
}

impl Outcome {
    /// Process exit code implied by the outcome, if the run should exit now
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Outcome::TopResult { .. } => Some(0),
            Outcome::Exhausted => Some(1),
            Outcome::AllSubmitted | Outcome::Halted { .. } => None,
        }
    }
}

/// Where the controller stands between two transitions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CycleState {
    /// The next query should be searched
    AwaitingSearch,
    /// Filtered results are waiting for the operator
    AwaitingSelection(FilesByOwner),
    /// The run is over
    Done(Outcome),
}

/// The orchestration loop
pub struct SearchController {
    config: SearchConfig,
    filter: ResultFilter,
    queries: Box<dyn QuerySource>,
    services: Services,
    event_tx: tokio::sync::broadcast::Sender<Event>,
}

impl SearchController {
    /// Create a controller; `config` is fixed for its whole lifetime
    pub fn new(config: SearchConfig, queries: Box<dyn QuerySource>, services: Services) -> Self {
        let filter = ResultFilter::new(config.quality, config.mode);
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);
        Self {
            config,
            filter,
            queries,
            services,
            event_tx,
        }
    }

    /// Subscribe to orchestration events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The query source, for inspection
    pub fn queries(&self) -> &dyn QuerySource {
        self.queries.as_ref()
    }

    /// Drive cycles until the run ends
    ///
    /// Fails with [`Error::NoPendingQuery`] if the queue is already exhausted.
    pub async fn run(&mut self) -> Result<Outcome> {
        let mut state = CycleState::AwaitingSearch;
        loop {
            state = match state {
                CycleState::AwaitingSearch => self.run_next_cycle().await?,
                CycleState::AwaitingSelection(files_by_owner) => {
                    self.handle_selection(files_by_owner).await
                }
                CycleState::Done(outcome) => {
                    tracing::debug!(?outcome, "orchestration finished");
                    return Ok(outcome);
                }
            };
        }
    }

    /// Search the current query and decide what happens next
    ///
    /// Callers must not invoke this once every query is consumed.
    pub async fn run_next_cycle(&mut self) -> Result<CycleState> {
        let query = self.queries.next_query().ok_or(Error::NoPendingQuery)?;

        tracing::info!(query = %query, "Searching for '{}'", query);
        self.emit(Event::Searching {
            query: query.to_string(),
        });

        let raw = match self
            .services
            .search
            .search(&query, self.config.timeout)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                // Query stays unconsumed; no retry is scheduled
                tracing::warn!(query = %query, error = %e, timed_out = e.is_timeout(), "Search failed");
                self.emit(Event::SearchFailed {
                    query: query.to_string(),
                    error: e.to_string(),
                });
                return Ok(CycleState::Done(Outcome::Halted {
                    query: query.to_string(),
                    reason: e.to_string(),
                }));
            }
        };

        let files_by_owner = self.filter.filter(&raw);
        drop(raw);

        if files_by_owner.is_empty() {
            tracing::info!(query = %query, "Nothing found");
            self.emit(Event::NothingFound {
                query: query.to_string(),
            });
            self.queries.consume_current_query();

            if self.queries.all_queries_completed() {
                self.emit(Event::AllQueriesCompleted);
                return Ok(CycleState::Done(Outcome::Exhausted));
            }
            return Ok(CycleState::AwaitingSearch);
        }

        let results = files_by_owner.len();
        tracing::info!(query = %query, results, "Search finished");
        self.emit(Event::SearchFinished {
            query: query.to_string(),
            results,
        });

        if self.config.interactive {
            return Ok(CycleState::AwaitingSelection(files_by_owner));
        }

        Ok(CycleState::Done(self.report_top_result(&files_by_owner)))
    }

    /// Ask the operator to pick an owner, start its downloads, and decide what happens next
    pub async fn handle_selection(&mut self, mut files_by_owner: FilesByOwner) -> CycleState {
        let candidates = files_by_owner.owners();
        tracing::info!("Displaying {} search results", candidates.len());
        self.emit(Event::SelectionRequested {
            candidates: candidates.clone(),
        });

        let owner = match self.services.prompt.choose(&candidates).await {
            Ok(owner) => owner,
            Err(e) => return self.halt_selection(e.to_string()),
        };

        let Some(files) = files_by_owner.take(&owner) else {
            return self.halt_selection(format!("'{owner}' is not one of the candidates"));
        };

        self.queries.consume_current_query();

        tracing::info!(owner = %owner, files = files.len(), "Selected '{}'", owner);
        self.emit(Event::Selected {
            owner,
            files: files.len(),
        });
        self.services.downloads.start_downloads(files);

        if self.queries.all_queries_completed() {
            self.emit(Event::AllQueriesCompleted);
            self.services.downloads.flush_log();
            self.services.downloads.notify_all_submitted();
            return CycleState::Done(Outcome::AllSubmitted);
        }

        CycleState::AwaitingSearch
    }

    fn report_top_result(&self, files_by_owner: &FilesByOwner) -> Outcome {
        let results = files_by_owner.len();
        let owner = files_by_owner.top_owner().unwrap_or_default().to_string();

        tracing::info!("Search returned {} results", results);
        tracing::info!(owner = %owner, "Top result: {}", owner);
        self.emit(Event::TopResult {
            owner: owner.clone(),
            results,
        });

        Outcome::TopResult { owner, results }
    }

    fn halt_selection(&self, reason: String) -> CycleState {
        let query = self
            .queries
            .next_query()
            .map(|q| q.to_string())
            .unwrap_or_default();
        tracing::warn!(query = %query, reason = %reason, "Selection failed");
        CycleState::Done(Outcome::Halted { query, reason })
    }

    fn emit(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }
}
