//! Shared test doubles for the orchestration collaborators.

use crate::config::SearchConfig;
use crate::controller::{SearchController, Services};
use crate::download::DownloadCoordinator;
use crate::error::{Error, Result};
use crate::prompt::SelectionPrompt;
use crate::query::{QueryQueue, QuerySource};
use crate::search::SearchClient;
use crate::types::{FileDescriptor, Query, RawSearchResult};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Build a search hit that passes the default mp3/320 filter
pub(crate) fn hit(owner: &str, path: &str) -> FileDescriptor {
    FileDescriptor {
        owner: owner.to_string(),
        path: path.to_string(),
        size: 4_000_000,
        bitrate: Some(320),
        free_slot: true,
        speed: 100,
    }
}

/// Canned response for one query
#[derive(Clone, Debug)]
pub(crate) enum Scripted {
    Hits(RawSearchResult),
    Fail(String),
}

/// Search client answering from a per-query script and recording every call
#[derive(Default)]
pub(crate) struct ScriptedSearch {
    script: HashMap<String, Scripted>,
    calls: Mutex<Vec<(String, Duration)>>,
}

impl ScriptedSearch {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(mut self, query: &str, response: Scripted) -> Self {
        self.script.insert(query.to_string(), response);
        self
    }

    pub(crate) fn calls(&self) -> Vec<(String, Duration)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn queries(&self) -> Vec<String> {
        self.calls().into_iter().map(|(q, _)| q).collect()
    }
}

#[async_trait]
impl SearchClient for ScriptedSearch {
    async fn search(&self, query: &Query, timeout: Duration) -> Result<RawSearchResult> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), timeout));
        match self.script.get(query.as_str()) {
            Some(Scripted::Hits(hits)) => Ok(hits.clone()),
            Some(Scripted::Fail(msg)) => Err(Error::Search(msg.clone())),
            None => Ok(Vec::new()),
        }
    }
}

/// One call made on the download coordinator
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum DownloadCall {
    Start(Vec<FileDescriptor>),
    Flush,
    NotifyAllSubmitted,
}

/// Download coordinator that only records calls
#[derive(Default)]
pub(crate) struct RecordingDownloads {
    calls: Mutex<Vec<DownloadCall>>,
}

impl RecordingDownloads {
    pub(crate) fn calls(&self) -> Vec<DownloadCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, wanted: &DownloadCall) -> usize {
        self.calls().iter().filter(|c| *c == wanted).count()
    }

    pub(crate) fn started(&self) -> Vec<Vec<FileDescriptor>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                DownloadCall::Start(files) => Some(files),
                _ => None,
            })
            .collect()
    }
}

impl DownloadCoordinator for RecordingDownloads {
    fn start_downloads(&self, files: Vec<FileDescriptor>) {
        self.calls.lock().unwrap().push(DownloadCall::Start(files));
    }

    fn flush_log(&self) {
        self.calls.lock().unwrap().push(DownloadCall::Flush);
    }

    fn notify_all_submitted(&self) {
        self.calls
            .lock()
            .unwrap()
            .push(DownloadCall::NotifyAllSubmitted);
    }
}

/// Operator answer for one prompt
#[derive(Clone, Debug)]
pub(crate) enum Answer {
    First,
    Pick(String),
    Fail(String),
}

/// Prompt answering from a queue (defaults to the first candidate) and recording candidates
#[derive(Default)]
pub(crate) struct ScriptedPrompt {
    answers: Mutex<VecDeque<Answer>>,
    shown: Mutex<Vec<Vec<String>>>,
}

impl ScriptedPrompt {
    pub(crate) fn answering(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            shown: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn shown(&self) -> Vec<Vec<String>> {
        self.shown.lock().unwrap().clone()
    }
}

#[async_trait]
impl SelectionPrompt for ScriptedPrompt {
    async fn choose(&self, candidates: &[String]) -> Result<String> {
        self.shown.lock().unwrap().push(candidates.to_vec());
        let answer = self.answers.lock().unwrap().pop_front().unwrap_or(Answer::First);
        match answer {
            Answer::First => Ok(candidates[0].clone()),
            Answer::Pick(owner) => Ok(owner),
            Answer::Fail(msg) => Err(Error::Prompt(msg)),
        }
    }
}

/// Query queue that counts consume calls
pub(crate) struct CountingQueries {
    inner: QueryQueue,
    consumes: Arc<AtomicUsize>,
}

impl CountingQueries {
    pub(crate) fn new(terms: &[&str]) -> (Self, Arc<AtomicUsize>) {
        let consumes = Arc::new(AtomicUsize::new(0));
        (
            Self {
                inner: QueryQueue::new(terms.iter().copied()),
                consumes: consumes.clone(),
            },
            consumes,
        )
    }
}

impl QuerySource for CountingQueries {
    fn next_query(&self) -> Option<Query> {
        self.inner.next_query()
    }

    fn consume_current_query(&mut self) {
        self.consumes.fetch_add(1, Ordering::SeqCst);
        self.inner.consume_current_query();
    }

    fn all_queries_completed(&self) -> bool {
        self.inner.all_queries_completed()
    }
}

/// Everything a controller test needs to inspect afterwards
pub(crate) struct Harness {
    pub(crate) controller: SearchController,
    pub(crate) search: Arc<ScriptedSearch>,
    pub(crate) downloads: Arc<RecordingDownloads>,
    pub(crate) prompt: Arc<ScriptedPrompt>,
    pub(crate) consumes: Arc<AtomicUsize>,
}

impl Harness {
    pub(crate) fn consumed(&self) -> usize {
        self.consumes.load(Ordering::SeqCst)
    }
}

/// Wire a controller to scripted collaborators
pub(crate) fn create_test_controller(
    queries: &[&str],
    interactive: bool,
    search: ScriptedSearch,
    prompt: ScriptedPrompt,
) -> Harness {
    let (queue, consumes) = CountingQueries::new(queries);
    let search = Arc::new(search);
    let downloads = Arc::new(RecordingDownloads::default());
    let prompt = Arc::new(prompt);

    let config = SearchConfig {
        interactive,
        ..SearchConfig::default()
    };
    let services = Services {
        search: search.clone(),
        downloads: downloads.clone(),
        prompt: prompt.clone(),
    };

    Harness {
        controller: SearchController::new(config, Box::new(queue), services),
        search,
        downloads,
        prompt,
        consumes,
    }
}
