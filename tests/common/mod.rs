//! Common test utilities for search-dl end-to-end tests

use async_trait::async_trait;
use search_dl::{
    Config, DownloadManager, Error, HttpSearchClient, HttpTransfer, QueryQueue, Result,
    SearchController, SelectionPrompt, Services,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Prompt that always picks the candidate at `index` and records what it was shown
#[allow(dead_code)]
#[derive(Default)]
pub struct PickIndex {
    pub index: usize,
    pub shown: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl SelectionPrompt for PickIndex {
    async fn choose(&self, candidates: &[String]) -> Result<String> {
        self.shown.lock().unwrap().push(candidates.to_vec());
        candidates
            .get(self.index)
            .cloned()
            .ok_or_else(|| Error::Prompt("index out of range".to_string()))
    }
}

/// Serve `body` as the search response for `query`
pub async fn mount_search(server: &MockServer, query: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", query))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Serve `content` for the remote file at `remote_path`
pub async fn mount_download(server: &MockServer, remote_path: &str, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path("/download"))
        .and(query_param("path", remote_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(server)
        .await;
}

/// JSON search hit that passes the default mp3/320 filter
pub fn hit_json(owner: &str, remote_path: &str, speed: u64) -> serde_json::Value {
    serde_json::json!({
        "owner": owner,
        "path": remote_path,
        "size": 3,
        "bitrate": 320,
        "free_slot": true,
        "speed": speed,
    })
}

/// A controller wired to the HTTP adapters, plus the pieces tests inspect
pub struct Wired {
    pub controller: SearchController,
    pub downloads: DownloadManager,
    pub prompt: Arc<PickIndex>,
    pub dir: tempfile::TempDir,
}

pub fn wire(server: &MockServer, queries: &[&str], interactive: bool) -> Wired {
    let dir = tempfile::tempdir().unwrap();
    let base_url: url::Url = server.uri().parse().unwrap();

    let mut config = Config::default();
    config.search.interactive = interactive;
    config.search.timeout = Duration::from_millis(1000);
    config.download.destination = dir.path().to_path_buf();

    let downloads = DownloadManager::new(
        Arc::new(HttpTransfer::new(base_url.clone()).unwrap()),
        config.download.destination.clone(),
        config.download.max_concurrent,
    );
    let prompt = Arc::new(PickIndex::default());
    let services = Services {
        search: Arc::new(HttpSearchClient::new(base_url).unwrap()),
        downloads: Arc::new(downloads.clone()),
        prompt: prompt.clone(),
    };
    let controller = SearchController::new(
        config.search,
        Box::new(QueryQueue::new(queries.iter().copied())),
        services,
    );

    Wired {
        controller,
        downloads,
        prompt,
        dir,
    }
}
