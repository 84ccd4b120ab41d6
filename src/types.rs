//! Core types and events for search-dl

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One search term drawn from the query queue
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Query(pub String);

impl Query {
    /// Create a new Query
    pub fn new(term: impl Into<String>) -> Self {
        Self(term.into())
    }

    /// Get the search term
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Query {
    fn from(term: &str) -> Self {
        Self(term.to_string())
    }
}

impl From<String> for Query {
    fn from(term: String) -> Self {
        Self(term)
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single file offered by a remote owner, as reported by the search service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Identity of the peer offering the file
    #[serde(alias = "user")]
    pub owner: String,
    /// Remote path of the file, using `\` or `/` separators
    #[serde(alias = "file")]
    pub path: String,
    /// Size in bytes
    #[serde(default)]
    pub size: u64,
    /// Bitrate in kbps, when the service knows it
    #[serde(default)]
    pub bitrate: Option<u32>,
    /// Whether the owner currently has a free upload slot
    #[serde(default, alias = "slots")]
    pub free_slot: bool,
    /// Advertised upload speed in bytes per second
    #[serde(default)]
    pub speed: u64,
}

impl FileDescriptor {
    /// Remote path split into its components, accepting both separator styles
    pub fn path_components(&self) -> impl Iterator<Item = &str> {
        self.path.split(['\\', '/']).filter(|c| !c.is_empty())
    }

    /// Final component of the remote path
    pub fn file_name(&self) -> Option<&str> {
        self.path_components().last()
    }

    /// Name of the folder directly containing the file
    pub fn folder_name(&self) -> Option<&str> {
        let mut components: Vec<&str> = self.path_components().collect();
        components.pop()?;
        components.pop()
    }

    /// Lowercased extension of the remote file name
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name()?;
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

/// Unfiltered response of one search invocation
pub type RawSearchResult = Vec<FileDescriptor>;

/// Filtered search hits grouped by owner
///
/// Insertion order is meaningful: the first owner is the top result.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FilesByOwner(IndexMap<String, Vec<FileDescriptor>>);

impl FilesByOwner {
    /// Create an empty grouping
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Append a file to its owner's group, creating the group at the end if needed
    pub fn push(&mut self, file: FileDescriptor) {
        self.0.entry(file.owner.clone()).or_default().push(file);
    }

    /// Number of owners
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no owner survived filtering
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First owner in insertion order
    pub fn top_owner(&self) -> Option<&str> {
        self.0.keys().next().map(String::as_str)
    }

    /// Owner keys in insertion order
    pub fn owners(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    /// Files of one owner
    pub fn get(&self, owner: &str) -> Option<&[FileDescriptor]> {
        self.0.get(owner).map(Vec::as_slice)
    }

    /// Remove and return one owner's files
    pub fn take(&mut self, owner: &str) -> Option<Vec<FileDescriptor>> {
        self.0.shift_remove(owner)
    }

    /// Iterate over `(owner, files)` in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<FileDescriptor>)> {
        self.0.iter()
    }
}

impl FromIterator<FileDescriptor> for FilesByOwner {
    fn from_iter<I: IntoIterator<Item = FileDescriptor>>(iter: I) -> Self {
        let mut grouped = Self::new();
        for file in iter {
            grouped.push(file);
        }
        grouped
    }
}

/// Event emitted by the orchestration loop and the download manager
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A search was issued
    Searching {
        /// Query being searched
        query: String,
    },

    /// The search collaborator reported a failure; the cycle is halted
    SearchFailed {
        /// Query that failed
        query: String,
        /// Error message
        error: String,
    },

    /// Filtering left nothing for this query
    NothingFound {
        /// Query that yielded nothing
        query: String,
    },

    /// Filtering left at least one owner
    SearchFinished {
        /// Query that was searched
        query: String,
        /// Number of owners in the filtered grouping
        results: usize,
    },

    /// Non-interactive mode picked the first owner
    TopResult {
        /// Top owner
        owner: String,
        /// Number of owners in the filtered grouping
        results: usize,
    },

    /// Candidates were handed to the operator prompt
    SelectionRequested {
        /// Owner keys in grouping order
        candidates: Vec<String>,
    },

    /// The operator picked an owner
    Selected {
        /// Chosen owner
        owner: String,
        /// Number of files handed to the download coordinator
        files: usize,
    },

    /// Every query of the queue has been consumed
    AllQueriesCompleted,

    /// A file transfer was queued
    DownloadQueued {
        /// Owner the file is downloaded from
        owner: String,
        /// Remote path
        file: String,
    },

    /// A file transfer finished
    DownloadComplete {
        /// Remote path
        file: String,
        /// Local destination
        path: PathBuf,
        /// Bytes written
        bytes: u64,
    },

    /// A file transfer failed
    DownloadFailed {
        /// Remote path
        file: String,
        /// Error message
        error: String,
    },

    /// All downloads were submitted and none is still in flight
    AllDownloadsSettled {
        /// Transfers that completed
        succeeded: usize,
        /// Transfers that failed
        failed: usize,
    },
}
