//! Result filtering and grouping
//!
//! Turns the raw hits of one search into a [`FilesByOwner`] grouping:
//! owners without a free slot are dropped, files are matched against the
//! configured [`Mode`] and quality threshold, duplicates are removed, and the
//! survivors are ordered fastest owner first.

use crate::config::Mode;
use crate::types::{FileDescriptor, FilesByOwner, RawSearchResult};
use std::collections::HashSet;

/// Pure quality/mode filter, configured once at construction
#[derive(Clone, Copy, Debug)]
pub struct ResultFilter {
    quality: u32,
    mode: Mode,
}

impl ResultFilter {
    /// Create a filter keeping `mode` files; MP3 files also need `quality` kbps
    pub fn new(quality: u32, mode: Mode) -> Self {
        Self { quality, mode }
    }

    /// Minimum MP3 bitrate in kbps
    pub fn quality(&self) -> u32 {
        self.quality
    }

    /// File selection mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Filter and group raw search hits
    ///
    /// Deterministic for the same input; the input is left untouched.
    pub fn filter(&self, raw: &RawSearchResult) -> FilesByOwner {
        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        let mut kept: Vec<&FileDescriptor> = Vec::with_capacity(raw.len());
        for file in raw {
            if !file.free_slot || file.speed == 0 || !self.matches_mode(file) {
                continue;
            }
            if seen.insert((file.owner.as_str(), file.path.as_str())) {
                kept.push(file);
            }
        }

        // Stable: equal speeds keep the order the service reported them in
        kept.sort_by(|a, b| b.speed.cmp(&a.speed));

        tracing::debug!(
            raw = raw.len(),
            kept = kept.len(),
            mode = %self.mode,
            quality = self.quality,
            "filtered search results"
        );

        kept.into_iter().cloned().collect()
    }

    fn matches_mode(&self, file: &FileDescriptor) -> bool {
        let Some(wanted) = self.mode.extension() else {
            return true;
        };
        if file.extension().as_deref() != Some(wanted) {
            return false;
        }
        match self.mode {
            Mode::Mp3 => file.bitrate.is_some_and(|kbps| kbps >= self.quality),
            Mode::Flac | Mode::Any => true,
        }
    }
}

impl Default for ResultFilter {
    fn default() -> Self {
        Self::new(320, Mode::Mp3)
    }
}
