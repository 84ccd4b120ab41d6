//! Configuration types for search-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};
use url::Url;

/// File selection mode applied by the result filter
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// MP3 files at or above the quality threshold
    #[default]
    Mp3,
    /// FLAC files, any bitrate
    Flac,
    /// Every file, no extension or bitrate check
    Any,
}

impl Mode {
    /// File extension this mode keeps (None = every extension)
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Mode::Mp3 => Some("mp3"),
            Mode::Flac => Some("flac"),
            Mode::Any => None,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Mp3 => f.write_str("mp3"),
            Mode::Flac => f.write_str("flac"),
            Mode::Any => f.write_str("any"),
        }
    }
}

/// Search loop behavior, fixed for the lifetime of a controller
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Timeout handed to the search service, in milliseconds (default: 2000)
    #[serde(default = "default_timeout", with = "duration_ms_serde")]
    pub timeout: Duration,

    /// Prompt the operator for a selection (default: true)
    ///
    /// When false, the top result is reported and the run ends without downloading.
    #[serde(default = "default_true")]
    pub interactive: bool,

    /// Minimum bitrate in kbps for MP3 results (default: 320)
    #[serde(default = "default_quality")]
    pub quality: u32,

    /// File selection mode (default: mp3)
    #[serde(default)]
    pub mode: Mode,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            interactive: true,
            quality: default_quality(),
            mode: Mode::default(),
        }
    }
}

/// Download placement settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Root directory for downloaded folders (default: "./downloads")
    #[serde(default = "default_destination")]
    pub destination: PathBuf,

    /// Maximum concurrent transfers (default: 3)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            destination: default_destination(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

/// Search/transfer service endpoint
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the search service (default: "http://127.0.0.1:8080")
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl ServerConfig {
    /// Parsed base URL
    pub fn url(&self) -> Result<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| Error::config("server.base_url", format!("invalid URL: {e}")))
    }
}

/// Main configuration
///
/// Fields are grouped by concern:
/// - [`search`](SearchConfig) - timeout, interactive flag, quality and mode filters
/// - [`download`](DownloadConfig) - where chosen folders land
/// - [`server`](ServerConfig) - search/transfer endpoint
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Search loop behavior
    #[serde(default)]
    pub search: SearchConfig,

    /// Download placement
    #[serde(default)]
    pub download: DownloadConfig,

    /// Service endpoint
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from a JSON file; missing keys fall back to defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {e}", path.display()),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Reject settings the loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.search.timeout.is_zero() {
            return Err(Error::config(
                "search.timeout",
                "timeout must be greater than zero",
            ));
        }
        if self.download.max_concurrent == 0 {
            return Err(Error::config(
                "download.max_concurrent",
                "at least one concurrent transfer is required",
            ));
        }
        self.server.url()?;
        Ok(())
    }
}

fn default_timeout() -> Duration {
    Duration::from_millis(2000)
}

fn default_true() -> bool {
    true
}

fn default_quality() -> u32 {
    320
}

fn default_destination() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_max_concurrent() -> usize {
    3
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

// Duration as integer milliseconds
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.search.timeout, Duration::from_millis(2000));
        assert!(config.search.interactive);
        assert_eq!(config.search.quality, 320);
        assert_eq!(config.search.mode, Mode::Mp3);
        assert_eq!(config.download.destination, PathBuf::from("./downloads"));
        assert_eq!(config.download.max_concurrent, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"search":{"timeout":500,"mode":"flac"}}"#).unwrap();
        assert_eq!(config.search.timeout, Duration::from_millis(500));
        assert_eq!(config.search.mode, Mode::Flac);
        assert!(config.search.interactive);
        assert_eq!(config.search.quality, 320);
        assert_eq!(config.server.base_url, "http://127.0.0.1:8080");
    }

    #[test]
    fn timeout_serializes_as_milliseconds() {
        let json = serde_json::to_value(SearchConfig::default()).unwrap();
        assert_eq!(json["timeout"], 2000);
        assert_eq!(json["mode"], "mp3");
    }

    #[test]
    fn oversized_timeout_saturates_when_serialized() {
        let config = SearchConfig {
            timeout: Duration::MAX,
            ..SearchConfig::default()
        };
        let json = serde_json::to_value(config).unwrap();
        assert_eq!(json["timeout"], u64::MAX);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = Config::default();
        config.search.timeout = Duration::ZERO;
        match config.validate() {
            Err(Error::Config { key, .. }) => assert_eq!(key.as_deref(), Some("search.timeout")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_base_url_is_rejected() {
        let mut config = Config::default();
        config.server.base_url = "not a url".to_string();
        match config.validate() {
            Err(Error::Config { key, .. }) => assert_eq!(key.as_deref(), Some("server.base_url")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn from_file_reads_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"search":{{"interactive":false,"quality":192}},"download":{{"destination":"/tmp/music"}}}}"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert!(!config.search.interactive);
        assert_eq!(config.search.quality, 192);
        assert_eq!(config.download.destination, PathBuf::from("/tmp/music"));
    }

    #[test]
    fn from_file_missing_path_is_config_error() {
        let err = Config::from_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, Error::Config { key: None, .. }));
    }
}
