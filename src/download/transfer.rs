//! File transfer backends

use crate::error::{DownloadError, Error, Result};
use crate::types::FileDescriptor;
use crate::utils::endpoint;
use async_trait::async_trait;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Moves one remote file to a local path
#[async_trait]
pub trait Transfer: Send + Sync {
    /// Fetch `file` into `destination`, returning the number of bytes written
    async fn fetch(&self, file: &FileDescriptor, destination: &Path) -> Result<u64>;
}

/// Transfer over `GET {base}/download?owner=<owner>&path=<remote path>`
#[derive(Clone, Debug)]
pub struct HttpTransfer {
    client: reqwest::Client,
    download_url: Url,
}

impl HttpTransfer {
    /// Create a transfer backend for the service rooted at `base_url`
    pub fn new(base_url: Url) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            download_url: endpoint(&base_url, "download")?,
        })
    }
}

#[async_trait]
impl Transfer for HttpTransfer {
    async fn fetch(&self, file: &FileDescriptor, destination: &Path) -> Result<u64> {
        let mut response = self
            .client
            .get(self.download_url.clone())
            .query(&[("owner", file.owner.as_str()), ("path", file.path.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DownloadError::Http {
                status: response.status().as_u16(),
                path: file.path.clone(),
            }
            .into());
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Stream into a .part sibling, renamed only once complete
        let partial = destination.with_extension(match destination.extension() {
            Some(ext) => format!("{}.part", ext.to_string_lossy()),
            None => "part".to_string(),
        });
        let mut out = tokio::fs::File::create(&partial).await?;

        let mut written: u64 = 0;
        let streamed: Result<()> = async {
            while let Some(chunk) = response.chunk().await? {
                out.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            out.flush().await?;
            Ok(())
        }
        .await;

        if let Err(e) = streamed {
            drop(out);
            tokio::fs::remove_file(&partial).await.ok();
            return Err(e);
        }
        drop(out);

        tokio::fs::rename(&partial, destination)
            .await
            .map_err(|e| {
                Error::Download(DownloadError::Destination {
                    path: destination.to_path_buf(),
                    reason: e.to_string(),
                })
            })?;

        tracing::debug!(file = %file.path, bytes = written, path = %destination.display(), "transfer finished");
        Ok(written)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn remote(path: &str) -> FileDescriptor {
        FileDescriptor {
            owner: "u1".to_string(),
            path: path.to_string(),
            size: 5,
            bitrate: Some(320),
            free_slot: true,
            speed: 10,
        }
    }

    #[tokio::test]
    async fn fetch_writes_body_to_destination() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/download"))
            .and(query_param("owner", "u1"))
            .and(query_param("path", "Album\\01.mp3"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hello".to_vec()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let dir = tempdir().unwrap();
        let destination = dir.path().join("Album").join("01.mp3");
        let transfer = HttpTransfer::new(mock_server.uri().parse().unwrap()).unwrap();

        let bytes = transfer
            .fetch(&remote("Album\\01.mp3"), &destination)
            .await
            .unwrap();

        assert_eq!(bytes, 5);
        assert_eq!(std::fs::read(&destination).unwrap(), b"hello");
        assert!(!dir.path().join("Album").join("01.mp3.part").exists());
    }

    #[tokio::test]
    async fn fetch_error_status_leaves_nothing_behind() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/download"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let dir = tempdir().unwrap();
        let destination = dir.path().join("Album").join("01.mp3");
        let transfer = HttpTransfer::new(mock_server.uri().parse().unwrap()).unwrap();

        let err = transfer
            .fetch(&remote("Album\\01.mp3"), &destination)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Download(DownloadError::Http { status: 404, .. })
        ));
        assert!(!destination.exists());
    }
}
