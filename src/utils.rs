//! Utility functions for endpoint URLs and local path mapping

use crate::error::{DownloadError, Error, Result};
use crate::types::FileDescriptor;
use std::path::{Path, PathBuf};
use url::Url;

/// Maximum number of rename attempts when resolving file collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Resolve a service endpoint relative to the base URL
///
/// The base URL is treated as a directory, so `http://host/api` and
/// `http://host/api/` both resolve `search` to `http://host/api/search`.
///
/// # Examples
///
/// ```
/// use search_dl::utils::endpoint;
/// use url::Url;
///
/// let base = Url::parse("http://localhost:8080/api").unwrap();
/// assert_eq!(endpoint(&base, "search").unwrap().as_str(), "http://localhost:8080/api/search");
/// ```
pub fn endpoint(base: &Url, name: &str) -> Result<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(name)
        .map_err(|e| Error::config("server.base_url", format!("cannot build {name} URL: {e}")))
}

/// Map a remote file to `<root>/<remote folder>/<remote file name>`
///
/// Files without a parent folder land directly under `root`. Components that
/// could escape `root` (`.`, `..`, drive prefixes) are rejected.
pub fn local_destination(root: &Path, file: &FileDescriptor) -> Result<PathBuf> {
    let name = file
        .file_name()
        .ok_or_else(|| DownloadError::InvalidPath(file.path.clone()))?;
    check_component(name, &file.path)?;

    let mut destination = root.to_path_buf();
    if let Some(folder) = file.folder_name() {
        check_component(folder, &file.path)?;
        destination.push(folder);
    }
    destination.push(name);
    Ok(destination)
}

fn check_component(component: &str, remote: &str) -> Result<()> {
    if component == "." || component == ".." || component.contains(':') {
        return Err(DownloadError::InvalidPath(remote.to_string()).into());
    }
    Ok(())
}

/// Get a path that does not exist yet, adding ` (1)`, ` (2)`, ... before the extension
///
/// ```
/// use search_dl::utils::get_unique_path;
/// use std::path::Path;
///
/// let path = Path::new("/tmp/definitely-missing-track.mp3");
/// assert_eq!(get_unique_path(path).unwrap(), path);
/// ```
pub fn get_unique_path(path: &Path) -> Result<PathBuf> {
    get_unique_path_with(path, |candidate| candidate.exists())
}

/// Like [`get_unique_path`], with the caller deciding which paths are taken
///
/// `is_taken` sees every candidate, starting with `path` itself.
pub fn get_unique_path_with(path: &Path, is_taken: impl Fn(&Path) -> bool) -> Result<PathBuf> {
    if !is_taken(path) {
        return Ok(path.to_path_buf());
    }

    let invalid = |reason: &str| DownloadError::Destination {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| invalid("cannot extract file stem"))?;
    let extension = path.extension().and_then(|e| e.to_str());
    let parent = path
        .parent()
        .ok_or_else(|| invalid("cannot extract parent directory"))?;

    for i in 1..=MAX_RENAME_ATTEMPTS {
        let new_name = match extension {
            Some(ext) => format!("{} ({}).{}", stem, i, ext),
            None => format!("{} ({})", stem, i),
        };
        let new_path = parent.join(new_name);
        if !is_taken(&new_path) {
            return Ok(new_path);
        }
    }

    Err(invalid("could not find unique filename after 9999 attempts").into())
}
