//! Hostname-list providers.
//!
//! A batch is fed either with typed text or with a named list (a "pod")
//! loaded through a [`HostListProvider`]. Lists hold one hostname per line.

use crate::error::SourceError;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const LIST_EXTENSION: &str = "txt";
const REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

/// Splits raw text into hostnames.
///
/// Surrounding whitespace is trimmed; blank lines and `#` comments are dropped.
/// Entries are not validated.
pub fn parse_hostnames(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

/// Loads a named hostname list.
pub trait HostListProvider {
    fn load(&self, source_id: &str) -> Result<Vec<String>, SourceError>;
}

/// A fixed block of text; the id is ignored.
pub struct InlineSource {
    text: String,
}

impl InlineSource {
    pub fn new(text: impl Into<String>) -> Self {
        InlineSource { text: text.into() }
    }
}

impl HostListProvider for InlineSource {
    fn load(&self, _source_id: &str) -> Result<Vec<String>, SourceError> {
        Ok(parse_hostnames(&self.text))
    }
}

/// Reads `<dir>/<source_id>.txt`, e.g. `hosts/pod1.txt`.
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        DirectorySource {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, source_id: &str) -> Result<PathBuf, SourceError> {
        validate_id(source_id)?;
        Ok(self
            .dir
            .join(format!("{}.{}", source_id, LIST_EXTENSION)))
    }
}

impl HostListProvider for DirectorySource {
    fn load(&self, source_id: &str) -> Result<Vec<String>, SourceError> {
        let path = self.path_for(source_id)?;
        debug!("loading host list from {}", path.display());
        let text = fs::read_to_string(&path).map_err(|e| SourceError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        non_empty(source_id, parse_hostnames(&text))
    }
}

/// Downloads `<base_url>/<source_id>.txt` over HTTP(S).
pub struct RemoteSource {
    base: Url,
    client: reqwest::blocking::Client,
}

impl RemoteSource {
    pub fn new(base_url: &str) -> Result<Self, SourceError> {
        let mut base = Url::parse(base_url).map_err(|e| SourceError::Remote {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        // Url::join replaces the last segment unless the path ends with '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(REMOTE_TIMEOUT)
            .build()
            .map_err(|e| SourceError::Remote {
                url: base_url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(RemoteSource { base, client })
    }

    pub fn url_for(&self, source_id: &str) -> Result<Url, SourceError> {
        validate_id(source_id)?;
        self.base
            .join(&format!("{}.{}", source_id, LIST_EXTENSION))
            .map_err(|e| SourceError::InvalidId {
                id: source_id.to_string(),
                reason: e.to_string(),
            })
    }
}

impl HostListProvider for RemoteSource {
    fn load(&self, source_id: &str) -> Result<Vec<String>, SourceError> {
        let url = self.url_for(source_id)?;
        debug!("fetching host list from {}", url);
        let remote_error = |reason: String| SourceError::Remote {
            url: url.to_string(),
            reason,
        };
        let text = self
            .client
            .get(url.clone())
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(|e| remote_error(e.to_string()))?;
        non_empty(source_id, parse_hostnames(&text))
    }
}

fn validate_id(source_id: &str) -> Result<(), SourceError> {
    let reason = if source_id.is_empty() {
        Some("cannot be empty")
    } else if source_id.contains(['/', '\\']) || source_id.contains("..") {
        Some("must not contain path separators")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(SourceError::InvalidId {
            id: source_id.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

fn non_empty(source_id: &str, hosts: Vec<String>) -> Result<Vec<String>, SourceError> {
    if hosts.is_empty() {
        return Err(SourceError::Empty {
            id: source_id.to_string(),
        });
    }
    Ok(hosts)
}
