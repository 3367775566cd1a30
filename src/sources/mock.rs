/*!
 * In-memory collaborators for tests and embedding.
 *
 * - `MockFetcher`: canned bodies or HTTP failures per URL
 * - `MemoryStorage`: a path to text map
 * - `MockSubtitleSource`: a scripted subtitle acquisition client
 */

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use parking_lot::{Mutex, RwLock};

use crate::errors::SourceError;

use super::{Fetcher, LiveInfo, Storage, SubtitleSource};

/// Scripted reply for one URL
#[derive(Debug, Clone)]
enum MockReply {
    Body(String),
    Status(u16),
}

/// Fetcher answering from a fixed URL table
#[derive(Debug, Default)]
pub struct MockFetcher {
    replies: HashMap<String, MockReply>,
    requests: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `body`
    pub fn with_response(mut self, url: &str, body: &str) -> Self {
        self.replies
            .insert(url.to_string(), MockReply::Body(body.to_string()));
        self
    }

    /// Answer `url` with an HTTP error status
    pub fn with_status(mut self, url: &str, status_code: u16) -> Self {
        self.replies
            .insert(url.to_string(), MockReply::Status(status_code));
        self
    }

    /// URLs requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

impl Fetcher for MockFetcher {
    fn fetch(&self, url: &str) -> Result<String, SourceError> {
        self.requests.lock().push(url.to_string());

        match self.replies.get(url) {
            Some(MockReply::Body(body)) => Ok(body.clone()),
            Some(MockReply::Status(status_code)) => Err(SourceError::HttpStatus {
                status_code: *status_code,
                url: url.to_string(),
            }),
            None => Err(SourceError::RequestFailed(format!("No route to {}", url))),
        }
    }
}

/// Storage keeping files in memory
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: RwLock<HashMap<PathBuf, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a file
    pub fn with_file(self, path: impl AsRef<Path>, text: &str) -> Self {
        self.files
            .write()
            .insert(path.as_ref().to_path_buf(), text.to_string());
        self
    }

    /// Current content of a file
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.read().get(path.as_ref()).cloned()
    }

    pub fn file_count(&self) -> usize {
        self.files.read().len()
    }
}

impl Storage for MemoryStorage {
    fn read_text(&self, path: &Path) -> io::Result<String> {
        self.contents(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )
        })
    }

    fn write_text(&self, path: &Path, text: &str) -> io::Result<()> {
        self.files
            .write()
            .insert(path.to_path_buf(), text.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.read().contains_key(path)
    }
}

/// Behavior mode for the mock subtitle source
#[derive(Debug, Clone, PartialEq)]
pub enum SubtitleBehavior {
    /// Reports this already-downloaded file
    Downloaded(PathBuf),
    /// The video has no subtitles
    NoSubtitles,
    /// Always fails with an error
    Failing,
}

/// Subtitle source with scripted results
#[derive(Debug, Clone)]
pub struct MockSubtitleSource {
    behavior: SubtitleBehavior,
    info: LiveInfo,
}

impl MockSubtitleSource {
    pub fn new(behavior: SubtitleBehavior) -> Self {
        MockSubtitleSource {
            behavior,
            info: LiveInfo::default(),
        }
    }

    pub fn downloaded(path: impl Into<PathBuf>) -> Self {
        Self::new(SubtitleBehavior::Downloaded(path.into()))
    }

    pub fn failing() -> Self {
        Self::new(SubtitleBehavior::Failing)
    }

    pub fn with_info(mut self, info: LiveInfo) -> Self {
        self.info = info;
        self
    }
}

impl SubtitleSource for MockSubtitleSource {
    fn download_subtitles(&self, url: &str, _dir: &Path) -> Result<Option<PathBuf>> {
        match &self.behavior {
            SubtitleBehavior::Downloaded(path) => Ok(Some(path.clone())),
            SubtitleBehavior::NoSubtitles => Ok(None),
            SubtitleBehavior::Failing => Err(anyhow!("Simulated subtitle download failure for {}", url)),
        }
    }

    fn extract_live_info(&self, url: &str) -> Result<LiveInfo> {
        match self.behavior {
            SubtitleBehavior::Failing => Err(anyhow!("Simulated info extraction failure for {}", url)),
            _ => Ok(self.info.clone()),
        }
    }
}
