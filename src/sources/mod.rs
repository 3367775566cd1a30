/*!
 * External collaborators of the parsing pipeline.
 *
 * The core never talks to the network or the filesystem directly. It goes
 * through these traits instead:
 * - `Fetcher`: text over HTTP (subtitle files, HLS playlists and segments)
 * - `SubtitleSource`: platform-specific subtitle acquisition (YouTube)
 * - `PlaylistInspector`: live playlist metadata
 * - `Storage`: text persistence
 */

use std::fmt::Debug;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::SourceError;
use crate::models::M3U8Info;
use crate::playlist::parse_m3u8_info;

pub mod http;
pub mod mock;
pub mod youtube;

pub use http::HttpFetcher;
pub use mock::{MemoryStorage, MockFetcher, MockSubtitleSource, SubtitleBehavior};

/// Fetches text resources
pub trait Fetcher: Send + Sync + Debug {
    /// Fetch the body of `url` as text
    ///
    /// # Returns
    /// * `Result<String, SourceError>` - The body, or an error for transport
    ///   failures and non-success statuses
    fn fetch(&self, url: &str) -> Result<String, SourceError>;

    /// Fetch an HLS playlist
    fn fetch_playlist(&self, url: &str) -> Result<String, SourceError> {
        self.fetch(url)
    }
}

/// Metadata of a (possibly live) video
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveInfo {
    pub video_id: Option<String>,
    pub title: Option<String>,
    /// Direct URL of the subtitle track, when one was found
    pub vtt_url: Option<String>,
    /// URL of the HLS manifest, when the video is live
    pub manifest_url: Option<String>,
    #[serde(default)]
    pub is_live: bool,
    #[serde(default)]
    pub was_live: bool,
}

/// Platform-specific subtitle acquisition
pub trait SubtitleSource: Send + Sync + Debug {
    /// Download subtitles for `url` into `dir`
    ///
    /// # Returns
    /// * `Ok(Some(path))` - The downloaded subtitle file
    /// * `Ok(None)` - The video has no subtitles
    fn download_subtitles(&self, url: &str, dir: &Path) -> Result<Option<PathBuf>>;

    /// Describe the video behind `url`
    fn extract_live_info(&self, url: &str) -> Result<LiveInfo>;
}

/// Supplies live playlist metadata
pub trait PlaylistInspector: Send + Sync + Debug {
    fn extract_info(&self, url: &str) -> M3U8Info;
}

/// Inspector that fetches the playlist and parses it.
///
/// Fetch failures degrade to default metadata.
#[derive(Debug)]
pub struct FetchingInspector<'a> {
    fetcher: &'a dyn Fetcher,
}

impl<'a> FetchingInspector<'a> {
    pub fn new(fetcher: &'a dyn Fetcher) -> Self {
        FetchingInspector { fetcher }
    }
}

impl PlaylistInspector for FetchingInspector<'_> {
    fn extract_info(&self, url: &str) -> M3U8Info {
        match self.fetcher.fetch_playlist(url) {
            Ok(text) => parse_m3u8_info(&text),
            Err(e) => {
                warn!("Failed to fetch playlist {}: {}, using defaults", url, e);
                M3U8Info::default()
            }
        }
    }
}

/// Text persistence
pub trait Storage: Send + Sync {
    fn read_text(&self, path: &Path) -> io::Result<String>;

    fn write_text(&self, path: &Path, text: &str) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;
}
