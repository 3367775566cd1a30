/*!
 * Subtitle download workflow.
 *
 * Every download is saved as `<stream_id>_current.vtt`. In append mode the
 * content is also offset-corrected, optionally enriched with estimated word
 * timestamps, and merged into `<stream_id>.vtt` without duplicating cues.
 */

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use url::Url;

use crate::corrector::{apply_offset_to_vtt_content, calculate_timestamp_offset};
use crate::models::M3U8Info;
use crate::merger::merge_vtt_content;
use crate::playlist::{concat_vtt_segments, is_hls_playlist, segment_urls};
use crate::sources::youtube::{extract_youtube_id, is_youtube_url};
use crate::sources::{Fetcher, Storage, SubtitleSource};
use crate::vtt::enrich_vtt_content;

// @const: Stream id used when none can be derived from the URL
const DEFAULT_STREAM_ID: &str = "downloaded";

/// Parameters of one download
#[derive(Debug, Clone, Default)]
pub struct DownloadRequest {
    /// Subtitle URL (plain VTT or HLS playlist)
    pub url: String,
    pub output_dir: PathBuf,
    /// Name of the local files; derived from the URL when absent
    pub stream_id: Option<String>,
    pub is_youtube: bool,
    /// Correct, merge and return `<stream_id>.vtt` instead of the raw download
    pub append_mode: bool,
    /// Page URL handed to the subtitle source for YouTube streams
    pub stream_url: Option<String>,
    /// Live playlist metadata for offset correction
    pub m3u8_info: Option<M3U8Info>,
    pub enrich_word_timestamps: bool,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        DownloadRequest {
            url: url.into(),
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }
}

/// Path of the merged VTT file of a stream
pub fn vtt_path(output_dir: &Path, stream_id: &str) -> PathBuf {
    output_dir.join(format!("{}.vtt", stream_id))
}

/// Downloads subtitles through the injected collaborators
pub struct VttDownloader<'a> {
    fetcher: &'a dyn Fetcher,
    storage: &'a dyn Storage,
    subtitle_source: Option<&'a dyn SubtitleSource>,
}

impl<'a> VttDownloader<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, storage: &'a dyn Storage) -> Self {
        VttDownloader {
            fetcher,
            storage,
            subtitle_source: None,
        }
    }

    /// Use `source` for YouTube URLs before falling back to a direct fetch
    pub fn with_subtitle_source(mut self, source: &'a dyn SubtitleSource) -> Self {
        self.subtitle_source = Some(source);
        self
    }

    /// Whether the merged VTT file of a stream already exists
    pub fn vtt_exists(&self, output_dir: &Path, stream_id: &str) -> bool {
        self.storage.exists(&vtt_path(output_dir, stream_id))
    }

    /// Download subtitles for `request`
    ///
    /// # Returns
    /// * `<stream_id>_current.vtt` - without append mode
    /// * `<stream_id>.vtt` - in append mode
    pub fn download(&self, request: &DownloadRequest) -> Result<PathBuf> {
        let mut is_youtube = request.is_youtube;
        let mut stream_url = request.stream_url.clone();

        if !is_youtube && is_youtube_url(&request.url) {
            info!("Auto-detected YouTube URL: {}", request.url);
            is_youtube = true;
            if stream_url.is_none() {
                stream_url = Some(request.url.clone());
            }
        }

        let stream_id = match &request.stream_id {
            Some(id) => id.clone(),
            None => derive_stream_id(&request.url, is_youtube, stream_url.as_deref()),
        };

        let mut content = None;
        if is_youtube {
            if let Some(page_url) = stream_url.as_deref() {
                content = self.download_from_source(page_url, &request.output_dir);
            }
        }

        let content = match content {
            Some(text) => text,
            None => self.fetch_direct(&request.url)?,
        };

        let current_path = request.output_dir.join(format!("{}_current.vtt", stream_id));
        self.storage
            .write_text(&current_path, &content)
            .with_context(|| format!("Failed to save VTT: {:?}", current_path))?;
        info!("Original VTT saved to: {}", current_path.display());

        if !request.append_mode {
            return Ok(current_path);
        }

        let mut corrected = content;
        if is_youtube {
            if let Some(info) = &request.m3u8_info {
                let (offset_seconds, method) = calculate_timestamp_offset(Some(info));
                info!(
                    "Calculated timestamp offset: {:.3}s using {}",
                    offset_seconds, method
                );
                corrected = apply_offset_to_vtt_content(&corrected, offset_seconds);
            }
        }

        let timestamped = if request.enrich_word_timestamps {
            info!("Enriching VTT with estimated word-level timestamps");
            enrich_vtt_content(&corrected)
        } else {
            corrected
        };

        let timestamped_path = request
            .output_dir
            .join(format!("{}_current_timestamped.vtt", stream_id));
        self.storage
            .write_text(&timestamped_path, &timestamped)
            .with_context(|| format!("Failed to save VTT: {:?}", timestamped_path))?;
        info!("Timestamped VTT saved to: {}", timestamped_path.display());

        // Offset is already applied above
        let main_path = vtt_path(&request.output_dir, &stream_id);
        let merged = merge_vtt_content(self.storage, &main_path, &timestamped, 0.0);
        self.storage
            .write_text(&main_path, &merged)
            .with_context(|| format!("Failed to save VTT: {:?}", main_path))?;
        info!("Merged VTT saved to: {}", main_path.display());

        Ok(main_path)
    }

    fn download_from_source(&self, page_url: &str, output_dir: &Path) -> Option<String> {
        let source = self.subtitle_source?;
        info!("Using subtitle source to download YouTube subtitles");

        match source.download_subtitles(page_url, output_dir) {
            Ok(Some(path)) if self.storage.exists(&path) => match self.storage.read_text(&path) {
                Ok(text) => {
                    info!("Successfully downloaded YouTube subtitles");
                    Some(text)
                }
                Err(e) => {
                    warn!(
                        "Failed to read downloaded subtitles {}: {}, falling back to direct download",
                        path.display(),
                        e
                    );
                    None
                }
            },
            Ok(_) => {
                warn!("Subtitle source did not download subtitles, falling back to direct download");
                None
            }
            Err(e) => {
                warn!(
                    "Subtitle download failed: {}, falling back to direct download",
                    e
                );
                None
            }
        }
    }

    fn fetch_direct(&self, url: &str) -> Result<String> {
        info!("Downloading VTT from: {}", truncate_url(url));

        let body = self
            .fetcher
            .fetch(url)
            .with_context(|| format!("VTT download failed: {}", truncate_url(url)))?;

        if !is_hls_playlist(&body) {
            return Ok(body);
        }

        info!("Detected HLS playlist format, downloading segments");
        let urls = segment_urls(&body, url);
        info!("Found {} VTT segments in playlist", urls.len());

        let mut segments = Vec::with_capacity(urls.len());
        for (i, segment_url) in urls.iter().enumerate() {
            debug!("Downloading segment {}/{}", i + 1, urls.len());
            match self.fetcher.fetch(segment_url) {
                Ok(text) => segments.push(text),
                Err(e) => warn!("Failed to download segment {}: {}, continuing", i + 1, e),
            }
        }

        info!("Merged {} of {} VTT segments", segments.len(), urls.len());
        Ok(concat_vtt_segments(&segments))
    }
}

fn derive_stream_id(url: &str, is_youtube: bool, stream_url: Option<&str>) -> String {
    if is_youtube {
        if let Some(id) = stream_url.and_then(extract_youtube_id) {
            return id;
        }
    }

    let last_segment = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_string),
        Err(_) => Some(url.to_string()),
    };

    last_segment
        .as_deref()
        .and_then(|segment| Path::new(segment).file_stem())
        .map(|stem| stem.to_string_lossy().to_string())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| DEFAULT_STREAM_ID.to_string())
}

fn truncate_url(url: &str) -> &str {
    match url.char_indices().nth(100) {
        Some((idx, _)) => &url[..idx],
        None => url,
    }
}
