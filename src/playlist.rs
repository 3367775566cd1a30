/*!
 * HLS (M3U8) playlist text handling.
 *
 * Fetching stays with the `Fetcher` collaborator; this module only reads
 * playlist text: timing metadata for offset correction, segment URLs, and
 * concatenation of downloaded VTT segments.
 */

use chrono::DateTime;
use log::{debug, info, warn};
use url::Url;

use crate::models::M3U8Info;
use crate::vtt::VTT_HEADER;

const PROGRAM_DATE_TIME_TAG: &str = "#EXT-X-PROGRAM-DATE-TIME:";
const MEDIA_SEQUENCE_TAG: &str = "#EXT-X-MEDIA-SEQUENCE:";
const EXTINF_TAG: &str = "#EXTINF:";

/// Read timing metadata from playlist text.
///
/// The first `PROGRAM-DATE-TIME` is kept; the segment duration is the mean
/// of all `EXTINF` durations (5.0 when there are none).
pub fn parse_m3u8_info(text: &str) -> M3U8Info {
    let mut info = M3U8Info::default();
    let mut durations: Vec<f64> = Vec::new();

    for line in text.lines().map(str::trim) {
        if let Some(value) = line.strip_prefix(PROGRAM_DATE_TIME_TAG) {
            if info.program_time.is_none() {
                let value = value.trim();
                if DateTime::parse_from_rfc3339(value).is_err() {
                    warn!("PROGRAM-DATE-TIME is not RFC 3339: {}", value);
                }
                debug!("Found PROGRAM-DATE-TIME: {}", value);
                info.program_time = Some(value.to_string());
            }
        } else if let Some(value) = line.strip_prefix(MEDIA_SEQUENCE_TAG) {
            match value.trim().parse::<u64>() {
                Ok(sequence) => {
                    debug!("Found MEDIA-SEQUENCE: {}", sequence);
                    info.media_sequence = Some(sequence);
                }
                Err(e) => warn!("Invalid MEDIA-SEQUENCE '{}': {}", value.trim(), e),
            }
        } else if let Some(value) = line.strip_prefix(EXTINF_TAG) {
            let duration = value.split(',').next().unwrap_or("").trim();
            if let Ok(seconds) = duration.parse::<f64>() {
                durations.push(seconds);
            }
        }
    }

    if !durations.is_empty() {
        info.segment_duration = durations.iter().sum::<f64>() / durations.len() as f64;
    }

    info!(
        "M3U8 info: sequence={:?}, avg_duration={:.3}s",
        info.media_sequence, info.segment_duration
    );
    info
}

/// Whether a response body is an HLS playlist rather than VTT
pub fn is_hls_playlist(text: &str) -> bool {
    text.trim_start().starts_with("#EXTM3U")
}

/// Whether a URL points at an M3U8 playlist
pub fn is_m3u8_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.ends_with(".m3u8") || lower.contains(".m3u8?")
}

/// Absolute URLs of every segment listed in a playlist
pub fn segment_urls(playlist_text: &str, playlist_url: &str) -> Vec<String> {
    let base = Url::parse(playlist_url).ok();

    playlist_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            if line.starts_with("http://") || line.starts_with("https://") {
                return line.to_string();
            }
            match base.as_ref().and_then(|b| b.join(line).ok()) {
                Some(joined) => joined.to_string(),
                None => {
                    let dir = playlist_url.rsplit_once('/').map_or(playlist_url, |(d, _)| d);
                    format!("{}/{}", dir, line)
                }
            }
        })
        .collect()
}

/// Concatenate VTT segments into one document, numbering cues from 1.
///
/// Segment headers and metadata lines are dropped.
pub fn concat_vtt_segments(segments: &[String]) -> String {
    let mut merged = format!("{}\n\n", VTT_HEADER);
    let mut cue_counter = 1;

    for (i, segment) in segments.iter().enumerate() {
        let mut in_cue = false;

        for line in segment.lines() {
            if line.starts_with(VTT_HEADER) || line.starts_with("Kind:") || line.starts_with("Language:") {
                continue;
            }

            if line.contains("-->") {
                if in_cue {
                    merged.push('\n');
                }
                in_cue = true;
                merged.push_str(&format!("{}\n{}\n", cue_counter, line));
                cue_counter += 1;
            } else if in_cue {
                if line.trim().is_empty() {
                    merged.push('\n');
                    in_cue = false;
                } else {
                    merged.push_str(line);
                    merged.push('\n');
                }
            }
        }

        if in_cue {
            merged.push('\n');
        }
        if i + 1 < segments.len() {
            merged.push('\n');
        }
    }

    merged
}
