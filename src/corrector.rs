/*!
 * Live-stream timestamp correction.
 *
 * Live VTT tracks restart their clock near zero on every playlist fetch. The
 * playlist's media sequence times the segment duration estimates how far the
 * stream has progressed, and that offset is added to every cue and word.
 */

use std::fmt;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::models::{Cue, M3U8Info, Word};
use crate::timestamp::Timestamp;
use crate::vtt::{TIMESTAMP_RANGE_REGEX, TIME_TAG_REGEX};

const LARGE_OFFSET_SECS: f64 = 86_400.0;

/// How an offset was derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionMethod {
    /// `media_sequence * segment_duration`
    MediaSequence,
    /// No usable metadata, timestamps left as they are
    #[default]
    None,
}

impl fmt::Display for CorrectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrectionMethod::MediaSequence => write!(f, "media_sequence"),
            CorrectionMethod::None => write!(f, "none"),
        }
    }
}

/// Compute the offset in seconds implied by playlist metadata.
///
/// Falls back to `(0.0, None)` when the media sequence is missing or the
/// segment duration is zero. Negative results clamp to zero.
pub fn calculate_timestamp_offset(info: Option<&M3U8Info>) -> (f64, CorrectionMethod) {
    let Some(info) = info else {
        warn!("No M3U8 info provided, using original timestamps");
        return (0.0, CorrectionMethod::None);
    };

    let segment_duration = info.segment_duration;
    let media_sequence = match info.media_sequence {
        Some(sequence) if segment_duration != 0.0 && !segment_duration.is_nan() => sequence,
        _ => {
            warn!("No media sequence found in M3U8 info, using original timestamps");
            return (0.0, CorrectionMethod::None);
        }
    };

    let mut offset = media_sequence as f64 * segment_duration;
    if !offset.is_finite() {
        warn!("Failed to calculate timestamp offset from {:?}, using original timestamps", info);
        return (0.0, CorrectionMethod::None);
    }

    info!(
        "Media sequence {} x {:.3}s segments = {:.3}s offset ({:.2} hours)",
        media_sequence,
        segment_duration,
        offset,
        offset / 3600.0
    );

    if offset < 0.0 {
        warn!("Negative offset calculated: {}s, using 0", offset);
        offset = 0.0;
    } else if offset > LARGE_OFFSET_SECS {
        warn!("Very large offset: {}s ({:.1} hours)", offset, offset / 3600.0);
    }

    (offset, CorrectionMethod::MediaSequence)
}

/// Shift an `HH:MM:SS.mmm` string; malformed input is logged and returned as is
pub fn add_seconds_to_timestamp(text: &str, offset_seconds: f64) -> String {
    match Timestamp::parse(text) {
        Ok(ts) => ts.shifted(offset_seconds).to_string(),
        Err(e) => {
            error!("Failed to adjust timestamp {}: {}", text, e);
            text.to_string()
        }
    }
}

/// Shift every cue boundary and word time by `offset_seconds`
pub fn apply_offset_to_cues(cues: Vec<Cue>, offset_seconds: f64) -> Vec<Cue> {
    if offset_seconds == 0.0 {
        return cues;
    }

    info!(
        "Applying timestamp offset to {} cues: {:.3}s ({:.1} minutes)",
        cues.len(),
        offset_seconds,
        offset_seconds / 60.0
    );

    cues.into_iter()
        .map(|cue| Cue {
            start: cue.start.shifted(offset_seconds),
            end: cue.end.shifted(offset_seconds),
            words: cue
                .words
                .into_iter()
                .map(|w| Word::new(w.text, w.time.shifted(offset_seconds)))
                .collect(),
            text: cue.text,
        })
        .collect()
}

/// Shift every timing line and inline `<TIME>` tag of raw VTT text
pub fn apply_offset_to_vtt_content(content: &str, offset_seconds: f64) -> String {
    if offset_seconds == 0.0 {
        return content.to_string();
    }

    let ranges_shifted = TIMESTAMP_RANGE_REGEX.replace_all(content, |caps: &regex::Captures| {
        format!(
            "{} --> {}",
            add_seconds_to_timestamp(&caps[1], offset_seconds),
            add_seconds_to_timestamp(&caps[2], offset_seconds)
        )
    });

    TIME_TAG_REGEX
        .replace_all(&ranges_shifted, |caps: &regex::Captures| {
            format!("<{}>", add_seconds_to_timestamp(&caps[1], offset_seconds))
        })
        .into_owned()
}

/// Audit record of an applied correction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionMetadata {
    pub applied: bool,
    pub offset_seconds: f64,
    pub media_sequence: Option<u64>,
    pub segment_duration: Option<f64>,
    pub program_time: Option<String>,
    pub correction_method: CorrectionMethod,
}

/// Holds one playlist snapshot and the offset derived from it
#[derive(Debug, Clone, Default)]
pub struct TimestampCorrector {
    info: Option<M3U8Info>,
    offset_seconds: f64,
    method: CorrectionMethod,
}

impl TimestampCorrector {
    pub fn new(info: M3U8Info) -> Self {
        let (offset_seconds, method) = calculate_timestamp_offset(Some(&info));
        TimestampCorrector {
            info: Some(info),
            offset_seconds,
            method,
        }
    }

    pub fn offset_seconds(&self) -> f64 {
        self.offset_seconds
    }

    pub fn method(&self) -> CorrectionMethod {
        self.method
    }

    pub fn apply_correction(&self, cues: Vec<Cue>) -> Vec<Cue> {
        apply_offset_to_cues(cues, self.offset_seconds)
    }

    pub fn apply_to_vtt_content(&self, content: &str) -> String {
        apply_offset_to_vtt_content(content, self.offset_seconds)
    }

    pub fn correction_metadata(&self) -> CorrectionMetadata {
        CorrectionMetadata {
            applied: self.offset_seconds > 0.0,
            offset_seconds: self.offset_seconds,
            media_sequence: self.info.as_ref().and_then(|i| i.media_sequence),
            segment_duration: self.info.as_ref().map(|i| i.segment_duration),
            program_time: self.info.as_ref().and_then(|i| i.program_time.clone()),
            correction_method: self.method,
        }
    }
}
