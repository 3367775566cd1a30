/*!
 * Data model shared by the parsing, merging and correction pipeline.
 *
 * Two JSON shapes leave this crate:
 * - the live VTT shape (`Document`): words are point-in-time markers
 *   serialised as `{"word", "time"}`;
 * - the transcription shape (`SpanDocument`): words keep their
 *   `{"word", "start", "end"}` span as reported by the speech-to-text backend.
 */

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::VttResult;
use crate::timestamp::Timestamp;

/// A word anchored at a single point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    /// Word text, never empty
    #[serde(rename = "word")]
    pub text: String,

    /// Point in time the word is spoken or highlighted
    pub time: Timestamp,
}

impl Word {
    pub fn new(text: impl Into<String>, time: Timestamp) -> Self {
        Word {
            text: text.into(),
            time,
        }
    }
}

/// One timed caption entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cue {
    #[serde(rename = "start_time")]
    pub start: Timestamp,

    #[serde(rename = "end_time")]
    pub end: Timestamp,

    /// Plain text with all markup removed
    pub text: String,

    /// Word timings in order; may be empty
    #[serde(default)]
    pub words: Vec<Word>,
}

impl Cue {
    pub fn new(start: Timestamp, end: Timestamp, text: impl Into<String>, words: Vec<Word>) -> Self {
        Cue {
            start,
            end,
            text: text.into(),
            words,
        }
    }

    /// Cue length in seconds
    pub fn duration_secs(&self) -> f64 {
        self.end.seconds_since(self.start)
    }
}

/// A parsed caption document ("segments document")
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Header metadata (`Kind`, `Language`, correction audit keys, ...)
    #[serde(default)]
    pub header: BTreeMap<String, String>,

    /// Cues in chronological order
    #[serde(default)]
    pub cues: Vec<Cue>,
}

impl Document {
    pub fn new(header: BTreeMap<String, String>, cues: Vec<Cue>) -> Self {
        Document { header, cues }
    }

    /// Serialise as pretty-printed JSON
    pub fn to_json_pretty(&self) -> VttResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a segments document back from JSON
    pub fn from_json(json: &str) -> VttResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Every word of every cue, in cue order
    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.cues.iter().flat_map(|cue| cue.words.iter())
    }
}

/// Live playlist metadata used to correct stream-relative timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct M3U8Info {
    /// `#EXT-X-PROGRAM-DATE-TIME` of the first segment (ISO-8601)
    #[serde(default)]
    pub program_time: Option<String>,

    /// `#EXT-X-MEDIA-SEQUENCE`
    #[serde(default)]
    pub media_sequence: Option<u64>,

    /// Mean segment duration in seconds
    #[serde(default = "default_segment_duration")]
    pub segment_duration: f64,
}

impl Default for M3U8Info {
    fn default() -> Self {
        M3U8Info {
            program_time: None,
            media_sequence: None,
            segment_duration: default_segment_duration(),
        }
    }
}

fn default_segment_duration() -> f64 {
    5.0
}

/// A word with a start and optional end, in seconds (transcription input)
#[derive(Debug, Clone, PartialEq)]
pub struct TimedWord {
    pub word: String,
    pub start: f64,
    pub end: Option<f64>,
}

/// A normalized speech-to-text segment, in seconds
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub words: Vec<TimedWord>,
}

/// Word span in the transcription output shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordSpan {
    pub word: String,
    pub start: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Timestamp>,
}

/// Cue in the transcription output shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanCue {
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub text: String,
    #[serde(default)]
    pub words: Vec<WordSpan>,
}

/// Segments document in the transcription output shape
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanDocument {
    #[serde(default)]
    pub header: BTreeMap<String, String>,
    #[serde(default)]
    pub cues: Vec<SpanCue>,
}
