/*!
 * Speech-to-text output normalization.
 *
 * Backends report segments either as JSON mappings or as typed records.
 * `normalize_segments` resolves both once into `TranscriptSegment`s; the
 * rest of the module only ever sees those.
 */

use std::cmp::Ordering;
use std::collections::BTreeMap;

use log::debug;
use serde_json::{Map, Value};

use crate::models::{
    Cue, Document, SpanCue, SpanDocument, TimedWord, TranscriptSegment, Word, WordSpan,
};
use crate::timestamp::Timestamp;

// @const: Assumed length of a final word without an end time
const TRAILING_WORD_SECS: f64 = 0.3;

/// Word as reported by a backend
#[derive(Debug, Clone, PartialEq)]
pub enum RawWord {
    Mapping(Map<String, Value>),
    Record(WordRecord),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordRecord {
    pub word: Option<String>,
    pub start: Option<f64>,
    pub end: Option<f64>,
}

/// Segment as reported by a backend
#[derive(Debug, Clone, PartialEq)]
pub enum RawSegment {
    Mapping(Map<String, Value>),
    Record(SegmentRecord),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentRecord {
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub text: Option<String>,
    pub words: Vec<RawWord>,
}

/// A field read through the mapping/record accessor
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(t) => t.trim().parse().ok(),
        }
    }

    fn into_text(self) -> String {
        match self {
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Text(t) => t,
        }
    }
}

fn mapping_field(map: &Map<String, Value>, name: &str) -> Option<FieldValue> {
    match map.get(name)? {
        Value::Number(n) => n.as_f64().map(FieldValue::Number),
        Value::String(s) => Some(FieldValue::Text(s.clone())),
        _ => None,
    }
}

impl RawWord {
    /// Named field, `None` when absent or null
    pub fn get_field(&self, name: &str) -> Option<FieldValue> {
        match self {
            RawWord::Mapping(map) => mapping_field(map, name),
            RawWord::Record(record) => match name {
                "word" => record.word.clone().map(FieldValue::Text),
                "start" => record.start.map(FieldValue::Number),
                "end" => record.end.map(FieldValue::Number),
                _ => None,
            },
        }
    }
}

impl RawSegment {
    /// Named scalar field, `None` when absent or null
    pub fn get_field(&self, name: &str) -> Option<FieldValue> {
        match self {
            RawSegment::Mapping(map) => mapping_field(map, name),
            RawSegment::Record(record) => match name {
                "start" => record.start.map(FieldValue::Number),
                "end" => record.end.map(FieldValue::Number),
                "text" => record.text.clone().map(FieldValue::Text),
                _ => None,
            },
        }
    }

    fn words(&self) -> Vec<RawWord> {
        match self {
            RawSegment::Mapping(map) => match map.get("words") {
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(|item| item.as_object().cloned().map(RawWord::Mapping))
                    .collect(),
                _ => Vec::new(),
            },
            RawSegment::Record(record) => record.words.clone(),
        }
    }
}

impl From<Map<String, Value>> for RawSegment {
    fn from(map: Map<String, Value>) -> Self {
        RawSegment::Mapping(map)
    }
}

impl From<SegmentRecord> for RawSegment {
    fn from(record: SegmentRecord) -> Self {
        RawSegment::Record(record)
    }
}

/// Resolve backend segments into plain records.
///
/// Texts are trimmed; words without text or start are dropped.
pub fn normalize_segments(raw: &[RawSegment]) -> Vec<TranscriptSegment> {
    raw.iter()
        .map(|segment| {
            let number = |name: &str| segment.get_field(name).and_then(|v| v.as_f64()).unwrap_or(0.0);
            let text = segment
                .get_field("text")
                .map(FieldValue::into_text)
                .unwrap_or_default()
                .trim()
                .to_string();

            let words = segment
                .words()
                .iter()
                .filter_map(|word| {
                    let text = word.get_field("word")?.into_text().trim().to_string();
                    let start = word.get_field("start")?.as_f64()?;
                    if text.is_empty() {
                        return None;
                    }
                    Some(TimedWord {
                        word: text,
                        start,
                        end: word.get_field("end").and_then(|v| v.as_f64()),
                    })
                })
                .collect();

            TranscriptSegment {
                start: number("start"),
                end: number("end"),
                text,
                words,
            }
        })
        .collect()
}

fn millis_key(seconds: f64) -> i64 {
    (seconds * 1000.0).round() as i64
}

/// Group words sharing a start time (rounded to the millisecond), in time order
pub fn group_words_by_start(words: &[TimedWord]) -> Vec<Vec<TimedWord>> {
    let mut sorted = words.to_vec();
    sorted.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(Ordering::Equal));

    let mut groups: Vec<Vec<TimedWord>> = Vec::new();
    let mut current_key = None;

    for word in sorted {
        let key = millis_key(word.start);
        if current_key == Some(key) {
            if let Some(group) = groups.last_mut() {
                group.push(word);
                continue;
            }
        }
        groups.push(vec![word]);
        current_key = Some(key);
    }

    groups
}

/// End of a word group: its last word's end, else the next group's start
pub fn estimate_group_end(group: &[TimedWord], next_start: Option<f64>) -> f64 {
    let Some(last) = group.last() else {
        return next_start.unwrap_or(0.0);
    };

    last.end
        .or(next_start)
        .unwrap_or(last.start + TRAILING_WORD_SECS)
}

/// Split segments longer than `max_duration` seconds.
///
/// Word groups are never split. The final chunk of a segment ends at the
/// later of the segment end and its last group end.
pub fn split_long_segments(
    segments: Vec<TranscriptSegment>,
    max_duration: f64,
) -> Vec<TranscriptSegment> {
    if max_duration <= 0.0 {
        return segments;
    }

    let mut result = Vec::with_capacity(segments.len());

    for segment in segments {
        let duration = segment.end - segment.start;
        if duration <= max_duration {
            result.push(segment);
            continue;
        }

        if segment.words.is_empty() {
            let chunks = (duration / max_duration).ceil().max(1.0) as usize;
            let chunk_duration = duration / chunks as f64;
            for i in 0..chunks {
                let end = if i + 1 == chunks {
                    segment.end
                } else {
                    (segment.start + (i + 1) as f64 * chunk_duration).min(segment.end)
                };
                result.push(TranscriptSegment {
                    start: segment.start + i as f64 * chunk_duration,
                    end,
                    text: segment.text.clone(),
                    words: Vec::new(),
                });
            }
            continue;
        }

        let groups = group_words_by_start(&segment.words);
        let mut chunk_words: Vec<TimedWord> = Vec::new();
        let mut chunk_start = segment.start;
        let mut last_end = segment.start;

        for (idx, group) in groups.iter().enumerate() {
            let next_start = groups.get(idx + 1).map(|g| g[0].start);
            let group_end = estimate_group_end(group, next_start);

            if group_end - chunk_start > max_duration && !chunk_words.is_empty() {
                result.push(TranscriptSegment {
                    start: chunk_start,
                    end: last_end,
                    text: join_words(&chunk_words),
                    words: std::mem::take(&mut chunk_words),
                });
                chunk_start = group[0].start;
            }

            chunk_words.extend(group.iter().cloned());
            last_end = group_end;
        }

        if !chunk_words.is_empty() {
            result.push(TranscriptSegment {
                start: chunk_start,
                end: segment.end.max(last_end),
                text: join_words(&chunk_words),
                words: chunk_words,
            });
        }
    }

    debug!("Split transcript into {} segments", result.len());
    result
}

fn join_words(words: &[TimedWord]) -> String {
    words
        .iter()
        .map(|w| w.word.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

fn captions_header(language: &str) -> BTreeMap<String, String> {
    let mut header = BTreeMap::new();
    header.insert("kind".to_string(), "captions".to_string());
    header.insert("language".to_string(), language.to_string());
    header
}

/// Segments document in the live shape: words keep only their start
pub fn build_segments_json(raw: &[RawSegment], language: &str, max_segment_duration: f64) -> Document {
    let segments = split_long_segments(normalize_segments(raw), max_segment_duration);

    let cues = segments
        .into_iter()
        .map(|segment| {
            let words = segment
                .words
                .into_iter()
                .map(|w| Word::new(w.word, Timestamp::from_seconds(w.start)))
                .collect();
            Cue::new(
                Timestamp::from_seconds(segment.start),
                Timestamp::from_seconds(segment.end),
                segment.text.trim(),
                words,
            )
        })
        .collect();

    Document::new(captions_header(language), cues)
}

/// Segments document in the transcription shape: words keep their span
pub fn build_timed_segments(raw: &[RawSegment], language: &str, max_segment_duration: f64) -> SpanDocument {
    let segments = split_long_segments(normalize_segments(raw), max_segment_duration);

    let cues = segments
        .into_iter()
        .map(|segment| SpanCue {
            start_time: Timestamp::from_seconds(segment.start),
            end_time: Timestamp::from_seconds(segment.end),
            text: segment.text.trim().to_string(),
            words: segment
                .words
                .into_iter()
                .map(|w| WordSpan {
                    word: w.word,
                    start: Timestamp::from_seconds(w.start),
                    end: w.end.map(Timestamp::from_seconds),
                })
                .collect(),
        })
        .collect();

    SpanDocument {
        header: captions_header(language),
        cues,
    }
}
