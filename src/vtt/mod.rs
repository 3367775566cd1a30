/*!
 * WebVTT parsing and reconstruction.
 *
 * - `tags`: per-cue inline tag parsing into words
 * - `rechunk`: duration-bounded cue splitting and cue rebuilding from words
 * - `document`: whole-document parsing into a segments document
 * - `enrich`: word timestamp estimation for cues without inline timing
 */

use once_cell::sync::Lazy;
use regex::Regex;

pub mod document;
pub mod enrich;
pub mod rechunk;
pub mod tags;

pub use document::{
    clean_vtt_content, format_transcript_with_timestamps, parse_vtt, parse_vtt_content,
    ParseOptions, ParseSummary, VttParser,
};
pub use enrich::{
    enrich_vtt_content, enrich_vtt_file, estimate_word_timestamps, format_cue_with_word_timestamps,
    normalize_word_times, EnrichStats, SyllableCounter, VowelGroupCounter, WordTimestampEstimator,
};
pub use rechunk::{build_cues_from_words, split_long_cues};
pub use tags::{has_inline_tags, parse_cue_words, resolve_inner_base, strip_tags, TagHeuristics};

/// Literal first token of every VTT document
pub const VTT_HEADER: &str = "WEBVTT";

// @const: `START --> END` cue timing line
pub(crate) static TIMESTAMP_RANGE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+:\d{2}:\d{2}\.\d{3}) --> (\d+:\d{2}:\d{2}\.\d{3})").unwrap()
});

// @const: Bare inline `<TIME>` tag
pub(crate) static TIME_TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(\d+:\d{2}:\d{2}\.\d{3})>").unwrap());

/// Split text into blocks separated by blank lines
pub(crate) fn split_blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

/// Normalise Windows line endings
pub(crate) fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
