use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::app_config::ParserConfig;
use crate::corrector::{CorrectionMethod, TimestampCorrector};
use crate::errors::{VttError, VttResult};
use crate::models::{Cue, Document, M3U8Info, Word};
use crate::sources::Storage;
use crate::timestamp::Timestamp;

use super::enrich::normalize_word_times;
use super::rechunk::{build_cues_from_words, split_long_cues};
use super::tags::{parse_cue_words, strip_tags, TagHeuristics};
use super::{normalize_newlines, split_blocks, TIMESTAMP_RANGE_REGEX, TIME_TAG_REGEX, VTT_HEADER};

// @module: Whole-document VTT parsing into segments documents

// @const: Timing line at the start of a line
static TIMING_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+:\d{2}:\d{2}\.\d{3} --> \d+:\d{2}:\d{2}\.\d{3}").unwrap()
});

/// Options for one document parse
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    /// Maximum output cue duration in seconds
    pub max_cue_duration: f64,

    /// Keep only timing lines and tagged lines before parsing
    pub clean_content: bool,

    /// Discard source cue boundaries and rebuild cues from all words
    pub rebuild_cues_from_words: bool,

    /// Push non-increasing word times forward and extend cue ends
    pub normalize_word_times: bool,

    pub heuristics: TagHeuristics,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            max_cue_duration: 2.0,
            clean_content: true,
            rebuild_cues_from_words: false,
            normalize_word_times: false,
            heuristics: TagHeuristics::default(),
        }
    }
}

impl From<&ParserConfig> for ParseOptions {
    fn from(config: &ParserConfig) -> Self {
        ParseOptions {
            max_cue_duration: config.max_cue_duration,
            clean_content: config.clean_content,
            rebuild_cues_from_words: config.rebuild_cues_from_words,
            normalize_word_times: config.normalize_word_times,
            heuristics: TagHeuristics {
                relative_tolerance_secs: config.relative_tag_tolerance_secs,
                align_rebuild_to_cue_start: config.align_rebuild_to_cue_start,
            },
        }
    }
}

/// Keep only timing lines that are directly followed by a tagged line.
///
/// The result is a minimal document of `timing\ncontent` pairs; the original
/// header metadata is not carried over.
pub fn clean_vtt_content(content: &str) -> String {
    let filtered: Vec<&str> = content
        .trim()
        .lines()
        .map(str::trim)
        .filter(|line| TIMING_LINE_REGEX.is_match(line) || TIME_TAG_REGEX.is_match(line))
        .collect();

    let mut pairs: Vec<String> = Vec::new();
    let mut i = 0;
    while i < filtered.len() {
        let line = filtered[i];
        if !TIMING_LINE_REGEX.is_match(line) {
            i += 1;
            continue;
        }

        match filtered.get(i + 1) {
            Some(next) if !TIMING_LINE_REGEX.is_match(next) => {
                pairs.push(format!("{}\n{}", line, next));
                i += 2;
            }
            _ => {
                debug!("Dropping orphan timing line: {}", line);
                i += 1;
            }
        }
    }

    format!("{}\n\n{}", VTT_HEADER, pairs.join("\n\n"))
}

fn validate(content: &str) -> VttResult<()> {
    let trimmed = content.trim_start();
    if trimmed.is_empty() {
        return Err(VttError::format("Empty VTT content"));
    }
    if !trimmed.starts_with(VTT_HEADER) {
        return Err(VttError::format(format!(
            "VTT content must start with '{}'",
            VTT_HEADER
        )));
    }
    Ok(())
}

fn parse_header(lines: &[&str]) -> BTreeMap<String, String> {
    lines
        .iter()
        .skip(1)
        .filter_map(|line| line.split_once(": "))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

// @struct: A cue block reduced to its timing and body
struct CueBlock {
    start: Timestamp,
    end: Timestamp,
    body: String,
}

fn read_cue_block(lines: &[&str]) -> VttResult<Option<CueBlock>> {
    if lines.len() < 2 {
        return Ok(None);
    }

    // The timing line follows an optional cue identifier
    let found = lines
        .iter()
        .take(2)
        .enumerate()
        .find_map(|(i, line)| TIMESTAMP_RANGE_REGEX.captures(line).map(|caps| (i, caps)));
    let Some((index, caps)) = found else {
        return Ok(None);
    };

    let start = Timestamp::parse(&caps[1])?;
    let mut end = Timestamp::parse(&caps[2])?;
    if end < start {
        warn!("Cue ends before it starts ({} --> {}), clamping end", start, end);
        end = start;
    }

    Ok(Some(CueBlock {
        start,
        end,
        body: lines[index + 1..].join(" "),
    }))
}

/// Parse VTT text into a segments document.
///
/// Fails with a format error on empty input or a missing `WEBVTT` marker.
pub fn parse_vtt_content(content: &str, options: &ParseOptions) -> VttResult<Document> {
    let content = normalize_newlines(content);
    validate(&content)?;

    let content = if options.clean_content {
        clean_vtt_content(&content)
    } else {
        content
    };

    let blocks = split_blocks(content.trim());
    let header = blocks.first().map(|b| parse_header(b)).unwrap_or_default();

    let rebuilding = options.rebuild_cues_from_words;
    let mut cues: Vec<Cue> = Vec::new();
    let mut all_words: Vec<Word> = Vec::new();

    for lines in blocks.iter().skip(1) {
        let Some(block) = read_cue_block(lines)? else {
            continue;
        };

        let words = parse_cue_words(
            &block.body,
            block.start,
            block.end,
            rebuilding,
            &all_words,
            &options.heuristics,
        );

        if rebuilding {
            all_words.extend(words);
        } else {
            cues.push(Cue::new(block.start, block.end, strip_tags(&block.body), words));
        }
    }

    let mut cues = if rebuilding {
        build_cues_from_words(all_words, options.max_cue_duration)
    } else {
        split_long_cues(cues, options.max_cue_duration)
    };

    if options.normalize_word_times {
        for cue in &mut cues {
            let (words, end) = normalize_word_times(&cue.words, cue.end);
            cue.words = words;
            cue.end = end;
        }
    }

    debug!("Parsed {} cues, {} header keys", cues.len(), header.len());
    Ok(Document::new(header, cues))
}

/// One `[HH:MM:SS] text` line per cue
pub fn format_transcript_with_timestamps(cues: &[Cue]) -> String {
    cues.iter()
        .map(|cue| {
            let total = cue.start.as_millis() / 1000;
            format!(
                "[{:02}:{:02}:{:02}] {}",
                total / 3600,
                (total % 3600) / 60,
                total % 60,
                cue.text.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read a VTT file and return its transcript together with the document
pub fn parse_vtt(
    storage: &dyn Storage,
    path: &Path,
    max_cue_duration: f64,
) -> VttResult<(String, Document)> {
    if !storage.exists(path) {
        return Err(VttError::NotFound(path.to_path_buf()));
    }

    let content = storage.read_text(path)?;
    let options = ParseOptions {
        max_cue_duration,
        ..ParseOptions::default()
    };
    let document = parse_vtt_content(&content, &options)?;

    Ok((format_transcript_with_timestamps(&document.cues), document))
}

/// Result of writing a segments document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseSummary {
    pub segments_path: PathBuf,
    pub cues_count: usize,
    pub offset_applied: f64,
    pub correction_method: CorrectionMethod,
}

/// VTT to segments document converter with optional live-stream correction
#[derive(Debug, Clone, Default)]
pub struct VttParser {
    options: ParseOptions,
}

impl VttParser {
    pub fn new(options: ParseOptions) -> Self {
        VttParser { options }
    }

    pub fn from_config(config: &ParserConfig) -> Self {
        Self::new(ParseOptions::from(config))
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse VTT text, shifting every timestamp when playlist info is given.
    ///
    /// The applied correction is recorded in the header under
    /// `timestamp_correction_*` keys.
    pub fn parse_content(&self, content: &str, m3u8_info: Option<&M3U8Info>) -> VttResult<Document> {
        let mut document = parse_vtt_content(content, &self.options)?;

        if let Some(info) = m3u8_info {
            let corrector = TimestampCorrector::new(info.clone());
            document.cues = corrector.apply_correction(document.cues);

            let metadata = corrector.correction_metadata();
            let header = &mut document.header;
            header.insert("timestamp_correction_applied".into(), metadata.applied.to_string());
            header.insert(
                "timestamp_correction_offset_seconds".into(),
                metadata.offset_seconds.to_string(),
            );
            header.insert(
                "timestamp_correction_method".into(),
                metadata.correction_method.to_string(),
            );
            if let Some(sequence) = metadata.media_sequence {
                header.insert("timestamp_correction_media_sequence".into(), sequence.to_string());
            }
            if let Some(duration) = metadata.segment_duration {
                header.insert("timestamp_correction_segment_duration".into(), duration.to_string());
            }
            if let Some(program_time) = metadata.program_time {
                header.insert("timestamp_correction_program_time".into(), program_time);
            }
        }

        Ok(document)
    }

    /// Parse a VTT file and write the segments document as pretty JSON
    pub fn parse_to_segments(
        &self,
        storage: &dyn Storage,
        vtt_file: &Path,
        output_file: &Path,
        m3u8_info: Option<&M3U8Info>,
    ) -> Result<ParseSummary> {
        info!("Parsing VTT file: {}", vtt_file.display());

        if !storage.exists(vtt_file) {
            return Err(VttError::NotFound(vtt_file.to_path_buf()).into());
        }

        let content = storage
            .read_text(vtt_file)
            .with_context(|| format!("Failed to read VTT file: {}", vtt_file.display()))?;
        let document = self.parse_content(&content, m3u8_info)?;

        let (offset_applied, correction_method) = match m3u8_info {
            Some(info) => {
                let corrector = TimestampCorrector::new(info.clone());
                (corrector.offset_seconds(), corrector.method())
            }
            None => (0.0, CorrectionMethod::None),
        };

        let json = document.to_json_pretty()?;
        storage
            .write_text(output_file, &json)
            .with_context(|| format!("Failed to write segments file: {}", output_file.display()))?;

        info!("VTT parsing complete: {} cues extracted", document.cues.len());

        Ok(ParseSummary {
            segments_path: output_file.to_path_buf(),
            cues_count: document.cues.len(),
            offset_applied,
            correction_method,
        })
    }
}
