/*!
 * Word timestamp estimation.
 *
 * Cues that arrive without inline timing get plausible per-word times by
 * spreading the cue span over its words, weighted by syllable count (or
 * character count when no syllable estimate is available) with short pauses
 * after punctuation. `enrich_vtt_content` writes the estimates back into
 * VTT text as inline tags.
 */

use std::path::Path;

use log::{debug, info};
use serde::Serialize;

use crate::errors::{VttError, VttResult};
use crate::models::Word;
use crate::sources::Storage;
use crate::timestamp::Timestamp;

use super::tags::{has_inline_tags, strip_tags};
use super::{normalize_newlines, split_blocks, TIMESTAMP_RANGE_REGEX};

/// Minimum time reserved for every word (seconds)
pub const BASELINE_PER_WORD_SECS: f64 = 0.15;

const COMMA_PAUSE_SECS: f64 = 0.1;
const SENTENCE_PAUSE_SECS: f64 = 0.2;

// Average speaking rate used to guess how long a word lasts
const WORDS_PER_MINUTE: f64 = 165.0;
const CHARS_PER_WORD: f64 = 5.0;
const MIN_WORD_DURATION_SECS: f64 = 0.2;
const MAX_WORD_DURATION_SECS: f64 = 1.5;
const LAST_WORD_TAIL_FACTOR: f64 = 0.8;

const WORD_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':', '\'', '"'];

/// Estimates how many syllables a word has
pub trait SyllableCounter: Send + Sync {
    /// Syllable count of a punctuation-free word, or `None` when no estimate
    /// can be made
    fn count(&self, word: &str) -> Option<usize>;
}

/// English heuristic: one syllable per vowel group, minus a silent final `e`
#[derive(Debug, Default, Clone, Copy)]
pub struct VowelGroupCounter;

impl SyllableCounter for VowelGroupCounter {
    fn count(&self, word: &str) -> Option<usize> {
        let lower = word.to_lowercase();
        if !lower.chars().any(char::is_alphabetic) {
            return None;
        }

        let mut groups = 0;
        let mut in_vowel_group = false;
        for c in lower.chars() {
            let is_vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
            if is_vowel && !in_vowel_group {
                groups += 1;
            }
            in_vowel_group = is_vowel;
        }

        if groups > 1 && lower.ends_with('e') && !lower.ends_with("le") {
            groups -= 1;
        }

        Some(groups.max(1))
    }
}

/// Spreads a cue span over its words
pub struct WordTimestampEstimator {
    counter: Option<Box<dyn SyllableCounter>>,
}

impl Default for WordTimestampEstimator {
    fn default() -> Self {
        Self::with_counter(VowelGroupCounter)
    }
}

impl WordTimestampEstimator {
    pub fn with_counter<C: SyllableCounter + 'static>(counter: C) -> Self {
        WordTimestampEstimator {
            counter: Some(Box::new(counter)),
        }
    }

    /// Estimator that weights words by character count only
    pub fn character_weighted() -> Self {
        WordTimestampEstimator { counter: None }
    }

    fn weight(&self, clean_word: &str) -> usize {
        let chars = clean_word.chars().count().max(1);
        if clean_word.is_empty() {
            return chars;
        }

        match self.counter.as_ref().map(|c| c.count(clean_word)) {
            Some(Some(syllables)) => syllables.max(1),
            Some(None) => {
                debug!("No syllable estimate for '{}', weighting by length", clean_word);
                chars
            }
            None => chars,
        }
    }

    /// Per-word times for `text` spoken between `start` and `end`
    pub fn estimate(&self, start: Timestamp, end: Timestamp, text: &str) -> Vec<Word> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        match tokens.len() {
            0 => return Vec::new(),
            1 => return vec![Word::new(tokens[0], start)],
            _ => {}
        }

        let total_duration = end.seconds_since(start);
        let weights: Vec<usize> = tokens
            .iter()
            .map(|t| self.weight(t.trim_matches(WORD_PUNCTUATION)))
            .collect();
        let pauses: Vec<f64> = tokens.iter().map(|t| pause_after(t)).collect();

        let total_weight: usize = weights.iter().sum();
        let total_pauses: f64 = pauses.iter().sum();
        let remaining = (total_duration
            - BASELINE_PER_WORD_SECS * tokens.len() as f64
            - total_pauses)
            .max(0.0);

        let mut words = Vec::with_capacity(tokens.len());
        let mut current = start.as_seconds();
        for (i, token) in tokens.iter().enumerate() {
            let time = Timestamp::from_seconds(current).min(end);
            words.push(Word::new(*token, time));

            if i + 1 == tokens.len() {
                // Last word runs to the cue end
                break;
            }
            let proportional = weights[i] as f64 / total_weight as f64 * remaining;
            current += BASELINE_PER_WORD_SECS + proportional + pauses[i];
        }

        words
    }
}

fn pause_after(token: &str) -> f64 {
    if token.ends_with(',') || token.ends_with(';') {
        COMMA_PAUSE_SECS
    } else if token.ends_with('.') || token.ends_with('!') || token.ends_with('?') {
        SENTENCE_PAUSE_SECS
    } else {
        0.0
    }
}

/// Estimate word times with the default syllable heuristic
pub fn estimate_word_timestamps(start: Timestamp, end: Timestamp, text: &str) -> Vec<Word> {
    WordTimestampEstimator::default().estimate(start, end, text)
}

fn estimated_word_duration(word: &str) -> f64 {
    let secs_per_char = 60.0 / (WORDS_PER_MINUTE * CHARS_PER_WORD);
    let chars = word.trim_matches(WORD_PUNCTUATION).chars().count() as f64;
    (chars * secs_per_char).clamp(MIN_WORD_DURATION_SECS, MAX_WORD_DURATION_SECS)
}

/// Push non-increasing word times forward and derive a cue end that does not
/// cut off the last word.
///
/// Returns the adjusted words and `max(cue_end, last + 0.8 * last_duration)`.
pub fn normalize_word_times(words: &[Word], cue_end: Timestamp) -> (Vec<Word>, Timestamp) {
    let mut result: Vec<Word> = Vec::with_capacity(words.len());
    let mut previous: Option<(Timestamp, f64)> = None;

    for word in words {
        let mut time = word.time;
        if let Some((prev_time, prev_duration)) = previous {
            if time <= prev_time {
                time = prev_time.shifted(prev_duration);
            }
        }

        previous = Some((time, estimated_word_duration(&word.text)));
        result.push(Word::new(word.text.clone(), time));
    }

    let derived_end = match previous {
        Some((last, duration)) => cue_end.max(last.shifted(LAST_WORD_TAIL_FACTOR * duration)),
        None => cue_end,
    };

    (result, derived_end)
}

/// Cue body with inline word tags followed by the plain sentence.
///
/// `first<T2><c> second</c><T3><c> third</c>\nfirst second third`
pub fn format_cue_with_word_timestamps(words: &[Word]) -> String {
    if words.is_empty() {
        return String::new();
    }

    let mut tagged = String::new();
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            tagged.push_str(&word.text);
        } else {
            tagged.push_str(&format!("<{}><c> {}</c>", word.time, word.text));
        }
    }

    let plain = words
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    format!("{}\n{}", tagged, plain)
}

/// Counters reported by VTT enrichment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichStats {
    pub cues_processed: usize,
    pub cues_enriched: usize,
    pub cues_skipped: usize,
}

fn is_header_block(first_line: &str) -> bool {
    ["WEBVTT", "X-TIMESTAMP-MAP", "Kind:", "Language:"]
        .iter()
        .any(|prefix| first_line.starts_with(prefix))
}

fn enrich_with_stats(content: &str, estimator: &WordTimestampEstimator) -> (String, EnrichStats) {
    let content = normalize_newlines(content);
    let mut stats = EnrichStats::default();
    let mut out_blocks: Vec<String> = Vec::new();

    for lines in split_blocks(&content) {
        if is_header_block(lines[0]) {
            out_blocks.push(lines.join("\n"));
            continue;
        }

        let timing = lines.iter().enumerate().find_map(|(i, line)| {
            TIMESTAMP_RANGE_REGEX.captures(line).map(|caps| (i, caps))
        });
        let Some((timing_idx, caps)) = timing else {
            out_blocks.push(lines.join("\n"));
            continue;
        };
        stats.cues_processed += 1;

        let body = lines[timing_idx + 1..].join(" ");
        if has_inline_tags(&body) {
            stats.cues_skipped += 1;
            out_blocks.push(lines.join("\n"));
            continue;
        }

        let plain = strip_tags(&body);
        let (Ok(start), Ok(end)) = (Timestamp::parse(&caps[1]), Timestamp::parse(&caps[2])) else {
            out_blocks.push(lines.join("\n"));
            continue;
        };
        if plain.is_empty() {
            out_blocks.push(lines.join("\n"));
            continue;
        }

        let words = estimator.estimate(start, end, &plain);
        let mut block: Vec<String> = lines[..=timing_idx].iter().map(|l| l.to_string()).collect();
        block.push(format_cue_with_word_timestamps(&words));
        out_blocks.push(block.join("\n"));
        stats.cues_enriched += 1;
    }

    let mut enriched = out_blocks.join("\n\n");
    if !enriched.ends_with('\n') {
        enriched.push('\n');
    }

    (enriched, stats)
}

/// Add estimated word tags to every cue that has none
pub fn enrich_vtt_content(content: &str) -> String {
    enrich_with_stats(content, &WordTimestampEstimator::default()).0
}

/// Enrich a VTT file in place, or into `output` when given
pub fn enrich_vtt_file(
    storage: &dyn Storage,
    input: &Path,
    output: Option<&Path>,
) -> VttResult<EnrichStats> {
    if !storage.exists(input) {
        return Err(VttError::NotFound(input.to_path_buf()));
    }

    let content = storage.read_text(input)?;
    let (enriched, stats) = enrich_with_stats(&content, &WordTimestampEstimator::default());

    let target = output.unwrap_or(input);
    storage.write_text(target, &enriched)?;

    info!(
        "Enriched {} of {} cues ({} already timed) -> {}",
        stats.cues_enriched,
        stats.cues_processed,
        stats.cues_skipped,
        target.display()
    );

    Ok(stats)
}
