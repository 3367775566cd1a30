/*!
 * Tests for word timestamp estimation and enrichment
 */

use std::path::Path;

use vttkit::models::Word;
use vttkit::sources::MemoryStorage;
use vttkit::timestamp::Timestamp;
use vttkit::vtt::{
    enrich_vtt_content, enrich_vtt_file, estimate_word_timestamps, has_inline_tags,
    normalize_word_times, parse_vtt_content, ParseOptions, SyllableCounter,
    WordTimestampEstimator,
};
use crate::common;

fn ts(text: &str) -> Timestamp {
    Timestamp::parse(text).unwrap()
}

/// Counter that never has an estimate
struct NoEstimate;

impl SyllableCounter for NoEstimate {
    fn count(&self, _word: &str) -> Option<usize> {
        None
    }
}

/// Three words, first at the cue start, increasing, inside the cue
#[test]
fn test_estimateWordTimestamps_withThreeWords_shouldSpreadOverCue() {
    let start = ts("00:00:00.000");
    let end = ts("00:00:03.000");
    let words = estimate_word_timestamps(start, end, "preparing to activate");

    assert_eq!(words.len(), 3);
    assert_eq!(words[0].time, start);
    assert!(words[0].time < words[1].time && words[1].time < words[2].time);
    assert!(words.iter().all(|w| w.time <= end));
}

/// A failing syllable counter falls back to character weighting
#[test]
fn test_estimate_withFailingCounter_shouldMatchCharacterWeighting() {
    let start = ts("00:00:10.000");
    let end = ts("00:00:14.000");
    let text = "well, that was unexpected. really";

    let fallback = WordTimestampEstimator::with_counter(NoEstimate).estimate(start, end, text);
    let by_chars = WordTimestampEstimator::character_weighted().estimate(start, end, text);

    assert_eq!(fallback, by_chars);
}

/// Punctuation pauses delay the following word
#[test]
fn test_estimate_withSentenceBreak_shouldDelayNextWord() {
    let start = ts("00:00:00.000");
    let end = ts("00:00:04.000");
    let estimator = WordTimestampEstimator::character_weighted();

    let plain = estimator.estimate(start, end, "aa bb cc");
    let paused = estimator.estimate(start, end, "aa. bb cc");

    assert!(paused[1].time > plain[1].time);
}

/// Degenerate inputs
#[test]
fn test_estimateWordTimestamps_withZeroOrOneWord_shouldBeTrivial() {
    let start = ts("00:00:01.000");
    let end = ts("00:00:02.000");
    assert!(estimate_word_timestamps(start, end, "   ").is_empty());
    assert_eq!(
        estimate_word_timestamps(start, end, "alone"),
        vec![Word::new("alone", start)]
    );
}

/// Non-increasing times are pushed forward and the cue end extended
#[test]
fn test_normalizeWordTimes_withCollidingWords_shouldPushForward() {
    let t = ts("00:00:05.000");
    let words = vec![Word::new("hello", t), Word::new("world", t)];

    let (normalized, end) = normalize_word_times(&words, t);

    assert!(normalized[1].time > normalized[0].time);
    assert!(end > normalized[1].time);
}

/// Enriched text parses back into one word per token
#[test]
fn test_enrichVttContent_thenParse_shouldYieldEveryWord() {
    let enriched = enrich_vtt_content(common::PLAIN_VTT);
    assert!(has_inline_tags(&enriched));

    let document = parse_vtt_content(&enriched, &ParseOptions::default()).unwrap();
    let words: Vec<&str> = document.words().map(|w| w.text.as_str()).collect();

    assert_eq!(
        words,
        vec!["Hello", "everyone,", "welcome", "back.", "Today", "we", "look", "at", "subtitles."]
    );
}

/// Already timed cues are left alone and counted as skipped
#[test]
fn test_enrichVttFile_shouldReportStats() {
    let input = format!(
        "{}\n00:00:07.000 --> 00:00:08.000\nalready<00:00:07.500><c> timed</c>\n",
        common::PLAIN_VTT
    );
    let storage = MemoryStorage::new().with_file("/in.vtt", &input);

    let stats = enrich_vtt_file(&storage, Path::new("/in.vtt"), Some(Path::new("/out.vtt"))).unwrap();

    assert_eq!(stats.cues_processed, 3);
    assert_eq!(stats.cues_enriched, 2);
    assert_eq!(stats.cues_skipped, 1);
    assert!(storage.contents("/out.vtt").unwrap().contains("already<00:00:07.500><c> timed</c>"));
    assert!(enrich_vtt_file(&storage, Path::new("/missing.vtt"), None).is_err());
}
