/*!
 * Tests for media-sequence offset correction
 */

use vttkit::corrector::{
    apply_offset_to_cues, apply_offset_to_vtt_content, calculate_timestamp_offset,
    CorrectionMethod, TimestampCorrector,
};
use vttkit::models::{Cue, M3U8Info, Word};
use vttkit::timestamp::Timestamp;

fn ts(text: &str) -> Timestamp {
    Timestamp::parse(text).unwrap()
}

fn info(media_sequence: Option<u64>, segment_duration: f64) -> M3U8Info {
    M3U8Info {
        program_time: None,
        media_sequence,
        segment_duration,
    }
}

/// Offset is sequence times segment duration
#[test]
fn test_calculateTimestampOffset_withSequence_shouldMultiply() {
    let (offset, method) = calculate_timestamp_offset(Some(&info(Some(1234), 5.0)));
    assert_eq!(offset, 6170.0);
    assert_eq!(method, CorrectionMethod::MediaSequence);
}

/// Missing metadata means no correction
#[test]
fn test_calculateTimestampOffset_withoutUsableInfo_shouldReturnNone() {
    assert_eq!(calculate_timestamp_offset(None), (0.0, CorrectionMethod::None));
    assert_eq!(
        calculate_timestamp_offset(Some(&M3U8Info::default())),
        (0.0, CorrectionMethod::None)
    );
    assert_eq!(
        calculate_timestamp_offset(Some(&info(Some(10), 0.0))),
        (0.0, CorrectionMethod::None)
    );
}

/// Negative segment durations clamp the offset to zero
#[test]
fn test_calculateTimestampOffset_withNegativeDuration_shouldClampToZero() {
    let (offset, method) = calculate_timestamp_offset(Some(&info(Some(3), -2.0)));
    assert_eq!(offset, 0.0);
    assert_eq!(method, CorrectionMethod::MediaSequence);
}

/// Cue bounds and word times move together
#[test]
fn test_applyOffsetToCues_shouldShiftBoundsAndWords() {
    let cues = vec![Cue::new(
        ts("00:00:05.000"),
        ts("00:00:07.000"),
        "hi",
        vec![Word::new("hi", ts("00:00:05.500"))],
    )];

    let shifted = apply_offset_to_cues(cues, 120.0);

    assert_eq!(shifted[0].start.to_string(), "00:02:05.000");
    assert_eq!(shifted[0].end.to_string(), "00:02:07.000");
    assert_eq!(shifted[0].words[0].time.to_string(), "00:02:05.500");
}

/// Zero offset returns the input untouched
#[test]
fn test_applyOffsetToCues_withZero_shouldBeIdentity() {
    let cues = vec![Cue::new(ts("00:00:01.000"), ts("00:00:02.000"), "x", Vec::new())];
    assert_eq!(apply_offset_to_cues(cues.clone(), 0.0), cues);
}

/// Raw text shifting touches timing lines and inline tags only
#[test]
fn test_applyOffsetToVttContent_shouldShiftLinesAndTags() {
    let content = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000 align:start\nhi<00:00:01.500><c> there</c>\n";
    let shifted = apply_offset_to_vtt_content(content, 3600.0);
    assert_eq!(
        shifted,
        "WEBVTT\n\n01:00:01.000 --> 01:00:02.000 align:start\nhi<01:00:01.500><c> there</c>\n"
    );
}

/// The corrector reports what it applied
#[test]
fn test_timestampCorrector_shouldExposeMetadata() {
    let corrector = TimestampCorrector::new(M3U8Info {
        program_time: Some("2024-01-15T10:30:00Z".to_string()),
        media_sequence: Some(24),
        segment_duration: 5.0,
    });

    let metadata = corrector.correction_metadata();
    assert!(metadata.applied);
    assert_eq!(metadata.offset_seconds, 120.0);
    assert_eq!(metadata.media_sequence, Some(24));
    assert_eq!(metadata.segment_duration, Some(5.0));
    assert_eq!(metadata.program_time.as_deref(), Some("2024-01-15T10:30:00Z"));
    assert_eq!(metadata.correction_method, CorrectionMethod::MediaSequence);

    let json = serde_json::to_value(&metadata).unwrap();
    assert_eq!(json["correction_method"], "media_sequence");
}
