/*!
 * Tests for the timestamp codec
 */

use vttkit::errors::VttError;
use vttkit::timestamp::{parse_timestamp_to_seconds, to_seconds, to_text, Timestamp};

/// Seconds -> text -> seconds stays within a millisecond
#[test]
fn test_roundTrip_withManySeconds_shouldStayWithinOneMillisecond() {
    let mut seconds = 0.0_f64;
    while seconds < 200_000.0 {
        let back = to_seconds(&to_text(seconds)).unwrap();
        assert!(
            (back - seconds).abs() < 0.001,
            "{} came back as {}",
            seconds,
            back
        );
        seconds = seconds * 1.7 + 0.0137;
    }
}

/// Text -> timestamp -> text is exact
#[test]
fn test_roundTrip_withCanonicalText_shouldBeExact() {
    for text in ["00:00:00.000", "00:59:59.999", "10:00:00.001", "250:12:34.567"] {
        assert_eq!(Timestamp::parse(text).unwrap().to_string(), text);
    }
}

/// Formatting truncates instead of rounding
#[test]
fn test_toText_withFraction_shouldTruncate() {
    assert_eq!(to_text(1.9999), "00:00:01.999");
    assert_eq!(to_text(3661.5), "01:01:01.500");
}

/// Malformed input is a format error
#[test]
fn test_toSeconds_withMalformedText_shouldFail() {
    for text in ["", "12:34", "1:2:3:4", "aa:00:00.000", "00:00:0x.000"] {
        assert!(
            matches!(to_seconds(text), Err(VttError::Format(_))),
            "{} should not parse",
            text
        );
    }
}

/// The lenient parser never fails
#[test]
fn test_parseTimestampToSeconds_shouldAcceptPlainSecondsAndDegradeToZero() {
    assert_eq!(parse_timestamp_to_seconds("00:01:00.250"), 60.25);
    assert_eq!(parse_timestamp_to_seconds("12.5"), 12.5);
    assert_eq!(parse_timestamp_to_seconds("garbage"), 0.0);
}

/// Shifting below zero clamps
#[test]
fn test_shifted_withNegativeOffset_shouldClampAtZero() {
    let ts = Timestamp::parse("00:00:01.000").unwrap();
    assert_eq!(ts.shifted(-5.0), Timestamp::ZERO);
    assert_eq!(ts.shifted(120.0).to_string(), "00:02:01.000");
}
