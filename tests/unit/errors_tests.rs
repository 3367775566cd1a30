/*!
 * Tests for error types
 */

use std::io;
use std::path::PathBuf;

use vttkit::errors::{AppError, SourceError, TranscriptionError, VttError};
use vttkit::vtt::{parse_vtt_content, ParseOptions};

/// Test that engine errors render their context
#[test]
fn test_vttError_display_shouldIncludeDetails() {
    assert_eq!(
        VttError::format("bad clock").to_string(),
        "Format error: bad clock"
    );
    assert_eq!(
        VttError::NotFound(PathBuf::from("/x.vtt")).to_string(),
        "File not found: /x.vtt"
    );
}

/// Test that missing header and empty input are format errors
#[test]
fn test_parse_withInvalidDocument_shouldReturnFormatError() {
    let options = ParseOptions::default();
    assert!(matches!(parse_vtt_content("", &options), Err(VttError::Format(_))));
    assert!(matches!(
        parse_vtt_content("1\n00:00:00.000 --> 00:00:01.000\nhi\n", &options),
        Err(VttError::Format(_))
    ));
}

/// Test conversions into the application error
#[test]
fn test_appError_fromComponents_shouldWrap() {
    let err: AppError = VttError::format("x").into();
    assert!(matches!(err, AppError::Vtt(_)));

    let err: AppError = SourceError::HttpStatus {
        status_code: 404,
        url: "https://a.example".to_string(),
    }
    .into();
    assert_eq!(err.to_string(), "Source error: HTTP 404 for https://a.example");

    let err: AppError = TranscriptionError::BackendUnavailable("nope".to_string()).into();
    assert!(matches!(err, AppError::Transcription(_)));

    let err: AppError = io::Error::new(io::ErrorKind::Other, "disk").into();
    assert!(matches!(err, AppError::File(_)));

    let err: AppError = anyhow::anyhow!("boom").into();
    assert!(matches!(err, AppError::Unknown(_)));
}

/// Test that transcription wraps engine errors
#[test]
fn test_transcriptionError_fromVttError_shouldWrapAsSegments() {
    let err: TranscriptionError = VttError::format("x").into();
    assert!(matches!(err, TranscriptionError::Segments(_)));
}
