/*!
 * Tests for turning backend transcripts into segments documents
 */

use std::path::Path;

use anyhow::Result;
use serde_json::{json, Map, Value};
use vttkit::app_config::TranscriptionConfig;
use vttkit::errors::TranscriptionError;
use vttkit::models::{Document, SpanDocument};
use vttkit::sources::{MemoryStorage, Storage};
use vttkit::transcription::{
    create_backend, transcribe_to_segments_json, transcribe_with_shape, RawSegment,
    SegmentsShape, StaticBackend, TranscriptionBackend,
};
use crate::common;

const AUDIO: &str = "/audio/clip.wav";
const OUTPUT: &str = "/out/segments.json";

fn mapping(value: Value) -> RawSegment {
    let map: Map<String, Value> = value.as_object().cloned().unwrap_or_default();
    RawSegment::from(map)
}

fn backend() -> StaticBackend {
    StaticBackend::new(vec![
        mapping(json!({
            "start": 0.0,
            "end": 1.5,
            "text": "  Hello there. ",
            "words": [
                {"word": " Hello", "start": 0.0, "end": 0.6},
                {"word": " there.", "start": 0.7, "end": 1.4}
            ]
        })),
        mapping(json!({
            "start": 2.0,
            "end": 6.0,
            "text": "this one runs long",
            "words": [
                {"word": "this", "start": 2.0, "end": 2.5},
                {"word": "one", "start": 2.6, "end": 3.4},
                {"word": "runs", "start": 3.8, "end": 4.6},
                {"word": "long", "start": 4.9, "end": 5.8}
            ]
        })),
    ])
}

fn storage() -> MemoryStorage {
    MemoryStorage::new().with_file(AUDIO, "RIFF")
}

/// The live shape matches what the VTT parser writes
#[test]
fn test_transcribe_withLiveShape_shouldWriteBoundedCues() -> Result<()> {
    common::init_logging();
    let storage = storage();
    let config = TranscriptionConfig::default();

    let summary = transcribe_to_segments_json(
        &backend(),
        &storage,
        Path::new(AUDIO),
        Path::new(OUTPUT),
        &config,
    )?;

    assert_eq!(summary.backend, "static");
    assert_eq!(summary.model_name, config.model_name);

    let document = Document::from_json(&storage.read_text(Path::new(OUTPUT))?)?;
    assert_eq!(document.cues.len(), summary.cues_count);
    assert_eq!(document.header["kind"], "captions");
    assert_eq!(document.header["language"], "en");
    assert_eq!(document.cues[0].text, "Hello there.");
    assert_eq!(document.cues[0].words[0].text, "Hello");

    // The long segment splits between word groups; the tail keeps the segment end
    let texts: Vec<&str> = document.cues.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["Hello there.", "this one", "runs long"]);
    assert_eq!(document.cues[1].end.to_string(), "00:00:03.400");
    assert_eq!(document.cues[2].start.to_string(), "00:00:03.800");
    assert_eq!(document.cues[2].end.to_string(), "00:00:06.000");
    let words: Vec<&str> = document.words().map(|w| w.text.as_str()).collect();
    assert_eq!(words, vec!["Hello", "there.", "this", "one", "runs", "long"]);
    Ok(())
}

/// The timed shape keeps word end times
#[test]
fn test_transcribe_withTimedShape_shouldKeepWordSpans() -> Result<()> {
    let storage = storage();

    transcribe_with_shape(
        &backend(),
        &storage,
        Path::new(AUDIO),
        Path::new(OUTPUT),
        &TranscriptionConfig::default(),
        SegmentsShape::Timed,
    )?;

    let json = storage.read_text(Path::new(OUTPUT))?;
    let document: SpanDocument = serde_json::from_str(&json)?;
    let first = &document.cues[0].words[0];
    assert_eq!(first.word, "Hello");
    assert_eq!(first.start.to_string(), "00:00:00.000");
    assert_eq!(first.end.map(|t| t.to_string()).as_deref(), Some("00:00:00.600"));

    let value: Value = serde_json::from_str(&json)?;
    assert!(value["cues"][0]["words"][0]["end"].is_string());
    Ok(())
}

/// Missing audio fails before the backend is called
#[test]
fn test_transcribe_withMissingAudio_shouldFail() {
    let storage = MemoryStorage::new();

    let result = transcribe_to_segments_json(
        &backend(),
        &storage,
        Path::new(AUDIO),
        Path::new(OUTPUT),
        &TranscriptionConfig::default(),
    );

    assert!(matches!(result, Err(TranscriptionError::AudioNotFound(_))));
    assert_eq!(storage.file_count(), 0);
}

/// Backends are looked up by name
#[test]
fn test_createBackend_shouldResolveKnownNamesOnly() {
    let config = TranscriptionConfig::default();
    let backend = create_backend(&config).unwrap();
    assert_eq!(backend.name(), "faster-whisper");

    let unknown = TranscriptionConfig {
        backend: "cloud-magic".to_string(),
        ..TranscriptionConfig::default()
    };
    assert!(matches!(
        create_backend(&unknown),
        Err(TranscriptionError::BackendUnavailable(name)) if name == "cloud-magic"
    ));
}
