/*!
 * Speech-to-text adapter.
 *
 * A `TranscriptionBackend` turns audio into raw segments; the adapter
 * normalizes them, bounds cue durations and writes the same segments
 * document the VTT parser produces.
 */

use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::app_config::TranscriptionConfig;
use crate::errors::{TranscriptionError, VttError};
use crate::sources::Storage;

pub mod adapter;
pub mod whisper;

pub use adapter::{
    build_segments_json, build_timed_segments, estimate_group_end, group_words_by_start,
    normalize_segments, split_long_segments, FieldValue, RawSegment, RawWord, SegmentRecord,
    WordRecord,
};
pub use whisper::{FasterWhisperBackend, FASTER_WHISPER};

/// Options handed to a backend for one call
#[derive(Debug, Clone, PartialEq)]
pub struct TranscribeOptions {
    pub model_name: String,
    pub language: String,
    pub device: String,
    pub compute_type: String,
    pub word_timestamps: bool,
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        Self::from(&TranscriptionConfig::default())
    }
}

impl From<&TranscriptionConfig> for TranscribeOptions {
    fn from(config: &TranscriptionConfig) -> Self {
        TranscribeOptions {
            model_name: config.model_name.clone(),
            language: config.language.clone(),
            device: config.device.clone(),
            compute_type: config.compute_type.clone(),
            word_timestamps: config.word_timestamps,
        }
    }
}

/// Speech-to-text engine
pub trait TranscriptionBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Transcribe `audio` into raw segments
    fn transcribe(
        &self,
        audio: &Path,
        options: &TranscribeOptions,
    ) -> Result<Vec<RawSegment>, TranscriptionError>;
}

/// Backend replaying fixed segments
#[derive(Debug, Clone, Default)]
pub struct StaticBackend {
    segments: Vec<RawSegment>,
}

impl StaticBackend {
    pub fn new(segments: Vec<RawSegment>) -> Self {
        StaticBackend { segments }
    }
}

impl TranscriptionBackend for StaticBackend {
    fn name(&self) -> &str {
        "static"
    }

    fn transcribe(
        &self,
        _audio: &Path,
        _options: &TranscribeOptions,
    ) -> Result<Vec<RawSegment>, TranscriptionError> {
        Ok(self.segments.clone())
    }
}

/// Backend registered under the configured name
pub fn create_backend(
    config: &TranscriptionConfig,
) -> Result<Box<dyn TranscriptionBackend>, TranscriptionError> {
    match config.backend.as_str() {
        FASTER_WHISPER => Ok(Box::new(FasterWhisperBackend::new())),
        other => Err(TranscriptionError::BackendUnavailable(other.to_string())),
    }
}

/// Result metadata of a transcription run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionSummary {
    pub segments_path: PathBuf,
    pub cues_count: usize,
    pub backend: String,
    pub model_name: String,
}

/// Which segments document shape to write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmentsShape {
    /// Words as `{"word", "time"}`
    #[default]
    Live,
    /// Words as `{"word", "start", "end"}`
    Timed,
}

/// Transcribe `audio` and write the live-shape segments document to `output`
pub fn transcribe_to_segments_json(
    backend: &dyn TranscriptionBackend,
    storage: &dyn Storage,
    audio: &Path,
    output: &Path,
    config: &TranscriptionConfig,
) -> Result<TranscriptionSummary, TranscriptionError> {
    transcribe_with_shape(backend, storage, audio, output, config, SegmentsShape::Live)
}

/// Transcribe `audio` and write the segments document in `shape`
pub fn transcribe_with_shape(
    backend: &dyn TranscriptionBackend,
    storage: &dyn Storage,
    audio: &Path,
    output: &Path,
    config: &TranscriptionConfig,
    shape: SegmentsShape,
) -> Result<TranscriptionSummary, TranscriptionError> {
    if !storage.exists(audio) {
        return Err(TranscriptionError::AudioNotFound(audio.to_path_buf()));
    }

    let raw = backend.transcribe(audio, &TranscribeOptions::from(config))?;
    info!("{} returned {} segments", backend.name(), raw.len());

    let (json, cues_count) = match shape {
        SegmentsShape::Live => {
            let document =
                build_segments_json(&raw, &config.language, config.max_segment_duration);
            (document.to_json_pretty()?, document.cues.len())
        }
        SegmentsShape::Timed => {
            let document =
                build_timed_segments(&raw, &config.language, config.max_segment_duration);
            let json = serde_json::to_string_pretty(&document).map_err(VttError::from)?;
            (json, document.cues.len())
        }
    };

    storage.write_text(output, &json).map_err(VttError::from)?;
    info!("Wrote {} cues to {:?}", cues_count, output);

    Ok(TranscriptionSummary {
        segments_path: output.to_path_buf(),
        cues_count,
        backend: backend.name().to_string(),
        model_name: config.model_name.clone(),
    })
}
