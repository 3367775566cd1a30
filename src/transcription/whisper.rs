use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, error, info};
use serde_json::Value;

use crate::errors::TranscriptionError;

use super::adapter::RawSegment;
use super::{TranscribeOptions, TranscriptionBackend};

// @module: faster-whisper backend driven through its command line front end

// @const: Backend name in configuration
pub const FASTER_WHISPER: &str = "faster-whisper";

// @const: Executable of the faster-whisper command line front end
const DEFAULT_PROGRAM: &str = "whisper-ctranslate2";

// @struct: Runs the transcriber and reads its JSON report
#[derive(Debug, Clone)]
pub struct FasterWhisperBackend {
    program: String,
    // @field: Directory for the JSON report, audio directory if unset
    work_dir: Option<PathBuf>,
}

impl Default for FasterWhisperBackend {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            work_dir: None,
        }
    }
}

impl FasterWhisperBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    fn report_path(&self, audio: &Path) -> PathBuf {
        let dir = self
            .work_dir
            .clone()
            .or_else(|| audio.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        let stem = audio.file_stem().unwrap_or_default().to_string_lossy();
        dir.join(format!("{}.json", stem))
    }

    /// Segments of a JSON report (`{"segments": [...]}`)
    pub fn segments_from_report(report: &str) -> Result<Vec<RawSegment>, TranscriptionError> {
        let value: Value = serde_json::from_str(report)
            .map_err(|e| TranscriptionError::Backend(format!("Invalid transcription report: {}", e)))?;

        let segments = value
            .get("segments")
            .and_then(Value::as_array)
            .ok_or_else(|| TranscriptionError::Backend("Transcription report has no segments".to_string()))?;

        Ok(segments
            .iter()
            .filter_map(|s| s.as_object().cloned().map(RawSegment::Mapping))
            .collect())
    }
}

impl TranscriptionBackend for FasterWhisperBackend {
    fn name(&self) -> &str {
        FASTER_WHISPER
    }

    fn transcribe(
        &self,
        audio: &Path,
        options: &TranscribeOptions,
    ) -> Result<Vec<RawSegment>, TranscriptionError> {
        let report_path = self.report_path(audio);
        let output_dir = report_path.parent().map(Path::to_path_buf).unwrap_or_default();

        info!(
            "Transcribing {:?} with {} (model {}, device {})",
            audio, self.program, options.model_name, options.device
        );

        let word_timestamps = if options.word_timestamps { "True" } else { "False" };
        let output = Command::new(&self.program)
            .arg(audio)
            .args(["--model", &options.model_name])
            .args(["--device", &options.device])
            .args(["--compute_type", &options.compute_type])
            .args(["--language", &options.language])
            .args(["--word_timestamps", word_timestamps])
            .args(["--output_format", "json"])
            .arg("--output_dir")
            .arg(&output_dir)
            .output()
            .map_err(|e| {
                TranscriptionError::Backend(format!("Failed to execute {}: {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("{} failed: {}", self.program, stderr.trim());
            return Err(TranscriptionError::Backend(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }

        debug!("Reading transcription report {:?}", report_path);
        let report = std::fs::read_to_string(&report_path).map_err(|e| {
            TranscriptionError::Backend(format!("Failed to read report {:?}: {}", report_path, e))
        })?;

        Self::segments_from_report(&report)
    }
}
