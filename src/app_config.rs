use anyhow::{anyhow, Context, Result};
use log::{warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;

use crate::file_utils::FileManager;

/// Application configuration module
/// This module handles loading, validating and saving the JSON configuration
/// that drives parsing, downloading and transcription.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// VTT parsing settings
    #[serde(default)]
    pub parser: ParserConfig,

    /// Download and live-merge settings
    #[serde(default)]
    pub download: DownloadSettings,

    /// Speech-to-text settings
    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Settings for turning VTT text into a segments document
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ParserConfig {
    /// Maximum duration in seconds of an output cue
    #[serde(default = "default_max_cue_duration")]
    pub max_cue_duration: f64,

    /// Keep only timestamp and tagged lines before parsing
    #[serde(default = "default_true")]
    pub clean_content: bool,

    /// Discard source cue boundaries and rebuild cues from the word stream
    #[serde(default = "default_true")]
    pub rebuild_cues_from_words: bool,

    /// How far past the cue duration a first inline tag may lie and still be
    /// read as cue-relative (seconds)
    #[serde(default = "default_relative_tag_tolerance_secs")]
    pub relative_tag_tolerance_secs: f64,

    /// When rebuilding, align the first inline tag of every cue to the cue start
    #[serde(default = "default_true")]
    pub align_rebuild_to_cue_start: bool,

    /// Push non-increasing word times forward and derive cue ends from the
    /// last word
    #[serde(default)]
    pub normalize_word_times: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_cue_duration: default_max_cue_duration(),
            clean_content: true,
            rebuild_cues_from_words: true,
            relative_tag_tolerance_secs: default_relative_tag_tolerance_secs(),
            align_rebuild_to_cue_start: true,
            normalize_word_times: false,
        }
    }
}

/// Settings for fetching subtitles and merging live downloads
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DownloadSettings {
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Verify TLS certificates
    #[serde(default)]
    pub verify_ssl: bool,

    /// Correct and merge each download into the main VTT file
    #[serde(default)]
    pub append_mode: bool,

    /// Add estimated word tags to cues that have none
    #[serde(default)]
    pub enrich_word_timestamps: bool,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            verify_ssl: false,
            append_mode: false,
            enrich_word_timestamps: false,
        }
    }
}

/// Speech-to-text settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranscriptionConfig {
    /// Backend name
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Model name or path
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Language code written to the output header
    #[serde(default = "default_language")]
    pub language: String,

    /// Device hint for the backend (cpu, cuda, auto)
    #[serde(default = "default_device")]
    pub device: String,

    /// Backend-specific compute type
    #[serde(default = "default_compute_type")]
    pub compute_type: String,

    /// Maximum duration in seconds of an output cue
    #[serde(default = "default_max_cue_duration")]
    pub max_segment_duration: f64,

    /// Ask the backend for word-level timestamps
    #[serde(default = "default_true")]
    pub word_timestamps: bool,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            model_name: default_model_name(),
            language: default_language(),
            device: default_device(),
            compute_type: default_compute_type(),
            max_segment_duration: default_max_cue_duration(),
            word_timestamps: true,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: Matching log facade filter
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_max_cue_duration() -> f64 {
    2.0
}

fn default_relative_tag_tolerance_secs() -> f64 {
    0.05
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_backend() -> String {
    "faster-whisper".to_string()
}

fn default_model_name() -> String {
    "base".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_device() -> String {
    "auto".to_string()
}

fn default_compute_type() -> String {
    "default".to_string()
}

impl Config {
    /// Load the configuration from a JSON file, creating a default one when
    /// the file does not exist yet
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if FileManager::file_exists(path) {
            let content = FileManager::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        FileManager::write_to_file(path, &json)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if !(self.parser.max_cue_duration > 0.0) {
            return Err(anyhow!(
                "parser.max_cue_duration must be positive, got {}",
                self.parser.max_cue_duration
            ));
        }

        if !(self.parser.relative_tag_tolerance_secs >= 0.0) {
            return Err(anyhow!(
                "parser.relative_tag_tolerance_secs must not be negative, got {}",
                self.parser.relative_tag_tolerance_secs
            ));
        }

        if self.download.timeout_secs == 0 {
            return Err(anyhow!("download.timeout_secs must be at least 1"));
        }

        if !(self.transcription.max_segment_duration > 0.0) {
            return Err(anyhow!(
                "transcription.max_segment_duration must be positive, got {}",
                self.transcription.max_segment_duration
            ));
        }

        if self.transcription.language.trim().is_empty() {
            return Err(anyhow!("transcription.language must not be empty"));
        }

        Ok(())
    }
}
