/*!
 * Error types for vttkit.
 *
 * This module contains the error taxonomy for the parsing pipeline and its
 * collaborators, using the thiserror crate for ergonomic error definitions.
 * Recoverable degradations (skipped HLS segments, failed enrichment, failed
 * offset calculation) are not errors: they are logged as warnings where the
 * pipeline falls back.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the VTT parsing, merging and correction engine
#[derive(Error, Debug)]
pub enum VttError {
    /// The input violates the VTT or timestamp contract
    #[error("Format error: {0}")]
    Format(String),

    /// A primary input file does not exist
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Reading or writing a file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialising a segments document failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VttError {
    /// Shorthand for a format error with a message
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }
}

/// Result alias for engine operations
pub type VttResult<T> = Result<T, VttError>;

/// Errors that can occur when talking to an external source (HTTP, YouTube)
#[derive(Error, Debug)]
pub enum SourceError {
    /// The request could not be sent or the body could not be read
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The server answered with a non-success status
    #[error("HTTP {status_code} for {url}")]
    HttpStatus {
        /// HTTP status code
        status_code: u16,
        /// Requested URL
        url: String,
    },

    /// The source cannot serve this kind of request
    #[error("Unsupported source: {0}")]
    Unsupported(String),
}

/// Errors that can occur while turning audio into segments
#[derive(Error, Debug)]
pub enum TranscriptionError {
    /// No backend is registered under the requested name
    #[error("Unsupported transcription backend: {0}")]
    BackendUnavailable(String),

    /// The backend itself failed
    #[error("Transcription backend failed: {0}")]
    Backend(String),

    /// The audio input is missing
    #[error("Audio file not found: {}", .0.display())]
    AudioNotFound(PathBuf),

    /// Writing the segments document failed
    #[error("Segments error: {0}")]
    Segments(#[from] VttError),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the VTT engine
    #[error("VTT error: {0}")]
    Vtt(#[from] VttError),

    /// Error from an external source
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Error from transcription
    #[error("Transcription error: {0}")]
    Transcription(#[from] TranscriptionError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
