/*!
 * # vttkit
 *
 * A Rust library for turning WebVTT subtitles, including the rolling
 * karaoke-style captions of live streams, into structured segments documents.
 *
 * ## Features
 *
 * - Parse VTT with inline `<TIME><c>TEXT</c>` word tags into words and cues
 * - Rebuild or split cues into duration-bounded chunks without breaking
 *   same-timestamp word groups
 * - Merge repeated live-stream downloads without duplicating cues
 * - Correct stream-relative timestamps using HLS playlist metadata
 * - Estimate word timestamps for cues that carry none
 * - Convert speech-to-text output into the same segments document
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `timestamp`: `H+:MM:SS.mmm` clock codec
 * - `vtt`: tag parsing, cue reconstruction, document parsing, enrichment
 * - `merger`: cue signature deduplication and merging
 * - `corrector`: media-sequence offset correction
 * - `playlist`: M3U8 metadata and segment handling
 * - `downloader`: download workflow over the `sources` collaborators
 * - `transcription`: speech-to-text adapter and backends
 * - `sources`: fetch, subtitle source, playlist and storage traits
 * - `app_config`: Configuration management
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the library
 *
 * Nothing is logged unless the embedding application installs a `log`
 * implementation.
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod corrector;
pub mod downloader;
pub mod errors;
pub mod file_utils;
pub mod merger;
pub mod models;
pub mod playlist;
pub mod sources;
pub mod timestamp;
pub mod transcription;
pub mod vtt;

// Re-export main types for easier usage
pub use app_config::Config;
pub use corrector::{calculate_timestamp_offset, CorrectionMethod, TimestampCorrector};
pub use downloader::{DownloadRequest, VttDownloader};
pub use errors::{AppError, SourceError, TranscriptionError, VttError, VttResult};
pub use file_utils::{FileManager, FsStorage};
pub use merger::{merge_vtt_content, VttMerger};
pub use models::{Cue, Document, M3U8Info, Word};
pub use sources::{Fetcher, PlaylistInspector, Storage, SubtitleSource};
pub use timestamp::Timestamp;
pub use vtt::{parse_vtt_content, ParseOptions, VttParser};
