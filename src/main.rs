// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use vttkit::app_config::{Config, LogLevel};
use vttkit::corrector::apply_offset_to_vtt_content;
use vttkit::downloader::{DownloadRequest, VttDownloader};
use vttkit::file_utils::{FileManager, FsStorage};
use vttkit::merger::merge_vtt_content;
use vttkit::models::M3U8Info;
use vttkit::sources::{FetchingInspector, HttpFetcher, PlaylistInspector, Storage};
use vttkit::transcription::{create_backend, transcribe_with_shape, SegmentsShape};
use vttkit::vtt::{enrich_vtt_file, VttParser};
use vttkit::{calculate_timestamp_offset, CorrectionMethod};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

/// Live playlist metadata given on the command line
#[derive(Args, Debug, Clone)]
struct PlaylistArgs {
    /// HLS playlist URL to read MEDIA-SEQUENCE and segment durations from
    #[arg(long, value_name = "URL")]
    playlist: Option<String>,

    /// Media sequence of the first segment (overrides --playlist)
    #[arg(long)]
    media_sequence: Option<u64>,

    /// Segment duration in seconds used with --media-sequence
    #[arg(long, default_value_t = 5.0)]
    segment_duration: f64,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse VTT files into segments documents (JSON)
    Parse {
        /// VTT file or directory of VTT files
        #[arg(value_name = "INPUT_PATH")]
        input_path: PathBuf,

        /// Output file (single input) or directory (directory input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum cue duration in seconds
        #[arg(long)]
        max_cue_duration: Option<f64>,

        /// Keep source cue boundaries instead of rebuilding from words
        #[arg(long)]
        keep_cue_boundaries: bool,

        /// Skip the cleaning pass
        #[arg(long)]
        no_clean: bool,

        #[command(flatten)]
        playlist: PlaylistArgs,
    },

    /// Merge new VTT content into an existing VTT file without duplicates
    Merge {
        /// Existing VTT file (created when missing)
        existing: PathBuf,

        /// VTT files with new content, merged in order
        #[arg(required = true)]
        incoming: Vec<PathBuf>,

        /// Offset in seconds applied to the new content first
        #[arg(long, default_value_t = 0.0)]
        offset: f64,
    },

    /// Add estimated word timestamps to cues without inline timing
    Enrich {
        input: PathBuf,

        /// Output file, input is rewritten when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Shift every timestamp of a VTT file
    Shift {
        input: PathBuf,

        /// Offset in seconds
        #[arg(long)]
        offset: Option<f64>,

        #[command(flatten)]
        playlist: PlaylistArgs,

        /// Output file, input is rewritten when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Download subtitles from a VTT URL, HLS playlist or YouTube link
    Download {
        url: String,

        /// Output directory
        #[arg(short = 'd', long, default_value = ".")]
        output_dir: PathBuf,

        /// Stream id used to name local files
        #[arg(long)]
        stream_id: Option<String>,

        /// Correct and merge into <stream_id>.vtt
        #[arg(short, long)]
        append: bool,

        /// Estimate word timestamps before merging
        #[arg(long)]
        enrich: bool,

        #[command(flatten)]
        playlist: PlaylistArgs,
    },

    /// Transcribe audio into a segments document
    Transcribe {
        audio: PathBuf,

        /// Output file
        #[arg(short, long, default_value = "segments.json")]
        output: PathBuf,

        /// Write word spans (start/end) instead of word times
        #[arg(long)]
        timed: bool,

        /// Language code
        #[arg(long)]
        language: Option<String>,

        /// Model name or path
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Generate shell completions for vttkit
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// vttkit - WebVTT toolkit for live-stream captions
///
/// Parses karaoke-style VTT into segments documents, merges repeated live
/// downloads and corrects stream-relative timestamps.
#[derive(Parser, Debug)]
#[command(name = "vttkit")]
#[command(version)]
#[command(about = "WebVTT parsing, merging and timestamp correction")]
#[command(long_about = "vttkit converts WebVTT subtitles into segments documents.

EXAMPLES:
    vttkit parse live.vtt                          # Write live.segments.json
    vttkit parse --keep-cue-boundaries --max-cue-duration 3 subs/
    vttkit merge stream.vtt a.vtt b.vtt             # Append unseen cues
    vttkit shift live.vtt --media-sequence 1234    # Shift by 1234 x 5s
    vttkit download -a -d out https://youtu.be/ID  # Download and merge
    vttkit completions bash > vttkit.bash          # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json", env = "VTTKIT_CONFIG")]
    config: PathBuf,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI color for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, color) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                color, now, emoji, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn main() -> Result<()> {
    // Trace lets --log-level and the config narrow it later
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "vttkit", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(level) = &cli.log_level {
        log::set_max_level(LogLevel::from(level.clone()).to_level_filter());
    }

    let mut config = Config::load_or_create(&cli.config)?;
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone().into();
    }
    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    let result = run(cli.command, config);
    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

fn run(command: Commands, mut config: Config) -> Result<()> {
    let storage = FsStorage;

    match command {
        Commands::Parse {
            input_path,
            output,
            max_cue_duration,
            keep_cue_boundaries,
            no_clean,
            playlist,
        } => {
            if let Some(max) = max_cue_duration {
                config.parser.max_cue_duration = max;
            }
            if keep_cue_boundaries {
                config.parser.rebuild_cues_from_words = false;
            }
            if no_clean {
                config.parser.clean_content = false;
            }

            let m3u8_info = resolve_playlist(&playlist, &config)?;
            let parser = VttParser::from_config(&config.parser);

            if input_path.is_file() {
                let output = output.unwrap_or_else(|| {
                    FileManager::generate_output_path(&input_path, None, "segments.json")
                });
                let summary =
                    parser.parse_to_segments(&storage, &input_path, &output, m3u8_info.as_ref())?;
                info!(
                    "Success: {} cues -> {:?} (offset {:.3}s, {})",
                    summary.cues_count, summary.segments_path, summary.offset_applied, summary.correction_method
                );
                Ok(())
            } else if FileManager::dir_exists(&input_path) {
                parse_folder(&parser, &storage, &input_path, output.as_deref(), m3u8_info.as_ref())
            } else {
                Err(anyhow!("Input path does not exist: {:?}", input_path))
            }
        }

        Commands::Merge {
            existing,
            incoming,
            offset,
        } => {
            for path in &incoming {
                let new_content = FileManager::read_to_string(path)?;
                let merged = merge_vtt_content(&storage, &existing, &new_content, offset);
                FileManager::write_to_file(&existing, &merged)?;
            }
            info!("Merged {} file(s) into: {:?}", incoming.len(), existing);
            Ok(())
        }

        Commands::Enrich { input, output } => {
            let stats = enrich_vtt_file(&storage, &input, output.as_deref())?;
            info!("{}", serde_json::to_string(&stats)?);
            Ok(())
        }

        Commands::Shift {
            input,
            offset,
            playlist,
            output,
        } => {
            let offset_seconds = match offset {
                Some(seconds) => seconds,
                None => {
                    let info = resolve_playlist(&playlist, &config)?;
                    let (seconds, method) = calculate_timestamp_offset(info.as_ref());
                    if method == CorrectionMethod::None {
                        warn!("No usable playlist metadata, timestamps are left unchanged");
                    }
                    seconds
                }
            };

            let content = FileManager::read_to_string(&input)?;
            let shifted = apply_offset_to_vtt_content(&content, offset_seconds);
            let target = output.unwrap_or(input);
            FileManager::write_to_file(&target, &shifted)?;
            info!("Shifted by {:.3}s -> {:?}", offset_seconds, target);
            Ok(())
        }

        Commands::Download {
            url,
            output_dir,
            stream_id,
            append,
            enrich,
            playlist,
        } => {
            let fetcher = HttpFetcher::new(config.download.timeout_secs, config.download.verify_ssl)?;
            let m3u8_info = resolve_playlist(&playlist, &config)?;

            let request = DownloadRequest {
                url,
                output_dir,
                stream_id,
                is_youtube: false,
                append_mode: append || config.download.append_mode,
                stream_url: None,
                m3u8_info,
                enrich_word_timestamps: enrich || config.download.enrich_word_timestamps,
            };

            let path = VttDownloader::new(&fetcher, &storage).download(&request)?;
            info!("Success: {:?}", path);
            Ok(())
        }

        Commands::Transcribe {
            audio,
            output,
            timed,
            language,
            model,
        } => {
            if let Some(language) = language {
                config.transcription.language = language;
            }
            if let Some(model) = model {
                config.transcription.model_name = model;
            }

            let backend = create_backend(&config.transcription)?;
            let shape = if timed { SegmentsShape::Timed } else { SegmentsShape::Live };
            let summary = transcribe_with_shape(
                backend.as_ref(),
                &storage,
                &audio,
                &output,
                &config.transcription,
                shape,
            )?;
            info!(
                "Success: {} cues -> {:?} ({} / {})",
                summary.cues_count, summary.segments_path, summary.backend, summary.model_name
            );
            Ok(())
        }

        Commands::Completions { .. } => Ok(()),
    }
}

// Helper function to resolve playlist metadata from the command line
fn resolve_playlist(args: &PlaylistArgs, config: &Config) -> Result<Option<M3U8Info>> {
    if let Some(sequence) = args.media_sequence {
        return Ok(Some(M3U8Info {
            program_time: None,
            media_sequence: Some(sequence),
            segment_duration: args.segment_duration,
        }));
    }

    match &args.playlist {
        Some(url) => {
            let fetcher = HttpFetcher::new(config.download.timeout_secs, config.download.verify_ssl)?;
            Ok(Some(FetchingInspector::new(&fetcher).extract_info(url)))
        }
        None => Ok(None),
    }
}

// Helper function to process an entire folder
fn parse_folder(
    parser: &VttParser,
    storage: &dyn Storage,
    input_dir: &Path,
    output_dir: Option<&Path>,
    m3u8_info: Option<&M3U8Info>,
) -> Result<()> {
    let files = FileManager::find_files(input_dir, "vtt")?;
    if files.is_empty() {
        warn!("No VTT files found in directory: {:?}", input_dir);
        return Ok(());
    }

    info!("Found {} VTT files in {:?}", files.len(), input_dir);

    let progress_bar = ProgressBar::new(files.len() as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress_bar.set_style(style.progress_chars("=>-"));

    let mut processed_count = 0;
    for file in &files {
        progress_bar.set_message(
            file.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
        );

        let output = FileManager::generate_output_path(file, output_dir, "segments.json");
        match parser.parse_to_segments(storage, file, &output, m3u8_info) {
            Ok(_) => processed_count += 1,
            Err(e) => progress_bar.suspend(|| error!("Error processing file {:?}: {:#}", file, e)),
        }
        progress_bar.inc(1);
    }

    progress_bar.finish_with_message("done");
    info!("Finished processing {} of {} files", processed_count, files.len());

    Ok(())
}
