/*!
 * Tests for rolling live-stream downloads merged into one growing file
 */

use std::path::Path;

use anyhow::Result;
use vttkit::downloader::{DownloadRequest, VttDownloader};
use vttkit::merger::{parse_vtt_cues, VttMerger};
use vttkit::models::M3U8Info;
use vttkit::sources::{MemoryStorage, MockFetcher, Storage};
use vttkit::vtt::{parse_vtt_content, ParseOptions};
use crate::common;

const PLAYLIST_URL: &str = "https://live.example/stream/captions.m3u8";

const WINDOW_ONE: &str = "WEBVTT

00:00:00.000 --> 00:00:02.000
good morning

00:00:02.000 --> 00:00:04.000
and welcome
";

const WINDOW_TWO: &str = "WEBVTT

00:00:02.000 --> 00:00:04.000
and welcome

00:00:04.000 --> 00:00:06.000
to the show
";

fn request() -> DownloadRequest {
    let mut request = DownloadRequest::new(PLAYLIST_URL, "/live");
    request.stream_id = Some("show".to_string());
    request.append_mode = true;
    request
}

/// Two overlapping windows merge without duplicates
#[test]
fn test_download_withOverlappingWindows_shouldAppendOnlyNewCues() -> Result<()> {
    common::init_logging();
    let storage = MemoryStorage::new();

    let first_fetcher = MockFetcher::new().with_response(PLAYLIST_URL, WINDOW_ONE);
    let path = VttDownloader::new(&first_fetcher, &storage).download(&request())?;

    let second_fetcher = MockFetcher::new().with_response(PLAYLIST_URL, WINDOW_TWO);
    let again = VttDownloader::new(&second_fetcher, &storage).download(&request())?;

    assert_eq!(path, again);
    assert_eq!(path, Path::new("/live/show.vtt"));

    let merged = storage.read_text(&path)?;
    let texts: Vec<String> = parse_vtt_cues(&merged).into_iter().map(|c| c.text).collect();
    assert_eq!(texts, vec!["good morning", "and welcome", "to the show"]);

    // The current file always holds only the latest window
    assert_eq!(storage.contents("/live/show_current.vtt").as_deref(), Some(WINDOW_TWO));
    Ok(())
}

/// Without a YouTube source the playlist offset is not applied
#[test]
fn test_download_withNonYoutubeSource_shouldKeepOriginalTimes() -> Result<()> {
    let storage = MemoryStorage::new();
    let fetcher = MockFetcher::new().with_response(PLAYLIST_URL, WINDOW_ONE);

    let mut request = request();
    request.m3u8_info = Some(M3U8Info {
        program_time: None,
        media_sequence: Some(100),
        segment_duration: 5.0,
    });
    let path = VttDownloader::new(&fetcher, &storage).download(&request)?;

    assert!(storage.read_text(&path)?.contains("00:00:00.000 --> 00:00:02.000"));
    Ok(())
}

/// Enriched merges parse back with word timings
#[test]
fn test_download_withEnrichment_shouldProduceWordTimings() -> Result<()> {
    let storage = MemoryStorage::new();
    let fetcher = MockFetcher::new().with_response(PLAYLIST_URL, WINDOW_ONE);

    let mut request = request();
    request.enrich_word_timestamps = true;
    let path = VttDownloader::new(&fetcher, &storage).download(&request)?;

    let options = ParseOptions {
        clean_content: false,
        ..ParseOptions::default()
    };
    let document = parse_vtt_content(&storage.read_text(&path)?, &options)?;
    let words: Vec<&str> = document.words().map(|w| w.text.as_str()).collect();

    assert_eq!(words, vec!["good", "morning", "and", "welcome"]);
    assert!(document.cues.iter().all(|cue| cue.words.len() == 2));
    Ok(())
}

/// A merger session accumulates several files and saves once
#[test]
fn test_vttMerger_withSeveralFiles_shouldKeepFirstOccurrences() -> Result<()> {
    let storage = MemoryStorage::new()
        .with_file("/live/a.vtt", WINDOW_ONE)
        .with_file("/live/b.vtt", WINDOW_TWO);

    let mut merger = VttMerger::new();
    assert_eq!(merger.add_from_file(&storage, Path::new("/live/a.vtt"))?, 2);
    assert_eq!(merger.add_from_file(&storage, Path::new("/live/b.vtt"))?, 1);
    assert!(merger.add_from_file(&storage, Path::new("/live/missing.vtt")).is_err());
    assert_eq!(merger.add_from_content(WINDOW_TWO), 0);

    merger.save(&storage, Path::new("/live/merged.vtt"))?;

    let saved = storage.read_text(Path::new("/live/merged.vtt"))?;
    assert!(saved.starts_with("WEBVTT"));
    assert_eq!(parse_vtt_cues(&saved).len(), 3);
    assert_eq!(merger.cue_count(), 3);

    merger.clear();
    assert_eq!(merger.cue_count(), 0);
    Ok(())
}
