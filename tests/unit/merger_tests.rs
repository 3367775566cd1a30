/*!
 * Tests for cue deduplication and merging
 */

use std::path::Path;

use vttkit::merger::{
    deduplicate_cues, format_vtt_from_cues, merge_vtt_content, parse_vtt_cues, RawCue, VttMerger,
};
use vttkit::sources::{MemoryStorage, Storage};

fn cue(timestamp: &str, text: &str) -> RawCue {
    RawCue::new(timestamp, text)
}

/// Duplicates inside one batch collapse
#[test]
fn test_deduplicateCues_withIntraBatchDuplicate_shouldKeepOne() {
    let a = cue("00:00:01.000 --> 00:00:02.000", "a");
    assert_eq!(deduplicate_cues(&[], vec![a.clone(), a.clone()]), vec![a]);
}

/// Known cues are dropped, new ones kept in order
#[test]
fn test_deduplicateCues_withExistingCue_shouldKeepOnlyNew() {
    let a = cue("00:00:01.000 --> 00:00:02.000", "a");
    let b = cue("00:00:02.000 --> 00:00:03.000", "b");
    assert_eq!(deduplicate_cues(&[a.clone()], vec![a, b.clone()]), vec![b]);
}

/// Signatures compare raw text, so a millisecond apart is a different cue
#[test]
fn test_deduplicateCues_withOneMillisecondApart_shouldKeepBoth() {
    let a = cue("00:00:01.000 --> 00:00:02.000", "same");
    let b = cue("00:00:01.001 --> 00:00:02.000", "same");
    assert_eq!(deduplicate_cues(&[a], vec![b.clone()]), vec![b]);
}

/// Merging the same content twice adds nothing the second time
#[test]
fn test_mergeVttContent_twice_shouldBeIdempotent() {
    let storage = MemoryStorage::new().with_file(
        "/live/stream.vtt",
        "WEBVTT\n\n1\n00:00:00.000 --> 00:00:01.000\nfirst\n\n",
    );
    let path = Path::new("/live/stream.vtt");
    let incoming = "WEBVTT\n\n00:00:00.000 --> 00:00:01.000\nfirst\n\n00:00:01.000 --> 00:00:02.000\nsecond\nline\n";

    let once = merge_vtt_content(&storage, path, incoming, 0.0);
    storage.write_text(path, &once).unwrap();
    let twice = merge_vtt_content(&storage, path, incoming, 0.0);

    assert_eq!(once, twice);
    assert_eq!(parse_vtt_cues(&twice).len(), 2);
    assert!(twice.contains("2\n00:00:01.000 --> 00:00:02.000\nsecond\nline\n"));
}

/// A missing existing file counts as empty
#[test]
fn test_mergeVttContent_withMissingFile_shouldUseIncomingOnly() {
    let storage = MemoryStorage::new();
    let merged = merge_vtt_content(
        &storage,
        Path::new("/nowhere.vtt"),
        "WEBVTT\n\n00:00:05.000 --> 00:00:07.000\nhi\n",
        120.0,
    );
    assert_eq!(merged, "WEBVTT\n\n1\n00:02:05.000 --> 00:02:07.000\nhi\n\n");
}

/// The accumulator keeps cues across additions and can be reset
#[test]
fn test_vttMerger_shouldAccumulateAndClear() {
    let storage = MemoryStorage::new()
        .with_file("/a.vtt", "WEBVTT\n\n00:00:00.000 --> 00:00:01.000\nx\n")
        .with_file("/b.vtt", "WEBVTT\n\n00:00:00.000 --> 00:00:01.000\nx\n\n00:00:01.000 --> 00:00:02.000\ny\n");

    let mut merger = VttMerger::new();
    assert_eq!(merger.add_from_file(&storage, Path::new("/a.vtt")).unwrap(), 1);
    assert_eq!(merger.add_from_file(&storage, Path::new("/b.vtt")).unwrap(), 1);
    assert_eq!(merger.cue_count(), 2);

    merger.save(&storage, Path::new("/merged.vtt")).unwrap();
    assert_eq!(
        storage.contents("/merged.vtt").unwrap(),
        format_vtt_from_cues(merger.cues())
    );

    merger.clear();
    assert_eq!(merger.cue_count(), 0);
    assert!(merger.add_from_file(&storage, Path::new("/missing.vtt")).is_err());
}
