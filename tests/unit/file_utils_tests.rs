/*!
 * Tests for file utility functions
 */

use std::path::Path;
use anyhow::Result;
use vttkit::file_utils::{FileManager, FsStorage};
use vttkit::sources::Storage;
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "a.vtt", "WEBVTT")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::file_exists(temp_dir.path()));
    Ok(())
}

/// Test that dir_exists returns false for non-existent directories
#[test]
fn test_dir_exists_withNonExistentDir_shouldReturnFalse() {
    assert!(!FileManager::dir_exists("./non_existent_directory_12345"));
}

/// Test that generate_output_path uses the input stem
#[test]
fn test_generate_output_path_withOutputDir_shouldUseStem() {
    let output_path = FileManager::generate_output_path(
        Path::new("/tmp/input/stream.vtt"),
        Some(Path::new("/tmp/output")),
        "segments.json",
    );
    assert_eq!(output_path, Path::new("/tmp/output/stream.segments.json"));
}

/// Test that write_to_file creates parent directories
#[test]
fn test_write_to_file_withNestedPath_shouldCreateParents() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let target = temp_dir.path().join("a").join("b").join("out.vtt");

    FileManager::write_to_file(&target, "WEBVTT\n")?;

    assert_eq!(FileManager::read_to_string(&target)?, "WEBVTT\n");
    Ok(())
}

/// Test that find_files only returns matching extensions, sorted
#[test]
fn test_find_files_withMixedFiles_shouldReturnSortedMatches() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "b.vtt", "")?;
    common::create_test_file(temp_dir.path(), "a.vtt", "")?;
    common::create_test_file(temp_dir.path(), "notes.txt", "")?;

    let files = FileManager::find_files(temp_dir.path(), "vtt")?;

    let names: Vec<String> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["a.vtt", "b.vtt"]);
    Ok(())
}

/// Test that FsStorage reports missing files as NotFound
#[test]
fn test_fsStorage_withMissingFile_shouldReportNotFound() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let missing = temp_dir.path().join("missing.vtt");

    assert!(!FsStorage.exists(&missing));
    assert_eq!(
        FsStorage.read_text(&missing).unwrap_err().kind(),
        std::io::ErrorKind::NotFound
    );
    Ok(())
}
