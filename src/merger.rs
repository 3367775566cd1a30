/*!
 * VTT merging and deduplication.
 *
 * Live streams are downloaded repeatedly and every download overlaps the
 * previous one. Cues are compared by their raw timing line and raw body
 * text: two cues whose timestamps differ by a single millisecond are
 * distinct.
 */

use std::collections::HashSet;
use std::path::Path;

use log::{error, info, warn};

use crate::corrector::apply_offset_to_vtt_content;
use crate::errors::VttResult;
use crate::sources::Storage;
use crate::vtt::VTT_HEADER;

/// A cue as raw text: timing line plus possibly multi-line body
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawCue {
    /// Timing line exactly as written, settings included
    pub timestamp: String,
    /// Body lines joined by `\n`
    pub text: String,
}

impl RawCue {
    pub fn new(timestamp: impl Into<String>, text: impl Into<String>) -> Self {
        RawCue {
            timestamp: timestamp.into(),
            text: text.into(),
        }
    }

    fn signature(&self) -> (String, String) {
        (self.timestamp.clone(), self.text.clone())
    }
}

fn is_metadata_line(line: &str) -> bool {
    line.starts_with(VTT_HEADER) || line.starts_with("Kind:") || line.starts_with("Language:")
}

/// Extract raw cues for deduplication.
///
/// Cue identifiers, metadata lines and cues without body text are dropped.
pub fn parse_vtt_cues(content: &str) -> Vec<RawCue> {
    let lines: Vec<&str> = content.lines().collect();
    let mut cues = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim();
        i += 1;

        if line.is_empty() || is_metadata_line(line) || !line.contains("-->") {
            continue;
        }

        let mut body: Vec<&str> = Vec::new();
        while i < lines.len() && !lines[i].trim().is_empty() {
            body.push(lines[i].trim());
            i += 1;
        }

        if !body.is_empty() {
            cues.push(RawCue::new(line, body.join("\n")));
        }
    }

    cues
}

/// Cues of `incoming` not present in `existing`, in their original order.
///
/// Duplicates inside `incoming` are dropped as well.
pub fn deduplicate_cues(existing: &[RawCue], incoming: Vec<RawCue>) -> Vec<RawCue> {
    let mut seen: HashSet<(String, String)> = existing.iter().map(RawCue::signature).collect();
    incoming
        .into_iter()
        .filter(|cue| seen.insert(cue.signature()))
        .collect()
}

/// Serialise cues as VTT, numbering them from 1
pub fn format_vtt_from_cues(cues: &[RawCue]) -> String {
    let mut content = format!("{}\n\n", VTT_HEADER);
    for (idx, cue) in cues.iter().enumerate() {
        content.push_str(&format!("{}\n{}\n{}\n\n", idx + 1, cue.timestamp, cue.text));
    }
    content
}

/// Merge `incoming` VTT text into the VTT file at `existing_path`.
///
/// A missing or unreadable existing file counts as empty. A positive
/// `offset_seconds` is applied to `incoming` first.
pub fn merge_vtt_content(
    storage: &dyn Storage,
    existing_path: &Path,
    incoming: &str,
    offset_seconds: f64,
) -> String {
    let incoming = if offset_seconds > 0.0 {
        info!(
            "Applying timestamp offset to new VTT content before merge: {:.3}s",
            offset_seconds
        );
        apply_offset_to_vtt_content(incoming, offset_seconds)
    } else {
        incoming.to_string()
    };

    let mut existing = Vec::new();
    if storage.exists(existing_path) {
        match storage.read_text(existing_path) {
            Ok(content) => {
                existing = parse_vtt_cues(&content);
                info!("Found {} existing cues in VTT file", existing.len());
            }
            Err(e) => warn!(
                "Failed to read existing VTT file {}: {}, will create new file",
                existing_path.display(),
                e
            ),
        }
    }

    let new_cues = parse_vtt_cues(&incoming);
    info!("Parsed {} new cues from download", new_cues.len());

    let unique = deduplicate_cues(&existing, new_cues);
    info!("Found {} unique new cues to append", unique.len());

    existing.extend(unique);
    info!("Merged VTT file now contains {} total cues", existing.len());
    format_vtt_from_cues(&existing)
}

/// Accumulates unique cues across successive downloads of one stream
#[derive(Debug, Default)]
pub struct VttMerger {
    cues: Vec<RawCue>,
    seen: HashSet<(String, String)>,
}

impl VttMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the unique cues of `content`; returns how many were added
    pub fn add_from_content(&mut self, content: &str) -> usize {
        let added = self.absorb(parse_vtt_cues(content));
        info!("Added {} unique cues from content", added);
        added
    }

    /// Add the unique cues of a VTT file; read errors are returned
    pub fn add_from_file(&mut self, storage: &dyn Storage, path: &Path) -> VttResult<usize> {
        let content = storage.read_text(path).inspect_err(|e| {
            error!("Failed to add cues from {}: {}", path.display(), e);
        })?;
        let added = self.absorb(parse_vtt_cues(&content));
        info!("Added {} unique cues from {}", added, path.display());
        Ok(added)
    }

    fn absorb(&mut self, incoming: Vec<RawCue>) -> usize {
        let before = self.cues.len();
        for cue in incoming {
            if self.seen.insert(cue.signature()) {
                self.cues.push(cue);
            }
        }
        self.cues.len() - before
    }

    pub fn merged_content(&self) -> String {
        format_vtt_from_cues(&self.cues)
    }

    pub fn save(&self, storage: &dyn Storage, path: &Path) -> VttResult<()> {
        storage.write_text(path, &self.merged_content())?;
        info!("Saved merged VTT with {} cues to {}", self.cues.len(), path.display());
        Ok(())
    }

    pub fn clear(&mut self) {
        self.cues.clear();
        self.seen.clear();
    }

    pub fn cue_count(&self) -> usize {
        self.cues.len()
    }

    pub fn cues(&self) -> &[RawCue] {
        &self.cues
    }
}
