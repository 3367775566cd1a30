use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Word;
use crate::timestamp::Timestamp;

// @module: Inline tag parsing for a single cue body

// @const: `<TIME><c>TEXT</c>` pair, optionally with a class on the `c` tag
static CUE_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(\d+:\d{2}:\d{2}\.\d{3})><c(?:\.[\w.\-]+)?>([^<]*)</c>").unwrap()
});

// @const: Any markup tag
static MARKUP_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Default window past the cue duration in which a first inline tag is still
/// read as cue-relative
pub const DEFAULT_RELATIVE_TOLERANCE_SECS: f64 = 0.05;

/// Tunable rules for telling cue-relative inline tags from absolute ones
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagHeuristics {
    /// Slack added to the cue duration when deciding whether the first tag
    /// is cue-relative
    pub relative_tolerance_secs: f64,

    /// When rebuilding cues from words, always move the first tag onto the
    /// cue start
    pub align_rebuild_to_cue_start: bool,
}

impl Default for TagHeuristics {
    fn default() -> Self {
        TagHeuristics {
            relative_tolerance_secs: DEFAULT_RELATIVE_TOLERANCE_SECS,
            align_rebuild_to_cue_start: true,
        }
    }
}

// @struct: One `<TIME><c>TEXT</c>` occurrence
#[derive(Debug)]
struct InlineTag<'a> {
    // @field: Byte offset of the tag in the cue body
    offset: usize,
    time: Timestamp,
    text: &'a str,
}

fn find_inline_tags(body: &str) -> Vec<InlineTag<'_>> {
    CUE_TAG_REGEX
        .captures_iter(body)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let time = match Timestamp::parse(&caps[1]) {
                Ok(time) => time,
                Err(e) => {
                    debug!("Skipping inline tag with bad timestamp: {}", e);
                    return None;
                }
            };
            Some(InlineTag {
                offset: whole.start(),
                time,
                text: caps.get(2).map_or("", |m| m.as_str()),
            })
        })
        .collect()
}

/// Decide the base (in milliseconds, possibly negative) that inline tag
/// timestamps are added to.
///
/// Tags are cue-relative unless the first tag cannot lie inside the cue, in
/// which case they are absolute and the first tag is moved onto the cue start.
/// When rebuilding from words the first tag is always moved onto the cue
/// start if `align_rebuild_to_cue_start` is set.
pub fn resolve_inner_base(
    first_tag: Timestamp,
    cue_start: Timestamp,
    cue_end: Timestamp,
    rebuilding: bool,
    heuristics: &TagHeuristics,
) -> i64 {
    let start_ms = cue_start.as_millis() as i64;
    let aligned_base = start_ms - first_tag.as_millis() as i64;

    if rebuilding && heuristics.align_rebuild_to_cue_start {
        return aligned_base;
    }

    let duration = cue_end.seconds_since(cue_start).max(0.0);
    if first_tag.as_seconds() > duration + heuristics.relative_tolerance_secs {
        aligned_base
    } else {
        start_ms
    }
}

fn resolve_tag_time(tag: Timestamp, base_ms: i64) -> Timestamp {
    let absolute = base_ms + tag.as_millis() as i64;
    Timestamp::from_millis(absolute.max(0) as u64)
}

// @struct: Fragments of one word being accumulated
#[derive(Debug, Default)]
struct SyllableGroup {
    parts: Vec<(Timestamp, String)>,
}

impl SyllableGroup {
    fn push(&mut self, time: Timestamp, text: &str) {
        self.parts.push((time, text.to_string()));
    }

    // Emits the group as one word timed at the midpoint of its first and last fragment
    fn finish_into(&mut self, words: &mut Vec<Word>) {
        if self.parts.is_empty() {
            return;
        }

        let text: String = self.parts.iter().map(|(_, t)| t.as_str()).collect();
        let text = text.trim();
        if !text.is_empty() {
            let first = self.parts[0].0;
            let time = match self.parts.last() {
                Some((last, _)) if self.parts.len() > 1 => first.midpoint(*last),
                _ => first,
            };
            words.push(Word::new(text, time));
        }

        self.parts.clear();
    }
}

/// Number of leading tokens that repeat the tail of the already emitted words
fn overlap_with_tail(prior_words: &[Word], tokens: &[&str]) -> usize {
    let longest = prior_words.len().min(tokens.len());
    (1..=longest)
        .rev()
        .find(|&k| {
            prior_words[prior_words.len() - k..]
                .iter()
                .zip(&tokens[..k])
                .all(|(word, token)| word.text == *token)
        })
        .unwrap_or(0)
}

/// Parse a cue body into timed words.
///
/// `body` is every line after the timing line joined by a single space.
/// `prior_words` is only consulted when `rebuilding`, to drop leading plain
/// words that repeat the end of the previous cue.
pub fn parse_cue_words(
    body: &str,
    cue_start: Timestamp,
    cue_end: Timestamp,
    rebuilding: bool,
    prior_words: &[Word],
    heuristics: &TagHeuristics,
) -> Vec<Word> {
    let tags = find_inline_tags(body);

    if tags.is_empty() {
        return strip_tags(body)
            .split_whitespace()
            .map(|token| Word::new(token, cue_start))
            .collect();
    }

    let first = &tags[0];
    let base_ms = resolve_inner_base(first.time, cue_start, cue_end, rebuilding, heuristics);

    let mut words = Vec::new();
    let mut group = SyllableGroup::default();

    let mut prefix_tokens: Vec<&str> = body[..first.offset].split_whitespace().collect();
    if !prefix_tokens.is_empty() {
        // Without a leading space the first tag continues the last plain token
        let carried = if first.text.starts_with(' ') {
            None
        } else {
            prefix_tokens.pop()
        };

        let skip = if rebuilding && !prior_words.is_empty() {
            overlap_with_tail(prior_words, &prefix_tokens)
        } else {
            0
        };
        if skip > 0 {
            debug!("Dropping {} repeated word(s) at cue {}", skip, cue_start);
        }

        for token in &prefix_tokens[skip..] {
            words.push(Word::new(*token, cue_start));
        }
        if let Some(token) = carried {
            group.push(cue_start, token);
        }
    }

    for tag in &tags {
        let time = resolve_tag_time(tag.time, base_ms);
        let mut text = tag.text;

        if text.starts_with(' ') {
            group.finish_into(&mut words);
            text = text.trim_start();
        }

        if !text.is_empty() {
            group.push(time, text);
        }

        if tag.text.ends_with(' ') {
            group.finish_into(&mut words);
        }
    }
    group.finish_into(&mut words);

    words
}

/// Remove every markup tag, keeping the text between them
pub fn strip_tags(text: &str) -> String {
    MARKUP_REGEX.replace_all(text, "").trim().to_string()
}

/// Whether the text carries at least one `<TIME><c>TEXT</c>` tag
pub fn has_inline_tags(text: &str) -> bool {
    CUE_TAG_REGEX.is_match(text)
}
