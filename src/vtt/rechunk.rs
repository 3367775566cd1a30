/*!
 * Cue re-chunking.
 *
 * Two strategies bound cue duration:
 * - `split_long_cues` splits each over-long cue, keeping words that share a
 *   timestamp in the same output cue;
 * - `build_cues_from_words` discards cue boundaries and windows a flat word
 *   stream.
 */

use log::debug;

use crate::models::{Cue, Word};
use crate::timestamp::Timestamp;

// @struct: Words sharing one exact timestamp
struct WordGroup {
    time: Timestamp,
    words: Vec<Word>,
}

fn group_by_time(mut words: Vec<Word>) -> Vec<WordGroup> {
    words.sort_by_key(|w| w.time);

    let mut groups: Vec<WordGroup> = Vec::new();
    for word in words {
        match groups.last_mut() {
            Some(group) if group.time == word.time => group.words.push(word),
            _ => groups.push(WordGroup {
                time: word.time,
                words: vec![word],
            }),
        }
    }
    groups
}

fn join_words(words: &[Word]) -> String {
    words
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Split cues longer than `max_duration` seconds.
///
/// Shorter cues pass through unchanged. A non-positive `max_duration`
/// disables splitting.
pub fn split_long_cues(cues: Vec<Cue>, max_duration: f64) -> Vec<Cue> {
    if !(max_duration > 0.0) {
        return cues;
    }

    let mut result = Vec::with_capacity(cues.len());
    for cue in cues {
        if cue.duration_secs() <= max_duration {
            result.push(cue);
            continue;
        }

        let groups = group_by_time(cue.words);
        if groups.len() <= 1 {
            let words = groups.into_iter().flat_map(|g| g.words).collect();
            split_evenly(cue.start, cue.end, &cue.text, words, max_duration, &mut result);
        } else {
            split_by_groups(cue.start, cue.end, groups, max_duration, &mut result);
        }
    }

    result
}

// Equal chunks, each repeating the full cue text
fn split_evenly(
    start: Timestamp,
    end: Timestamp,
    text: &str,
    words: Vec<Word>,
    max_duration: f64,
    out: &mut Vec<Cue>,
) {
    let duration = end.seconds_since(start);
    let mut chunk_count = (duration / max_duration).floor() as u64;
    if duration % max_duration > 0.0 {
        chunk_count += 1;
    }
    let chunk_count = chunk_count.max(1);

    let span_ms = end.as_millis() - start.as_millis();
    debug!(
        "Splitting {:.3}s cue at {} into {} equal chunks",
        duration, start, chunk_count
    );

    for i in 0..chunk_count {
        let chunk_start = Timestamp::from_millis(start.as_millis() + i * span_ms / chunk_count);
        let is_last = i + 1 == chunk_count;
        let chunk_end = if is_last {
            end
        } else {
            Timestamp::from_millis(start.as_millis() + (i + 1) * span_ms / chunk_count)
        };

        let chunk_words = words
            .iter()
            .filter(|w| w.time >= chunk_start && (w.time < chunk_end || (is_last && w.time <= chunk_end)))
            .cloned()
            .collect();

        out.push(Cue::new(chunk_start, chunk_end, text, chunk_words));
    }
}

// Walks timestamp groups, closing a chunk when the next group would overflow it
fn split_by_groups(
    start: Timestamp,
    end: Timestamp,
    groups: Vec<WordGroup>,
    max_duration: f64,
    out: &mut Vec<Cue>,
) {
    let group_ends: Vec<Timestamp> = groups
        .iter()
        .skip(1)
        .map(|g| g.time)
        .chain(std::iter::once(end))
        .collect();

    let mut chunk_words: Vec<Word> = Vec::new();
    let mut chunk_start = start;
    let mut last_end = start;

    for (group, group_end) in groups.into_iter().zip(group_ends) {
        if group_end.seconds_since(chunk_start) > max_duration && !chunk_words.is_empty() {
            let words = std::mem::take(&mut chunk_words);
            out.push(Cue::new(chunk_start, last_end, join_words(&words), words));
            chunk_start = group.time;
        }

        chunk_words.extend(group.words);
        last_end = group_end;
    }

    if !chunk_words.is_empty() {
        out.push(Cue::new(chunk_start, end, join_words(&chunk_words), chunk_words));
    }
}

/// Build cues from a flat word stream, starting a new cue whenever a word
/// lies more than `max_cue_duration` seconds after the current cue start.
///
/// Each cue ends at its last word's time.
pub fn build_cues_from_words(mut words: Vec<Word>, max_cue_duration: f64) -> Vec<Cue> {
    // Stable: equal times keep stream order
    words.sort_by_key(|w| w.time);

    let mut cues = Vec::new();
    let mut current: Vec<Word> = Vec::new();
    let mut cue_start = Timestamp::ZERO;
    let mut cue_end = Timestamp::ZERO;

    for word in words {
        if current.is_empty() {
            cue_start = word.time;
        } else if word.time.seconds_since(cue_start) > max_cue_duration {
            let finished = std::mem::take(&mut current);
            cues.push(Cue::new(cue_start, cue_end, join_words(&finished), finished));
            cue_start = word.time;
        }

        cue_end = word.time;
        current.push(word);
    }

    if !current.is_empty() {
        cues.push(Cue::new(cue_start, cue_end, join_words(&current), current));
    }

    cues
}
