/*!
 * Tests for cue splitting and rebuilding from words
 */

use std::collections::HashMap;

use vttkit::models::{Cue, Word};
use vttkit::timestamp::Timestamp;
use vttkit::vtt::{build_cues_from_words, split_long_cues};

/// Small deterministic generator so the word streams are reproducible
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 33) % bound
    }
}

fn word_stream(seed: u64, count: usize) -> Vec<Word> {
    let mut rng = Lcg(seed);
    let mut time = 0u64;
    (0..count)
        .map(|i| {
            // Roughly a third of the words share the previous timestamp
            if rng.next(3) != 0 {
                time += rng.next(900);
            }
            Word::new(format!("w{}", i), Timestamp::from_millis(time))
        })
        .collect()
}

/// Words sharing a timestamp never end up in different output cues
#[test]
fn test_splitLongCues_withRandomStreams_shouldKeepGroupsAtomic() {
    for seed in 1..40 {
        let words = word_stream(seed, 30);
        let end = Timestamp::from_millis(words.last().map_or(0, |w| w.time.as_millis()) + 500);
        let cue = Cue::new(Timestamp::ZERO, end, "", words.clone());

        let split = split_long_cues(vec![cue], 2.0);

        let mut cue_of_time: HashMap<Timestamp, usize> = HashMap::new();
        for (idx, cue) in split.iter().enumerate() {
            for word in &cue.words {
                let owner = *cue_of_time.entry(word.time).or_insert(idx);
                assert_eq!(owner, idx, "seed {}: group at {} was split", seed, word.time);
            }
        }

        let total: usize = split.iter().map(|c| c.words.len()).sum();
        assert_eq!(total, words.len(), "seed {}: words lost", seed);
    }
}

/// Rebuilt cues are ordered and contain every word exactly once
#[test]
fn test_buildCuesFromWords_withShuffledStream_shouldOrderAndKeepEveryWord() {
    for seed in 1..40 {
        let mut words = word_stream(seed, 25);
        words.reverse();

        let cues = build_cues_from_words(words.clone(), 2.0);

        for pair in cues.windows(2) {
            assert!(pair[0].start <= pair[1].start, "seed {}: cues out of order", seed);
        }
        for cue in &cues {
            assert!(cue.end.seconds_since(cue.start) <= 2.0);
            assert_eq!(cue.end, cue.words.last().map(|w| w.time).unwrap_or(cue.start));
        }

        let mut seen: Vec<String> = cues
            .iter()
            .flat_map(|c| c.words.iter().map(|w| w.text.clone()))
            .collect();
        let mut expected: Vec<String> = words.iter().map(|w| w.text.clone()).collect();
        seen.sort();
        expected.sort();
        assert_eq!(seen, expected, "seed {}", seed);
    }
}

/// Word-free five second cue splits into three chunks ending at the cue end
#[test]
fn test_splitLongCues_withoutWords_shouldProduceThreeChunks() {
    let cue = Cue::new(
        Timestamp::ZERO,
        Timestamp::parse("00:00:05.000").unwrap(),
        "hello world",
        Vec::new(),
    );

    let split = split_long_cues(vec![cue], 2.0);

    assert_eq!(split.len(), 3);
    assert!(split.iter().all(|c| c.text == "hello world"));
    assert_eq!(split[0].start, Timestamp::ZERO);
    assert_eq!(split[2].end.as_seconds(), 5.0);
}

/// A single group longer than the limit stays whole
#[test]
fn test_splitLongCues_withOneOverlongGroup_shouldNotSplitIt() {
    let time = Timestamp::from_millis(100);
    let cue = Cue::new(
        Timestamp::ZERO,
        Timestamp::from_millis(9_000),
        "a b",
        vec![Word::new("a", time), Word::new("b", time)],
    );

    let split = split_long_cues(vec![cue], 2.0);

    let holders: Vec<&Cue> = split.iter().filter(|c| !c.words.is_empty()).collect();
    assert_eq!(holders.len(), 1);
    assert_eq!(holders[0].words.len(), 2);
}
