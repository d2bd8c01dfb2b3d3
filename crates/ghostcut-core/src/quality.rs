//! Compression quality analysis.
//!
//! Computes three signals from the verified tree plus the source text:
//!
//! - **Compression ratio**: how much smaller the summary is than the
//!   source, in percent. Negative when the "summary" is longer than the
//!   source; that is a legitimate signal, not an error.
//! - **Redundancy score**: the ratio of unique to total word trigrams
//!   across all summaries. The name is inverted from intuition: a higher
//!   score means *less* duplicate phrasing (100 = no duplicates at all).
//! - **Abstraction level**: how much the document/chapter prose
//!   paraphrases rather than reuses source vocabulary. Leaf `section`
//!   nodes are excluded because they are expected to quote verbatim.
//!
//! Short connector words (4 characters or fewer) are excluded from both
//! the trigram and vocabulary signals, the same precision-over-recall
//! choice the evidence verifier makes.

use std::collections::HashSet;

use crate::models::{AbstractionLevel, CompressionQuality, Level, VerifiedNode};
use crate::stats::count_nodes;

/// Overlap ratio below which the summary counts as highly abstracted.
const HIGH_ABSTRACTION_MAX_OVERLAP: f64 = 0.5;

/// Overlap ratio below which the summary counts as moderately abstracted.
const MEDIUM_ABSTRACTION_MAX_OVERLAP: f64 = 0.7;

/// Minimum word length (exclusive) for trigram and vocabulary signals.
const MIN_SIGNAL_WORD_LEN: usize = 4;

/// Analyze compression quality of a verified tree against its source text.
///
/// Pure function; all divisions are guarded (empty source yields a ratio
/// of 0, zero trigrams yield a vacuously non-redundant score of 100, and
/// no qualifying abstraction words yield [`AbstractionLevel::None`]).
pub fn analyze_quality(tree: &[VerifiedNode], source_text: &str) -> CompressionQuality {
    let source_word_count = source_text.split_whitespace().count();
    let summary_word_count = count_summary_words(tree);

    let compression_ratio = if source_word_count > 0 {
        let ratio = (1.0 - summary_word_count as f64 / source_word_count as f64) * 100.0;
        // Half-values round toward positive infinity: -62.5 gives -62.
        (ratio + 0.5).floor() as i32
    } else {
        0
    };

    CompressionQuality {
        compression_ratio,
        redundancy_score: redundancy_score(tree),
        abstraction_level: abstraction_level(tree, source_text),
        source_word_count,
        summary_word_count,
    }
}

/// Total whitespace-token count of every node's summary, all levels.
pub fn count_summary_words(tree: &[VerifiedNode]) -> usize {
    let mut count = 0usize;
    count_nodes(tree, &mut |node| {
        count += node.summary.split_whitespace().count();
    });
    count
}

/// Ratio of unique to total summary trigrams, as a 0-100 score.
///
/// Trigrams are contiguous 3-word windows over the lowercased summary
/// text of each node, restricted to words longer than 4 characters.
/// Higher means less duplication; 100 when no trigrams exist at all.
pub fn redundancy_score(tree: &[VerifiedNode]) -> u32 {
    let mut phrases: Vec<String> = Vec::new();

    count_nodes(tree, &mut |node| {
        let summary = node.summary.to_lowercase();
        let words: Vec<&str> = summary
            .split_whitespace()
            .filter(|w| w.chars().count() > MIN_SIGNAL_WORD_LEN)
            .collect();
        for window in words.windows(3) {
            phrases.push(window.join(" "));
        }
    });

    if phrases.is_empty() {
        return 100;
    }

    let unique: HashSet<&String> = phrases.iter().collect();
    ((unique.len() as f64 / phrases.len() as f64) * 100.0).round() as u32
}

/// Classify how much the non-leaf summary prose paraphrases the source.
///
/// Collects words (longer than 4 chars, lowercased) from every node whose
/// level is not `section`, then measures what fraction literally appears
/// in the source vocabulary. Lower overlap means more paraphrasing and a
/// higher abstraction level.
pub fn abstraction_level(tree: &[VerifiedNode], source_text: &str) -> AbstractionLevel {
    let source_vocab: HashSet<String> = source_text
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > MIN_SIGNAL_WORD_LEN)
        .map(|w| w.to_string())
        .collect();

    let mut summary_words: Vec<String> = Vec::new();
    count_nodes(tree, &mut |node| {
        if node.level != Level::Section {
            summary_words.extend(
                node.summary
                    .to_lowercase()
                    .split_whitespace()
                    .filter(|w| w.chars().count() > MIN_SIGNAL_WORD_LEN)
                    .map(|w| w.to_string()),
            );
        }
    });

    if summary_words.is_empty() {
        return AbstractionLevel::None;
    }

    let overlap_count = summary_words
        .iter()
        .filter(|w| source_vocab.contains(*w))
        .count();
    let overlap_ratio = overlap_count as f64 / summary_words.len() as f64;

    if overlap_ratio < HIGH_ABSTRACTION_MAX_OVERLAP {
        AbstractionLevel::High
    } else if overlap_ratio < MEDIUM_ABSTRACTION_MAX_OVERLAP {
        AbstractionLevel::Medium
    } else {
        AbstractionLevel::Low
    }
}
