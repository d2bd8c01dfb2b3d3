//! Evidence verification against source text.
//!
//! This is the part of GhostCut that does not trust the claims producer:
//! given a claimed evidence quote and the original document, it decides
//! algorithmically whether the claim is actually supported.
//!
//! # Matching model
//!
//! Evidence is tokenized on whitespace, lowercased, and filtered to tokens
//! longer than 3 characters, so short/common words are excluded from the
//! match signal so stopword overlap cannot produce a false "verified".
//! Each surviving token counts as matched when it appears as a substring
//! anywhere in the lowercased source. Substring containment (rather than
//! whole-word matching) over-counts short tokens embedded in longer words;
//! the 0.6/0.3 thresholds were tuned against that noise floor, so the
//! matching and the thresholds must only ever change together.
//!
//! | Match ratio | Status |
//! |-------------|--------|
//! | `>= 0.6` | `verified` |
//! | `>= 0.3` | `unverified` |
//! | `< 0.3` (including no qualifying tokens) | `conflict` |

use anyhow::{bail, Result};

use crate::models::{ClaimNode, Level, VerificationStatus, VerifiedNode};

/// Minimum match ratio for a claim to count as verified.
pub const VERIFIED_MIN_RATIO: f64 = 0.6;

/// Minimum match ratio for a partial match; below this is a conflict.
pub const PARTIAL_MIN_RATIO: f64 = 0.3;

/// Upper bound on total node count accepted by the tree verifier. The
/// claims contract promises a few hundred nodes at most; anything beyond
/// this is malformed producer output.
pub const MAX_TREE_NODES: usize = 10_000;

const NOTE_VERIFIED: &str = "Evidence confirmed in source document";
const NOTE_PARTIAL: &str = "Partial match - some evidence terms not found in source";
const NOTE_CONFLICT: &str = "Evidence could not be confirmed in source document";

/// Outcome of checking one evidence quote against the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvidenceCheck {
    /// True only for the `verified` status.
    pub verified: bool,
    pub status: VerificationStatus,
    /// Fixed human-readable note for the status bucket.
    pub note: &'static str,
}

/// Check a single claimed evidence quote against the source text.
///
/// Pure function, never fails: empty evidence (or evidence consisting only
/// of short words) has no qualifying tokens, a match ratio of 0, and is
/// classified as a conflict.
pub fn verify_evidence(claimed_evidence: &str, source_text: &str) -> EvidenceCheck {
    verify_lowered(claimed_evidence, &source_text.to_lowercase())
}

/// Same as [`verify_evidence`], but against a pre-lowercased source. The
/// tree verifier lowercases the source once and reuses it for every node.
fn verify_lowered(claimed_evidence: &str, lower_source: &str) -> EvidenceCheck {
    let evidence = claimed_evidence.to_lowercase();
    let tokens: Vec<&str> = evidence
        .split_whitespace()
        .filter(|w| w.chars().count() > 3)
        .collect();

    let match_ratio = if tokens.is_empty() {
        0.0
    } else {
        let match_count = tokens.iter().filter(|w| lower_source.contains(**w)).count();
        match_count as f64 / tokens.len() as f64
    };

    if match_ratio >= VERIFIED_MIN_RATIO {
        EvidenceCheck {
            verified: true,
            status: VerificationStatus::Verified,
            note: NOTE_VERIFIED,
        }
    } else if match_ratio >= PARTIAL_MIN_RATIO {
        EvidenceCheck {
            verified: false,
            status: VerificationStatus::Unverified,
            note: NOTE_PARTIAL,
        }
    } else {
        EvidenceCheck {
            verified: false,
            status: VerificationStatus::Conflict,
            note: NOTE_CONFLICT,
        }
    }
}

/// Verify an entire claims tree against the source text.
///
/// Validates the tree structure first (failing fast with the offending node
/// id), then annotates every node depth-first. The output preserves the
/// input's shape and order exactly; nodes are verified independently, so
/// the traversal order cannot affect the result.
///
/// # Errors
///
/// Returns an error when the tree is structurally invalid: no single
/// document-level root, a child at the wrong level, children under a
/// `section` node, or more than [`MAX_TREE_NODES`] nodes. A silently wrong
/// confidence score is worse than a loud rejection, so no partial result
/// is ever produced.
pub fn verify_tree(nodes: &[ClaimNode], source_text: &str) -> Result<Vec<VerifiedNode>> {
    validate_tree(nodes)?;
    let lower_source = source_text.to_lowercase();
    Ok(nodes.iter().map(|n| annotate(n, &lower_source)).collect())
}

fn annotate(node: &ClaimNode, lower_source: &str) -> VerifiedNode {
    let check = verify_lowered(&node.evidence, lower_source);

    VerifiedNode {
        id: node.id.clone(),
        title: node.title.clone(),
        level: node.level,
        summary: node.summary.clone(),
        evidence: node.evidence.clone(),
        source_ref: node.source_ref.clone(),
        importance: node.importance.clone(),
        extracted_entities: node.extracted_entities.clone(),
        verified: check.verified,
        verification_status: check.status,
        verification_note: check.note.to_string(),
        original_text: node.evidence.clone(),
        children: node
            .children
            .iter()
            .map(|c| annotate(c, lower_source))
            .collect(),
    }
}

/// Validate the structural contract of a claims tree.
///
/// Exactly one top-level node with level `document`; its children are
/// `chapter`, their children are `section`, and `section` nodes are leaves.
/// The level chain doubles as a depth cap, so no cycle guard beyond the
/// node-count bound is needed for an owned tree.
pub fn validate_tree(nodes: &[ClaimNode]) -> Result<()> {
    if nodes.len() != 1 {
        bail!(
            "claims tree must have exactly one document-level root, got {} top-level nodes",
            nodes.len()
        );
    }
    let root = &nodes[0];
    if root.level != Level::Document {
        bail!(
            "root node '{}' has level {:?}, expected document",
            root.id,
            root.level
        );
    }

    let mut count = 0usize;
    validate_children(root, &mut count)
}

fn validate_children(node: &ClaimNode, count: &mut usize) -> Result<()> {
    *count += 1;
    if *count > MAX_TREE_NODES {
        bail!("claims tree exceeds {} nodes", MAX_TREE_NODES);
    }

    let expected = node.level.child_level();
    for child in &node.children {
        match expected {
            None => bail!(
                "section node '{}' must not have children (found '{}')",
                node.id,
                child.id
            ),
            Some(level) if child.level != level => bail!(
                "node '{}' has level {:?}, expected {:?} under parent '{}'",
                child.id,
                child.level,
                level,
                node.id
            ),
            Some(_) => validate_children(child, count)?,
        }
    }
    Ok(())
}
