//! Whole-document verification statistics.
//!
//! Reduces an annotated claims tree to counts per verification status, a
//! 0-100 confidence score, and a hallucination-risk classification. Every
//! node at every depth counts equally as one fact: a leaf evidence detail
//! and the document-level executive summary each contribute one.

use crate::models::{HallucinationRisk, VerificationStats, VerificationStatus, VerifiedNode};

/// Confidence score at or above which hallucination risk is `low`.
pub const LOW_RISK_MIN_CONFIDENCE: u32 = 80;

/// Confidence score at or above which hallucination risk is `medium`.
pub const MEDIUM_RISK_MIN_CONFIDENCE: u32 = 50;

/// Aggregate a verified tree into [`VerificationStats`].
///
/// Order-independent: counts and derived scores are identical regardless
/// of how the tree was traversed or annotated. An empty tree yields all
/// zeros with a confidence of 0 (and therefore `high` risk).
pub fn aggregate(tree: &[VerifiedNode]) -> VerificationStats {
    let mut total = 0usize;
    let mut verified = 0usize;
    let mut unverified = 0usize;
    let mut conflict = 0usize;

    count_nodes(tree, &mut |node| {
        total += 1;
        match node.verification_status {
            VerificationStatus::Verified => verified += 1,
            VerificationStatus::Unverified => unverified += 1,
            VerificationStatus::Conflict => conflict += 1,
        }
    });

    let confidence_score = if total > 0 {
        ((verified as f64 / total as f64) * 100.0).round() as u32
    } else {
        0
    };

    VerificationStats {
        total_facts: total,
        verified_facts: verified,
        unverified_facts: unverified,
        conflict_facts: conflict,
        confidence_score,
        hallucination_risk: risk_for(confidence_score),
    }
}

/// Map a confidence score to its risk bucket. Lower bounds are inclusive:
/// 80 is `low`, 79 and 50 are `medium`, 49 is `high`.
pub fn risk_for(confidence_score: u32) -> HallucinationRisk {
    if confidence_score >= LOW_RISK_MIN_CONFIDENCE {
        HallucinationRisk::Low
    } else if confidence_score >= MEDIUM_RISK_MIN_CONFIDENCE {
        HallucinationRisk::Medium
    } else {
        HallucinationRisk::High
    }
}

/// Visit every node of the tree, all depths, in order.
pub(crate) fn count_nodes<F: FnMut(&VerifiedNode)>(tree: &[VerifiedNode], visit: &mut F) {
    for node in tree {
        visit(node);
        count_nodes(&node.children, visit);
    }
}
