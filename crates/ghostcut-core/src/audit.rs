//! Retrieval-audit contract.
//!
//! The retrieval side of GhostCut mirrors the compression side, but the
//! raw numbers (per-chunk similarity, relevance/noise flags, integrity
//! score, coverage) are computed by the external claims producer. The
//! core's responsibility is the contract those numbers must satisfy:
//! [`validate_audit`] rejects reports whose shape or bounds are broken
//! rather than letting a silently-wrong score through.
//!
//! [`ground_audit`] additionally applies the same evidence-vs-source
//! discipline used for compression claims to each retrieved chunk,
//! annotating (never altering) the producer's numbers. This closes the
//! historical asymmetry where compression claims were machine-verified
//! but retrieval claims were trusted as-is.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::models::VerificationStatus;
use crate::verify::verify_evidence;

/// A chunk the producer claims it retrieved for the query, with its
/// self-reported relevance signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedChunk {
    pub id: String,
    pub text: String,
    /// Claimed query similarity in `[0.0, 1.0]`.
    pub similarity: f64,
    pub is_relevant: bool,
    pub is_noise: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
}

/// Coverage of one query aspect, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoveragePoint {
    pub label: String,
    /// `[0, 100]`.
    pub coverage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAlertKind {
    Missing,
    Noise,
    Info,
}

/// A producer-raised retrieval concern (missing evidence, noise chunk, or
/// informational note).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditAlert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AuditAlertKind,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// The complete audit report returned by the external producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub retrieved_chunks: Vec<RetrievedChunk>,
    /// Aggregate retrieval integrity in `[0, 100]`.
    pub integrity_score: f64,
    pub coverage_data: Vec<CoveragePoint>,
    pub alerts: Vec<AuditAlert>,
    pub explanation: String,
    pub suggestions: Vec<String>,
}

/// A retrieved chunk annotated with an independent grounding check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundedChunk {
    #[serde(flatten)]
    pub chunk: RetrievedChunk,
    /// Result of checking the chunk text against the source document with
    /// the same word-overlap discipline used for compression evidence.
    pub grounding: VerificationStatus,
    pub grounding_note: String,
}

/// An [`AuditReport`] whose chunks carry grounding annotations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundedAuditReport {
    pub retrieved_chunks: Vec<GroundedChunk>,
    pub integrity_score: f64,
    pub coverage_data: Vec<CoveragePoint>,
    pub alerts: Vec<AuditAlert>,
    pub explanation: String,
    pub suggestions: Vec<String>,
}

/// Enforce the shape and bounds of a producer audit report.
///
/// Fails fast naming the offending chunk or coverage label: integrity in
/// `[0, 100]`, similarity in `[0.0, 1.0]`, coverage in `[0, 100]`, and no
/// NaN anywhere. The producer's numbers are never clamped or corrected.
pub fn validate_audit(report: &AuditReport) -> Result<()> {
    if !report.integrity_score.is_finite()
        || !(0.0..=100.0).contains(&report.integrity_score)
    {
        bail!(
            "audit integrity score {} out of range 0-100",
            report.integrity_score
        );
    }

    for chunk in &report.retrieved_chunks {
        if !chunk.similarity.is_finite() || !(0.0..=1.0).contains(&chunk.similarity) {
            bail!(
                "retrieved chunk '{}' has similarity {} out of range 0.0-1.0",
                chunk.id,
                chunk.similarity
            );
        }
    }

    for point in &report.coverage_data {
        if !point.coverage.is_finite() || !(0.0..=100.0).contains(&point.coverage) {
            bail!(
                "coverage for '{}' is {} out of range 0-100",
                point.label,
                point.coverage
            );
        }
    }

    Ok(())
}

/// Validate a report and annotate each retrieved chunk with an independent
/// grounding check against the source text.
pub fn ground_audit(report: AuditReport, source_text: &str) -> Result<GroundedAuditReport> {
    validate_audit(&report)?;

    let retrieved_chunks = report
        .retrieved_chunks
        .into_iter()
        .map(|chunk| {
            let check = verify_evidence(&chunk.text, source_text);
            GroundedChunk {
                chunk,
                grounding: check.status,
                grounding_note: check.note.to_string(),
            }
        })
        .collect();

    Ok(GroundedAuditReport {
        retrieved_chunks,
        integrity_score: report.integrity_score,
        coverage_data: report.coverage_data,
        alerts: report.alerts,
        explanation: report.explanation,
        suggestions: report.suggestions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, text: &str, similarity: f64) -> RetrievedChunk {
        RetrievedChunk {
            id: id.to_string(),
            text: text.to_string(),
            similarity,
            is_relevant: true,
            is_noise: false,
            source_ref: None,
        }
    }

    fn report(chunks: Vec<RetrievedChunk>, integrity: f64) -> AuditReport {
        AuditReport {
            retrieved_chunks: chunks,
            integrity_score: integrity,
            coverage_data: vec![CoveragePoint {
                label: "main topic".to_string(),
                coverage: 85.0,
            }],
            alerts: Vec::new(),
            explanation: String::new(),
            suggestions: Vec::new(),
        }
    }

    #[test]
    fn test_valid_report_accepted() {
        let r = report(vec![chunk("chunk-1", "anything", 0.92)], 77.0);
        assert!(validate_audit(&r).is_ok());
    }

    #[test]
    fn test_similarity_out_of_bounds_names_chunk() {
        let r = report(vec![chunk("chunk-3", "anything", 1.5)], 77.0);
        let err = validate_audit(&r).unwrap_err();
        assert!(err.to_string().contains("chunk-3"));
    }

    #[test]
    fn test_integrity_out_of_bounds_rejected() {
        let r = report(vec![], 104.0);
        assert!(validate_audit(&r).is_err());
    }

    #[test]
    fn test_nan_rejected() {
        let r = report(vec![chunk("chunk-1", "anything", f64::NAN)], 50.0);
        assert!(validate_audit(&r).is_err());
    }

    #[test]
    fn test_coverage_out_of_bounds_names_label() {
        let mut r = report(vec![], 50.0);
        r.coverage_data[0].coverage = -3.0;
        let err = validate_audit(&r).unwrap_err();
        assert!(err.to_string().contains("main topic"));
    }

    #[test]
    fn test_grounding_flags_fabricated_chunk() {
        let source = "The reactor maintenance schedule requires inspections every \
ninety days with certified technicians present";
        let r = report(
            vec![
                chunk("chunk-1", "maintenance schedule requires inspections every ninety days", 0.9),
                chunk("chunk-2", "pirates discovered buried treasure beneath lighthouse", 0.8),
            ],
            80.0,
        );
        let grounded = ground_audit(r, source).unwrap();
        assert_eq!(grounded.retrieved_chunks[0].grounding, VerificationStatus::Verified);
        assert_eq!(grounded.retrieved_chunks[1].grounding, VerificationStatus::Conflict);
        // The producer's numbers pass through untouched.
        assert_eq!(grounded.integrity_score, 80.0);
        assert!((grounded.retrieved_chunks[1].chunk.similarity - 0.8).abs() < 1e-9);
    }
}
