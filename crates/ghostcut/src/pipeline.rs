//! Compression and audit pipeline orchestration.
//!
//! Coordinates the full flow for one request: truncate → chunk → producer
//! → verify → aggregate → quality. The producer only ever sees the
//! truncated text, and verification runs against that same truncated text,
//! so claims are always checked against exactly what the producer saw.

use anyhow::{bail, Result};
use serde::Serialize;

use ghostcut_core::audit::{ground_audit, GroundedAuditReport};
use ghostcut_core::chunk::chunk_text;
use ghostcut_core::models::{
    AiDecision, Chunk, ClaimNode, CompressionQuality, CompressionReport, ExecutiveAlert,
    VerificationStats, VerifiedNode,
};
use ghostcut_core::producer::ClaimsProducer;
use ghostcut_core::quality::analyze_quality;
use ghostcut_core::stats::aggregate;
use ghostcut_core::verify::verify_tree;

use crate::config::Config;
use crate::session::DocumentSession;

/// Verification statistics and quality metrics merged into the single
/// object dashboard clients consume.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    #[serde(flatten)]
    pub stats: VerificationStats,
    #[serde(flatten)]
    pub quality: CompressionQuality,
}

/// Full response for one compression request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressResponse {
    pub chunks: Vec<Chunk>,
    pub summaries: Vec<VerifiedNode>,
    pub verification_stats: ReportStats,
    pub executive_alerts: Vec<ExecutiveAlert>,
    pub ai_decisions: Vec<AiDecision>,
    pub raw_text_preview: String,
}

/// Run the compression pipeline for a session's document.
///
/// Stores the chunks and the response on the session before returning it.
///
/// # Errors
///
/// Fails when the document contains no text, when the producer fails, or
/// when the producer returns a structurally invalid claims tree.
pub async fn run_compress(
    config: &Config,
    producer: &dyn ClaimsProducer,
    session: &mut DocumentSession,
) -> Result<CompressResponse> {
    let text = truncate_chars(&session.raw_text, config.limits.compress_chars);

    let chunks = chunk_text(text);
    if chunks.is_empty() {
        bail!("document '{}' contains no text to compress", session.file_name);
    }

    let claims = producer.produce_claims(&session.file_name, &chunks).await?;

    let report = build_report(&claims.summaries, text)?;

    let response = CompressResponse {
        chunks: chunks.clone(),
        summaries: report.verified_tree,
        verification_stats: ReportStats {
            stats: report.stats,
            quality: report.quality,
        },
        executive_alerts: claims.executive_alerts,
        ai_decisions: claims.ai_decisions,
        raw_text_preview: truncate_chars(text, config.limits.preview_chars).to_string(),
    };

    session.chunks = chunks;
    session.report = Some(response.clone());
    Ok(response)
}

/// Verify a claims tree and derive its aggregate statistics and quality
/// metrics. This is the whole core contract in one place:
/// `(source text, claims tree)` in, annotated tree plus trustworthy
/// numbers out.
pub fn build_report(claims: &[ClaimNode], source_text: &str) -> Result<CompressionReport> {
    let verified_tree = verify_tree(claims, source_text)?;
    let stats = aggregate(&verified_tree);
    let quality = analyze_quality(&verified_tree, source_text);
    Ok(CompressionReport {
        verified_tree,
        stats,
        quality,
    })
}

/// Run a retrieval audit for a query against a session's document.
///
/// The producer's numbers are validated against the audit contract and
/// each retrieved chunk is annotated with an independent grounding check;
/// the numbers themselves pass through untouched.
pub async fn run_audit(
    config: &Config,
    producer: &dyn ClaimsProducer,
    session: &mut DocumentSession,
    query: &str,
) -> Result<GroundedAuditReport> {
    if query.trim().is_empty() {
        bail!("audit query must not be empty");
    }

    let excerpt = truncate_chars(&session.raw_text, config.limits.audit_chars);
    let chunks = if session.chunks.is_empty() {
        chunk_text(excerpt)
    } else {
        session.chunks.clone()
    };

    let report = producer.audit_retrieval(query, excerpt, &chunks).await?;
    let grounded = ground_audit(report, excerpt)?;

    session.audit = Some(grounded.clone());
    Ok(grounded)
}

/// Truncate to at most `max_chars` characters, never splitting a char.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &s[..byte_index],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghostcut_core::models::{ClaimNode, Level};

    fn claim(id: &str, level: Level, summary: &str, evidence: &str) -> ClaimNode {
        ClaimNode {
            id: id.to_string(),
            title: format!("title {}", id),
            level,
            summary: summary.to_string(),
            evidence: evidence.to_string(),
            source_ref: None,
            importance: None,
            extracted_entities: None,
            children: Vec::new(),
        }
    }

    #[test]
    fn test_truncate_chars_ascii() {
        assert_eq!(truncate_chars("hello world", 5), "hello");
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("", 10), "");
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        let s = "héllo wörld";
        let t = truncate_chars(s, 6);
        assert_eq!(t.chars().count(), 6);
        assert!(s.starts_with(t));
    }

    #[test]
    fn test_build_report_merges_stats_and_quality() {
        let source = "The migration service processes incoming records nightly and \
archives completed batches after validation succeeds";
        let mut root = claim(
            "exec-1",
            Level::Document,
            "records processed nightly",
            "migration service processes incoming records nightly",
        );
        root.children = vec![claim(
            "sec-1",
            Level::Chapter,
            "batches archived after validation",
            "archives completed batches after validation",
        )];

        let report = build_report(&[root], source).unwrap();
        assert_eq!(report.stats.total_facts, 2);
        assert_eq!(report.stats.verified_facts, 2);
        assert_eq!(report.stats.confidence_score, 100);
        assert!(report.quality.compression_ratio > 0);
    }

    #[test]
    fn test_build_report_rejects_invalid_tree() {
        let bad = vec![claim("sec-1", Level::Chapter, "", "")];
        assert!(build_report(&bad, "source text").is_err());
    }

    #[test]
    fn test_report_stats_serializes_flat() {
        let report = build_report(
            &[claim("exec-1", Level::Document, "summary words here", "")],
            "plenty of source words to compress down from",
        )
        .unwrap();
        let merged = ReportStats {
            stats: report.stats,
            quality: report.quality,
        };
        let value = serde_json::to_value(&merged).unwrap();
        // Stats and quality fields sit side by side in one flat object.
        assert!(value.get("totalFacts").is_some());
        assert!(value.get("compressionRatio").is_some());
        assert!(value.get("hallucinationRisk").is_some());
        assert!(value.get("abstractionLevel").is_some());
    }
}
