//! Core data models used throughout GhostCut.
//!
//! These types represent the chunks, claims trees, and verification results
//! that flow through the compression and audit pipeline. All types serialize
//! in camelCase to match the JSON contract consumed by dashboard clients.

use serde::{Deserialize, Serialize};

/// A line-addressable slice of the source document.
///
/// Produced once per compression request by [`chunk_text`](crate::chunk::chunk_text)
/// and immutable afterward. Identity is the 1-based sequential index embedded
/// in `id` (`"chunk-N"`); ids are dense over non-empty chunks only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// `"chunk-N"`, N starting at 1.
    pub id: String,
    /// Window text, joined with newlines and trimmed at both ends.
    pub text: String,
    /// Human-readable line range, e.g. `"Lines 31-45"`. Computed from the
    /// original window bounds even when blank lines were trimmed away.
    pub source_ref: String,
    /// `ceil(start_line / 50)`: an approximation, not a real PDF page.
    /// Monotonically non-decreasing as the chunk index increases.
    pub page_number: u32,
}

/// Hierarchy level of a claim node. The tree is at most three levels deep:
/// one `document` root, `chapter` children, `section` grandchildren.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Document,
    Chapter,
    Section,
}

impl Level {
    /// The only level allowed for children of `self`, if any.
    pub fn child_level(self) -> Option<Level> {
        match self {
            Level::Document => Some(Level::Chapter),
            Level::Chapter => Some(Level::Section),
            Level::Section => None,
        }
    }
}

/// Importance annotation attached to a claim by the external producer.
///
/// Passed through unmodified; the core never recomputes importance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Importance {
    pub level: ImportanceLevel,
    /// 0-100 importance score as claimed by the producer.
    pub score: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportanceLevel {
    Critical,
    Important,
    Supporting,
}

/// Entities the producer extracted from source text (numbers, dates, risks,
/// constraints, exceptions). Pass-through display data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedEntities {
    #[serde(default)]
    pub numbers: Vec<String>,
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub exceptions: Vec<String>,
}

/// A node of the claims tree returned by the external claims producer.
///
/// This shape is an external contract: any producer (LLM call, rule-based
/// extractor, human annotation) satisfying it is substitutable. The core
/// validates the shape at the tree-verifier boundary and otherwise assumes
/// it strictly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimNode {
    pub id: String,
    pub title: String,
    pub level: Level,
    /// Summary prose for this node. Missing summaries are treated as empty.
    #[serde(default)]
    pub summary: String,
    /// The quote the producer asserts is drawn verbatim from the source.
    /// Missing evidence is treated as empty (an automatic conflict).
    #[serde(default)]
    pub evidence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<Importance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_entities: Option<ExtractedEntities>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ClaimNode>,
}

/// Per-claim verification outcome.
///
/// | Status | Meaning |
/// |--------|---------|
/// | `verified` | Evidence terms overwhelmingly present in source (ratio >= 0.6) |
/// | `unverified` | Partial overlap (0.3 <= ratio < 0.6) |
/// | `conflict` | Little to no overlap (ratio < 0.3) |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Verified,
    Unverified,
    Conflict,
}

/// A [`ClaimNode`] annotated with its verification outcome.
///
/// Created once per node during the tree verifier's single pass and
/// immutable afterward; never round-tripped back into a `ClaimNode`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedNode {
    pub id: String,
    pub title: String,
    pub level: Level,
    pub summary: String,
    pub evidence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub importance: Option<Importance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_entities: Option<ExtractedEntities>,
    /// True only when `verification_status` is `verified`.
    pub verified: bool,
    pub verification_status: VerificationStatus,
    pub verification_note: String,
    /// The raw claimed evidence string, echoed verbatim for display. This
    /// is not a verified excerpt of the source.
    pub original_text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<VerifiedNode>,
}

/// Coarse likelihood that the summary contains fabricated content, derived
/// from the confidence score (>= 80 low, >= 50 medium, else high).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HallucinationRisk {
    Low,
    Medium,
    High,
}

/// Whole-document verification statistics.
///
/// Invariant: `total_facts = verified_facts + unverified_facts + conflict_facts`
/// and `confidence_score = round(100 * verified_facts / total_facts)`
/// (0 when the tree is empty). Every node at every depth counts as one fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationStats {
    pub total_facts: usize,
    pub verified_facts: usize,
    pub unverified_facts: usize,
    pub conflict_facts: usize,
    /// 0-100 integer.
    pub confidence_score: u32,
    pub hallucination_risk: HallucinationRisk,
}

/// How much the summary paraphrases versus reuses source vocabulary.
/// `none` means too little qualifying text to judge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbstractionLevel {
    None,
    Low,
    Medium,
    High,
}

/// Compression quality metrics derived from the verified tree and the
/// source word count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionQuality {
    /// `round(100 * (1 - summary_words / source_words))`. Negative when the
    /// summary is longer than the source, which is a legitimate signal,
    /// not an error.
    pub compression_ratio: i32,
    /// Inverted from intuition: higher means *less* duplicate phrasing
    /// (100 = no duplicate trigrams at all).
    pub redundancy_score: u32,
    pub abstraction_level: AbstractionLevel,
    pub source_word_count: usize,
    pub summary_word_count: usize,
}

/// Severity/category pass-through types for producer-detected alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    Deadline,
    Risk,
    Financial,
    Policy,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    High,
    Medium,
    Low,
}

/// A deadline/risk/financial/policy alert detected by the producer.
/// Pass-through display data; never machine-verified by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutiveAlert {
    pub id: String,
    pub category: AlertCategory,
    pub severity: AlertSeverity,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub evidence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

/// The producer's explanation of one compression decision it made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiDecision {
    pub id: String,
    pub action: String,
    pub reason: String,
    #[serde(default)]
    pub evidence: String,
    /// 0-100 self-reported confidence.
    pub confidence: f64,
}

/// The merged result of one verification pass: the annotated tree plus the
/// aggregate statistics and quality metrics derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionReport {
    pub verified_tree: Vec<VerifiedNode>,
    pub stats: VerificationStats,
    pub quality: CompressionQuality,
}
