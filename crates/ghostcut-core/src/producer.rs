//! Claims producer abstraction.
//!
//! The claims tree and the retrieval audit are produced by an external
//! collaborator: in production an LLM call, in tests a deterministic
//! stub. Anything satisfying [`ClaimsProducer`] is substitutable; the
//! core validates the returned shapes and never assumes how they were
//! produced.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::audit::AuditReport;
use crate::models::{AiDecision, Chunk, ClaimNode, ExecutiveAlert};

/// Everything a producer returns for one compression request, before any
/// verification has happened.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimsResponse {
    /// The claims tree: one document-level root with chapter/section
    /// descendants. Verified downstream; trusted nowhere.
    pub summaries: Vec<ClaimNode>,
    #[serde(default)]
    pub executive_alerts: Vec<ExecutiveAlert>,
    #[serde(default)]
    pub ai_decisions: Vec<AiDecision>,
}

/// External producer of claims trees and retrieval audits.
///
/// Implementations must be `Send + Sync`. The trait is async because the
/// production implementation performs network I/O; in-process test
/// producers return immediately-ready futures.
#[async_trait]
pub trait ClaimsProducer: Send + Sync {
    /// Produce a hierarchical claims tree for the given document chunks.
    async fn produce_claims(&self, file_name: &str, chunks: &[Chunk]) -> Result<ClaimsResponse>;

    /// Audit retrieval quality of `chunks` for `query` against the source
    /// excerpt. The returned numbers are the producer's own; callers are
    /// expected to pass them through [`crate::audit::ground_audit`].
    async fn audit_retrieval(
        &self,
        query: &str,
        source_excerpt: &str,
        chunks: &[Chunk],
    ) -> Result<AuditReport>;
}
