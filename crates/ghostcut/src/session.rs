//! Document session state.
//!
//! One [`DocumentSession`] owns everything derived from a single uploaded
//! document: the raw text, its chunks, and the latest compression and
//! audit results. There is no ambient global state: whoever drives the
//! pipeline (CLI command or request handler) creates the session, passes
//! it where needed, and replaces it wholesale when a new document arrives.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use ghostcut_core::audit::GroundedAuditReport;
use ghostcut_core::models::Chunk;

use crate::pipeline::CompressResponse;

/// State for one document, from upload to results.
#[derive(Debug)]
pub struct DocumentSession {
    pub id: String,
    pub file_name: String,
    pub raw_text: String,
    /// SHA-256 of the raw text, for detecting re-upload of the same document.
    pub dedup_hash: String,
    pub created_at: DateTime<Utc>,
    /// Populated by the compression pipeline.
    pub chunks: Vec<Chunk>,
    pub report: Option<CompressResponse>,
    pub audit: Option<GroundedAuditReport>,
}

impl DocumentSession {
    /// Start a fresh session for an uploaded document.
    pub fn new(file_name: impl Into<String>, raw_text: impl Into<String>) -> Self {
        let raw_text = raw_text.into();
        let mut hasher = Sha256::new();
        hasher.update(raw_text.as_bytes());
        let dedup_hash = format!("{:x}", hasher.finalize());

        Self {
            id: Uuid::new_v4().to_string(),
            file_name: file_name.into(),
            raw_text,
            dedup_hash,
            created_at: Utc::now(),
            chunks: Vec::new(),
            report: None,
            audit: None,
        }
    }

    /// Whether `text` is byte-identical to this session's document.
    pub fn same_document(&self, text: &str) -> bool {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize()) == self.dedup_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_empty() {
        let session = DocumentSession::new("report.txt", "raw body text");
        assert!(session.chunks.is_empty());
        assert!(session.report.is_none());
        assert!(session.audit.is_none());
        assert!(!session.id.is_empty());
    }

    #[test]
    fn test_same_document_detection() {
        let session = DocumentSession::new("report.txt", "raw body text");
        assert!(session.same_document("raw body text"));
        assert!(!session.same_document("different text"));
    }

    #[test]
    fn test_replacement_gets_fresh_identity() {
        let first = DocumentSession::new("a.txt", "one");
        let second = DocumentSession::new("a.txt", "two");
        assert_ne!(first.id, second.id);
        assert_ne!(first.dedup_hash, second.dedup_hash);
    }
}
