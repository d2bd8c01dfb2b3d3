//! JSON export of compression results.
//!
//! Writes the same shape the dashboard's "Export JSON" button produces:
//! file name, verified summary tree, chunks, and an export timestamp.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::path::Path;

use ghostcut_core::models::{Chunk, VerifiedNode};

use crate::session::DocumentSession;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument<'a> {
    file_name: &'a str,
    summaries: &'a [VerifiedNode],
    chunks: &'a [Chunk],
    exported_at: String,
}

/// Write a session's compression results to `path` as pretty-printed JSON.
///
/// Fails if the session has no compression report yet.
pub fn export_json(session: &DocumentSession, path: &Path) -> Result<()> {
    let report = match &session.report {
        Some(r) => r,
        None => bail!("session has no compression results to export"),
    };

    let doc = ExportDocument {
        file_name: &session.file_name,
        summaries: &report.summaries,
        chunks: &report.chunks,
        exported_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
    };

    let json = serde_json::to_string_pretty(&doc)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write export file: {}", path.display()))?;
    Ok(())
}
