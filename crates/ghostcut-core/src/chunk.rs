//! Line-indexed text chunker.
//!
//! Splits raw document text into fixed-size, line-addressable [`Chunk`]s
//! with stable source references, so every downstream claim can point back
//! to an exact line range of the original document.
//!
//! # Algorithm
//!
//! 1. Split the text on `\n` into an ordered sequence of lines (interior
//!    whitespace is preserved).
//! 2. Group lines into fixed windows of 15 lines, in order, non-overlapping.
//! 3. Join each window with newlines and trim leading/trailing whitespace.
//! 4. Skip windows whose trimmed text is empty; ids are dense over
//!    non-empty chunks, not over window position.
//! 5. `source_ref` is computed from the original window bounds (1-indexed,
//!    inclusive), even when blank lines were trimmed from the emitted text.
//!
//! # Example
//!
//! ```rust
//! use ghostcut_core::chunk::chunk_text;
//!
//! let chunks = chunk_text("first line\nsecond line");
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].id, "chunk-1");
//! assert_eq!(chunks[0].source_ref, "Lines 1-2");
//! ```

use crate::models::Chunk;

/// Number of source lines per chunk window.
pub const CHUNK_LINES: usize = 15;

/// Approximate lines per "page". The derived page number is a display
/// approximation, not a real PDF page.
pub const LINES_PER_PAGE: usize = 50;

/// Split `source_text` into line-indexed chunks.
///
/// Pure and deterministic; no error conditions. Empty input (and input
/// consisting only of blank lines) yields an empty chunk list.
///
/// # Guarantees
///
/// - Chunk ids are `"chunk-1"`, `"chunk-2"`, ... dense over emitted chunks.
/// - `source_ref` ranges are 1-indexed, inclusive, and clipped to the
///   actual line count of the input.
/// - `page_number` is monotonically non-decreasing across the output.
pub fn chunk_text(source_text: &str) -> Vec<Chunk> {
    let lines: Vec<&str> = source_text.split('\n').collect();
    let mut chunks = Vec::new();
    let mut chunk_index = 0usize;

    let mut start = 0usize;
    while start < lines.len() {
        let end = (start + CHUNK_LINES).min(lines.len());
        let text = lines[start..end].join("\n");
        let text = text.trim();

        if !text.is_empty() {
            chunk_index += 1;
            chunks.push(Chunk {
                id: format!("chunk-{}", chunk_index),
                text: text.to_string(),
                source_ref: format!("Lines {}-{}", start + 1, end),
                page_number: ((start + 1).div_ceil(LINES_PER_PAGE)) as u32,
            });
        }

        start += CHUNK_LINES;
    }

    chunks
}
