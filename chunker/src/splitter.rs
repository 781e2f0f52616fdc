//! Sliding-window chunking with boundary snapping.
//!
//! The splitter walks the trimmed document with a cursor, takes a window of
//! `chunk_size` bytes, and looks for the latest acceptable split point inside
//! it: a paragraph break (`"\n\n"`) or a sentence terminator (`". "`, `"? "`,
//! `"! "`). A candidate only counts if it falls in the second half of the
//! window, which prevents pathologically short chunks. When no candidate
//! qualifies the window is cut hard at its end.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ChunkerError, Result};
use crate::record::Chunk;

/// Sentence terminators searched after the paragraph break.
const SENTENCE_TERMINATORS: [&str; 3] = [". ", "? ", "! "];

/// Configuration for the chunker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Target size of each chunk, in bytes of UTF-8 text.
    pub chunk_size: usize,

    /// Overlap carried between consecutive chunks, in bytes.
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1200,
            overlap: 200,
        }
    }
}

impl ChunkerConfig {
    /// Validate the configuration before any chunking happens.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ChunkerError::InvalidChunkSize {
                chunk_size: self.chunk_size,
            });
        }
        if self.overlap >= self.chunk_size {
            return Err(ChunkerError::InvalidOverlap {
                overlap: self.overlap,
                chunk_size: self.chunk_size,
            });
        }
        Ok(())
    }
}

/// Deterministic overlapping-window chunker.
///
/// `split` is a pure function of the input text and the configuration: no
/// hidden state, restartable, byte-identical output on identical input.
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Create a chunker, validating the configuration up front.
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create a chunker with the default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: ChunkerConfig::default(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Split text into overlapping segments.
    ///
    /// Leading/trailing whitespace is trimmed first; empty input yields an
    /// empty sequence. Emitted segments are trimmed and never empty.
    pub fn split(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        let n = text.len();
        let chunk_size = self.config.chunk_size;
        let overlap = self.config.overlap;
        let min_reasonable = chunk_size / 2;

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < n {
            let window_end = floor_char_boundary(text, (start + chunk_size).min(n));
            let window = &text[start..window_end];

            // The farthest valid boundary wins, no matter which separator
            // produced it. Offsets are relative to the window.
            let mut split_pos: Option<usize> = None;
            if let Some(idx) = window.rfind("\n\n") {
                if idx >= min_reasonable {
                    // Keep the break itself with the emitted chunk.
                    split_pos = Some(start + idx + 2);
                }
            }
            for sep in SENTENCE_TERMINATORS {
                if let Some(idx) = window.rfind(sep) {
                    if idx >= min_reasonable {
                        let pos = start + idx + sep.len();
                        if split_pos.is_none_or(|best| pos > best) {
                            split_pos = Some(pos);
                        }
                    }
                }
            }

            // No acceptable boundary: hard cut at the window end.
            let end = split_pos.unwrap_or(window_end);

            let chunk = text[start..end].trim();
            if !chunk.is_empty() {
                chunks.push(chunk.to_string());
            }

            if end >= n {
                break;
            }

            let next = floor_char_boundary(text, end.saturating_sub(overlap));
            // The cursor must strictly advance; if the overlap would pull it
            // back to (or before) the current position, continue from the
            // split point without overlap for this step.
            start = if next > start { next } else { end };
        }

        chunks
    }

    /// Chunk a whole document into records with stable ids.
    pub fn chunk_document(&self, source: &str, text: &str) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = self
            .split(text)
            .into_iter()
            .enumerate()
            .map(|(idx, chunk)| Chunk::new(source, idx as u32, chunk))
            .collect();
        debug!("Chunked {source} into {} chunks", chunks.len());
        chunks
    }
}

/// Move a byte position backward to the nearest UTF-8 character boundary.
fn floor_char_boundary(text: &str, mut pos: usize) -> usize {
    while pos > 0 && !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chunker(chunk_size: usize, overlap: usize) -> Chunker {
        Chunker::new(ChunkerConfig {
            chunk_size,
            overlap,
        })
        .unwrap()
    }

    /// Every non-whitespace byte of the input must be covered by at least one
    /// chunk: chunks must occur in order, each starting no later than where
    /// the previous one ended (whitespace gaps excepted, since emitted chunks
    /// are trimmed).
    fn assert_full_coverage(text: &str, chunks: &[String]) {
        let text = text.trim();
        let mut covered_to = 0usize;
        for chunk in chunks {
            let found = text
                .match_indices(chunk.as_str())
                .filter(|(at, _)| text[covered_to.min(*at)..*at].trim().is_empty())
                .map(|(at, _)| at + chunk.len())
                .max();
            let end = found.unwrap_or_else(|| panic!("chunk not found in order: {chunk:?}"));
            covered_to = covered_to.max(end);
        }
        assert!(
            text[covered_to..].trim().is_empty(),
            "uncovered tail: {:?}",
            &text[covered_to..]
        );
    }

    #[test]
    fn test_config_validation() {
        assert!(
            ChunkerConfig {
                chunk_size: 0,
                overlap: 0
            }
            .validate()
            .is_err()
        );
        assert!(
            ChunkerConfig {
                chunk_size: 10,
                overlap: 10
            }
            .validate()
            .is_err()
        );
        assert!(
            ChunkerConfig {
                chunk_size: 10,
                overlap: 9
            }
            .validate()
            .is_ok()
        );
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        let chunker = chunker(100, 10);
        assert_eq!(chunker.split(""), Vec::<String>::new());
        assert_eq!(chunker.split("   \n\t  "), Vec::<String>::new());
    }

    #[test]
    fn test_short_document_single_chunk() {
        let chunker = chunker(1200, 200);
        let chunks = chunker.split("A short note.");
        assert_eq!(chunks, vec!["A short note.".to_string()]);
    }

    #[test]
    fn test_deterministic() {
        let chunker = chunker(40, 10);
        let text = "First sentence here. Second sentence follows. Third one closes the text.";
        let first = chunker.split(text);
        let second = chunker.split(text);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_sentence_boundary_snapping() {
        let chunker = chunker(20, 5);
        let text = "Alpha beta. Gamma delta epsilon zeta.";
        let chunks = chunker.split(text);
        // ". " at window offset 10 passes min_reasonable = 10, so the first
        // chunk ends right after the terminator and is trimmed.
        assert_eq!(chunks[0], "Alpha beta.");
        assert_full_coverage(text, &chunks);
    }

    #[test]
    fn test_paragraph_break_preferred_when_farthest() {
        let chunker = chunker(30, 5);
        let text = "First paragraph text.\n\nSecond paragraph continues with more words here.";
        let chunks = chunker.split(text);
        // "\n\n" at offset 21 >= 15 beats any earlier sentence boundary.
        assert_eq!(chunks[0], "First paragraph text.");
        assert_full_coverage(text, &chunks);
    }

    #[test]
    fn test_hard_cut_when_no_boundary() {
        let chunker = chunker(10, 2);
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = chunker.split(text);
        assert_eq!(chunks[0], "abcdefghij");
        assert_full_coverage(text, &chunks);
    }

    #[test]
    fn test_early_boundary_is_rejected() {
        let chunker = chunker(20, 4);
        // ". " at window offset 3 is before min_reasonable = 10, so the
        // window is cut hard instead of producing a tiny chunk.
        let text = "Ab. cdefghijklmnopqrstuvwxyz";
        let chunks = chunker.split(text);
        assert_eq!(chunks[0], "Ab. cdefghijklmnopqr");
    }

    #[test]
    fn test_tiny_document_terminates() {
        let chunker = chunker(5, 1);
        let chunks = chunker.split("A. B. C.");
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| !c.trim().is_empty()));
        // The ". " at window offset 1 is rejected (min_reasonable = 2), so
        // both windows are cut hard; the second starts one byte back.
        assert_eq!(chunks, vec!["A. B.".to_string(), ". C.".to_string()]);
    }

    #[test]
    fn test_overlap_repeats_tail_of_previous_chunk() {
        let chunker = chunker(20, 8);
        let text = "Alpha beta. Gamma delta epsilon zeta eta theta.";
        let chunks = chunker.split(text);
        assert!(chunks.len() >= 2);
        // The first window splits after "Alpha beta. " (byte 12); the second
        // chunk starts 8 bytes earlier and repeats the tail of the first.
        assert_eq!(chunks[0], "Alpha beta.");
        assert!(
            chunks[1].starts_with("a beta."),
            "expected overlap at start of {:?}",
            chunks[1]
        );
        assert_full_coverage(text, &chunks);
    }

    #[test]
    fn test_multibyte_input_does_not_split_inside_char() {
        let chunker = chunker(10, 2);
        let text = "héllo wörld über ältere ärzte ökonomie";
        let chunks = chunker.split(text);
        assert!(!chunks.is_empty());
        // Would panic on a bad boundary while slicing; also check validity.
        for chunk in &chunks {
            assert!(std::str::from_utf8(chunk.as_bytes()).is_ok());
        }
        assert_full_coverage(text, &chunks);
    }

    #[test]
    fn test_chunk_indices_contiguous() {
        let chunker = chunker(25, 5);
        let text = "One sentence here. Another sentence there. A third sentence now. \
                    And one more to make the document long enough.";
        let records = chunker.chunk_document("notes/sample.txt", text);
        assert!(records.len() > 1);
        for (idx, record) in records.iter().enumerate() {
            assert_eq!(record.chunk_index, idx as u32);
            assert_eq!(record.id, format!("notes/sample-{idx}"));
            assert_eq!(record.source, "notes/sample.txt");
            assert!(!record.text.trim().is_empty());
        }
    }

    #[test]
    fn test_chunk_document_deterministic() {
        let chunker = chunker(30, 6);
        let text = "Diabetes is a chronic disease. It affects how the body turns food \
                    into energy. Treatment involves monitoring blood sugar.";
        let first = chunker.chunk_document("diseases/diabetes.txt", text);
        let second = chunker.chunk_document("diseases/diabetes.txt", text);
        assert_eq!(first, second);
    }
}
