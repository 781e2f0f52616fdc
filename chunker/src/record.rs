//! Chunk records and id derivation.

use serde::{Deserialize, Serialize};

/// A chunk of text extracted from a source document.
///
/// Chunks are immutable once produced: ids are derived from the source path
/// and the 0-based emission position, so identical input yields identical
/// records on every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable identifier, `"{source_without_extension}-{chunk_index}"`.
    pub id: String,

    /// Logical path of the originating document, `/`-separated.
    pub source: String,

    /// 0-based position of this chunk within its source document.
    pub chunk_index: u32,

    /// The chunk text, non-empty after trimming.
    pub text: String,
}

impl Chunk {
    /// Create a chunk record, deriving its id from `(source, chunk_index)`.
    pub fn new(source: impl Into<String>, chunk_index: u32, text: impl Into<String>) -> Self {
        let source = normalize_source(&source.into());
        Self {
            id: chunk_id(&source, chunk_index),
            source,
            chunk_index,
            text: text.into(),
        }
    }
}

/// Normalize path separators so ids and sources are platform-independent.
fn normalize_source(source: &str) -> String {
    source.replace('\\', "/")
}

/// Derive the stable chunk id for a source path and chunk position.
///
/// The final extension of the last path component is stripped, so
/// `diseases/diabetes.txt` chunk 0 becomes `diseases/diabetes-0`.
pub fn chunk_id(source: &str, chunk_index: u32) -> String {
    let source = normalize_source(source);
    let stem = match source.rfind('.') {
        Some(dot) if !source[dot + 1..].contains('/') => &source[..dot],
        _ => source.as_str(),
    };
    format!("{stem}-{chunk_index}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_chunk_id_strips_extension() {
        assert_eq!(chunk_id("diseases/diabetes.txt", 0), "diseases/diabetes-0");
        assert_eq!(chunk_id("diseases/diabetes.txt", 12), "diseases/diabetes-12");
    }

    #[test]
    fn test_chunk_id_without_extension() {
        assert_eq!(chunk_id("notes/readme", 3), "notes/readme-3");
    }

    #[test]
    fn test_chunk_id_dot_in_directory() {
        // A dot in a directory name is not an extension.
        assert_eq!(chunk_id("v1.2/notes", 0), "v1.2/notes-0");
    }

    #[test]
    fn test_chunk_id_normalizes_separators() {
        assert_eq!(chunk_id("diseases\\asthma.txt", 1), "diseases/asthma-1");
    }

    #[test]
    fn test_chunk_new_derives_id() {
        let chunk = Chunk::new("a/b.txt", 2, "some text");
        assert_eq!(chunk.id, "a/b-2");
        assert_eq!(chunk.source, "a/b.txt");
        assert_eq!(chunk.chunk_index, 2);
    }

    #[test]
    fn test_chunk_jsonl_round_trip() {
        let chunk = Chunk::new("doc.txt", 0, "Diabetes is a chronic disease.");
        let line = serde_json::to_string(&chunk).unwrap();
        let parsed: Chunk = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, chunk);
    }
}
