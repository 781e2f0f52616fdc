//! Exact top-k inner-product search over a fixed set of vectors.
//!
//! The index stores vectors row-major in a single dense buffer and never
//! reorders them: the row position is the join key back to chunk metadata
//! held by the caller, in the exact order the vectors were inserted. There
//! is no update path; a content change rebuilds the index from scratch.

use ordered_float::OrderedFloat;
use tracing::debug;

use crate::Embedding;
use crate::error::{EmbeddingError, Result};

/// One search result: a row position and its inner-product score.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Row position in insertion order.
    pub row: usize,

    /// Inner product of the query with this row.
    pub score: f32,
}

/// Dense in-memory vector index with exact search.
///
/// Search is a full matrix-vector product, so recall is always 100% relative
/// to the indexed set. Read-only after `build`.
pub struct VectorIndex {
    /// Row-major vector data, `rows * dimension` values.
    data: Vec<f32>,

    /// Dimension shared by every row (0 for an empty index).
    dimension: usize,

    /// Number of rows.
    rows: usize,
}

impl VectorIndex {
    /// Build an index from vectors in their final row order.
    ///
    /// Every vector must share the dimension of the first; a mismatch is a
    /// fatal configuration error, not something to truncate or pad over.
    pub fn build(vectors: &[Embedding]) -> Result<Self> {
        let dimension = vectors.first().map_or(0, Vec::len);
        let rows = vectors.len();

        let mut data = Vec::with_capacity(rows * dimension);
        for vector in vectors {
            if vector.len() != dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            data.extend_from_slice(vector);
        }

        debug!("Built vector index: {rows} rows, dimension {dimension}");
        Ok(Self {
            data,
            dimension,
            rows,
        })
    }

    /// Dimension of the indexed vectors.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of indexed vectors.
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Whether the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Exact top-k search by inner product.
    ///
    /// Returns `min(k, N)` hits sorted by descending score, ties broken by
    /// ascending row position so results are reproducible. `k == 0` and the
    /// empty index both yield an empty result. A query whose dimension does
    /// not match the index is an error.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if self.rows == 0 || k == 0 {
            return Ok(Vec::new());
        }

        if query.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut hits: Vec<SearchHit> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(row, vector)| SearchHit {
                row,
                score: vector.iter().zip(query.iter()).map(|(x, y)| x * y).sum(),
            })
            .collect();

        hits.sort_by(|a, b| {
            OrderedFloat(b.score)
                .cmp(&OrderedFloat(a.score))
                .then(a.row.cmp(&b.row))
        });
        hits.truncate(k.min(self.rows));

        Ok(hits)
    }
}
