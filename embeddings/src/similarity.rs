//! Similarity primitives for embeddings.

use crate::Embedding;
use crate::error::{EmbeddingError, Result};

/// Compute the inner product of two vectors.
///
/// For unit-normalized vectors this equals the cosine similarity. A length
/// mismatch is a precondition violation and fails fast.
pub fn inner_product(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}

/// Compute the L2 norm of a vector.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Normalize a vector to unit length in place.
///
/// The zero vector is left unchanged.
pub fn normalize(embedding: &mut Embedding) {
    let magnitude = l2_norm(embedding);
    if magnitude > 0.0 {
        for x in embedding.iter_mut() {
            *x /= magnitude;
        }
    }
}
