//! Vector normalization and similarity functions.

/// Compute the L2 (Euclidean) norm of a vector.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// L2-normalize a vector in-place. Zero vectors remain zero.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = l2_norm(v);
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Matryoshka truncation: slice to `target_dims`, then L2 re-normalize.
///
/// If `target_dims >= v.len()`, returns a re-normalized copy of the full vector.
pub fn matryoshka_truncate(v: &[f32], target_dims: usize) -> Vec<f32> {
    let end = target_dims.min(v.len());
    let mut truncated = v[..end].to_vec();
    l2_normalize(&mut truncated);
    truncated
}

/// Cosine similarity between two L2-normalized vectors (dot product).
///
/// For non-normalized vectors, this computes the dot product divided by
/// the product of their norms.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "vectors must have equal dimensions");
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Euclidean distance between two vectors.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "vectors must have equal dimensions");
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Truncate and normalize a batch of flattened embeddings.
///
/// `data` is a flat array of `batch_size` * `full_dim` floats.
/// Returns `batch_size` vectors, each of length `target_dim`, L2-normalized.
pub fn batch_truncate_normalize(
    data: &[f32],
    batch_size: usize,
    full_dim: usize,
    target_dim: usize,
) -> Vec<Vec<f32>> {
    (0..batch_size)
        .map(|i| {
            let start = i * full_dim;
            let end = (start + full_dim).min(data.len());
            if start >= data.len() {
                return vec![];
            }
            matryoshka_truncate(&data[start..end], target_dim)
        })
        .collect()
}
