//! Pure vector similarity functions.

use serde::{Deserialize, Serialize};

/// Similarity method between two unit vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimilarityMethod {
    /// Cosine similarity clamped to [-1, 1]
    #[default]
    Cosine,
    /// `1 / (1 + d)` for Euclidean distance `d`, in (0, 1]
    Euclidean,
}

/// Similarity between `a` and `b` under `method`.
pub fn similarity(a: &[f32], b: &[f32], method: SimilarityMethod) -> f64 {
    match method {
        SimilarityMethod::Cosine => cosine_similarity(a, b),
        SimilarityMethod::Euclidean => 1.0 / (1.0 + euclidean_distance(a, b)),
    }
}

/// Cosine similarity; zero vectors have similarity 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a <= f64::EPSILON || norm_b <= f64::EPSILON {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Cosine distance `1 - cos`, in [0, 2].
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    1.0 - cosine_similarity(a, b)
}

/// Euclidean distance.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let diff = f64::from(*x) - f64::from(*y);
            diff * diff
        })
        .sum::<f64>()
        .sqrt()
}

/// Cosine distance between an f32 vector and an f64 centroid.
pub(crate) fn cosine_distance_to_centroid(v: &[f32], centroid: &[f64]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_v = 0.0f64;
    let mut norm_c = 0.0f64;
    for (x, c) in v.iter().zip(centroid) {
        let x = f64::from(*x);
        dot += x * c;
        norm_v += x * x;
        norm_c += c * c;
    }
    if norm_v <= f64::EPSILON || norm_c <= f64::EPSILON {
        return 1.0;
    }
    1.0 - (dot / (norm_v.sqrt() * norm_c.sqrt())).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cosine_of_parallel_and_orthogonal_vectors() {
        assert_relative_eq!(cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]), 1.0);
        assert_relative_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]), 0.0);
        assert_relative_eq!(cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]), 2.0);
    }

    #[test]
    fn zero_vectors_do_not_divide_by_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_distance_to_centroid(&[0.0], &[1.0]), 1.0);
    }

    #[test]
    fn euclidean_similarity_is_one_for_identical_vectors() {
        let v = [0.3f32, 0.4];
        assert_relative_eq!(similarity(&v, &v, SimilarityMethod::Euclidean), 1.0);
        let s = similarity(&[0.0, 0.0], &[3.0, 4.0], SimilarityMethod::Euclidean);
        assert_relative_eq!(s, 1.0 / 6.0);
    }

    #[test]
    fn similarity_method_serializes_kebab_case() {
        let json = serde_json::to_string(&SimilarityMethod::Euclidean).unwrap();
        assert_eq!(json, "\"euclidean\"");
    }
}
