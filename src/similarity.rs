//! Cosine similarity for ranking documents against a query

use crate::error::{EngineError, Result};
use crate::vector::Vector;

/// Compute cosine similarity between two vectors, in [-1, 1].
///
/// TF-IDF vectors are non-negative, so scores land in [0, 1] in practice.
/// If either vector is zero (a query with no known terms), the similarity
/// is defined as 0.0 rather than an error.
pub fn cosine_similarity(v1: &Vector, v2: &Vector) -> Result<f32> {
    if !v1.has_same_dimension(v2) {
        return Err(EngineError::DimensionMismatch {
            expected: v1.dimension(),
            actual: v2.dimension(),
        });
    }

    let norm1 = v1.norm();
    let norm2 = v2.norm();
    if norm1 == 0.0 || norm2 == 0.0 {
        return Ok(0.0);
    }

    let similarity = dot_product(v1, v2) / (norm1 * norm2);

    // Clamp to [-1, 1] to handle floating point errors
    Ok(similarity.clamp(-1.0, 1.0))
}

/// Compute dot product of two vectors
pub fn dot_product(v1: &Vector, v2: &Vector) -> f32 {
    v1.as_slice()
        .iter()
        .zip(v2.as_slice().iter())
        .map(|(a, b)| a * b)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dot_product() {
        let v1 = Vector::new(vec![1.0, 2.0, 3.0]);
        let v2 = Vector::new(vec![4.0, 5.0, 6.0]);
        assert_relative_eq!(dot_product(&v1, &v2), 32.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_identical() {
        let v1 = Vector::new(vec![1.0, 0.0, 0.0]);
        let v2 = Vector::new(vec![1.0, 0.0, 0.0]);
        let sim = cosine_similarity(&v1, &v2).unwrap();
        assert_relative_eq!(sim, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let v1 = Vector::new(vec![1.0, 0.0, 0.0]);
        let v2 = Vector::new(vec![0.0, 1.0, 0.0]);
        let sim = cosine_similarity(&v1, &v2).unwrap();
        assert_relative_eq!(sim, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_opposite() {
        let v1 = Vector::new(vec![1.0, 0.0]);
        let v2 = Vector::new(vec![-1.0, 0.0]);
        let sim = cosine_similarity(&v1, &v2).unwrap();
        assert_relative_eq!(sim, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector_is_zero_score() {
        let v1 = Vector::zeros(3);
        let v2 = Vector::new(vec![1.0, 2.0, 3.0]);
        assert_relative_eq!(cosine_similarity(&v1, &v2).unwrap(), 0.0);
    }

    #[test]
    fn test_cosine_dimension_mismatch() {
        let v1 = Vector::zeros(2);
        let v2 = Vector::zeros(3);
        assert!(matches!(
            cosine_similarity(&v1, &v2),
            Err(EngineError::DimensionMismatch { .. })
        ));
    }
}
