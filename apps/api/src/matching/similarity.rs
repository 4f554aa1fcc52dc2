/// Cosine similarity between two embeddings.
///
/// Returns 0.0 instead of failing when either vector is empty, the lengths
/// differ, or either vector has zero norm. The raw value lies in [-1, 1];
/// callers that need a percentage must scale and clamp it themselves.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn test_identical_vectors_score_one() {
        let a = [0.3_f32, -1.2, 4.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let a = [1.0_f32, 2.0, 3.0];
        let b = [-0.5_f32, 4.0, 0.25];
        assert!((cosine_similarity(&a, &b) - cosine_similarity(&b, &a)).abs() < TOLERANCE);
    }

    #[test]
    fn test_empty_input_scores_zero() {
        assert_eq!(cosine_similarity(&[], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_zero_norm_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_dimension_mismatch_scores_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_orthogonal_and_opposite_vectors() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < TOLERANCE);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < TOLERANCE);
    }
}
