//! Vector math used by the ranker.

pub fn dot(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

pub fn norm(v: &[f32]) -> f32 { v.iter().map(|x| x * x).sum::<f32>().sqrt() }

/// Cosine similarity. Exactly `0.0` when either vector has zero norm or the dimensions differ.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() { return 0.0; }
    let (na, nb) = (norm(a), norm(b));
    if na == 0.0 || nb == 0.0 { return 0.0; }
    dot(a, b) / (na * nb)
}

pub fn l2_normalize(v: &mut [f32]) {
    let n = norm(v);
    if n > 0.0 { for x in v.iter_mut() { *x /= n; } }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_similarity_is_one() {
        for v in [vec![1.0f32, 2.0, 3.0], vec![-0.5, 0.0, 4.0, 1e-3], vec![7.0]] {
            assert!((cosine(&v, &v) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn zero_vector_scores_exactly_zero() {
        let v = vec![0.3f32, -0.2, 0.9];
        let zero = vec![0.0f32; 3];
        assert_eq!(cosine(&v, &zero), 0.0);
        assert_eq!(cosine(&zero, &v), 0.0);
        assert_eq!(cosine(&zero, &zero), 0.0);
    }

    #[test]
    fn opposite_and_orthogonal() {
        assert!((cosine(&[1.0, 0.0], &[-2.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine(&[1.0, 0.0], &[0.0, 3.0]), 0.0);
        assert_eq!(cosine(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn normalize_gives_unit_norm() {
        let mut v = vec![3.0f32, 4.0];
        l2_normalize(&mut v);
        assert!((norm(&v) - 1.0).abs() < 1e-6);
        let mut z = vec![0.0f32; 2];
        l2_normalize(&mut z);
        assert_eq!(z, vec![0.0, 0.0]);
    }
}
