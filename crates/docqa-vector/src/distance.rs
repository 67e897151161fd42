//! Scalar distance kernels for the flat index.

use docqa_core::config::Metric;

pub fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

pub fn euclidean_distance_squared(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Zero when either side has no magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let (ma, mb) = (magnitude(a), magnitude(b));
    if ma == 0.0 || mb == 0.0 {
        return 0.0;
    }
    dot / (ma * mb)
}

/// Similarity where larger is closer, for either metric.
pub fn score(metric: Metric, query: &[f32], candidate: &[f32]) -> f32 {
    match metric {
        Metric::L2 => -euclidean_distance_squared(query, candidate),
        Metric::Cosine => cosine_similarity(query, candidate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_score_prefers_nearer_vectors() {
        let q = [0.0, 0.0];
        assert!(score(Metric::L2, &q, &[1.0, 0.0]) > score(Metric::L2, &q, &[2.0, 0.0]));
        assert_eq!(euclidean_distance_squared(&[1.0, 2.0], &[4.0, 6.0]), 25.0);
    }

    #[test]
    fn cosine_ignores_length() {
        let s = cosine_similarity(&[1.0, 1.0], &[3.0, 3.0]);
        assert!((s - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
