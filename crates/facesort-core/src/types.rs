use serde::{Deserialize, Serialize};

/// Bounding box for a detected face, with optional facial landmarks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    /// Five-point facial landmarks: [left_eye, right_eye, nose, left_mouth, right_mouth].
    pub landmarks: Option<[(f32, f32); 5]>,
}

/// Face embedding vector (512-dimensional for ArcFace, L2-normalized by the provider).
///
/// An embedding is meaningless in isolation; it is only comparable to other
/// embeddings produced by the same model, under [`distance`](Self::distance).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Euclidean distance to another embedding.
    ///
    /// Symmetric, ≥ 0, lower = more similar. For L2-normalized vectors the
    /// range is [0, 2]; every threshold in [`MatchPolicy`](crate::MatchPolicy)
    /// is calibrated against this metric.
    pub fn distance(&self, other: &Embedding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }

    /// Element-wise mean of a set of embeddings. `None` on an empty set.
    pub fn mean(vectors: &[Embedding]) -> Option<Embedding> {
        let first = vectors.first()?;
        let dim = first.values.len();
        let mut acc = vec![0.0f32; dim];
        for v in vectors {
            for (slot, x) in acc.iter_mut().zip(v.values.iter()) {
                *slot += x;
            }
        }
        let n = vectors.len() as f32;
        Some(Embedding::new(acc.into_iter().map(|x| x / n).collect()))
    }

    /// Element-wise median of a set of embeddings. `None` on an empty set.
    ///
    /// Robust to outlier detections: a single bad vector among many cannot
    /// drag any component outside the range of the remaining samples.
    pub fn median(vectors: &[Embedding]) -> Option<Embedding> {
        let first = vectors.first()?;
        let dim = first.values.len();
        let mut out = Vec::with_capacity(dim);
        let mut column = Vec::with_capacity(vectors.len());
        for i in 0..dim {
            column.clear();
            column.extend(vectors.iter().filter_map(|v| v.values.get(i).copied()));
            column.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let mid = column.len() / 2;
            let median = if column.len() % 2 == 1 {
                column[mid]
            } else {
                (column[mid - 1] + column[mid]) / 2.0
            };
            out.push(median);
        }
        Some(Embedding::new(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_identical() {
        let a = Embedding::new(vec![0.5, 0.5, 0.0]);
        assert!(a.distance(&a).abs() < 1e-6);
    }

    #[test]
    fn test_distance_symmetric() {
        let a = Embedding::new(vec![1.0, 0.0, 0.0]);
        let b = Embedding::new(vec![0.0, 1.0, 0.0]);
        assert!((a.distance(&b) - b.distance(&a)).abs() < 1e-6);
        assert!((a.distance(&b) - 2.0f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_mean_of_two() {
        let a = Embedding::new(vec![0.0, 2.0]);
        let b = Embedding::new(vec![2.0, 0.0]);
        let m = Embedding::mean(&[a, b]).unwrap();
        assert_eq!(m.values, vec![1.0, 1.0]);
    }

    #[test]
    fn test_mean_empty() {
        assert!(Embedding::mean(&[]).is_none());
    }

    #[test]
    fn test_median_odd_count() {
        let vs = vec![
            Embedding::new(vec![1.0]),
            Embedding::new(vec![9.0]),
            Embedding::new(vec![2.0]),
        ];
        let m = Embedding::median(&vs).unwrap();
        assert_eq!(m.values, vec![2.0]);
    }

    #[test]
    fn test_median_even_count_averages_middles() {
        let vs = vec![
            Embedding::new(vec![1.0]),
            Embedding::new(vec![2.0]),
            Embedding::new(vec![3.0]),
            Embedding::new(vec![100.0]),
        ];
        let m = Embedding::median(&vs).unwrap();
        assert_eq!(m.values, vec![2.5]);
    }

    #[test]
    fn test_median_ignores_single_outlier() {
        // One wild vector among five must not shift the median outside the
        // range of the other four samples.
        let vs = vec![
            Embedding::new(vec![0.10, -0.20]),
            Embedding::new(vec![0.11, -0.21]),
            Embedding::new(vec![0.12, -0.19]),
            Embedding::new(vec![0.105, -0.205]),
            Embedding::new(vec![5.0, -9.0]),
        ];
        let m = Embedding::median(&vs).unwrap();
        assert!(m.values[0] >= 0.10 && m.values[0] <= 0.12);
        assert!(m.values[1] >= -0.21 && m.values[1] <= -0.19);
    }
}
