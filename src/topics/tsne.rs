// Exact t-SNE projection of document-topic distributions to two dimensions.
//
// Review sets are small (hundreds to a few thousand documents), so the
// O(N^2) exact gradient is used rather than a tree approximation. The
// optimiser follows the usual schedule: early exaggeration with low
// momentum, then plain KL descent with higher momentum and per-coordinate
// gains.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

/// Smallest sample count the projector accepts.
pub const MIN_SAMPLES: usize = 5;

const MAX_PERPLEXITY: f64 = 30.0;
const EARLY_EXAGGERATION: f64 = 12.0;
const EXPLORATION_ITER: usize = 250;
const MIN_GAIN: f64 = 0.01;
const PERPLEXITY_TOL: f64 = 1e-5;
const PERPLEXITY_STEPS: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("projection needs at least {required} samples, got {found}")]
    TooFewSamples { found: usize, required: usize },
    #[error("perplexity {perplexity} must be positive and below the sample count {samples}")]
    InvalidPerplexity { perplexity: f64, samples: usize },
    #[error("input rows have inconsistent lengths")]
    RaggedInput,
    #[error("projection diverged (non-finite coordinates)")]
    NonFinite,
    #[error("could not build the initialisation distribution: {0}")]
    Initialisation(String),
}

#[derive(Debug, Clone)]
pub struct Tsne {
    pub perplexity: f64,
    pub n_iter: usize,
    pub seed: u64,
}

impl Tsne {
    /// Projector configured for `n_samples` points: perplexity min(30, N-1).
    pub fn for_samples(n_samples: usize) -> Self {
        Self {
            perplexity: MAX_PERPLEXITY.min(n_samples.saturating_sub(1) as f64),
            n_iter: 1000,
            seed: super::lda::DEFAULT_SEED,
        }
    }

    /// Embed `data` (one row per sample) into 2D, preserving row order.
    pub fn fit_transform(&self, data: &[Vec<f64>]) -> Result<Vec<[f64; 2]>, ProjectionError> {
        let n = data.len();
        if n < MIN_SAMPLES {
            return Err(ProjectionError::TooFewSamples {
                found: n,
                required: MIN_SAMPLES,
            });
        }
        if !(self.perplexity > 0.0 && self.perplexity < n as f64) {
            return Err(ProjectionError::InvalidPerplexity {
                perplexity: self.perplexity,
                samples: n,
            });
        }
        let dim = data[0].len();
        if data.iter().any(|row| row.len() != dim) {
            return Err(ProjectionError::RaggedInput);
        }

        let distances = squared_distances(data);
        let p = joint_probabilities(&distances, self.perplexity);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let init = Normal::new(0.0, 1e-4).map_err(|e| ProjectionError::Initialisation(e.to_string()))?;
        let mut y: Vec<[f64; 2]> = (0..n)
            .map(|_| [init.sample(&mut rng), init.sample(&mut rng)])
            .collect();

        let learning_rate = (n as f64 / EARLY_EXAGGERATION / 4.0).max(50.0);
        let mut update = vec![[0.0_f64; 2]; n];
        let mut gains = vec![[1.0_f64; 2]; n];

        for iter in 0..self.n_iter {
            let (exaggeration, momentum) = if iter < EXPLORATION_ITER {
                (EARLY_EXAGGERATION, 0.5)
            } else {
                (1.0, 0.8)
            };

            let grad = kl_gradient(&p, &y, exaggeration);
            for i in 0..n {
                for d in 0..2 {
                    let g = grad[i][d];
                    if update[i][d] * g < 0.0 {
                        gains[i][d] += 0.2;
                    } else {
                        gains[i][d] = (gains[i][d] * 0.8).max(MIN_GAIN);
                    }
                    update[i][d] = momentum * update[i][d] - learning_rate * gains[i][d] * g;
                    y[i][d] += update[i][d];
                }
            }
        }

        if y.iter().flatten().any(|v| !v.is_finite()) {
            return Err(ProjectionError::NonFinite);
        }

        debug!(samples = n, perplexity = self.perplexity, "t-SNE projection finished");
        Ok(y)
    }
}

fn squared_distances(data: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = data.len();
    let mut distances = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d: f64 = data[i]
                .iter()
                .zip(&data[j])
                .map(|(a, b)| (a - b) * (a - b))
                .sum();
            distances[i][j] = d;
            distances[j][i] = d;
        }
    }
    distances
}

/// Symmetric joint probabilities P from conditional Gaussians whose
/// bandwidths are binary-searched to match the target perplexity.
fn joint_probabilities(distances: &[Vec<f64>], perplexity: f64) -> Vec<Vec<f64>> {
    let n = distances.len();
    let desired_entropy = perplexity.ln();
    let mut conditional = vec![vec![0.0; n]; n];

    for i in 0..n {
        let mut beta = 1.0;
        let mut beta_min = f64::NEG_INFINITY;
        let mut beta_max = f64::INFINITY;

        for _ in 0..PERPLEXITY_STEPS {
            let mut sum_p = 0.0;
            for j in 0..n {
                conditional[i][j] = if i == j { 0.0 } else { (-distances[i][j] * beta).exp() };
                sum_p += conditional[i][j];
            }
            if sum_p == 0.0 {
                sum_p = f64::EPSILON;
            }

            let mut weighted = 0.0;
            for j in 0..n {
                conditional[i][j] /= sum_p;
                weighted += distances[i][j] * conditional[i][j];
            }
            let entropy = sum_p.ln() + beta * weighted;
            let diff = entropy - desired_entropy;
            if diff.abs() <= PERPLEXITY_TOL {
                break;
            }

            if diff > 0.0 {
                beta_min = beta;
                beta = if beta_max.is_infinite() { beta * 2.0 } else { (beta + beta_max) / 2.0 };
            } else {
                beta_max = beta;
                beta = if beta_min.is_infinite() { beta / 2.0 } else { (beta + beta_min) / 2.0 };
            }
        }
    }

    let mut joint = vec![vec![0.0; n]; n];
    let mut total = 0.0;
    for i in 0..n {
        for j in 0..n {
            joint[i][j] = conditional[i][j] + conditional[j][i];
            total += joint[i][j];
        }
    }
    let total = total.max(f64::EPSILON);
    for (i, row) in joint.iter_mut().enumerate() {
        for (j, p) in row.iter_mut().enumerate() {
            *p = if i == j { 0.0 } else { (*p / total).max(f64::EPSILON) };
        }
    }
    joint
}

/// Gradient of KL(P || Q) with a Student-t (one degree of freedom) kernel.
fn kl_gradient(p: &[Vec<f64>], y: &[[f64; 2]], exaggeration: f64) -> Vec<[f64; 2]> {
    let n = y.len();
    let mut num = vec![vec![0.0; n]; n];
    let mut sum_num = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = y[i][0] - y[j][0];
            let dy = y[i][1] - y[j][1];
            let kernel = 1.0 / (1.0 + dx * dx + dy * dy);
            num[i][j] = kernel;
            num[j][i] = kernel;
            sum_num += 2.0 * kernel;
        }
    }
    let sum_num = sum_num.max(f64::EPSILON);

    let mut grad = vec![[0.0; 2]; n];
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let q = (num[i][j] / sum_num).max(f64::EPSILON);
            let coeff = 4.0 * (exaggeration * p[i][j] - q) * num[i][j];
            grad[i][0] += coeff * (y[i][0] - y[j][0]);
            grad[i][1] += coeff * (y[i][1] - y[j][1]);
        }
    }
    grad
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_clusters() -> Vec<Vec<f64>> {
        vec![
            vec![0.95, 0.05],
            vec![0.9, 0.1],
            vec![0.92, 0.08],
            vec![0.05, 0.95],
            vec![0.1, 0.9],
            vec![0.08, 0.92],
        ]
    }

    fn dist(a: [f64; 2], b: [f64; 2]) -> f64 {
        ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
    }

    #[test]
    fn test_perplexity_for_small_sets() {
        assert_eq!(Tsne::for_samples(5).perplexity, 4.0);
        assert_eq!(Tsne::for_samples(31).perplexity, 30.0);
        assert_eq!(Tsne::for_samples(500).perplexity, 30.0);
    }

    #[test]
    fn test_too_few_samples() {
        let data = vec![vec![1.0, 0.0]; 4];
        let err = Tsne::for_samples(4).fit_transform(&data).unwrap_err();
        assert!(matches!(
            err,
            ProjectionError::TooFewSamples { found: 4, required: 5 }
        ));
    }

    #[test]
    fn test_invalid_perplexity() {
        let tsne = Tsne {
            perplexity: 10.0,
            n_iter: 10,
            seed: 42,
        };
        let err = tsne.fit_transform(&two_clusters()).unwrap_err();
        assert!(matches!(err, ProjectionError::InvalidPerplexity { .. }));
    }

    #[test]
    fn test_one_point_per_row() {
        let data = two_clusters();
        let points = Tsne::for_samples(data.len()).fit_transform(&data).unwrap();
        assert_eq!(points.len(), data.len());
        assert!(points.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn test_clusters_stay_apart() {
        let data = two_clusters();
        // Perplexity close to N flattens P; keep the neighbourhood to the cluster size
        let tsne = Tsne {
            perplexity: 2.0,
            ..Tsne::for_samples(data.len())
        };
        let points = tsne.fit_transform(&data).unwrap();
        let within = dist(points[0], points[1]).max(dist(points[3], points[4]));
        let between = dist(points[0], points[3]);
        assert!(between > within, "between {between} <= within {within}");
    }

    #[test]
    fn test_deterministic() {
        let data = two_clusters();
        let a = Tsne::for_samples(data.len()).fit_transform(&data).unwrap();
        let b = Tsne::for_samples(data.len()).fit_transform(&data).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_identical_points_do_not_diverge() {
        let data = vec![vec![0.5, 0.5]; 6];
        let points = Tsne::for_samples(6).fit_transform(&data).unwrap();
        assert!(points.iter().flatten().all(|v| v.is_finite()));
    }
}
