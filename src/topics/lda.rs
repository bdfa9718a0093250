// Latent Dirichlet Allocation, fit with batch variational Bayes.
//
// Every outer iteration runs an E-step over all documents (per-document
// variational updates until convergence) and then an M-step that sets the
// topic-word parameters to prior + expected counts. The sampler is seeded,
// so the same matrix always yields the same model.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Gamma};
use tracing::debug;

use super::vectorizer::DocumentTermMatrix;

/// Fixed seed for all random initialisation.
pub const DEFAULT_SEED: u64 = 42;

/// Outer EM iterations.
pub const DEFAULT_MAX_ITER: usize = 50;

/// Shape and scale of the Gamma distribution used to initialise variational
/// parameters (mean 1, small variance).
const INIT_SHAPE: f64 = 100.0;
const INIT_SCALE: f64 = 0.01;

#[derive(Debug, thiserror::Error)]
pub enum LdaError {
    #[error("topic count must be at least 1")]
    InvalidTopicCount,
    #[error("document-term matrix has no terms")]
    EmptyMatrix,
    #[error("could not build the initialisation distribution: {0}")]
    Initialisation(String),
    #[error("inference produced a non-finite value")]
    NonFinite,
}

/// Fewest topics the pipeline ever fits.
pub const MIN_TOPICS: usize = 2;

/// Number of topics actually fit for a requested count and vocabulary size.
///
/// Requests below [`MIN_TOPICS`] are raised to it. A vocabulary smaller than
/// the request cannot support that many topics, so the count drops to one
/// less than the vocabulary, but never below [`MIN_TOPICS`].
pub fn effective_topic_count(requested: usize, vocabulary_size: usize) -> usize {
    let requested = requested.max(MIN_TOPICS);
    if vocabulary_size < requested {
        MIN_TOPICS.max(vocabulary_size.saturating_sub(1))
    } else {
        requested
    }
}

#[derive(Debug, Clone)]
pub struct LatentDirichletAllocation {
    pub n_topics: usize,
    pub max_iter: usize,
    pub seed: u64,
    /// Inner variational updates per document per E-step
    pub max_doc_update_iter: usize,
    /// Per-document convergence threshold (mean absolute change)
    pub mean_change_tol: f64,
}

impl LatentDirichletAllocation {
    pub fn new(n_topics: usize) -> Self {
        Self {
            n_topics,
            max_iter: DEFAULT_MAX_ITER,
            seed: DEFAULT_SEED,
            max_doc_update_iter: 100,
            mean_change_tol: 1e-3,
        }
    }

    /// Fit the model and return topic-word weights plus normalised
    /// document-topic distributions for the same documents.
    pub fn fit_transform(&self, dtm: &DocumentTermMatrix) -> Result<FittedLda, LdaError> {
        if self.n_topics == 0 {
            return Err(LdaError::InvalidTopicCount);
        }
        if dtm.n_terms() == 0 {
            return Err(LdaError::EmptyMatrix);
        }

        let k = self.n_topics;
        let prior = 1.0 / k as f64;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let init = Gamma::new(INIT_SHAPE, INIT_SCALE)
            .map_err(|e| LdaError::Initialisation(e.to_string()))?;

        let mut components = vec![vec![0.0; dtm.n_terms()]; k];
        for weight in components.iter_mut().flatten() {
            *weight = init.sample(&mut rng);
        }
        let mut exp_topic_word = exp_dirichlet_expectation_rows(&components);

        for _ in 0..self.max_iter {
            let (_, sstats) = self.e_step(dtm, &exp_topic_word, prior, Some((&init, &mut rng)));
            let sstats = sstats.unwrap_or_default();
            for (topic, stats) in components.iter_mut().zip(&sstats) {
                for (weight, s) in topic.iter_mut().zip(stats) {
                    *weight = prior + s;
                }
            }
            exp_topic_word = exp_dirichlet_expectation_rows(&components);
        }
        debug!(iterations = self.max_iter, topics = k, "LDA fit finished");

        let (mut doc_topic, _) = self.e_step(dtm, &exp_topic_word, prior, None);
        for row in &mut doc_topic {
            let total: f64 = row.iter().sum();
            if total > 0.0 {
                row.iter_mut().for_each(|w| *w /= total);
            }
        }

        let finite = components.iter().chain(&doc_topic).flatten().all(|v| v.is_finite());
        if !finite {
            return Err(LdaError::NonFinite);
        }

        Ok(FittedLda {
            components,
            doc_topic,
        })
    }

    /// Variational E-step. With `random_init` the per-document parameters
    /// start from Gamma draws and sufficient statistics are collected (fit);
    /// without it they start at one and only distributions are returned.
    fn e_step(
        &self,
        dtm: &DocumentTermMatrix,
        exp_topic_word: &[Vec<f64>],
        prior: f64,
        random_init: Option<(&Gamma<f64>, &mut StdRng)>,
    ) -> (Vec<Vec<f64>>, Option<Vec<Vec<f64>>>) {
        let k = self.n_topics;
        let collect_stats = random_init.is_some();

        let mut doc_topic = vec![vec![1.0; k]; dtm.n_docs()];
        if let Some((init, rng)) = random_init {
            for value in doc_topic.iter_mut().flatten() {
                *value = init.sample(&mut *rng);
            }
        }
        let mut sstats = collect_stats.then(|| vec![vec![0.0; dtm.n_terms()]; k]);

        for (d, row) in dtm.rows().enumerate() {
            let mut gamma_d = doc_topic[d].clone();
            let mut exp_doc_topic = exp_dirichlet_expectation(&gamma_d);

            for _ in 0..self.max_doc_update_iter {
                let last = gamma_d.clone();
                let norm_phi = phi_norm(row, &exp_doc_topic, exp_topic_word);

                for (t, g) in gamma_d.iter_mut().enumerate() {
                    let dot: f64 = row
                        .iter()
                        .zip(&norm_phi)
                        .map(|(&(w, count), norm)| count as f64 / norm * exp_topic_word[t][w])
                        .sum();
                    *g = exp_doc_topic[t] * dot + prior;
                }
                exp_doc_topic = exp_dirichlet_expectation(&gamma_d);

                if mean_change(&last, &gamma_d) < self.mean_change_tol {
                    break;
                }
            }

            if let Some(stats) = sstats.as_mut() {
                let norm_phi = phi_norm(row, &exp_doc_topic, exp_topic_word);
                for (t, stats_t) in stats.iter_mut().enumerate() {
                    for (&(w, count), norm) in row.iter().zip(&norm_phi) {
                        stats_t[w] += exp_doc_topic[t] * count as f64 / norm;
                    }
                }
            }

            doc_topic[d] = gamma_d;
        }

        if let Some(stats) = sstats.as_mut() {
            for (stats_t, exp_t) in stats.iter_mut().zip(exp_topic_word) {
                for (s, e) in stats_t.iter_mut().zip(exp_t) {
                    *s *= e;
                }
            }
        }

        (doc_topic, sstats)
    }
}

/// Normaliser of the word-topic responsibilities for each term of a document.
fn phi_norm(row: &[(usize, u32)], exp_doc_topic: &[f64], exp_topic_word: &[Vec<f64>]) -> Vec<f64> {
    row.iter()
        .map(|&(w, _)| {
            exp_doc_topic
                .iter()
                .zip(exp_topic_word)
                .map(|(theta, beta)| theta * beta[w])
                .sum::<f64>()
                + f64::EPSILON
        })
        .collect()
}

/// exp(E[log x]) for x ~ Dirichlet(alpha).
fn exp_dirichlet_expectation(alpha: &[f64]) -> Vec<f64> {
    let psi_total = digamma(alpha.iter().sum());
    alpha.iter().map(|&a| (digamma(a) - psi_total).exp()).collect()
}

fn exp_dirichlet_expectation_rows(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    rows.iter().map(|row| exp_dirichlet_expectation(row)).collect()
}

fn mean_change(a: &[f64], b: &[f64]) -> f64 {
    let total: f64 = a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum();
    total / a.len() as f64
}

/// Digamma function via recurrence up to x >= 6 and the asymptotic series.
pub fn digamma(mut x: f64) -> f64 {
    if x <= 0.0 {
        return f64::NAN;
    }
    let mut result = 0.0;
    while x < 6.0 {
        result -= 1.0 / x;
        x += 1.0;
    }
    let f = 1.0 / (x * x);
    let series = f
        * (1.0 / 12.0 - f * (1.0 / 120.0 - f * (1.0 / 252.0 - f * (1.0 / 240.0 - f / 132.0))));
    result + x.ln() - 0.5 / x - series
}

/// A fitted model: K' × V topic-word weights and N × K' document-topic rows.
#[derive(Debug, Clone)]
pub struct FittedLda {
    components: Vec<Vec<f64>>,
    doc_topic: Vec<Vec<f64>>,
}

impl FittedLda {
    pub fn n_topics(&self) -> usize {
        self.components.len()
    }

    /// Unnormalised topic-word weights, one row per topic.
    pub fn components(&self) -> &[Vec<f64>] {
        &self.components
    }

    /// Document-topic distributions; each row sums to 1.
    pub fn doc_topic(&self) -> &[Vec<f64>] {
        &self.doc_topic
    }

    /// The `n` highest-weight terms of `topic` as `(term index, weight)`,
    /// descending, ties broken by lower term index.
    pub fn top_words(&self, topic: usize, n: usize) -> Vec<(usize, f64)> {
        let mut ranked: Vec<(usize, f64)> =
            self.components[topic].iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(n);
        ranked
    }

    /// Main topic of `doc` as (0-based index, weight); the first maximum wins.
    pub fn main_topic(&self, doc: usize) -> (usize, f64) {
        self.doc_topic[doc]
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (t, w)| if w > best.1 { (t, w) } else { best })
    }
}
