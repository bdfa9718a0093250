// Topic-modeling pipeline — reviews in, topic report out.
//
// Steps: drop empty reviews, normalize, extract adjectives and count them,
// fit LDA, name topics by their top words, assign each review its main
// topic, then project and chart when there are enough reviews. The
// projection and chart are best effort: their failures are logged here and
// only leave the corresponding fields empty.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::adjectives::FallbackExtractor;
use super::chart::{self, ChartError};
use super::lda::{self, LatentDirichletAllocation, LdaError};
use super::normalize::normalize;
use super::report::{
    DocumentTopicAssignment, ProjectionPoint, Review, Topic, TopicModelingResult,
};
use super::tagger::PosTagger;
use super::tsne::{self, Tsne};
use super::vectorizer::{CountVectorizer, VectorizeError};
use crate::output::truncate_chars;

pub const DEFAULT_TOPICS: usize = 5;
pub const DEFAULT_TOP_WORDS: usize = 10;

/// Fewest non-empty reviews a model is fit on.
pub const MIN_REVIEWS: usize = 3;

/// Characters of the original review kept in an assignment preview.
const PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("at least {required} reviews with text are needed for topic modeling, found {found}", required = MIN_REVIEWS)]
    InsufficientData { found: usize },
    #[error("{0}")]
    Vectorization(String),
    #[error("topic modeling failed: {0}")]
    Internal(String),
}

impl PipelineError {
    /// True for errors caused by the input rather than by the system.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InsufficientData { .. } | Self::Vectorization(_))
    }

    /// The error message, safe to show in a UI.
    pub fn user_message(&self) -> String {
        sanitize_message(&self.to_string())
    }
}

impl From<VectorizeError> for PipelineError {
    fn from(e: VectorizeError) -> Self {
        match e {
            VectorizeError::EmptyVocabulary | VectorizeError::AllTermsPruned => Self::Vectorization(
                "the reviews did not contain enough adjectives to build topics".to_string(),
            ),
            VectorizeError::Extraction(e) => Self::Internal(sanitize_message(&e.to_string())),
        }
    }
}

impl From<LdaError> for PipelineError {
    fn from(e: LdaError) -> Self {
        Self::Internal(sanitize_message(&e.to_string()))
    }
}

/// Strip control and replacement characters and collapse whitespace.
pub fn sanitize_message(message: &str) -> String {
    message
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .filter(|&c| c != char::REPLACEMENT_CHARACTER)
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Knobs for one pipeline run.
#[derive(Clone)]
pub struct TopicModelingOptions {
    pub n_topics: usize,
    pub n_top_words: usize,
    /// Morphological tagger; the heuristic extractor is used without one
    pub tagger: Option<Arc<dyn PosTagger>>,
    /// Preferred chart font, tried before the system fonts
    pub chart_font: Option<PathBuf>,
    pub render_chart: bool,
}

impl Default for TopicModelingOptions {
    fn default() -> Self {
        Self {
            n_topics: DEFAULT_TOPICS,
            n_top_words: DEFAULT_TOP_WORDS,
            tagger: None,
            chart_font: None,
            render_chart: true,
        }
    }
}

/// Run the pipeline with heuristic extraction and system chart fonts.
///
/// No POS tagger is attached here, so the morphological path always reports
/// itself unavailable and every document goes through the heuristic
/// extractor. Pass a tagger in [`TopicModelingOptions::tagger`] and call
/// [`perform_topic_modeling_with`] to have it tried first
/// (`Config::topic_options` does this with the configured lexicon).
pub fn perform_topic_modeling(
    reviews: &[Review],
    n_topics: usize,
    n_top_words: usize,
) -> Result<TopicModelingResult, PipelineError> {
    let options = TopicModelingOptions {
        n_topics,
        n_top_words,
        ..TopicModelingOptions::default()
    };
    perform_topic_modeling_with(&options, reviews)
}

/// Run the pipeline with explicit options.
pub fn perform_topic_modeling_with(
    options: &TopicModelingOptions,
    reviews: &[Review],
) -> Result<TopicModelingResult, PipelineError> {
    let result = run(options, reviews);
    match &result {
        Ok(report) => info!(
            reviews = report.total_reviews,
            topics = report.n_topics,
            projected = !report.projection.is_empty(),
            chart = report.chart.is_some(),
            "Topic modeling complete"
        ),
        Err(e) if e.is_client_error() => info!(error = %e, "Topic modeling rejected input"),
        Err(e) => error!(error = %e, "Topic modeling failed"),
    }
    result
}

fn run(
    options: &TopicModelingOptions,
    reviews: &[Review],
) -> Result<TopicModelingResult, PipelineError> {
    let originals: Vec<&str> = reviews
        .iter()
        .map(|r| r.content.as_str())
        .filter(|content| !content.trim().is_empty())
        .collect();
    if originals.len() < MIN_REVIEWS {
        return Err(PipelineError::InsufficientData {
            found: originals.len(),
        });
    }

    let documents: Vec<String> = originals.iter().map(|text| normalize(text)).collect();
    let extractor = FallbackExtractor::new(options.tagger.clone());
    let (vocabulary, dtm) = CountVectorizer::default().fit_transform(&documents, &extractor)?;

    let n_topics = lda::effective_topic_count(options.n_topics, vocabulary.len());
    if n_topics != options.n_topics {
        debug!(
            requested = options.n_topics,
            effective = n_topics,
            vocabulary = vocabulary.len(),
            "Reduced topic count to fit the vocabulary"
        );
    }
    let model = LatentDirichletAllocation::new(n_topics).fit_transform(&dtm)?;

    let topics: Vec<Topic> = (0..model.n_topics())
        .map(|t| {
            let (words, weights): (Vec<String>, Vec<f64>) = model
                .top_words(t, options.n_top_words)
                .into_iter()
                .map(|(term, weight)| (vocabulary[term].clone(), weight))
                .unzip();
            Topic {
                id: t + 1,
                words,
                weights,
            }
        })
        .collect();

    let doc_topics: Vec<DocumentTopicAssignment> = originals
        .iter()
        .enumerate()
        .map(|(i, original)| {
            let (topic, confidence) = model.main_topic(i);
            DocumentTopicAssignment {
                review_index: i,
                main_topic: topic + 1,
                confidence,
                preview: truncate_chars(original, PREVIEW_CHARS),
            }
        })
        .collect();

    let coordinates = project(model.doc_topic());
    let chart = match &coordinates {
        Some(points) if options.render_chart => {
            let main_topics: Vec<usize> = doc_topics.iter().map(|a| a.main_topic - 1).collect();
            render_chart(points, &main_topics, model.n_topics(), options)
        }
        _ => None,
    };

    let projection = coordinates
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(review_index, [x, y])| ProjectionPoint { review_index, x, y })
        .collect();

    Ok(TopicModelingResult {
        n_topics: model.n_topics(),
        topics,
        doc_topics,
        projection,
        chart,
        total_reviews: originals.len(),
    })
}

fn project(doc_topic: &[Vec<f64>]) -> Option<Vec<[f64; 2]>> {
    if doc_topic.len() < tsne::MIN_SAMPLES {
        debug!(documents = doc_topic.len(), "Too few documents for projection");
        return None;
    }
    match Tsne::for_samples(doc_topic.len()).fit_transform(doc_topic) {
        Ok(points) => Some(points),
        Err(e) => {
            debug!(error = %e, "Projection skipped");
            None
        }
    }
}

fn render_chart(
    points: &[[f64; 2]],
    main_topics: &[usize],
    n_topics: usize,
    options: &TopicModelingOptions,
) -> Option<String> {
    match chart::render_scatter(points, main_topics, n_topics, options.chart_font.as_deref()) {
        Ok(uri) => Some(uri),
        Err(ChartError::NoFont) => {
            debug!("No chart font found, chart omitted");
            None
        }
        Err(e) => {
            warn!(error = %e, "Chart rendering failed");
            None
        }
    }
}
