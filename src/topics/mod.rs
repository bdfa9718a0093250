// Topic modeling — adjective extraction, LDA, projection and reporting.

pub mod adjectives;
pub mod chart;
pub mod lda;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod tagger;
pub mod tsne;
pub mod vectorizer;

pub use pipeline::{
    perform_topic_modeling, perform_topic_modeling_with, PipelineError, TopicModelingOptions,
    DEFAULT_TOPICS, DEFAULT_TOP_WORDS,
};
pub use report::{Review, TopicModelingResult};
