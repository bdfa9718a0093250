use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::topics::tagger::{LexiconTagger, PosTagger};
use crate::topics::{TopicModelingOptions, DEFAULT_TOPICS, DEFAULT_TOP_WORDS};

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    /// Tab-separated lexicon for the morphological tagger
    pub lexicon_path: PathBuf,
    /// Font for chart text; system fonts are tried when unset
    pub chart_font: Option<PathBuf>,
    pub n_topics: usize,
    pub n_top_words: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every setting has a default; only malformed numbers are errors.
    pub fn load() -> Result<Self> {
        let lexicon_path = env::var("REVIEWLENS_LEXICON")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_lexicon_path());

        Ok(Self {
            db_path: env::var("REVIEWLENS_DB_PATH").unwrap_or_else(|_| "./reviewlens.db".to_string()),
            lexicon_path,
            chart_font: env::var("REVIEWLENS_CHART_FONT").ok().map(PathBuf::from),
            n_topics: parse_count("REVIEWLENS_TOPICS", DEFAULT_TOPICS)?,
            n_top_words: parse_count("REVIEWLENS_TOP_WORDS", DEFAULT_TOP_WORDS)?,
        })
    }

    /// Whether the lexicon file for morphological tagging exists.
    pub fn lexicon_present(&self) -> bool {
        self.lexicon_path.is_file()
    }

    /// Pipeline options for this configuration, with optional overrides.
    ///
    /// The tagger is always attached; it reports itself unavailable when
    /// the lexicon is missing and the heuristic extractor takes over.
    pub fn topic_options(
        &self,
        n_topics: Option<usize>,
        n_top_words: Option<usize>,
    ) -> TopicModelingOptions {
        let tagger: Arc<dyn PosTagger> = Arc::new(LexiconTagger::new(self.lexicon_path.clone()));
        TopicModelingOptions {
            n_topics: n_topics.unwrap_or(self.n_topics),
            n_top_words: n_top_words.unwrap_or(self.n_top_words),
            tagger: Some(tagger),
            chart_font: self.chart_font.clone(),
            render_chart: true,
        }
    }
}

/// Default lexicon location: the platform data directory, e.g.
/// ~/.local/share/reviewlens/lexicon.tsv on Linux.
pub fn default_lexicon_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("reviewlens")
        .join("lexicon.tsv")
}

fn parse_count(var: &str, default: usize) -> Result<usize> {
    match env::var(var) {
        Ok(value) => {
            let count: usize = value
                .trim()
                .parse()
                .with_context(|| format!("{var} must be a positive integer, got {value:?}"))?;
            if count == 0 {
                anyhow::bail!("{var} must be at least 1");
            }
            Ok(count)
        }
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lexicon_path_file_name() {
        let path = default_lexicon_path();
        assert!(path.ends_with("reviewlens/lexicon.tsv"));
    }

    #[test]
    fn test_topic_options_overrides() {
        let config = Config {
            db_path: ":memory:".to_string(),
            lexicon_path: PathBuf::from("/nonexistent/lexicon.tsv"),
            chart_font: None,
            n_topics: 5,
            n_top_words: 10,
        };
        assert!(!config.lexicon_present());

        let options = config.topic_options(Some(3), None);
        assert_eq!(options.n_topics, 3);
        assert_eq!(options.n_top_words, 10);
        let tagger = options.tagger.unwrap();
        assert!(!tagger.is_available());
    }
}
