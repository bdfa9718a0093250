// Adjective extraction — swap-ready abstraction with two strategies.
//
// The morphological path asks a PosTagger for tokens tagged Adjective. The
// heuristic path matches known adjective stems and sentence-final endings.
// FallbackExtractor picks between them on every call: a tagger that is
// missing, or that rejects one input, only costs that call the better path.

use std::sync::Arc;

use tracing::debug;

use super::normalize::normalize;
use super::tagger::{PosTag, PosTagger, TaggerError};

/// Minimum token length, in characters, for any extracted adjective.
const MIN_ADJECTIVE_CHARS: usize = 2;

/// Common Korean adjective stems. A token containing any of them is kept.
const ADJECTIVE_STEMS: &[&str] = &[
    "좋", "나쁘", "크", "작", "많", "적", "빠르", "느리", "쉬", "어렵", "예쁘", "못생기", "맛있",
    "맛없", "재미있", "재미없", "편하", "불편", "가벼", "무거", "밝", "어두", "따뜻하", "차갑",
    "깨끗하", "더럽", "새롭", "오래", "높", "낮", "넓", "좁", "두껍", "얇", "강하", "약하",
    "똑똑하", "멍청하", "친절하", "불친절",
];

/// Sentence-final endings that usually close a predicate adjective.
const ADJECTIVE_ENDINGS: &[&str] = &["다", "네요", "어요", "습니다", "아요"];

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("morphological analysis failed: {0}")]
    Tagger(#[from] TaggerError),
}

/// Trait for pulling adjective-like tokens out of a document.
pub trait AdjectiveExtractor: Send + Sync {
    /// Extract adjectives in order of appearance (repeats allowed).
    fn extract(&self, text: &str) -> Result<Vec<String>, ExtractionError>;
}

fn char_len(token: &str) -> usize {
    token.chars().count()
}

/// Pattern/suffix matcher used when no tagger is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicExtractor;

impl HeuristicExtractor {
    fn is_adjective(token: &str) -> bool {
        if ADJECTIVE_STEMS.iter().any(|stem| token.contains(stem)) {
            return true;
        }
        char_len(token) >= MIN_ADJECTIVE_CHARS
            && ADJECTIVE_ENDINGS.iter().any(|ending| token.ends_with(ending))
    }

    pub fn extract_tokens(&self, text: &str) -> Vec<String> {
        normalize(text)
            .split_whitespace()
            .filter(|token| Self::is_adjective(token))
            .filter(|token| char_len(token) >= MIN_ADJECTIVE_CHARS)
            .map(str::to_string)
            .collect()
    }
}

impl AdjectiveExtractor for HeuristicExtractor {
    fn extract(&self, text: &str) -> Result<Vec<String>, ExtractionError> {
        Ok(self.extract_tokens(text))
    }
}

/// Tagger-backed extractor: keeps tokens tagged `Adjective`.
pub struct MorphologicalExtractor {
    tagger: Arc<dyn PosTagger>,
}

impl MorphologicalExtractor {
    pub fn new(tagger: Arc<dyn PosTagger>) -> Self {
        Self { tagger }
    }
}

impl AdjectiveExtractor for MorphologicalExtractor {
    fn extract(&self, text: &str) -> Result<Vec<String>, ExtractionError> {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return Ok(Vec::new());
        }
        let tagged = self.tagger.pos(&normalized)?;
        Ok(tagged
            .into_iter()
            .filter(|(word, tag)| *tag == PosTag::Adjective && char_len(word) >= MIN_ADJECTIVE_CHARS)
            .map(|(word, _)| word)
            .collect())
    }
}

/// The extractor the pipeline uses: tagger first, heuristic fallback.
///
/// Availability is probed on every call and nothing is cached, so a tagger
/// that recovers is used again on the next document. Only the expected
/// failure categories (unavailable, unsupported input) fall back; any other
/// tagger error propagates.
pub struct FallbackExtractor {
    morphological: Option<MorphologicalExtractor>,
    heuristic: HeuristicExtractor,
}

impl FallbackExtractor {
    pub fn new(tagger: Option<Arc<dyn PosTagger>>) -> Self {
        Self {
            morphological: tagger.map(MorphologicalExtractor::new),
            heuristic: HeuristicExtractor,
        }
    }

    /// Heuristic-only extractor.
    pub fn heuristic_only() -> Self {
        Self::new(None)
    }
}

impl AdjectiveExtractor for FallbackExtractor {
    fn extract(&self, text: &str) -> Result<Vec<String>, ExtractionError> {
        let Some(morphological) = &self.morphological else {
            return self.heuristic.extract(text);
        };

        if !morphological.tagger.is_available() {
            debug!("POS tagger unavailable, using heuristic adjective extraction");
            return self.heuristic.extract(text);
        }

        match morphological.extract(text) {
            Ok(adjectives) => Ok(adjectives),
            Err(ExtractionError::Tagger(
                e @ (TaggerError::Unavailable(_) | TaggerError::Unsupported(_)),
            )) => {
                debug!(error = %e, "POS tagger declined input, using heuristic extraction");
                self.heuristic.extract(text)
            }
            Err(e) => Err(e),
        }
    }
}
