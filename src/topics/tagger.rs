// Part-of-speech tagger port — the morphological-analyzer side of adjective
// extraction.
//
// The pipeline never requires a tagger. When one is configured and available
// it is preferred; otherwise the heuristic extractor takes over (see
// adjectives.rs). The shipped implementation is a lexicon lookup: a
// tab-separated file of surface forms and tags, read on first use and kept
// in memory afterwards.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

/// Coarse part-of-speech categories, named after the usual Korean tagset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PosTag {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Josa,
    Eomi,
    Unknown,
}

impl PosTag {
    /// Parse a tag name from a lexicon file. Unknown names map to `Unknown`.
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "Noun" => PosTag::Noun,
            "Verb" => PosTag::Verb,
            "Adjective" => PosTag::Adjective,
            "Adverb" => PosTag::Adverb,
            "Josa" => PosTag::Josa,
            "Eomi" => PosTag::Eomi,
            _ => PosTag::Unknown,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TaggerError {
    /// The analyzer cannot be used at all (missing dictionary, not installed).
    #[error("tagger unavailable: {0}")]
    Unavailable(String),
    /// The analyzer refused this particular input.
    #[error("tagger cannot handle input: {0}")]
    Unsupported(String),
    /// Anything else — a real bug or a corrupt resource.
    #[error("tagger failed: {0}")]
    Failed(String),
}

/// Trait for morphological analyzers that tag text with parts of speech.
pub trait PosTagger: Send + Sync {
    /// Cheap availability probe, checked before every extraction call.
    fn is_available(&self) -> bool;

    /// Tag every morpheme of `text`, in order of appearance.
    fn pos(&self, text: &str) -> Result<Vec<(String, PosTag)>, TaggerError>;
}

/// Particles recognised when splitting an unknown suffix off a lexicon stem.
const PARTICLES: &[&str] = &[
    "이", "가", "은", "는", "을", "를", "에", "에서", "의", "도", "로", "으로", "와", "과",
    "만", "까지", "부터", "보다", "처럼", "하고", "이나", "나",
];

/// Lexicon-backed tagger.
///
/// Each line of the lexicon is `surface<TAB>Tag`; blank lines and lines
/// starting with `#` are ignored. A token is tagged by exact match, or by its
/// longest lexicon prefix with the remainder tagged `Josa` (known particle) or
/// `Unknown`.
///
/// The file is parsed on the first `pos` call and cached for the life of the
/// tagger, so tagging a batch of documents reads it once.
pub struct LexiconTagger {
    path: PathBuf,
    cache: Mutex<Option<Arc<Lexicon>>>,
}

impl LexiconTagger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Lexicon, TaggerError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                TaggerError::Unavailable(format!("lexicon not found at {}", self.path.display()))
            }
            _ => TaggerError::Failed(format!(
                "could not read lexicon {}: {e}",
                self.path.display()
            )),
        })?;
        Lexicon::parse(&raw)
    }

    fn lexicon(&self) -> Result<Arc<Lexicon>, TaggerError> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| TaggerError::Failed("lexicon cache lock poisoned".to_string()))?;
        if let Some(lexicon) = cache.as_ref() {
            return Ok(Arc::clone(lexicon));
        }
        let lexicon = Arc::new(self.load()?);
        debug!(
            entries = lexicon.entries.len(),
            path = %self.path.display(),
            "Loaded POS lexicon"
        );
        *cache = Some(Arc::clone(&lexicon));
        Ok(lexicon)
    }
}

impl PosTagger for LexiconTagger {
    fn is_available(&self) -> bool {
        self.path.is_file()
    }

    fn pos(&self, text: &str) -> Result<Vec<(String, PosTag)>, TaggerError> {
        Ok(self.lexicon()?.tag(text))
    }
}

/// Parsed lexicon: surface form -> tag.
#[derive(Debug, Default)]
pub struct Lexicon {
    entries: HashMap<String, PosTag>,
    longest: usize,
}

impl Lexicon {
    pub fn parse(raw: &str) -> Result<Self, TaggerError> {
        let mut lexicon = Lexicon::default();
        for (line_no, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((surface, tag)) = line.split_once('\t') else {
                return Err(TaggerError::Failed(format!(
                    "malformed lexicon line {}: expected `surface<TAB>tag`",
                    line_no + 1
                )));
            };
            let surface = surface.trim();
            if surface.is_empty() {
                continue;
            }
            lexicon.longest = lexicon.longest.max(surface.chars().count());
            lexicon.entries.insert(surface.to_string(), PosTag::parse(tag));
        }
        Ok(lexicon)
    }

    pub fn tag(&self, text: &str) -> Vec<(String, PosTag)> {
        let mut tagged = Vec::new();
        for token in text.split_whitespace() {
            self.tag_token(token, &mut tagged);
        }
        tagged
    }

    fn tag_token(&self, token: &str, out: &mut Vec<(String, PosTag)>) {
        if let Some(tag) = self.entries.get(token) {
            out.push((token.to_string(), *tag));
            return;
        }

        // Longest known prefix, measured in characters
        let chars: Vec<char> = token.chars().collect();
        let max_len = self.longest.min(chars.len().saturating_sub(1));
        for len in (1..=max_len).rev() {
            let stem: String = chars[..len].iter().collect();
            if let Some(tag) = self.entries.get(&stem) {
                let rest: String = chars[len..].iter().collect();
                let rest_tag = if PARTICLES.contains(&rest.as_str()) {
                    PosTag::Josa
                } else {
                    PosTag::Unknown
                };
                out.push((stem, *tag));
                out.push((rest, rest_tag));
                return;
            }
        }

        out.push((token.to_string(), PosTag::Unknown));
    }
}
