// Document-term count matrix over extracted adjectives.
//
// Each document is lowercased, run through the adjective extractor, and
// counted. The vocabulary is pruned by document frequency and capped at the
// most frequent terms, then sorted so column indices are deterministic.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use super::adjectives::{AdjectiveExtractor, ExtractionError};

#[derive(Debug, thiserror::Error)]
pub enum VectorizeError {
    #[error("no adjectives could be extracted from any document")]
    EmptyVocabulary,
    #[error("every extracted term was pruned by the document-frequency limits")]
    AllTermsPruned,
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Sparse document-term count matrix.
///
/// Rows are documents in input order; each row lists `(term index, count)`
/// pairs sorted by term index.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTermMatrix {
    rows: Vec<Vec<(usize, u32)>>,
    n_terms: usize,
}

impl DocumentTermMatrix {
    pub fn n_docs(&self) -> usize {
        self.rows.len()
    }

    pub fn n_terms(&self) -> usize {
        self.n_terms
    }

    pub fn row(&self, doc: usize) -> &[(usize, u32)] {
        &self.rows[doc]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[(usize, u32)]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Count of `term` in `doc` (zero when absent).
    pub fn get(&self, doc: usize, term: usize) -> u32 {
        self.rows[doc]
            .binary_search_by_key(&term, |&(t, _)| t)
            .map(|i| self.rows[doc][i].1)
            .unwrap_or(0)
    }
}

/// Count vectorizer with document-frequency pruning.
#[derive(Debug, Clone)]
pub struct CountVectorizer {
    /// Keep at most this many terms, ranked by total count
    pub max_features: usize,
    /// A term must appear in at least this many documents
    pub min_df: usize,
    /// A term must appear in at most this fraction of documents
    pub max_df: f64,
}

impl Default for CountVectorizer {
    fn default() -> Self {
        Self {
            max_features: 500,
            min_df: 1,
            max_df: 0.9,
        }
    }
}

impl CountVectorizer {
    /// Tokenize `documents` and build the vocabulary and count matrix.
    pub fn fit_transform(
        &self,
        documents: &[String],
        extractor: &dyn AdjectiveExtractor,
    ) -> Result<(Vec<String>, DocumentTermMatrix), VectorizeError> {
        let tokenized = documents
            .iter()
            .map(|doc| extractor.extract(&doc.to_lowercase()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut term_count: BTreeMap<&str, u64> = BTreeMap::new();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for tokens in &tokenized {
            let mut seen = HashSet::new();
            for token in tokens {
                *term_count.entry(token.as_str()).or_insert(0) += 1;
                if seen.insert(token.as_str()) {
                    *doc_freq.entry(token.as_str()).or_insert(0) += 1;
                }
            }
        }

        if term_count.is_empty() {
            return Err(VectorizeError::EmptyVocabulary);
        }

        let max_doc_count = self.max_df * documents.len() as f64;
        let mut kept: Vec<(&str, u64)> = term_count
            .into_iter()
            .filter(|(term, _)| {
                let df = doc_freq[term];
                df >= self.min_df && df as f64 <= max_doc_count
            })
            .collect();

        if kept.is_empty() {
            return Err(VectorizeError::AllTermsPruned);
        }

        if kept.len() > self.max_features {
            // Stable sort keeps lexicographic order among equal counts
            kept.sort_by(|a, b| b.1.cmp(&a.1));
            kept.truncate(self.max_features);
            kept.sort_by(|a, b| a.0.cmp(b.0));
        }

        let vocabulary: Vec<String> = kept.iter().map(|(term, _)| term.to_string()).collect();
        let n_terms = vocabulary.len();
        let index: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, term)| (term.as_str(), i))
            .collect();

        let rows = tokenized
            .iter()
            .map(|tokens| {
                let mut counts: BTreeMap<usize, u32> = BTreeMap::new();
                for token in tokens {
                    if let Some(&i) = index.get(token.as_str()) {
                        *counts.entry(i).or_insert(0) += 1;
                    }
                }
                counts.into_iter().collect()
            })
            .collect();

        debug!(
            documents = documents.len(),
            vocabulary = n_terms,
            "Built document-term matrix"
        );

        Ok((vocabulary, DocumentTermMatrix { rows, n_terms }))
    }
}
