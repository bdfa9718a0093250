// Unit tests for the topic pipeline's building blocks.
//
// Tests isolated pure functions through the public API: normalization
// properties, adjective extraction strategies, the document-term matrix,
// topic-count clamping and LDA output invariants.

use std::sync::Arc;

use reviewlens::topics::adjectives::{AdjectiveExtractor, FallbackExtractor, HeuristicExtractor};
use reviewlens::topics::lda::{effective_topic_count, LatentDirichletAllocation};
use reviewlens::topics::normalize::{is_permitted, normalize};
use reviewlens::topics::tagger::{Lexicon, LexiconTagger, PosTag, PosTagger};
use reviewlens::topics::vectorizer::CountVectorizer;

fn docs(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|t| t.to_string()).collect()
}

// ============================================================
// normalize — output alphabet
// ============================================================

#[test]
fn normalize_output_alphabet_and_spacing() {
    let inputs = [
        "정말!!! 좋은 앱😀입니다...",
        "  tabs\tand\nnewlines  ",
        "ㅋㅋㅋ 최고 👍👍 100%",
        "mixed한글English123 — dash",
        "",
        "!!!",
    ];
    for input in inputs {
        let out = normalize(input);
        assert!(out.chars().all(|c| is_permitted(c) || c == ' '), "{out:?}");
        assert!(!out.contains("  "), "{out:?}");
        assert_eq!(out, out.trim(), "{out:?}");
    }
}

#[test]
fn normalize_is_idempotent() {
    let once = normalize("좋아요!! 진짜   good app :)");
    assert_eq!(normalize(&once), once);
    assert_eq!(once, "좋아요 진짜 good app");
}

// ============================================================
// Adjective extraction
// ============================================================

#[test]
fn heuristic_extracts_from_raw_text() {
    let got = HeuristicExtractor.extract("정말 좋은 앱입니다!!").unwrap();
    assert_eq!(got, vec!["좋은", "앱입니다"]);
}

#[test]
fn heuristic_tokens_are_at_least_two_chars() {
    let got = HeuristicExtractor
        .extract("좋 크 다 작아요 넓은 방이네요")
        .unwrap();
    assert!(got.iter().all(|t| t.chars().count() >= 2));
    assert_eq!(got, vec!["작아요", "넓은", "방이네요"]);
}

#[test]
fn fallback_without_lexicon_matches_heuristic() {
    let tagger: Arc<dyn PosTagger> = Arc::new(LexiconTagger::new("/nonexistent/lexicon.tsv"));
    let fallback = FallbackExtractor::new(Some(tagger));
    let text = "빠르고 편한 앱이에요 정말 좋다";
    assert_eq!(
        fallback.extract(text).unwrap(),
        HeuristicExtractor.extract(text).unwrap()
    );
}

#[test]
fn fallback_uses_lexicon_when_present() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lexicon.tsv");
    std::fs::write(&path, "예쁜\tAdjective\n디자인\tNoun\n").unwrap();

    let tagger: Arc<dyn PosTagger> = Arc::new(LexiconTagger::new(&path));
    let fallback = FallbackExtractor::new(Some(tagger));
    // The heuristic would also keep 좋은; the lexicon does not know it
    assert_eq!(fallback.extract("예쁜 디자인 좋은").unwrap(), vec!["예쁜"]);
}

#[test]
fn lexicon_splits_particles() {
    let lexicon = Lexicon::parse("앱\tNoun\n").unwrap();
    assert_eq!(
        lexicon.tag("앱이"),
        vec![
            ("앱".to_string(), PosTag::Noun),
            ("이".to_string(), PosTag::Josa)
        ]
    );
}

// ============================================================
// Vectorizer
// ============================================================

#[test]
fn matrix_shape_matches_documents_and_vocabulary() {
    let documents = docs(&["좋은 좋은 앱입니다", "나쁜 경험이었다", "그냥 그래", "빠르고 편하다"]);
    let (vocab, dtm) = CountVectorizer::default()
        .fit_transform(&documents, &HeuristicExtractor)
        .unwrap();
    assert_eq!(dtm.n_docs(), documents.len());
    assert_eq!(dtm.n_terms(), vocab.len());

    let mut sorted = vocab.clone();
    sorted.sort();
    assert_eq!(vocab, sorted);
}

#[test]
fn vectorizer_lowercases_latin_tokens() {
    let documents = docs(&["GOOD앱이네요 좋다", "good앱이네요", "느리다"]);
    let (vocab, _) = CountVectorizer::default()
        .fit_transform(&documents, &HeuristicExtractor)
        .unwrap();
    assert!(vocab.contains(&"good앱이네요".to_string()));
    assert!(!vocab.iter().any(|t| t.chars().any(|c| c.is_ascii_uppercase())));
}

// ============================================================
// Topic count clamping and LDA invariants
// ============================================================

#[test]
fn effective_topic_count_rules() {
    assert_eq!(effective_topic_count(5, 500), 5);
    assert_eq!(effective_topic_count(5, 5), 5);
    assert_eq!(effective_topic_count(5, 4), 3);
    assert_eq!(effective_topic_count(5, 3), 2);
    assert_eq!(effective_topic_count(5, 2), 2);
    assert_eq!(effective_topic_count(5, 1), 2);
}

#[test]
fn effective_topic_count_bounds() {
    for requested in 0..10 {
        for vocab in 1..15 {
            let k = effective_topic_count(requested, vocab);
            assert!(k <= requested.max(vocab).max(2));
            assert!(k >= 2);
        }
    }
}

#[test]
fn lda_rows_are_distributions_and_top_words_descend() {
    let documents = docs(&[
        "좋은 좋은 예쁘다",
        "좋은 예쁘다 예쁘다",
        "느리다 느리다 불편한",
        "불편한 느리다 작은",
        "좋은 예쁘다 작은",
        "느리다 불편한 불편한",
    ]);
    let (vocab, dtm) = CountVectorizer::default()
        .fit_transform(&documents, &HeuristicExtractor)
        .unwrap();
    let k = effective_topic_count(2, vocab.len());
    let model = LatentDirichletAllocation::new(k).fit_transform(&dtm).unwrap();

    assert_eq!(model.n_topics(), 2);
    for row in model.doc_topic() {
        let sum: f64 = row.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(row.iter().all(|&p| p >= 0.0));
    }
    for topic in 0..model.n_topics() {
        let top = model.top_words(topic, 3);
        assert_eq!(top.len(), 3);
        assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
        assert!(top.iter().all(|&(_, weight)| weight >= 0.0));
    }
    for doc in 0..dtm.n_docs() {
        let (topic, confidence) = model.main_topic(doc);
        assert!(topic < model.n_topics());
        let max = model.doc_topic()[doc].iter().cloned().fold(f64::MIN, f64::max);
        assert_eq!(confidence, max);
    }
}
