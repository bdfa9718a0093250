// Input and output records of the topic-modeling pipeline.

use serde::{Deserialize, Serialize};

/// One user review as fed to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub rating: f64,
    #[serde(rename = "review_content")]
    pub content: String,
    #[serde(rename = "review_date", default)]
    pub date: String,
}

impl Review {
    pub fn new(rating: f64, content: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            rating,
            content: content.into(),
            date: date.into(),
        }
    }
}

/// A latent topic: its top words with their weights, highest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    /// 1-based topic number
    #[serde(rename = "topic_id")]
    pub id: usize,
    pub words: Vec<String>,
    pub weights: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentTopicAssignment {
    /// Position among the non-empty reviews
    pub review_index: usize,
    /// 1-based topic number
    pub main_topic: usize,
    pub confidence: f64,
    #[serde(rename = "review_preview")]
    pub preview: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    pub review_index: usize,
    pub x: f64,
    pub y: f64,
}

/// Everything a topic-modeling run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicModelingResult {
    /// Topics actually fit, which may be fewer than requested
    pub n_topics: usize,
    pub topics: Vec<Topic>,
    pub doc_topics: Vec<DocumentTopicAssignment>,
    /// Empty when the projection was skipped
    #[serde(default)]
    pub projection: Vec<ProjectionPoint>,
    /// PNG data URI, absent when the chart could not be drawn
    pub chart: Option<String>,
    pub total_reviews: usize,
}

impl TopicModelingResult {
    /// Number of documents assigned to each topic, indexed by topic id - 1.
    pub fn topic_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_topics];
        for assignment in &self.doc_topics {
            if let Some(size) = assignment.main_topic.checked_sub(1).and_then(|i| sizes.get_mut(i)) {
                *size += 1;
            }
        }
        sizes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_wire_names() {
        let review: Review = serde_json::from_str(
            r#"{"rating": 4.0, "review_content": "좋은 앱", "review_date": "2024-05-01"}"#,
        )
        .unwrap();
        assert_eq!(review, Review::new(4.0, "좋은 앱", "2024-05-01"));

        let json = serde_json::to_value(&review).unwrap();
        assert_eq!(json["review_content"], "좋은 앱");
        assert_eq!(json["review_date"], "2024-05-01");
    }

    #[test]
    fn test_result_json_shape() {
        let result = TopicModelingResult {
            n_topics: 2,
            topics: vec![Topic {
                id: 1,
                words: vec!["좋은".to_string()],
                weights: vec![1.5],
            }],
            doc_topics: vec![DocumentTopicAssignment {
                review_index: 0,
                main_topic: 2,
                confidence: 0.8,
                preview: "좋은 앱".to_string(),
            }],
            projection: Vec::new(),
            chart: None,
            total_reviews: 1,
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["topics"][0]["topic_id"], 1);
        assert_eq!(json["doc_topics"][0]["review_preview"], "좋은 앱");
        assert!(json["chart"].is_null());
        assert_eq!(result.topic_sizes(), vec![0, 1]);
    }
}
