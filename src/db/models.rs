// Data models — Rust structs that map to database rows.
//
// Kept apart from the queries so the web and output layers can use them
// without depending on rusqlite.

use serde::{Deserialize, Serialize};

use crate::topics::Review;

/// An application and its aggregate review statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppInfo {
    pub id: i64,
    pub app_id: String,
    pub app_name: String,
    pub review_count: u32,
    pub download_count: u64,
    /// Mean review rating, absent until the app has reviews
    pub rating: Option<f64>,
    pub overall_analysis: Option<String>,
    pub created_at: String,
}

/// A review as stored, tied to its app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReview {
    pub id: i64,
    pub app_id: String,
    pub rating: f64,
    pub review_content: String,
    pub review_date: String,
    pub individual_analysis: Option<String>,
    pub created_at: String,
}

impl From<&StoredReview> for Review {
    fn from(stored: &StoredReview) -> Self {
        Review::new(stored.rating, stored.review_content.clone(), stored.review_date.clone())
    }
}

/// Metadata supplied when an app is first imported.
#[derive(Debug, Clone, PartialEq)]
pub struct NewApp {
    pub app_id: String,
    pub app_name: String,
    pub download_count: u64,
}
