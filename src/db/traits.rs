// Database trait — backend-agnostic async interface for the review store.
//
// Methods are async so a synchronous backend (rusqlite behind a Mutex) and
// a natively async one fit behind the same interface. The trait mirrors the
// free functions in queries.rs.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{AppInfo, NewApp, StoredReview};
use crate::topics::Review;

#[async_trait]
pub trait Database: Send + Sync {
    // --- Lifecycle ---

    /// Count the user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Apps ---

    /// Create the app or update its metadata.
    async fn upsert_app(&self, app: &NewApp) -> Result<()>;

    /// All apps, most recent first.
    async fn list_apps(&self) -> Result<Vec<AppInfo>>;

    async fn get_app(&self, app_id: &str) -> Result<Option<AppInfo>>;

    /// Delete an app and its reviews; false when it did not exist.
    async fn delete_app(&self, app_id: &str) -> Result<bool>;

    // --- Reviews ---

    /// Store reviews for an app, optionally replacing the existing ones.
    async fn insert_reviews(&self, app_id: &str, reviews: &[Review], replace: bool)
        -> Result<usize>;

    async fn get_reviews(&self, app_id: &str, limit: Option<u32>) -> Result<Vec<StoredReview>>;

    async fn count_reviews(&self) -> Result<i64>;
}
