// SqliteDatabase — rusqlite backend implementing the Database trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Sync.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// The lock is never held across .await points.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{AppInfo, NewApp, StoredReview};
use super::traits::Database;
use crate::topics::Review;

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn upsert_app(&self, app: &NewApp) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::upsert_app(&conn, app)
    }

    async fn list_apps(&self) -> Result<Vec<AppInfo>> {
        let conn = self.conn.lock().await;
        super::queries::list_apps(&conn)
    }

    async fn get_app(&self, app_id: &str) -> Result<Option<AppInfo>> {
        let conn = self.conn.lock().await;
        super::queries::get_app(&conn, app_id)
    }

    async fn delete_app(&self, app_id: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        super::queries::delete_app(&conn, app_id)
    }

    async fn insert_reviews(
        &self,
        app_id: &str,
        reviews: &[Review],
        replace: bool,
    ) -> Result<usize> {
        let conn = self.conn.lock().await;
        super::queries::insert_reviews(&conn, app_id, reviews, replace)
    }

    async fn get_reviews(&self, app_id: &str, limit: Option<u32>) -> Result<Vec<StoredReview>> {
        let conn = self.conn.lock().await;
        super::queries::get_reviews(&conn, app_id, limit)
    }

    async fn count_reviews(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::count_reviews(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;

    fn test_db() -> SqliteDatabase {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        SqliteDatabase::new(conn)
    }

    #[tokio::test]
    async fn test_trait_table_count() {
        let db = test_db();
        assert_eq!(db.table_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_trait_app_roundtrip() {
        let db = test_db();
        db.upsert_app(&NewApp {
            app_id: "com.example".to_string(),
            app_name: "Example".to_string(),
            download_count: 10,
        })
        .await
        .unwrap();

        let reviews = vec![Review::new(2.0, "느린 앱", "2024-02-01")];
        assert_eq!(db.insert_reviews("com.example", &reviews, false).await.unwrap(), 1);

        let app = db.get_app("com.example").await.unwrap().unwrap();
        assert_eq!(app.review_count, 1);
        assert_eq!(app.rating, Some(2.0));
        assert_eq!(db.get_reviews("com.example", None).await.unwrap().len(), 1);

        assert!(db.delete_app("com.example").await.unwrap());
        assert!(db.list_apps().await.unwrap().is_empty());
        assert_eq!(db.count_reviews().await.unwrap(), 0);
    }
}
