// Database queries — CRUD operations for apps and reviews.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::models::{AppInfo, NewApp, StoredReview};
use crate::topics::Review;

const APP_COLUMNS: &str =
    "id, app_id, app_name, review_count, download_count, rating, overall_analysis, created_at";

const REVIEW_COLUMNS: &str =
    "id, app_id, rating, review_content, review_date, individual_analysis, created_at";

fn app_from_row(row: &Row<'_>) -> rusqlite::Result<AppInfo> {
    Ok(AppInfo {
        id: row.get(0)?,
        app_id: row.get(1)?,
        app_name: row.get(2)?,
        review_count: row.get(3)?,
        download_count: row.get::<_, i64>(4)?.max(0) as u64,
        rating: row.get(5)?,
        overall_analysis: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn review_from_row(row: &Row<'_>) -> rusqlite::Result<StoredReview> {
    Ok(StoredReview {
        id: row.get(0)?,
        app_id: row.get(1)?,
        rating: row.get(2)?,
        review_content: row.get(3)?,
        review_date: row.get(4)?,
        individual_analysis: row.get(5)?,
        created_at: row.get(6)?,
    })
}

// --- Apps ---

/// Create the app, or update its name and download count if it exists.
pub fn upsert_app(conn: &Connection, app: &NewApp) -> Result<()> {
    conn.execute(
        "INSERT INTO apps (app_id, app_name, download_count)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(app_id) DO UPDATE SET
            app_name = ?2,
            download_count = ?3",
        params![app.app_id, app.app_name, app.download_count as i64],
    )
    .with_context(|| format!("Failed to save app {}", app.app_id))?;
    Ok(())
}

/// All apps, most recently created first.
pub fn list_apps(conn: &Connection) -> Result<Vec<AppInfo>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APP_COLUMNS} FROM apps ORDER BY created_at DESC, id DESC"
    ))?;
    let apps = stmt
        .query_map([], app_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(apps)
}

pub fn get_app(conn: &Connection, app_id: &str) -> Result<Option<AppInfo>> {
    let mut stmt = conn.prepare(&format!("SELECT {APP_COLUMNS} FROM apps WHERE app_id = ?1"))?;
    let app = stmt.query_row(params![app_id], app_from_row).optional()?;
    Ok(app)
}

/// Delete an app and its reviews. Returns false if the app did not exist.
pub fn delete_app(conn: &Connection, app_id: &str) -> Result<bool> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM reviews WHERE app_id = ?1", params![app_id])?;
    let deleted = tx.execute("DELETE FROM apps WHERE app_id = ?1", params![app_id])?;
    tx.commit()?;
    Ok(deleted > 0)
}

/// Recompute the cached review count and mean rating of an app.
pub fn refresh_app_stats(conn: &Connection, app_id: &str) -> Result<()> {
    conn.execute(
        "UPDATE apps SET
            review_count = (SELECT COUNT(*) FROM reviews WHERE app_id = ?1),
            rating = (SELECT AVG(rating) FROM reviews WHERE app_id = ?1)
         WHERE app_id = ?1",
        params![app_id],
    )?;
    Ok(())
}

// --- Reviews ---

/// Store reviews for an existing app and refresh its statistics.
///
/// With `replace`, the app's previous reviews are removed first. Returns the
/// number of reviews inserted.
pub fn insert_reviews(
    conn: &Connection,
    app_id: &str,
    reviews: &[Review],
    replace: bool,
) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    if replace {
        tx.execute("DELETE FROM reviews WHERE app_id = ?1", params![app_id])?;
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO reviews (app_id, rating, review_content, review_date)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for review in reviews {
            stmt.execute(params![app_id, review.rating, review.content, review.date])?;
        }
    }
    refresh_app_stats(&tx, app_id)?;
    tx.commit()
        .with_context(|| format!("Failed to store reviews for {app_id}"))?;
    Ok(reviews.len())
}

/// Reviews of an app in insertion order, optionally limited.
pub fn get_reviews(conn: &Connection, app_id: &str, limit: Option<u32>) -> Result<Vec<StoredReview>> {
    // SQLite treats a negative LIMIT as no limit
    let limit = limit.map(i64::from).unwrap_or(-1);
    let mut stmt = conn.prepare(&format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews WHERE app_id = ?1 ORDER BY id LIMIT ?2"
    ))?;
    let reviews = stmt
        .query_map(params![app_id, limit], review_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(reviews)
}

/// Total number of stored reviews across all apps.
pub fn count_reviews(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM reviews", [], |row| row.get(0))?;
    Ok(count)
}
