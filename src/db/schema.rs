// Database schema — table creation and migrations.
//
// A `schema_version` table tracks which migrations have run; each migration
// is a closure that executes SQL statements once.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet.
///
/// Idempotent, safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- One row per crawled or imported application
        CREATE TABLE IF NOT EXISTS apps (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            app_id TEXT NOT NULL UNIQUE,       -- store identifier, e.g. com.example.app
            app_name TEXT NOT NULL,
            review_count INTEGER NOT NULL DEFAULT 0,
            download_count INTEGER NOT NULL DEFAULT 0,
            rating REAL,                       -- mean star rating, null until reviews exist
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS reviews (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            app_id TEXT NOT NULL REFERENCES apps(app_id) ON DELETE CASCADE,
            rating REAL NOT NULL,
            review_content TEXT NOT NULL,
            review_date TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_reviews_app
            ON reviews(app_id);
        ",
    )
    .context("Failed to create database tables")?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    // Migration v2: free-form analysis text. overall_analysis summarises an
    // app, individual_analysis annotates one review. Written by external
    // tools only; reviewlens reads and displays them.
    run_migration(conn, 2, |c| {
        c.execute_batch(
            "ALTER TABLE apps ADD COLUMN overall_analysis TEXT;
             ALTER TABLE reviews ADD COLUMN individual_analysis TEXT;",
        )
    })?;

    Ok(())
}

/// Run a migration if it hasn't been applied yet.
fn run_migration<F>(conn: &Connection, version: i64, migrate: F) -> Result<()>
where
    F: FnOnce(&Connection) -> rusqlite::Result<()>,
{
    let already_applied: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM schema_version WHERE version = ?1",
        [version],
        |row| row.get(0),
    )?;

    if !already_applied {
        migrate(conn).with_context(|| format!("Migration v{version} failed"))?;
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [version],
        )?;
    }

    Ok(())
}

/// Count the user tables in the database (shown after `init`).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
    }

    #[test]
    fn test_table_count() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        // schema_version, apps, reviews
        assert_eq!(table_count(&conn).unwrap(), 3);
    }

    #[test]
    fn test_migration_v2_adds_analysis_columns() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        conn.execute(
            "INSERT INTO apps (app_id, app_name, overall_analysis) VALUES ('a', 'A', 'mostly positive')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO reviews (app_id, rating, review_content, review_date, individual_analysis)
             VALUES ('a', 5.0, '좋아요', '2024-01-01', 'praise')",
            [],
        )
        .unwrap();

        let analysis: String = conn
            .query_row("SELECT individual_analysis FROM reviews", [], |row| row.get(0))
            .unwrap();
        assert_eq!(analysis, "praise");
    }

    #[test]
    fn test_migrations_recorded_once() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();

        let versions: Vec<i64> = conn
            .prepare("SELECT version FROM schema_version ORDER BY version")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(versions, vec![1, 2]);
    }
}
