// Database layer — SQLite storage for apps and their reviews.
//
// rusqlite with the "bundled" feature, so there's no system SQLite
// dependency. The database file lives wherever REVIEWLENS_DB_PATH points
// (defaults to ./reviewlens.db).

pub mod models;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod queries;
#[cfg(feature = "sqlite")]
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use traits::Database;

#[cfg(feature = "sqlite")]
mod open {
    use std::path::Path;
    use std::sync::Arc;

    use anyhow::{Context, Result};
    use rusqlite::Connection;

    use super::sqlite::SqliteDatabase;
    use super::{schema, Database};

    /// Open (or create) the database file and run migrations.
    ///
    /// Called by `reviewlens init` and `reviewlens import`.
    pub fn initialize_sqlite(db_path: &str) -> Result<Arc<dyn Database>> {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create directory for database: {db_path}")
                })?;
            }
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database at {db_path}"))?;
        // WAL for concurrent reads while the server is running
        conn.pragma_update(None, "journal_mode", "WAL")?;
        schema::create_tables(&conn)?;

        Ok(Arc::new(SqliteDatabase::new(conn)))
    }

    /// Open an existing database (fails if it doesn't exist yet).
    ///
    /// Migrations still run, so a database created by an older build is
    /// upgraded in place.
    pub fn open_sqlite(db_path: &str) -> Result<Arc<dyn Database>> {
        if !Path::new(db_path).exists() {
            anyhow::bail!("Database not found at {db_path}. Run `reviewlens init` first.");
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database at {db_path}"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        schema::create_tables(&conn)?;

        Ok(Arc::new(SqliteDatabase::new(conn)))
    }

    /// In-memory database with the schema applied, for tests and dry runs.
    pub fn in_memory() -> Result<Arc<dyn Database>> {
        let conn = Connection::open_in_memory()?;
        schema::create_tables(&conn)?;
        Ok(Arc::new(SqliteDatabase::new(conn)))
    }
}

#[cfg(feature = "sqlite")]
pub use open::{in_memory, initialize_sqlite, open_sqlite};
