mod links;
mod notebooks;
mod notes;
pub mod pool;
mod users;

pub use notes::NoteUpdate;

use sqlx::SqlitePool;
use tower_sessions_sqlx_store::SqliteStore;
use std::path::Path;

use crate::error::Result;

/// Data store handle (cheap to clone, shares one connection pool)
///
/// Every entity-to-entity traversal goes through an explicit query on this
/// type; records never hold references to each other.
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

/// Open or create the SQLite database at the given path
///
/// Applies pending migrations on every start.
pub async fn open_database(path: impl AsRef<Path>) -> Result<Db> {
    let path = path.as_ref();
    tracing::info!("Opening database at: {:?}", path);

    // Create parent directory if it doesn't exist
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                tracing::error!("Failed to create database directory: {}", e);
                e
            })?;
        }
    }

    let pool = pool::create_pool(path).await?;
    let db = Db::migrate(pool).await?;

    tracing::info!("Database initialized successfully");

    Ok(db)
}

impl Db {
    /// Fresh in-memory database with the schema applied
    pub async fn open_in_memory() -> Result<Db> {
        let pool = pool::create_memory_pool().await?;
        Db::migrate(pool).await
    }

    async fn migrate(pool: SqlitePool) -> Result<Db> {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&pool).await?;
        SqliteStore::new(pool.clone()).migrate().await?;
        tracing::info!("Migrations complete");

        Ok(Db { pool })
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Cheap round trip used by the health check
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
