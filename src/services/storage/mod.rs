//! Unified SQLite storage for the application.

mod connections;
mod history;
mod saved_queries;
mod types;

pub use connections::ConnectionsRepository;
pub use history::QueryHistoryRepository;
pub use saved_queries::SavedQueriesRepository;
pub use types::*;

use anyhow::Result;
use async_lock::OnceCell;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

use crate::services::backend::{ConfigCommands, HistoryCommands, SavedQueryCommands};
use crate::services::settings::{self, AppSettings};

/// Shared application storage backed by SQLite.
#[derive(Debug, Clone)]
pub struct AppStore {
    pool: SqlitePool,
}

/// Global singleton instance
static STORE: OnceCell<AppStore> = OnceCell::new();

impl AppStore {
    /// Get or initialize the global AppStore singleton.
    /// Schema initialization and migration only run once.
    pub async fn singleton() -> Result<&'static Self> {
        STORE.get_or_try_init(|| Self::init()).await
    }

    pub async fn init() -> Result<Self> {
        let db_path = Self::get_db_path()?;
        Self::from_path(db_path).await
    }

    /// Open a throwaway in-memory store, used by tests.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // A second pool connection would see a different memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn from_path(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.initialize_schema().await?;
        store.migrate_schema().await?;
        Ok(store)
    }

    fn get_db_path() -> Result<PathBuf> {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        Ok(home.join(".dbdeck").join("dbdeck.db"))
    }

    /// Get a connections repository
    pub fn connections(&self) -> ConnectionsRepository {
        ConnectionsRepository::new(self.pool.clone())
    }

    /// Get a query history repository
    pub fn history(&self) -> QueryHistoryRepository {
        QueryHistoryRepository::new(self.pool.clone())
    }

    /// Get a saved queries repository
    pub fn saved_queries(&self) -> SavedQueriesRepository {
        SavedQueriesRepository::new(self.pool.clone())
    }

    /// Initialize the database schema
    async fn initialize_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS connections (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                hostname TEXT NOT NULL,
                username TEXT NOT NULL,
                database TEXT NOT NULL,
                port INTEGER NOT NULL,
                ssl_mode TEXT NOT NULL DEFAULT 'prefer',
                color TEXT,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Create index on name for faster lookups
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_connections_name ON connections(name)")
            .execute(&self.pool)
            .await?;

        // Query history table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS query_history (
                id TEXT PRIMARY KEY,
                connection_id TEXT NOT NULL,
                sql TEXT NOT NULL,
                execution_time_ms INTEGER NOT NULL,
                rows_affected INTEGER,
                success INTEGER NOT NULL,
                error_message TEXT,
                executed_at TIMESTAMP NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Index for fast lookups by connection
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_history_connection ON query_history(connection_id, executed_at DESC)",
        )
        .execute(&self.pool)
        .await?;

        // Saved queries table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS saved_queries (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                sql TEXT NOT NULL,
                folder TEXT,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_saved_queries_folder ON saved_queries(folder)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Migrate schema for existing databases
    async fn migrate_schema(&self) -> Result<()> {
        // Databases created before the color column existed need it added.
        let has_color = sqlx::query("SELECT color FROM connections LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .is_ok();

        if !has_color {
            match sqlx::query("ALTER TABLE connections ADD COLUMN color TEXT")
                .execute(&self.pool)
                .await
            {
                Ok(_) => tracing::info!("Migration: added color column"),
                Err(e) => {
                    // If the column already exists, SQLite will error - that's okay
                    tracing::warn!("Migration: column may already exist: {}", e);
                }
            }
        }

        Ok(())
    }
}

impl ConfigCommands for AppStore {
    async fn load_configs(&self) -> Result<Vec<ConnectionInfo>> {
        self.connections().load_all().await
    }

    async fn save_config(&self, config: &ConnectionInfo) -> Result<()> {
        self.connections().save(config).await
    }

    async fn delete_config(&self, connection_id: Uuid) -> Result<()> {
        self.connections().delete(&connection_id).await
    }

    async fn load_settings(&self) -> Result<AppSettings> {
        Ok(settings::load_settings().await)
    }
}

impl HistoryCommands for AppStore {
    async fn load_history(
        &self,
        connection_id: Option<Uuid>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<QueryHistoryEntry>> {
        self.history()
            .load(connection_id.as_ref(), search, limit, offset)
            .await
    }

    async fn delete_history_entry(&self, id: Uuid) -> Result<()> {
        self.history().delete(&id).await
    }

    async fn clear_history(&self) -> Result<()> {
        self.history().clear_all().await
    }
}

impl SavedQueryCommands for AppStore {
    async fn load_saved_queries(&self) -> Result<Vec<SavedQuery>> {
        self.saved_queries().load_all().await
    }

    async fn create_saved_query(&self, draft: &SavedQueryDraft) -> Result<SavedQuery> {
        self.saved_queries().create(draft).await
    }

    async fn update_saved_query(&self, query: &SavedQuery) -> Result<Option<SavedQuery>> {
        self.saved_queries().update(query).await
    }

    async fn delete_saved_query(&self, id: Uuid) -> Result<bool> {
        self.saved_queries().delete(&id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[async_std::test]
    async fn in_memory_store_creates_the_schema() {
        let store = AppStore::in_memory().await.unwrap();
        assert!(store.connections().load_all().await.unwrap().is_empty());
        assert!(
            store
                .history()
                .load(None, None, 10, 0)
                .await
                .unwrap()
                .is_empty()
        );
        assert!(store.saved_queries().load_all().await.unwrap().is_empty());
    }

    #[async_std::test]
    async fn file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("dbdeck.db");

        let info = ConnectionInfo::default();
        let id = info.id;
        {
            let store = AppStore::from_path(db_path.clone()).await.unwrap();
            store.connections().create(&info).await.unwrap();
        }

        let store = AppStore::from_path(db_path).await.unwrap();
        assert!(store.connections().get(&id).await.unwrap().is_some());
    }
}
