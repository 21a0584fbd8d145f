//! Connection repository using SQLite and the system keyring.

use anyhow::{Context, Result};
use keyring::Entry;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::types::{ConnectionInfo, SslMode};

const KEYRING_SERVICE: &str = "dbdeck";

/// Repository for connection CRUD operations.
///
/// Passwords are stored in the system keyring; only connection metadata
/// (host, port, username, etc.) lives in SQLite.
#[derive(Debug, Clone)]
pub struct ConnectionsRepository {
    pool: SqlitePool,
}

type ConnectionRow = (
    String,
    String,
    String,
    String,
    String,
    i64,
    String,
    Option<String>,
);

impl ConnectionsRepository {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ========== Keyring Methods ==========

    fn keyring_entry(connection_id: &Uuid) -> Result<Entry> {
        Entry::new(KEYRING_SERVICE, &connection_id.to_string())
            .context("Failed to create keyring entry")
    }

    fn store_password(connection_id: &Uuid, password: &str) -> Result<()> {
        let entry = Self::keyring_entry(connection_id)?;
        entry
            .set_password(password)
            .context("Failed to store password in keyring")
    }

    fn delete_password(connection_id: &Uuid) -> Result<()> {
        let entry = Self::keyring_entry(connection_id)?;
        let _ = entry.delete_credential();
        Ok(())
    }

    /// Get the password for a connection from the keyring.
    ///
    /// Called on demand right before connecting so startup never triggers a
    /// cascade of keychain prompts.
    pub fn password(connection_id: &Uuid) -> Result<String> {
        let entry = Self::keyring_entry(connection_id)?;
        entry
            .get_password()
            .context("Failed to retrieve password from keyring")
    }

    // ========== CRUD Methods ==========

    /// Load all saved connections, ordered by name. Passwords are left empty
    /// and loaded on demand.
    pub async fn load_all(&self) -> Result<Vec<ConnectionInfo>> {
        let rows = sqlx::query_as::<_, ConnectionRow>(
            "SELECT id, name, hostname, username, database, port, ssl_mode, color
             FROM connections
             ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_info).collect()
    }

    /// Get a single connection by id.
    pub async fn get(&self, id: &Uuid) -> Result<Option<ConnectionInfo>> {
        let row = sqlx::query_as::<_, ConnectionRow>(
            "SELECT id, name, hostname, username, database, port, ssl_mode, color
             FROM connections
             WHERE id = ?1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_info).transpose()
    }

    fn row_to_info(row: ConnectionRow) -> Result<ConnectionInfo> {
        let (id_str, name, hostname, username, database, port, ssl_mode_str, color) = row;
        let id = Uuid::parse_str(&id_str).context("Invalid UUID in database")?;

        Ok(ConnectionInfo {
            id,
            name,
            hostname,
            username,
            password: String::new(), // Load on-demand to avoid keychain prompts
            database,
            port: port as usize,
            ssl_mode: SslMode::from_db_str(&ssl_mode_str),
            color,
        })
    }

    /// Create a new connection. Fails if the name is already taken.
    pub async fn create(&self, connection: &ConnectionInfo) -> Result<()> {
        if self.exists_by_name(&connection.name).await? {
            anyhow::bail!(
                "A connection with the name '{}' already exists",
                connection.name
            );
        }

        if !connection.password.is_empty() {
            Self::store_password(&connection.id, &connection.password)?;
        }

        sqlx::query(
            r#"
            INSERT INTO connections (id, name, hostname, username, database, port, ssl_mode, color, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, CURRENT_TIMESTAMP)
            "#,
        )
        .bind(connection.id.to_string())
        .bind(&connection.name)
        .bind(&connection.hostname)
        .bind(&connection.username)
        .bind(&connection.database)
        .bind(connection.port as i64)
        .bind(connection.ssl_mode.to_db_str())
        .bind(&connection.color)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Update an existing connection. Fails if the name collides with a
    /// different connection.
    pub async fn update(&self, connection: &ConnectionInfo) -> Result<()> {
        let existing = sqlx::query_scalar::<_, String>(
            "SELECT id FROM connections WHERE name = ?1 AND id != ?2",
        )
        .bind(&connection.name)
        .bind(connection.id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        if existing.is_some() {
            anyhow::bail!(
                "A connection with the name '{}' already exists",
                connection.name
            );
        }

        if !connection.password.is_empty() {
            Self::store_password(&connection.id, &connection.password)?;
        }

        sqlx::query(
            r#"
            UPDATE connections
            SET name = ?2,
                hostname = ?3,
                username = ?4,
                database = ?5,
                port = ?6,
                ssl_mode = ?7,
                color = ?8,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?1
            "#,
        )
        .bind(connection.id.to_string())
        .bind(&connection.name)
        .bind(&connection.hostname)
        .bind(&connection.username)
        .bind(&connection.database)
        .bind(connection.port as i64)
        .bind(connection.ssl_mode.to_db_str())
        .bind(&connection.color)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Create or update, depending on whether the id is already stored.
    pub async fn save(&self, connection: &ConnectionInfo) -> Result<()> {
        if self.get(&connection.id).await?.is_some() {
            self.update(connection).await
        } else {
            self.create(connection).await
        }
    }

    /// Delete a connection and its keyring password.
    pub async fn delete(&self, id: &Uuid) -> Result<()> {
        Self::delete_password(id)?;

        sqlx::query("DELETE FROM connections WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Check if a connection with the given name exists.
    pub async fn exists_by_name(&self, name: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM connections WHERE name = ?1")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::AppStore;
    use super::*;

    // Tests use empty passwords so they never touch the real keyring.
    fn sample(name: &str) -> ConnectionInfo {
        ConnectionInfo {
            name: name.to_string(),
            hostname: "localhost".to_string(),
            username: "tester".to_string(),
            database: "testdb".to_string(),
            port: 5432,
            ssl_mode: SslMode::Disable,
            ..Default::default()
        }
    }

    #[async_std::test]
    async fn save_and_load_connection() {
        let store = AppStore::in_memory().await.unwrap();
        let repo = store.connections();

        let connection = sample("save-load");
        let id = connection.id;
        repo.create(&connection).await.unwrap();

        let connections = repo.load_all().await.unwrap();
        assert!(connections.iter().any(|c| c.id == id));

        let loaded = repo.get(&id).await.unwrap().unwrap();
        assert_eq!(loaded.hostname, "localhost");
        assert_eq!(loaded.port, 5432);
        assert_eq!(loaded.ssl_mode, SslMode::Disable);
        assert!(loaded.password.is_empty());
    }

    #[async_std::test]
    async fn duplicate_names_are_rejected() {
        let store = AppStore::in_memory().await.unwrap();
        let repo = store.connections();

        repo.create(&sample("taken")).await.unwrap();
        assert!(repo.create(&sample("taken")).await.is_err());

        let mut other = sample("other");
        repo.create(&other).await.unwrap();
        other.name = "taken".to_string();
        assert!(repo.update(&other).await.is_err());
    }

    #[async_std::test]
    async fn update_changes_stored_fields() {
        let store = AppStore::in_memory().await.unwrap();
        let repo = store.connections();

        let mut connection = sample("update-me");
        let id = connection.id;
        repo.create(&connection).await.unwrap();

        connection.hostname = "db.internal".to_string();
        connection.port = 5433;
        connection.color = Some("#ff8800".to_string());
        repo.update(&connection).await.unwrap();

        let loaded = repo.get(&id).await.unwrap().unwrap();
        assert_eq!(loaded.hostname, "db.internal");
        assert_eq!(loaded.port, 5433);
        assert_eq!(loaded.color.as_deref(), Some("#ff8800"));
    }

    #[async_std::test]
    async fn save_upserts_by_id() {
        let store = AppStore::in_memory().await.unwrap();
        let repo = store.connections();

        let mut connection = sample("upsert");
        let id = connection.id;
        repo.save(&connection).await.unwrap();

        connection.database = "analytics".to_string();
        repo.save(&connection).await.unwrap();

        let all = repo.load_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].database, "analytics");
    }

    #[async_std::test]
    async fn delete_removes_the_row() {
        let store = AppStore::in_memory().await.unwrap();
        let repo = store.connections();

        let connection = sample("delete-me");
        let id = connection.id;
        repo.create(&connection).await.unwrap();
        assert!(repo.get(&id).await.unwrap().is_some());

        repo.delete(&id).await.unwrap();
        assert!(repo.get(&id).await.unwrap().is_none());
    }

    #[test]
    fn password_lookup_for_an_unknown_connection_fails() {
        assert!(ConnectionsRepository::password(&Uuid::new_v4()).is_err());
    }

    #[async_std::test]
    async fn load_all_orders_by_name() {
        let store = AppStore::in_memory().await.unwrap();
        let repo = store.connections();

        repo.create(&sample("zeta")).await.unwrap();
        repo.create(&sample("alpha")).await.unwrap();

        let names: Vec<String> = repo
            .load_all()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
