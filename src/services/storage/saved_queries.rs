//! Repository for the saved-query catalog.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::types::{SavedQuery, SavedQueryDraft};

#[derive(Debug, Clone)]
pub struct SavedQueriesRepository {
    pool: SqlitePool,
}

type SavedQueryRow = (String, String, String, Option<String>, String, String);

impl SavedQueriesRepository {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load the full catalog, ordered by name (case-insensitive).
    pub async fn load_all(&self) -> Result<Vec<SavedQuery>> {
        let rows = sqlx::query_as::<_, SavedQueryRow>(
            "SELECT id, name, sql, folder, created_at, updated_at
             FROM saved_queries
             ORDER BY name COLLATE NOCASE",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_query).collect()
    }

    /// Persist a new saved query, assigning the id and timestamps, and
    /// return the canonical record.
    pub async fn create(&self, draft: &SavedQueryDraft) -> Result<SavedQuery> {
        let now = Utc::now();
        let query = SavedQuery {
            id: Uuid::new_v4(),
            name: draft.name.clone(),
            sql: draft.sql.clone(),
            folder: draft.folder.clone(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO saved_queries (id, name, sql, folder, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(query.id.to_string())
        .bind(&query.name)
        .bind(&query.sql)
        .bind(&query.folder)
        .bind(query.created_at.to_rfc3339())
        .bind(query.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(query)
    }

    /// Overwrite an existing record. Returns `None` (and writes nothing)
    /// when the record no longer exists.
    pub async fn update(&self, query: &SavedQuery) -> Result<Option<SavedQuery>> {
        let updated_at = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE saved_queries
            SET name = ?2,
                sql = ?3,
                folder = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(query.id.to_string())
        .bind(&query.name)
        .bind(&query.sql)
        .bind(&query.folder)
        .bind(updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(Some(SavedQuery {
            updated_at,
            ..query.clone()
        }))
    }

    /// Delete a saved query. Returns whether a record was removed.
    pub async fn delete(&self, id: &Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM saved_queries WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    fn row_to_query(row: SavedQueryRow) -> Result<SavedQuery> {
        let (id, name, sql, folder, created_at, updated_at) = row;
        Ok(SavedQuery {
            id: Uuid::parse_str(&id).context("Invalid UUID")?,
            name,
            sql,
            folder,
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
