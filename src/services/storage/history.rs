//! Repository for query history operations.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::types::QueryHistoryEntry;

#[derive(Debug, Clone)]
pub struct QueryHistoryRepository {
    pool: SqlitePool,
}

type HistoryRow = (
    String,
    String,
    String,
    i64,
    Option<i64>,
    bool,
    Option<String>,
    String,
);

impl QueryHistoryRepository {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a query execution.
    pub async fn record(&self, entry: &QueryHistoryEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO query_history
                (id, connection_id, sql, execution_time_ms, rows_affected, success, error_message, executed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.connection_id.to_string())
        .bind(&entry.sql)
        .bind(entry.execution_time_ms)
        .bind(entry.rows_affected)
        .bind(entry.success)
        .bind(&entry.error_message)
        .bind(entry.executed_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Load a page of history, most recent first, optionally scoped to one
    /// connection and filtered by a substring match on the query text.
    pub async fn load(
        &self,
        connection_id: Option<&Uuid>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<QueryHistoryEntry>> {
        let mut sql = String::from(
            "SELECT id, connection_id, sql, execution_time_ms, rows_affected, success, error_message, executed_at
             FROM query_history",
        );
        let mut clauses = Vec::new();
        if connection_id.is_some() {
            clauses.push("connection_id = ?");
        }
        if search.is_some() {
            clauses.push("sql LIKE ?");
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY executed_at DESC LIMIT ? OFFSET ?");

        let mut query = sqlx::query_as::<_, HistoryRow>(&sql);
        if let Some(id) = connection_id {
            query = query.bind(id.to_string());
        }
        if let Some(text) = search {
            query = query.bind(format!("%{}%", text));
        }
        let rows = query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_entry).collect()
    }

    fn row_to_entry(row: HistoryRow) -> Result<QueryHistoryEntry> {
        let (id, connection_id, sql, execution_time_ms, rows_affected, success, error_message, executed_at) =
            row;
        Ok(QueryHistoryEntry {
            id: Uuid::parse_str(&id).context("Invalid UUID")?,
            connection_id: Uuid::parse_str(&connection_id).context("Invalid connection UUID")?,
            sql,
            execution_time_ms,
            rows_affected,
            success,
            error_message,
            executed_at: DateTime::parse_from_rfc3339(&executed_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    /// Delete a single entry.
    pub async fn delete(&self, id: &Uuid) -> Result<()> {
        sqlx::query("DELETE FROM query_history WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Clear the whole history.
    pub async fn clear_all(&self) -> Result<()> {
        sqlx::query("DELETE FROM query_history")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Prune old entries, keeping only the last N per connection.
    pub async fn prune(&self, keep_per_connection: u32) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM query_history
            WHERE id NOT IN (
                SELECT id FROM (
                    SELECT id, ROW_NUMBER() OVER (
                        PARTITION BY connection_id
                        ORDER BY executed_at DESC
                    ) as rn
                    FROM query_history
                ) ranked
                WHERE rn <= ?
            )
            "#,
        )
        .bind(keep_per_connection)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::super::AppStore;
    use super::*;

    fn entry(connection_id: Uuid, sql: &str, age_secs: i64) -> QueryHistoryEntry {
        QueryHistoryEntry {
            id: Uuid::new_v4(),
            connection_id,
            sql: sql.to_string(),
            execution_time_ms: 5,
            rows_affected: Some(10),
            success: true,
            error_message: None,
            executed_at: Utc::now() - Duration::seconds(age_secs),
        }
    }

    #[async_std::test]
    async fn record_and_load_round_trip() {
        let store = AppStore::in_memory().await.unwrap();
        let repo = store.history();
        let connection_id = Uuid::new_v4();

        let recorded = entry(connection_id, "select * from users", 0);
        repo.record(&recorded).await.unwrap();

        let loaded = repo.load(None, None, 10, 0).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, recorded.id);
        assert_eq!(loaded[0].sql, "select * from users");
        assert_eq!(loaded[0].rows_affected, Some(10));
        assert!(loaded[0].success);
    }

    #[async_std::test]
    async fn load_is_newest_first_and_paginated() {
        let store = AppStore::in_memory().await.unwrap();
        let repo = store.history();
        let connection_id = Uuid::new_v4();

        for i in 0..5 {
            repo.record(&entry(connection_id, &format!("select {}", i), i))
                .await
                .unwrap();
        }

        let first = repo.load(None, None, 2, 0).await.unwrap();
        let rest = repo.load(None, None, 10, 2).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].sql, "select 0"); // age 0 = newest
        assert_eq!(rest.len(), 3);
        assert_eq!(rest[2].sql, "select 4");
    }

    #[async_std::test]
    async fn load_filters_by_connection_and_search() {
        let store = AppStore::in_memory().await.unwrap();
        let repo = store.history();
        let mine = Uuid::new_v4();
        let other = Uuid::new_v4();

        repo.record(&entry(mine, "select * from orders", 1))
            .await
            .unwrap();
        repo.record(&entry(mine, "delete from sessions", 2))
            .await
            .unwrap();
        repo.record(&entry(other, "select * from orders", 3))
            .await
            .unwrap();

        let scoped = repo.load(Some(&mine), None, 10, 0).await.unwrap();
        assert_eq!(scoped.len(), 2);

        let searched = repo
            .load(Some(&mine), Some("orders"), 10, 0)
            .await
            .unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].sql, "select * from orders");
        assert_eq!(searched[0].connection_id, mine);
    }

    #[async_std::test]
    async fn delete_and_clear() {
        let store = AppStore::in_memory().await.unwrap();
        let repo = store.history();
        let connection_id = Uuid::new_v4();

        let first = entry(connection_id, "select 1", 1);
        repo.record(&first).await.unwrap();
        repo.record(&entry(connection_id, "select 2", 2))
            .await
            .unwrap();

        repo.delete(&first.id).await.unwrap();
        assert_eq!(repo.load(None, None, 10, 0).await.unwrap().len(), 1);

        repo.clear_all().await.unwrap();
        assert!(repo.load(None, None, 10, 0).await.unwrap().is_empty());
    }

    #[async_std::test]
    async fn prune_keeps_the_newest_entries_per_connection() {
        let store = AppStore::in_memory().await.unwrap();
        let repo = store.history();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        for i in 0..4 {
            repo.record(&entry(a, &format!("a{}", i), i)).await.unwrap();
            repo.record(&entry(b, &format!("b{}", i), i)).await.unwrap();
        }

        let pruned = repo.prune(2).await.unwrap();
        assert_eq!(pruned, 4);

        let remaining_a = repo.load(Some(&a), None, 10, 0).await.unwrap();
        let sqls: Vec<&str> = remaining_a.iter().map(|e| e.sql.as_str()).collect();
        assert_eq!(sqls, vec!["a0", "a1"]);
    }
}
