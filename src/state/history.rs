//! Paginated, searchable cache over the persisted query history.

use anyhow::Result;
use uuid::Uuid;

use crate::services::backend::HistoryCommands;
use crate::services::storage::{HistoryEntryPatch, QueryHistoryEntry};

/// Fixed page length for history pagination.
pub const HISTORY_PAGE_SIZE: i64 = 100;

/// Local projection of the query history for one panel.
///
/// Entries are kept in the order the backend returned them for the current
/// filter (connection scope + search text). Freshly executed queries are
/// prepended locally ahead of the backend round-trip; the next `load`
/// replaces the projection with the authoritative list.
pub struct QueryHistoryStore<H: HistoryCommands> {
    backend: H,
    entries: Vec<QueryHistoryEntry>,
    search: String,
    has_more: bool,
    is_loading: bool,
}

impl<H: HistoryCommands> QueryHistoryStore<H> {
    pub fn new(backend: H) -> Self {
        Self {
            backend,
            entries: Vec::new(),
            search: String::new(),
            has_more: false,
            is_loading: false,
        }
    }

    pub fn entries(&self) -> &[QueryHistoryEntry] {
        &self.entries
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Advisory busy flag; callers check it before re-issuing paginated
    /// fetches.
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Update the search text. Takes effect on the next `load`.
    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search = text.into();
    }

    /// Reset and fetch the first page for the given connection scope and the
    /// current search text.
    pub async fn load(&mut self, connection_id: Option<Uuid>) -> Result<()> {
        self.is_loading = true;
        let result = self
            .backend
            .load_history(connection_id, self.search_filter(), HISTORY_PAGE_SIZE, 0)
            .await;
        self.is_loading = false;

        match result {
            Ok(entries) => {
                self.has_more = entries.len() as i64 >= HISTORY_PAGE_SIZE;
                self.entries = entries;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to load query history: {}", e);
                Err(e)
            }
        }
    }

    /// Fetch and append the next page. No-op when the last page was short or
    /// a load is already in flight.
    pub async fn load_more(&mut self, connection_id: Option<Uuid>) -> Result<()> {
        if !self.has_more || self.is_loading {
            return Ok(());
        }

        self.is_loading = true;
        let offset = self.entries.len() as i64;
        let result = self
            .backend
            .load_history(
                connection_id,
                self.search_filter(),
                HISTORY_PAGE_SIZE,
                offset,
            )
            .await;
        self.is_loading = false;

        match result {
            Ok(page) => {
                self.has_more = page.len() as i64 >= HISTORY_PAGE_SIZE;
                self.entries.extend(page);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to load more query history: {}", e);
                Err(e)
            }
        }
    }

    /// Delete an entry, best effort: a failed backend call is logged and the
    /// local list is left untouched.
    pub async fn delete_entry(&mut self, id: Uuid) {
        match self.backend.delete_history_entry(id).await {
            Ok(()) => self.entries.retain(|entry| entry.id != id),
            Err(e) => tracing::warn!("Failed to delete history entry {}: {}", id, e),
        }
    }

    /// Clear the whole history, best effort.
    pub async fn clear(&mut self) {
        match self.backend.clear_history().await {
            Ok(()) => {
                self.entries.clear();
                self.has_more = false;
            }
            Err(e) => tracing::warn!("Failed to clear query history: {}", e),
        }
    }

    /// Insert a freshly executed query at the front, ahead of the backend
    /// round-trip.
    pub fn prepend(&mut self, entry: QueryHistoryEntry) {
        self.entries.insert(0, entry);
    }

    /// Merge-patch an entry by id, e.g. to attach the row count once the
    /// execution settles. No-op if the id is not present.
    pub fn update_entry(&mut self, id: &Uuid, patch: HistoryEntryPatch) {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.id == *id) {
            if let Some(execution_time_ms) = patch.execution_time_ms {
                entry.execution_time_ms = execution_time_ms;
            }
            if let Some(rows_affected) = patch.rows_affected {
                entry.rows_affected = Some(rows_affected);
            }
            if let Some(success) = patch.success {
                entry.success = success;
            }
            if let Some(error_message) = patch.error_message {
                entry.error_message = Some(error_message);
            }
        }
    }

    fn search_filter(&self) -> Option<&str> {
        let trimmed = self.search.trim();
        if trimmed.is_empty() { None } else { Some(trimmed) }
    }
}
