//! Saved-query catalog: named queries organized into folders.
//!
//! Folders are not first-class records; they are derived from the folder
//! values on the queries, unioned with a client-local set of empty folders
//! the user created but has not populated yet.

use anyhow::Result;
use uuid::Uuid;

use crate::services::backend::SavedQueryCommands;
use crate::services::storage::{SavedQuery, SavedQueryDraft};

pub struct SavedQueryCatalog<S: SavedQueryCommands> {
    backend: S,
    queries: Vec<SavedQuery>,
    /// Folder names with no queries yet; session-local, never persisted
    /// alongside the queries.
    empty_folders: Vec<String>,
    is_loading: bool,
    error: Option<String>,
}

impl<S: SavedQueryCommands> SavedQueryCatalog<S> {
    pub fn new(backend: S) -> Self {
        Self {
            backend,
            queries: Vec::new(),
            empty_folders: Vec::new(),
            is_loading: false,
            error: None,
        }
    }

    /// Queries, always sorted by name (case-insensitive).
    pub fn queries(&self) -> &[SavedQuery] {
        &self.queries
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn empty_folders(&self) -> &[String] {
        &self.empty_folders
    }

    /// Replace the local list with the persisted catalog.
    pub async fn load(&mut self) -> Result<()> {
        self.is_loading = true;
        self.error = None;
        let result = self.backend.load_saved_queries().await;
        self.is_loading = false;

        match result {
            Ok(queries) => {
                self.queries = queries;
                self.sort_queries();
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to load saved queries: {}", e);
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Persist a new query and insert the canonical record returned by the
    /// backend.
    pub async fn create(&mut self, draft: SavedQueryDraft) -> Result<Uuid> {
        let created = self.backend.create_saved_query(&draft).await?;
        let id = created.id;
        self.reconcile_empty_folder(created.folder.as_deref());
        self.queries.push(created);
        self.sort_queries();
        Ok(id)
    }

    /// Persist an edit. When the backend reports the record is gone (`None`),
    /// the local list is left unchanged.
    pub async fn update(&mut self, query: SavedQuery) -> Result<()> {
        match self.backend.update_saved_query(&query).await? {
            Some(updated) => {
                self.reconcile_empty_folder(updated.folder.as_deref());
                if let Some(slot) = self.queries.iter_mut().find(|q| q.id == updated.id) {
                    *slot = updated;
                } else {
                    self.queries.push(updated);
                }
                self.sort_queries();
            }
            None => {
                tracing::warn!("Saved query {} no longer exists; skipping update", query.id);
            }
        }
        Ok(())
    }

    /// Delete a query. Removes it locally only when the backend confirmed
    /// the deletion.
    pub async fn delete(&mut self, id: Uuid) -> Result<()> {
        match self.backend.delete_saved_query(id).await {
            Ok(true) => {
                self.queries.retain(|q| q.id != id);
                Ok(())
            }
            Ok(false) => {
                tracing::warn!("Saved query {} was not deleted", id);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to delete saved query {}: {}", id, e);
                Err(e)
            }
        }
    }

    /// Register an empty folder. Blank names and names already in use (by a
    /// query or another empty folder) are silently ignored.
    pub fn add_empty_folder(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() || self.folder_exists(name) {
            return;
        }
        self.empty_folders.push(name.to_string());
        self.empty_folders.sort();
    }

    pub fn remove_empty_folder(&mut self, name: &str) {
        self.empty_folders.retain(|folder| folder != name);
    }

    /// Rename an empty folder. Blank targets, no-change renames, and
    /// collisions with any existing folder are silently ignored.
    pub fn rename_empty_folder(&mut self, old: &str, new: &str) {
        let new = new.trim();
        if new.is_empty() || new == old || self.folder_exists(new) {
            return;
        }
        if let Some(folder) = self.empty_folders.iter_mut().find(|folder| *folder == old) {
            *folder = new.to_string();
            self.empty_folders.sort();
        }
    }

    /// Distinct folder names carried by the queries, sorted.
    pub fn folders(&self) -> Vec<String> {
        let mut folders: Vec<String> = self
            .queries
            .iter()
            .filter_map(|q| q.folder.clone())
            .collect();
        folders.sort();
        folders.dedup();
        folders
    }

    /// Query folders plus the empty folders, sorted and deduplicated.
    pub fn all_folders(&self) -> Vec<String> {
        let mut folders = self.folders();
        folders.extend(self.empty_folders.iter().cloned());
        folders.sort();
        folders.dedup();
        folders
    }

    fn folder_exists(&self, name: &str) -> bool {
        self.queries
            .iter()
            .any(|q| q.folder.as_deref() == Some(name))
            || self.empty_folders.iter().any(|folder| folder == name)
    }

    /// A folder cannot be empty and hold a query at the same time; once a
    /// query lands in it, the empty-folder placeholder goes away.
    fn reconcile_empty_folder(&mut self, folder: Option<&str>) {
        if let Some(folder) = folder {
            self.empty_folders.retain(|name| name != folder);
        }
    }

    fn sort_queries(&mut self) {
        self.queries
            .sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    }
}
