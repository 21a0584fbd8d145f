//! Abstract backend command surface consumed by the state managers.
//!
//! The live-database half (`DatabaseCommands`) stays abstract here; the
//! driver that speaks to the actual server is injected by the application.
//! The persistence half is implemented by [`AppStore`](super::storage::AppStore).

use anyhow::Result;
use uuid::Uuid;

use crate::services::settings::AppSettings;
use crate::services::storage::{
    ConnectionInfo, QueryHistoryEntry, SavedQuery, SavedQueryDraft,
};
use crate::state::ConnectionStatus;

/// Result of a connect attempt as reported by the backend.
#[derive(Debug, Clone)]
pub struct ConnectOutcome {
    pub status: ConnectionStatus,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
}

impl ConnectOutcome {
    pub fn connected(latency_ms: u64) -> Self {
        Self {
            status: ConnectionStatus::Connected,
            latency_ms: Some(latency_ms),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ConnectionStatus::Error,
            latency_ms: None,
            error: Some(message.into()),
        }
    }
}

/// Commands against the live database server.
#[allow(async_fn_in_trait)]
pub trait DatabaseCommands {
    async fn connect(&self, config: &ConnectionInfo) -> Result<ConnectOutcome>;
    async fn disconnect(&self, connection_id: Uuid) -> Result<()>;
}

/// Commands against the persisted connection configs and app settings.
#[allow(async_fn_in_trait)]
pub trait ConfigCommands {
    async fn load_configs(&self) -> Result<Vec<ConnectionInfo>>;
    async fn save_config(&self, config: &ConnectionInfo) -> Result<()>;
    async fn delete_config(&self, connection_id: Uuid) -> Result<()>;
    async fn load_settings(&self) -> Result<AppSettings>;
}

/// Commands against the persisted query history.
#[allow(async_fn_in_trait)]
pub trait HistoryCommands {
    /// Load a page of history, newest first, optionally scoped to one
    /// connection and filtered by a search string over the query text.
    async fn load_history(
        &self,
        connection_id: Option<Uuid>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<QueryHistoryEntry>>;
    async fn delete_history_entry(&self, id: Uuid) -> Result<()>;
    async fn clear_history(&self) -> Result<()>;
}

/// Commands against the persisted saved-query catalog.
#[allow(async_fn_in_trait)]
pub trait SavedQueryCommands {
    async fn load_saved_queries(&self) -> Result<Vec<SavedQuery>>;
    async fn create_saved_query(&self, draft: &SavedQueryDraft) -> Result<SavedQuery>;
    /// Returns `None` when the target record no longer exists.
    async fn update_saved_query(&self, query: &SavedQuery) -> Result<Option<SavedQuery>>;
    /// Returns whether a record was actually deleted.
    async fn delete_saved_query(&self, id: Uuid) -> Result<bool>;
}
