//! Shared type definitions for the state core.
//!
//! This module contains:
//! - `SslMode` - SSL mode options for database connections
//! - `ConnectionInfo` - saved connection configuration
//! - `QueryHistoryEntry` / `HistoryEntryPatch` - query history records
//! - `SavedQuery` / `SavedQueryDraft` - saved query records
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// SSL mode options for database connections
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum SslMode {
    Disable,
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

impl Default for SslMode {
    fn default() -> Self {
        SslMode::Prefer
    }
}

impl SslMode {
    /// Parse an SSL mode from a database string
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "disable" => SslMode::Disable,
            "prefer" => SslMode::Prefer,
            "require" => SslMode::Require,
            "verify-ca" => SslMode::VerifyCa,
            "verify-full" => SslMode::VerifyFull,
            _ => SslMode::Prefer, // Default fallback
        }
    }

    /// Convert this SSL mode to a database string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            SslMode::Disable => "disable",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
            SslMode::VerifyCa => "verify-ca",
            SslMode::VerifyFull => "verify-full",
        }
    }
}

/// Saved connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub hostname: String,
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub password: String,
    pub database: String,
    pub port: usize,
    #[serde(default)]
    pub ssl_mode: SslMode,
    /// Free-form display accent, shown in the connection list
    #[serde(default)]
    pub color: Option<String>,
}

impl ConnectionInfo {
    /// Create a new connection info with the given parameters
    pub fn new(
        name: String,
        hostname: String,
        username: String,
        password: String,
        database: String,
        port: usize,
        ssl_mode: SslMode,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            hostname,
            username,
            password,
            database,
            port,
            ssl_mode,
            color: None,
        }
    }

    /// Build a copy of this config under a fresh id.
    ///
    /// The password is never carried over; the user re-enters it for the
    /// duplicated connection.
    pub fn duplicated(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: format!("{} (copy)", self.name),
            hostname: self.hostname.clone(),
            username: self.username.clone(),
            password: String::new(),
            database: self.database.clone(),
            port: self.port,
            ssl_mode: self.ssl_mode.clone(),
            color: self.color.clone(),
        }
    }
}

impl Default for ConnectionInfo {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            hostname: "localhost".to_string(),
            username: "test".to_string(),
            password: String::new(),
            database: "test".to_string(),
            port: 5432,
            ssl_mode: SslMode::default(),
            color: None,
        }
    }
}

/// Query history entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryHistoryEntry {
    pub id: Uuid,
    pub connection_id: Uuid,
    pub sql: String,
    pub execution_time_ms: i64,
    pub rows_affected: Option<i64>,
    pub success: bool,
    pub error_message: Option<String>,
    pub executed_at: DateTime<Utc>,
}

/// Partial update for a query history entry; `None` fields are left as-is.
#[derive(Debug, Clone, Default)]
pub struct HistoryEntryPatch {
    pub execution_time_ms: Option<i64>,
    pub rows_affected: Option<i64>,
    pub success: Option<bool>,
    pub error_message: Option<String>,
}

/// Saved query record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedQuery {
    pub id: Uuid,
    pub name: String,
    pub sql: String,
    /// Organizational folder; `None` means top level
    pub folder: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied by the user when creating a saved query; the backend
/// assigns the id and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedQueryDraft {
    pub name: String,
    pub sql: String,
    #[serde(default)]
    pub folder: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicated_config_gets_fresh_id_and_no_password() {
        let original = ConnectionInfo {
            name: "Prod".to_string(),
            password: "hunter2".to_string(),
            ..Default::default()
        };

        let copy = original.duplicated();
        assert_ne!(copy.id, original.id);
        assert_eq!(copy.name, "Prod (copy)");
        assert!(copy.password.is_empty());
        assert_eq!(copy.hostname, original.hostname);
        assert_eq!(copy.database, original.database);
    }

    #[test]
    fn ssl_mode_db_string_round_trip() {
        for mode in [
            SslMode::Disable,
            SslMode::Prefer,
            SslMode::Require,
            SslMode::VerifyCa,
            SslMode::VerifyFull,
        ] {
            assert_eq!(SslMode::from_db_str(mode.to_db_str()), mode);
        }
        assert_eq!(SslMode::from_db_str("bogus"), SslMode::Prefer);
    }
}
