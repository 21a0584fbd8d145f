//! Connection registry: the saved connections, their live status, display
//! order, and per-connection schema selection.

use std::collections::HashMap;

use uuid::Uuid;

use crate::services::storage::ConnectionInfo;

/// Live status of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// A saved connection config plus its runtime state.
#[derive(Debug, Clone)]
pub struct Connection {
    pub info: ConnectionInfo,
    pub status: ConnectionStatus,
    /// Set only while `status` is `Error`
    pub error: Option<String>,
    /// Set only while `status` is `Connected`
    pub latency_ms: Option<u64>,
}

impl Connection {
    fn new(info: ConnectionInfo) -> Self {
        Self {
            info,
            status: ConnectionStatus::Disconnected,
            error: None,
            latency_ms: None,
        }
    }
}

/// Owns the set of connections, keyed by id, with an explicit display order.
///
/// The keyed map and the order list always hold the same id set. All
/// operations are synchronous; the lifecycle service drives status changes
/// from backend results.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<Uuid, Connection>,
    order: Vec<Uuid>,
    active_id: Option<Uuid>,
    selected_schemas: HashMap<Uuid, Option<String>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the registry from an authoritative config list (startup).
    /// Every connection starts out disconnected; order follows the input.
    pub fn replace_all(&mut self, configs: Vec<ConnectionInfo>) {
        self.connections.clear();
        self.order.clear();
        for info in configs {
            let id = info.id;
            self.order.push(id);
            self.connections.insert(id, Connection::new(info));
        }
        if let Some(active) = self.active_id {
            if !self.connections.contains_key(&active) {
                self.active_id = None;
            }
        }
    }

    /// Insert a new connection at the end of the display order.
    /// Callers guarantee fresh ids.
    pub fn add(&mut self, info: ConnectionInfo) {
        let id = info.id;
        self.order.push(id);
        self.connections.insert(id, Connection::new(info));
    }

    /// Replace the config of an existing connection, preserving its runtime
    /// state. No-op if the id is unknown.
    pub fn update(&mut self, info: ConnectionInfo) {
        if let Some(connection) = self.connections.get_mut(&info.id) {
            connection.info = info;
        }
    }

    /// Remove a connection. Clears the active id if it matched. No-op if the
    /// id is unknown.
    pub fn remove(&mut self, id: &Uuid) {
        self.connections.remove(id);
        self.order.retain(|entry| entry != id);
        if self.active_id == Some(*id) {
            self.active_id = None;
        }
    }

    /// Overwrite the (status, error, latency) tuple as one unit. The error
    /// is kept only for `Error`, the latency only for `Connected`. No-op if
    /// the id is unknown.
    pub fn set_status(
        &mut self,
        id: &Uuid,
        status: ConnectionStatus,
        error: Option<String>,
        latency_ms: Option<u64>,
    ) {
        if let Some(connection) = self.connections.get_mut(id) {
            connection.status = status;
            connection.error = if status == ConnectionStatus::Error {
                error
            } else {
                None
            };
            connection.latency_ms = if status == ConnectionStatus::Connected {
                latency_ms
            } else {
                None
            };
        }
    }

    /// Set (or clear) the active connection. Ids not present in the registry
    /// are ignored so the active id always references a live entry.
    pub fn set_active(&mut self, id: Option<Uuid>) {
        match id {
            Some(id) if !self.connections.contains_key(&id) => {}
            other => self.active_id = other,
        }
    }

    /// Remember the chosen schema for a connection. Entries are kept even if
    /// the connection later goes away; they are only meaningful for live ids.
    pub fn set_selected_schema(&mut self, id: &Uuid, schema: Option<String>) {
        self.selected_schemas.insert(*id, schema);
    }

    /// Replace the display order wholesale. The caller supplies a permutation
    /// of the existing ids; no validation is performed.
    pub fn reorder(&mut self, ids: Vec<Uuid>) {
        self.order = ids;
    }

    pub fn get(&self, id: &Uuid) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub fn active_id(&self) -> Option<Uuid> {
        self.active_id
    }

    pub fn active(&self) -> Option<&Connection> {
        self.active_id.and_then(|id| self.connections.get(&id))
    }

    /// All connections currently in `Connected` status, in display order.
    pub fn connected(&self) -> Vec<&Connection> {
        self.ordered()
            .into_iter()
            .filter(|connection| connection.status == ConnectionStatus::Connected)
            .collect()
    }

    /// All connections, in no particular order.
    pub fn all(&self) -> Vec<&Connection> {
        self.connections.values().collect()
    }

    /// All connections, following the display order.
    pub fn ordered(&self) -> Vec<&Connection> {
        self.order
            .iter()
            .filter_map(|id| self.connections.get(id))
            .collect()
    }

    pub fn selected_schema(&self, id: &Uuid) -> Option<String> {
        self.selected_schemas.get(id).cloned().flatten()
    }

    /// Selected schema of the active connection, if any.
    pub fn active_schema(&self) -> Option<String> {
        self.active_id.and_then(|id| self.selected_schema(&id))
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn order_ids(&self) -> &[Uuid] {
        &self.order
    }
}
