//! Connection lifecycle: sequences connect/disconnect/delete/duplicate
//! against the backend and writes the outcomes into the registry.

use std::sync::Arc;

use anyhow::Result;
use async_channel::{Receiver, Sender, unbounded};
use async_lock::RwLock;
use uuid::Uuid;

use crate::services::backend::{ConfigCommands, DatabaseCommands};
use crate::state::{ConnectionRegistry, ConnectionStatus};

/// Yes/no prompt shown before destructive operations. The UI supplies the
/// real dialog; headless callers can auto-confirm.
#[allow(async_fn_in_trait)]
pub trait ConfirmPrompt {
    async fn confirm(&self, message: &str) -> bool;
}

/// Drives connection state transitions.
///
/// Status writes are optimistic: `connect` flips the status to `Connecting`
/// before the backend call settles, and whatever the backend eventually
/// reports fully replaces it. There is no cancellation; a disconnect issued
/// while a connect is in flight can be overwritten by the connect's late
/// result (last write wins).
pub struct ConnectionLifecycle<B, P> {
    registry: Arc<RwLock<ConnectionRegistry>>,
    backend: B,
    prompt: P,
    refresh_tx: Sender<Uuid>,
    refresh_rx: Receiver<Uuid>,
}

impl<B, P> ConnectionLifecycle<B, P>
where
    B: DatabaseCommands + ConfigCommands,
    P: ConfirmPrompt,
{
    pub fn new(registry: Arc<RwLock<ConnectionRegistry>>, backend: B, prompt: P) -> Self {
        let (refresh_tx, refresh_rx) = unbounded();
        Self {
            registry,
            backend,
            prompt,
            refresh_tx,
            refresh_rx,
        }
    }

    pub fn registry(&self) -> Arc<RwLock<ConnectionRegistry>> {
        self.registry.clone()
    }

    /// Schema-refresh requests: one connection id per successful connect or
    /// explicit refresh. The schema tree listens on a clone of this receiver.
    pub fn schema_refresh_events(&self) -> Receiver<Uuid> {
        self.refresh_rx.clone()
    }

    /// Load the authoritative config list from the backend and rebuild the
    /// registry (startup path).
    pub async fn load_connections(&self) -> Result<()> {
        let configs = self.backend.load_configs().await?;
        self.registry.write().await.replace_all(configs);
        Ok(())
    }

    /// Connect, optimistically showing `Connecting` until the backend call
    /// settles. No-op for unknown ids and for already-connected connections.
    pub async fn connect(&self, id: Uuid) {
        let info = {
            let registry = self.registry.read().await;
            match registry.get(&id) {
                Some(connection) if connection.status == ConnectionStatus::Connected => return,
                Some(connection) => connection.info.clone(),
                None => return,
            }
        };

        self.registry
            .write()
            .await
            .set_status(&id, ConnectionStatus::Connecting, None, None);

        match self.backend.connect(&info).await {
            Ok(outcome) => match outcome.status {
                ConnectionStatus::Connected => {
                    tracing::info!("Connected to {}", info.name);
                    self.registry.write().await.set_status(
                        &id,
                        ConnectionStatus::Connected,
                        None,
                        outcome.latency_ms,
                    );
                    let _ = self.refresh_tx.send(id).await;
                }
                ConnectionStatus::Error => {
                    let message = outcome
                        .error
                        .unwrap_or_else(|| "connection failed".to_string());
                    tracing::error!("Failed to connect to {}: {}", info.name, message);
                    self.registry.write().await.set_status(
                        &id,
                        ConnectionStatus::Error,
                        Some(message),
                        None,
                    );
                }
                // The backend may report intermediate states; take them as-is.
                other => {
                    self.registry
                        .write()
                        .await
                        .set_status(&id, other, None, None);
                }
            },
            Err(e) => {
                tracing::error!("Failed to connect to {}: {}", info.name, e);
                self.registry.write().await.set_status(
                    &id,
                    ConnectionStatus::Error,
                    Some(e.to_string()),
                    None,
                );
            }
        }
    }

    /// Disconnect, best effort: a failed backend call is logged but the
    /// status is forced to `Disconnected` regardless, so the UI never gets
    /// stuck showing a live connection the user asked to drop.
    pub async fn disconnect(&self, id: Uuid) {
        if self.registry.read().await.get(&id).is_none() {
            return;
        }

        if let Err(e) = self.backend.disconnect(id).await {
            tracing::warn!("Failed to disconnect {}: {}", id, e);
        }

        self.registry
            .write()
            .await
            .set_status(&id, ConnectionStatus::Disconnected, None, None);
    }

    /// Request a schema refresh for a connected connection; no-op otherwise.
    pub async fn refresh(&self, id: Uuid) {
        let connected = self
            .registry
            .read()
            .await
            .get(&id)
            .map(|connection| connection.status == ConnectionStatus::Connected)
            .unwrap_or(false);

        if connected {
            let _ = self.refresh_tx.send(id).await;
        }
    }

    /// Delete a connection after user confirmation. Returns `Ok(false)` when
    /// the user declined. A failed backend delete leaves the registry entry
    /// intact; the user retries.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let (name, was_connected) = {
            let registry = self.registry.read().await;
            match registry.get(&id) {
                Some(connection) => (
                    connection.info.name.clone(),
                    connection.status == ConnectionStatus::Connected,
                ),
                None => return Ok(false),
            }
        };

        let message = format!("Delete connection \"{}\"?", name);
        if !self.prompt.confirm(&message).await {
            return Ok(false);
        }

        if was_connected {
            if let Err(e) = self.backend.disconnect(id).await {
                tracing::warn!("Failed to disconnect {} before delete: {}", name, e);
            }
        }

        match self.backend.delete_config(id).await {
            Ok(()) => {
                self.registry.write().await.remove(&id);
                tracing::info!("Deleted connection {}", name);
                Ok(true)
            }
            Err(e) => {
                tracing::error!("Failed to delete connection {}: {}", name, e);
                Err(e)
            }
        }
    }

    /// Duplicate a connection under a fresh id with the password cleared.
    /// The copy is registered only after the backend persisted it.
    pub async fn duplicate(&self, id: Uuid) -> Result<Uuid> {
        let copy = {
            let registry = self.registry.read().await;
            match registry.get(&id) {
                Some(connection) => connection.info.duplicated(),
                None => anyhow::bail!("unknown connection: {}", id),
            }
        };

        if let Err(e) = self.backend.save_config(&copy).await {
            tracing::error!("Failed to persist duplicate of {}: {}", copy.name, e);
            return Err(e);
        }

        let new_id = copy.id;
        self.registry.write().await.add(copy);
        Ok(new_id)
    }
}
