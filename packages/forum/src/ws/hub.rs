//! The live-connection hub: the registry plus the collaborators every event
//! handler needs. Presence, relay, typing and post fan-out are implemented as
//! `impl Hub` blocks in their own modules.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::metrics::ServerMetrics;

use super::connection::{ConnectionHandle, SendError};
use super::protocol::ServerEvent;
use super::registry::ConnectionRegistry;
use super::store::HubStore;

pub struct Hub {
    registry: ConnectionRegistry,
    store: Arc<dyn HubStore>,
    metrics: Arc<ServerMetrics>,
    /// Per-user lock held across a connection's announce and cleanup steps
    presence_gates: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Hub {
    pub fn new(store: Arc<dyn HubStore>, metrics: Arc<ServerMetrics>) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            store,
            metrics,
            presence_gates: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn store(&self) -> &dyn HubStore {
        self.store.as_ref()
    }

    pub fn metrics(&self) -> &ServerMetrics {
        &self.metrics
    }

    /// Queue one event on one connection. A failed enqueue closes the
    /// connection; its own lifecycle then unregisters it.
    pub(crate) fn deliver(&self, conn: &ConnectionHandle, event: ServerEvent) -> bool {
        let kind = event.kind();
        match conn.send(event) {
            Ok(()) => {
                self.metrics.event_sent();
                true
            }
            Err(SendError::Full) => {
                warn!(
                    user_id = %conn.user_id(),
                    conn_id = %conn.id(),
                    event = kind,
                    "Send queue full, disconnecting stalled connection"
                );
                self.metrics.event_dropped();
                self.metrics.connection_stalled();
                conn.close();
                false
            }
            Err(SendError::Closed) => {
                debug!(
                    user_id = %conn.user_id(),
                    conn_id = %conn.id(),
                    event = kind,
                    "Dropping event for closed connection"
                );
                self.metrics.event_dropped();
                conn.close();
                false
            }
        }
    }

    /// Send `event` to every registered connection except `exclude_user`.
    /// Returns how many connections accepted it.
    pub(crate) async fn fan_out(&self, event: &ServerEvent, exclude_user: Option<&str>) -> usize {
        let snapshot = self.registry.snapshot().await;
        let mut delivered = 0;
        for (user_id, conn) in snapshot {
            if exclude_user == Some(user_id.as_str()) {
                continue;
            }
            if self.deliver(&conn, event.clone()) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Look up a user's connection and send to it. False if the user has no
    /// live connection or the enqueue failed.
    pub(crate) async fn send_to_user(&self, user_id: &str, event: ServerEvent) -> bool {
        match self.registry.lookup(user_id).await {
            Some(conn) => self.deliver(&conn, event),
            None => false,
        }
    }

    /// Display name for presence events, falling back to the user id when the
    /// lookup fails or the user row is gone.
    pub(crate) async fn display_name_or_id(&self, user_id: &str) -> String {
        match self.store.display_name(user_id).await {
            Ok(Some(name)) => name,
            Ok(None) => {
                warn!(user_id = %user_id, "No user row for connected user");
                user_id.to_string()
            }
            Err(e) => {
                warn!(user_id = %user_id, "Failed to look up display name: {:#}", e);
                user_id.to_string()
            }
        }
    }

    /// Serialize presence changes for one user. A connection holds this
    /// while it registers and announces itself, and again while it cleans up,
    /// so an old connection's offline steps never interleave with a
    /// reconnect's online steps.
    pub(crate) async fn presence_gate(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let gate = {
            let mut gates = self.presence_gates.lock().await;
            gates.entry(user_id.to_string()).or_default().clone()
        };
        gate.lock_owned().await
    }

    /// Unregister and close the user's live connection if it authenticated
    /// with `session_token`. Connections opened with other sessions stay up.
    pub async fn disconnect_session(&self, user_id: &str, session_token: &str) -> bool {
        match self.registry.remove_if_session(user_id, session_token).await {
            Some(conn) => {
                conn.close();
                true
            }
            None => false,
        }
    }
}
