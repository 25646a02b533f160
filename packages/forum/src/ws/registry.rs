//! Connection Registry
//!
//! Maps each user id to at most one live connection. Every operation holds
//! the lock only for the map mutation or the snapshot copy; callers do their
//! sends after the guard is gone.

use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::connection::ConnectionHandle;

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    entries: RwLock<BTreeMap<String, ConnectionHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `handle` for its user, evicting and closing any previous
    /// connection for the same user. Returns the evicted handle.
    pub async fn register(&self, handle: ConnectionHandle) -> Option<ConnectionHandle> {
        let user_id = handle.user_id().to_string();
        let previous = {
            let mut entries = self.entries.write().await;
            entries.insert(user_id.clone(), handle)
        };
        if let Some(ref old) = previous {
            debug!(user_id = %user_id, conn_id = %old.id(), "Evicting superseded connection");
            old.close();
        }
        previous
    }

    /// Remove the entry for `user_id` if present. Safe to call repeatedly.
    #[allow(dead_code)]
    pub async fn remove(&self, user_id: &str) -> Option<ConnectionHandle> {
        self.entries.write().await.remove(user_id)
    }

    /// Remove the entry only if it is still the connection `conn_id`.
    /// Returns false when the user has since been re-registered or removed.
    pub async fn remove_if_current(&self, user_id: &str, conn_id: Uuid) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get(user_id) {
            Some(current) if current.id() == conn_id => {
                entries.remove(user_id);
                true
            }
            _ => false,
        }
    }

    /// Remove the entry only if it authenticated with `session_token`.
    pub async fn remove_if_session(
        &self,
        user_id: &str,
        session_token: &str,
    ) -> Option<ConnectionHandle> {
        let mut entries = self.entries.write().await;
        match entries.get(user_id) {
            Some(current) if current.session_token() == session_token => entries.remove(user_id),
            _ => None,
        }
    }

    pub async fn lookup(&self, user_id: &str) -> Option<ConnectionHandle> {
        self.entries.read().await.get(user_id).cloned()
    }

    /// Point-in-time copy of all entries, ordered by user id.
    pub async fn snapshot(&self) -> Vec<(String, ConnectionHandle)> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(user_id, handle)| (user_id.clone(), handle.clone()))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn handle(user_id: &str) -> ConnectionHandle {
        ConnectionHandle::new(user_id, format!("tok-{}", user_id), 8).0
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = ConnectionRegistry::new();
        let h = handle("U1");
        assert!(registry.register(h.clone()).await.is_none());

        let found = registry.lookup("U1").await.unwrap();
        assert!(found.same_connection(&h));
        assert!(registry.lookup("U2").await.is_none());
    }

    #[tokio::test]
    async fn test_register_supersedes_previous() {
        let registry = ConnectionRegistry::new();
        let c1 = handle("U1");
        let c2 = handle("U1");

        registry.register(c1.clone()).await;
        let evicted = registry.register(c2.clone()).await.unwrap();

        assert!(evicted.same_connection(&c1));
        assert!(c1.is_closed());
        assert!(!c2.is_closed());
        assert!(registry.lookup("U1").await.unwrap().same_connection(&c2));

        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot[0].1.same_connection(&c2));
        assert!(!snapshot.iter().any(|(_, h)| h.same_connection(&c1)));
    }

    #[tokio::test]
    async fn test_remove_absent_is_noop() {
        let registry = ConnectionRegistry::new();
        registry.register(handle("U1")).await;

        assert!(registry.remove("ghost").await.is_none());
        assert!(registry.remove("ghost").await.is_none());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove_twice() {
        let registry = ConnectionRegistry::new();
        registry.register(handle("U1")).await;

        assert!(registry.remove("U1").await.is_some());
        assert!(registry.remove("U1").await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove_if_current_ignores_stale_connection() {
        let registry = ConnectionRegistry::new();
        let c1 = handle("U1");
        let c2 = handle("U1");
        registry.register(c1.clone()).await;
        registry.register(c2.clone()).await;

        // The superseded connection must not remove its successor
        assert!(!registry.remove_if_current("U1", c1.id()).await);
        assert!(registry.lookup("U1").await.unwrap().same_connection(&c2));

        assert!(registry.remove_if_current("U1", c2.id()).await);
        assert!(registry.lookup("U1").await.is_none());
        assert!(!registry.remove_if_current("U1", c2.id()).await);
    }

    #[tokio::test]
    async fn test_snapshot_ordered_by_user() {
        let registry = ConnectionRegistry::new();
        for user in ["U3", "U1", "U2"] {
            registry.register(handle(user)).await;
        }
        let users: Vec<String> = registry
            .snapshot()
            .await
            .into_iter()
            .map(|(u, _)| u)
            .collect();
        assert_eq!(users, vec!["U1", "U2", "U3"]);
    }

    #[tokio::test]
    async fn test_remove_if_session_matches_token() {
        let registry = ConnectionRegistry::new();
        let (phone, _rx) = ConnectionHandle::new("U1", "tok-phone", 8);
        registry.register(phone.clone()).await;

        assert!(registry.remove_if_session("U1", "tok-laptop").await.is_none());
        assert!(registry.lookup("U1").await.unwrap().same_connection(&phone));

        let removed = registry.remove_if_session("U1", "tok-phone").await.unwrap();
        assert!(removed.same_connection(&phone));
        assert!(registry.is_empty().await);
        assert!(registry.remove_if_session("U1", "tok-phone").await.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_is_detached() {
        let registry = ConnectionRegistry::new();
        registry.register(handle("U1")).await;
        let snapshot = registry.snapshot().await;

        registry.register(handle("U2")).await;
        registry.remove("U1").await;

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].0, "U1");
    }

    #[tokio::test]
    async fn test_concurrent_registers_leave_one_entry_per_user() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut tasks = Vec::new();
        for i in 0..32 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                let user = format!("U{}", i % 4);
                registry.register(handle(&user)).await;
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }

        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.len(), 4);
        // Exactly the registered handle per user is still open
        for (_, h) in snapshot {
            assert!(!h.is_closed());
        }
    }
}
