//! Server metrics for observability
//!
//! Provides runtime counters for the live-connection hub.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Server-wide metrics
#[derive(Debug, Default)]
pub struct ServerMetrics {
    // Connection metrics
    /// Currently active WebSocket connections
    pub active_connections: AtomicU64,
    /// Total connections since server start
    pub total_connections: AtomicU64,
    /// Connections closed because a newer one for the same user took over
    pub superseded_connections: AtomicU64,
    /// Connections closed because their send queue filled up
    pub stalled_connections: AtomicU64,

    // Frame metrics
    /// Inbound frames received from clients
    pub frames_received: AtomicU64,
    /// Inbound frames dropped (malformed, unknown type, invalid payload)
    pub frames_dropped: AtomicU64,

    // Event metrics
    /// Outbound events queued to a connection
    pub events_sent: AtomicU64,
    /// Outbound events that could not be queued
    pub events_dropped: AtomicU64,

    // Persistence metrics
    /// Private messages written to the store
    pub messages_persisted: AtomicU64,
    /// Private messages lost to a store failure
    pub persist_failures: AtomicU64,

    /// Server start time (for uptime calculation)
    start_time: Option<Instant>,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    // Connection tracking
    pub fn connection_opened(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn connection_superseded(&self) {
        self.superseded_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_stalled(&self) {
        self.stalled_connections.fetch_add(1, Ordering::Relaxed);
    }

    // Frame tracking
    pub fn frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frame_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    // Event tracking
    pub fn event_sent(&self) {
        self.events_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn event_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    // Persistence tracking
    pub fn message_persisted(&self) {
        self.messages_persisted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn persist_failed(&self) {
        self.persist_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0)
    }

    /// Create a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.uptime_secs(),
            connections: ConnectionMetrics {
                active: self.active_connections.load(Ordering::Relaxed),
                total: self.total_connections.load(Ordering::Relaxed),
                superseded: self.superseded_connections.load(Ordering::Relaxed),
                stalled: self.stalled_connections.load(Ordering::Relaxed),
            },
            frames: FrameMetrics {
                received: self.frames_received.load(Ordering::Relaxed),
                dropped: self.frames_dropped.load(Ordering::Relaxed),
            },
            events: EventMetrics {
                sent: self.events_sent.load(Ordering::Relaxed),
                dropped: self.events_dropped.load(Ordering::Relaxed),
            },
            messages: MessageMetrics {
                persisted: self.messages_persisted.load(Ordering::Relaxed),
                persist_failures: self.persist_failures.load(Ordering::Relaxed),
            },
        }
    }
}

/// Serializable snapshot of metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub connections: ConnectionMetrics,
    pub frames: FrameMetrics,
    pub events: EventMetrics,
    pub messages: MessageMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionMetrics {
    pub active: u64,
    pub total: u64,
    pub superseded: u64,
    pub stalled: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameMetrics {
    pub received: u64,
    pub dropped: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetrics {
    pub sent: u64,
    pub dropped: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageMetrics {
    pub persisted: u64,
    pub persist_failures: u64,
}

/// Health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub connections: u64,
    pub registered_users: usize,
    pub uptime_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_tracking() {
        let metrics = ServerMetrics::new();

        metrics.connection_opened();
        metrics.connection_opened();
        assert_eq!(metrics.active_connections.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.total_connections.load(Ordering::Relaxed), 2);

        metrics.connection_closed();
        assert_eq!(metrics.active_connections.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.total_connections.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_frame_and_event_tracking() {
        let metrics = ServerMetrics::new();

        metrics.frame_received();
        metrics.frame_received();
        metrics.frame_dropped();
        metrics.event_sent();
        metrics.event_dropped();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.frames.received, 2);
        assert_eq!(snapshot.frames.dropped, 1);
        assert_eq!(snapshot.events.sent, 1);
        assert_eq!(snapshot.events.dropped, 1);
    }

    #[test]
    fn test_snapshot() {
        let metrics = ServerMetrics::new();
        metrics.connection_opened();
        metrics.connection_superseded();
        metrics.message_persisted();
        metrics.persist_failed();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.connections.active, 1);
        assert_eq!(snapshot.connections.superseded, 1);
        assert_eq!(snapshot.messages.persisted, 1);
        assert_eq!(snapshot.messages.persist_failures, 1);
    }
}
