//! Per-connection handle and lifecycle phases.
//!
//! A `ConnectionHandle` is the only way other tasks reach a live socket: it
//! wraps the bounded queue feeding that socket's single writer task and a
//! cancellation token that tears the connection down.

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use uuid::Uuid;

use super::protocol::ServerEvent;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The peer is not draining its queue.
    #[error("send queue full")]
    Full,
    /// The writer task has already stopped.
    #[error("connection closed")]
    Closed,
}

#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: Uuid,
    user_id: String,
    session_token: String,
    tx: mpsc::Sender<ServerEvent>,
    cancel: CancellationToken,
}

impl ConnectionHandle {
    /// Create a handle and the receiving end its writer task drains.
    pub fn new(
        user_id: impl Into<String>,
        session_token: impl Into<String>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            session_token: session_token.into(),
            tx,
            cancel: CancellationToken::new(),
        };
        (handle, rx)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn session_token(&self) -> &str {
        &self.session_token
    }

    /// Queue an event without waiting. Never blocks the caller on a slow peer.
    pub fn send(&self, event: ServerEvent) -> Result<(), SendError> {
        if self.cancel.is_cancelled() {
            return Err(SendError::Closed);
        }
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::Full,
            mpsc::error::TrySendError::Closed(_) => SendError::Closed,
        })
    }

    /// Ask the owning lifecycle to shut down. Idempotent.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    pub fn same_connection(&self, other: &ConnectionHandle) -> bool {
        self.id == other.id
    }
}

/// Phases a connection moves through, strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Connecting,
    Authenticated,
    Active,
    Closing,
    Closed,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("illegal lifecycle transition {from:?} -> {to:?}")]
pub struct LifecycleError {
    pub from: LifecyclePhase,
    pub to: LifecyclePhase,
}

impl LifecyclePhase {
    fn allows(self, next: LifecyclePhase) -> bool {
        use LifecyclePhase::*;
        matches!(
            (self, next),
            (Connecting, Authenticated)
                | (Connecting, Closed)
                | (Authenticated, Active)
                | (Authenticated, Closing)
                | (Active, Closing)
                | (Closing, Closed)
        )
    }

    pub fn transition(&mut self, next: LifecyclePhase) -> Result<(), LifecycleError> {
        if !self.allows(next) {
            return Err(LifecycleError {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }
}
