//! Live-connection registry and realtime event types
//!
//! Delivery over the live channel is at-most-once and best-effort: a
//! recipient without a registered handle is a normal branch, not an error.
//! Durable notification records (see the notification service) are the
//! source of truth for offline recipients.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use shared::EventKind;

/// An event pushed to a connected client.
#[derive(Debug, Clone, Serialize)]
pub struct LiveEvent {
    pub event: EventKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// The other party in the exchange (provider for customer events and
    /// vice versa).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_id: Option<Uuid>,
}

impl LiveEvent {
    pub fn new(event: EventKind, message: impl Into<String>) -> Self {
        Self {
            event,
            message: message.into(),
            request_id: None,
            status: None,
            service: None,
            peer_id: None,
        }
    }

    pub fn with_request(mut self, request_id: Uuid) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_peer(mut self, peer_id: Uuid) -> Self {
        self.peer_id = Some(peer_id);
        self
    }
}

/// Process-wide mapping from user identity to a live delivery handle.
///
/// Handed to services through `AppState` rather than accessed as a global.
/// Registering a second connection for the same user replaces the first.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, mpsc::UnboundedSender<LiveEvent>>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live connection for `user_id`, returning the receiving
    /// end to drive the client stream.
    pub fn register(&self, user_id: Uuid) -> mpsc::UnboundedReceiver<LiveEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .write()
            .expect("connection registry lock poisoned")
            .insert(user_id, tx);
        rx
    }

    /// Drop the live connection for `user_id`, if any.
    pub fn deregister(&self, user_id: Uuid) {
        self.inner
            .write()
            .expect("connection registry lock poisoned")
            .remove(&user_id);
    }

    pub fn is_connected(&self, user_id: Uuid) -> bool {
        self.inner
            .read()
            .expect("connection registry lock poisoned")
            .contains_key(&user_id)
    }

    /// Push an event to a user's live connection. Returns false when the
    /// user has no handle or the connection has gone away; callers treat
    /// that as the normal offline branch.
    pub fn send(&self, user_id: Uuid, event: LiveEvent) -> bool {
        let guard = self
            .inner
            .read()
            .expect("connection registry lock poisoned");
        match guard.get(&user_id) {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }
}

/// Deregisters the connection when the client stream is dropped.
pub struct ConnectionGuard {
    registry: ConnectionRegistry,
    user_id: Uuid,
}

impl ConnectionGuard {
    pub fn new(registry: ConnectionRegistry, user_id: Uuid) -> Self {
        Self { registry, user_id }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.registry.deregister(self.user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> LiveEvent {
        LiveEvent::new(EventKind::ServiceAlert, "a customer is looking for you")
    }

    #[test]
    fn send_without_handle_is_a_normal_miss() {
        let registry = ConnectionRegistry::new();
        assert!(!registry.send(Uuid::new_v4(), event()));
    }

    #[test]
    fn registered_handle_receives_events() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let mut rx = registry.register(user);

        assert!(registry.is_connected(user));
        assert!(registry.send(user, event()));

        let received = rx.try_recv().unwrap();
        assert_eq!(received.event, EventKind::ServiceAlert);
    }

    #[test]
    fn guard_deregisters_on_drop() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let _rx = registry.register(user);

        {
            let _guard = ConnectionGuard::new(registry.clone(), user);
        }
        assert!(!registry.is_connected(user));
        assert!(!registry.send(user, event()));
    }

    #[test]
    fn dropped_receiver_reports_disconnected_send() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        drop(registry.register(user));
        assert!(!registry.send(user, event()));
    }
}
