//! Connection lifecycle
//!
//! The gateway sits between the live transport layer and the subscription
//! registry: it allocates connection ids, applies join requests, and tears
//! memberships down on disconnect. It never touches the durable log, and its
//! callbacks run on the transport's event path, so everything here must stay
//! quick.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::registry::RoomRegistry;

/// Unique identifier for a live connection
pub type ConnectionId = u64;

/// Lifecycle handler for live connections
///
/// Holds the registry by explicit injection; the same instance is shared
/// with the dispatcher so both sides observe one membership state.
pub struct ConnectionGateway {
    registry: Arc<RoomRegistry>,
    next_connection_id: AtomicU64,
}

impl ConnectionGateway {
    /// Create a gateway over the given registry
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self {
            registry,
            next_connection_id: AtomicU64::new(1),
        }
    }

    /// Get the underlying registry
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Register a new live connection and allocate its id
    pub fn on_connect(&self) -> ConnectionId {
        let connection = self.next_connection_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(connection, "Connection established");
        connection
    }

    /// Apply a join request
    ///
    /// Joins are not authorization-gated; any connected client may join any
    /// room string. This is the single point where a gate would slot in.
    pub async fn on_join(&self, connection: ConnectionId, room: &str) {
        self.registry.join(connection, room).await;
    }

    /// Tear down a connection's memberships
    ///
    /// Unconditional: called on every exit path, graceful or abrupt, and
    /// idempotent if the connection never joined anything.
    pub async fn on_disconnect(&self, connection: ConnectionId) {
        self.registry.remove_connection(connection).await;
        tracing::debug!(connection, "Connection removed");
    }
}
