//! Live transport boundary
//!
//! The relay talks to connected clients through [`EventPush`] only: a
//! try-once, report-nothing delivery primitive. [`WsTransport`] is the
//! WebSocket implementation; tests substitute their own recording doubles.

pub mod ws;

use std::future::Future;

use serde_json::Value;

use crate::session::ConnectionId;

pub use ws::WsTransport;

/// Push-only handle to the live transport layer
///
/// A push is fire-and-forget: delivery to a connection that is gone, slow,
/// or mid-teardown fails silently and must never affect other connections.
/// Implementations must not block; queueing per connection is the
/// transport's own concern.
pub trait EventPush: Send + Sync + 'static {
    /// Attempt delivery of a named event to a single connection
    fn push(
        &self,
        connection: ConnectionId,
        event_name: &str,
        payload: &Value,
    ) -> impl Future<Output = ()> + Send;
}
