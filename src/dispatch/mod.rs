//! Fan-out dispatcher
//!
//! Takes one decoded event and pushes it to every connection subscribed to
//! the event's entity room or the global ops room. Delivery is best-effort:
//! a dead connection costs one failed push and nothing else.

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::event::{DomainEvent, OPS_ROOM};
use crate::registry::RoomRegistry;
use crate::session::ConnectionId;
use crate::stats::RelayStats;
use crate::transport::EventPush;

/// Dispatch seam between the ingestion loop and the fan-out
///
/// The loop only needs something to hand events to; unit tests substitute
/// a recording double here.
pub trait Dispatch: Send + Sync + 'static {
    /// Fan one event out to its target rooms
    fn dispatch(&self, event: DomainEvent) -> impl Future<Output = ()> + Send;
}

/// Dispatcher that fans events out through the room registry
///
/// Target rooms for an event are its entity room (`flight:<no>` /
/// `baggage:<tag>`) plus the global `dash:ops` room. The membership union
/// is deduplicated, so a connection joined to both rooms receives the event
/// once.
pub struct FanoutDispatcher<P> {
    registry: Arc<RoomRegistry>,
    transport: Arc<P>,
    stats: Arc<RelayStats>,
}

impl<P: EventPush> FanoutDispatcher<P> {
    /// Create a dispatcher over the shared registry and transport
    pub fn new(registry: Arc<RoomRegistry>, transport: Arc<P>, stats: Arc<RelayStats>) -> Self {
        Self {
            registry,
            transport,
            stats,
        }
    }

    async fn targets_for(&self, entity_room: &str) -> HashSet<ConnectionId> {
        let mut targets = self.registry.members_of(entity_room).await;
        targets.extend(self.registry.members_of(OPS_ROOM).await);
        targets
    }
}

impl<P: EventPush> Dispatch for FanoutDispatcher<P> {
    async fn dispatch(&self, event: DomainEvent) {
        self.stats.events_dispatched.fetch_add(1, Ordering::Relaxed);

        let room = event.room();
        let targets = self.targets_for(&room).await;
        if targets.is_empty() {
            tracing::trace!(room, "No live subscribers for event");
            return;
        }

        let payload = match serde_json::to_value(&event) {
            Ok(value) => value,
            Err(e) => {
                // Decoded events always reserialize; guard anyway.
                tracing::error!(room, error = %e, "Failed to serialize event for push");
                return;
            }
        };

        let event_name = event.event_name();
        for connection in &targets {
            self.transport.push(*connection, event_name, &payload).await;
        }

        tracing::debug!(
            room,
            event_name,
            targets = targets.len(),
            "Event fanned out"
        );
    }
}
