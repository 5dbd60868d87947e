//! Subscription registry implementation
//!
//! The central room-membership map shared by the connection gateway
//! (writes) and the fan-out dispatcher (reads).

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

use crate::session::ConnectionId;

/// Both directions of the membership relation
///
/// `joined` mirrors `rooms` so that tearing a connection down only touches
/// the rooms that connection actually joined.
#[derive(Debug, Default)]
struct Membership {
    /// Room name to member set
    rooms: HashMap<String, HashSet<ConnectionId>>,

    /// Connection to the rooms it has joined
    joined: HashMap<ConnectionId, HashSet<String>>,
}

/// Registry of live room memberships
///
/// Thread-safe via a single `RwLock` over both maps, so a reader never
/// observes a half-applied membership change. Purely in-memory; rebuilt
/// from empty on process restart.
///
/// All operations are idempotent: double joins, leaves of rooms never
/// joined, and removals of unknown connections are no-ops.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    membership: RwLock<Membership>,
}

impl RoomRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a room
    ///
    /// The room's member set is created lazily on first join.
    pub async fn join(&self, connection: ConnectionId, room: &str) {
        let mut membership = self.membership.write().await;

        let added = membership
            .rooms
            .entry(room.to_string())
            .or_default()
            .insert(connection);
        membership
            .joined
            .entry(connection)
            .or_default()
            .insert(room.to_string());

        if added {
            tracing::debug!(connection, room, "Joined room");
        }
    }

    /// Remove a connection from a single room
    pub async fn leave(&self, connection: ConnectionId, room: &str) {
        let mut membership = self.membership.write().await;

        if let Some(members) = membership.rooms.get_mut(room) {
            members.remove(&connection);
            if members.is_empty() {
                membership.rooms.remove(room);
            }
        }
        if let Some(joined) = membership.joined.get_mut(&connection) {
            joined.remove(room);
            if joined.is_empty() {
                membership.joined.remove(&connection);
            }
        }

        tracing::debug!(connection, room, "Left room");
    }

    /// Remove a connection from every room it belongs to
    ///
    /// Proportional to the rooms this connection joined, not to the total
    /// room count.
    pub async fn remove_connection(&self, connection: ConnectionId) {
        let mut membership = self.membership.write().await;

        let Some(joined) = membership.joined.remove(&connection) else {
            return;
        };

        for room in &joined {
            if let Some(members) = membership.rooms.get_mut(room) {
                members.remove(&connection);
                if members.is_empty() {
                    membership.rooms.remove(room);
                }
            }
        }

        tracing::debug!(connection, rooms = joined.len(), "Removed from all rooms");
    }

    /// Snapshot of a room's current members
    ///
    /// An unknown room yields an empty set, never an error. The snapshot is
    /// not atomic with later pushes: a member may disconnect after the
    /// snapshot is taken, and the push to it simply fails silently.
    pub async fn members_of(&self, room: &str) -> HashSet<ConnectionId> {
        let membership = self.membership.read().await;
        membership.rooms.get(room).cloned().unwrap_or_default()
    }

    /// Snapshot of the rooms a connection has joined
    pub async fn rooms_of(&self, connection: ConnectionId) -> HashSet<String> {
        let membership = self.membership.read().await;
        membership
            .joined
            .get(&connection)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of rooms with at least one member
    pub async fn room_count(&self) -> usize {
        self.membership.read().await.rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_join_is_idempotent() {
        let registry = RoomRegistry::new();

        registry.join(1, "dash:ops").await;
        registry.join(1, "dash:ops").await;

        let members = registry.members_of("dash:ops").await;
        assert_eq!(members.len(), 1);
        assert!(members.contains(&1));
    }

    #[tokio::test]
    async fn test_members_of_unknown_room_is_empty() {
        let registry = RoomRegistry::new();
        assert!(registry.members_of("flight:UA999").await.is_empty());
    }

    #[tokio::test]
    async fn test_leave_removes_membership() {
        let registry = RoomRegistry::new();

        registry.join(1, "flight:UA123").await;
        registry.join(2, "flight:UA123").await;
        registry.leave(1, "flight:UA123").await;

        let members = registry.members_of("flight:UA123").await;
        assert_eq!(members.len(), 1);
        assert!(members.contains(&2));
    }

    #[tokio::test]
    async fn test_leave_never_joined_room_is_a_noop() {
        let registry = RoomRegistry::new();
        registry.leave(7, "dash:ops").await;
        assert_eq!(registry.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_remove_connection_clears_every_room() {
        let registry = RoomRegistry::new();

        registry.join(1, "dash:ops").await;
        registry.join(1, "flight:UA123").await;
        registry.join(1, "baggage:BG100").await;
        registry.join(2, "dash:ops").await;

        registry.remove_connection(1).await;

        assert!(registry.members_of("flight:UA123").await.is_empty());
        assert!(registry.members_of("baggage:BG100").await.is_empty());
        assert_eq!(registry.members_of("dash:ops").await.len(), 1);
        assert!(registry.rooms_of(1).await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_unknown_connection_is_a_noop() {
        let registry = RoomRegistry::new();
        registry.join(1, "dash:ops").await;

        registry.remove_connection(99).await;

        assert_eq!(registry.members_of("dash:ops").await.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_rooms_are_dropped() {
        let registry = RoomRegistry::new();

        registry.join(1, "flight:UA123").await;
        assert_eq!(registry.room_count().await, 1);

        registry.remove_connection(1).await;
        assert_eq!(registry.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_joins_and_reads() {
        let registry = Arc::new(RoomRegistry::new());

        let mut tasks = Vec::new();
        for connection in 0..32u64 {
            let registry = Arc::clone(&registry);
            tasks.push(tokio::spawn(async move {
                registry.join(connection, "dash:ops").await;
                registry.members_of("dash:ops").await
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(registry.members_of("dash:ops").await.len(), 32);
    }
}
