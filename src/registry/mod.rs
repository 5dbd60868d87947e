//! Room registry for broadcast fan-out
//!
//! The registry maps room names to the live connections subscribed to them.
//! It is the single piece of mutable state shared between the two concurrent
//! halves of the relay.
//!
//! # Architecture
//!
//! ```text
//!                         Arc<RoomRegistry>
//!                    ┌─────────────────────────┐
//!                    │ rooms:  HashMap<Room,   │
//!                    │           Set<ConnId>>  │
//!                    │ joined: HashMap<ConnId, │
//!                    │           Set<Room>>    │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┴───────────────────┐
//!            │                                       │
//!            ▼                                       ▼
//!      [ConnectionGateway]                  [FanoutDispatcher]
//!      join / remove_connection             members_of snapshot
//!      (transport event path)               (ingestion path)
//! ```
//!
//! A connection appears in a room's member set exactly while it has joined
//! that room and not yet disconnected; removal on disconnect is
//! unconditional, so the registry never holds a stale handle. Membership
//! reads return snapshots: delivery to a member that disconnects after the
//! snapshot is taken fails silently, which is the intended best-effort
//! contract.

pub mod store;

pub use store::RoomRegistry;
