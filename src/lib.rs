//! # airside-relay
//!
//! Event relay for airport operations dashboards: consumes flight and
//! baggage change-events from a durable log, decodes them, and fans them
//! out to live WebSocket connections grouped into rooms.
//!
//! # Architecture
//!
//! ```text
//!  durable log (external)                     live connections
//!  ┌──────────────────┐                      ┌───────────────┐
//!  │ flight-events    │   ┌──────────────┐   │ flight:UA123  │
//!  │ baggage-events   │──►│  IngestLoop  │   │ baggage:BG100 │
//!  └──────────────────┘   │   decode()   │   │ dash:ops      │
//!        LogConsumer      └──────┬───────┘   └───────▲───────┘
//!                                │                   │ push
//!                                ▼                   │
//!                       ┌─────────────────┐   ┌──────┴──────┐
//!                       │ FanoutDispatcher│──►│ WsTransport │
//!                       └────────┬────────┘   └──────▲──────┘
//!                                │ members_of        │ join / disconnect
//!                                ▼                   │
//!                         ┌──────────────┐   ┌───────┴──────────┐
//!                         │ RoomRegistry │◄──│ConnectionGateway │
//!                         └──────────────┘   └──────────────────┘
//! ```
//!
//! Delivery is at-least-once from the log and best-effort to the sockets:
//! a malformed record is skipped, a dead connection costs one failed push,
//! and only a fatal log client error ends the relay. Dashboards that miss
//! an event show stale state until the next one arrives; there is no
//! replay.
//!
//! # Example
//!
//! ```no_run
//! use airside_relay::{InMemoryLog, RelayConfig, RelayServer};
//!
//! #[tokio::main]
//! async fn main() -> airside_relay::Result<()> {
//!     let (log, consumer) = InMemoryLog::channel();
//!     let relay = RelayServer::new(RelayConfig::default(), consumer);
//!
//!     log.append(
//!         "flight-events",
//!         Some("UA123".into()),
//!         r#"{"type":"flight","subtype":"delayed","flightNo":"UA123"}"#,
//!     )?;
//!
//!     relay.run().await
//! }
//! ```

pub mod dispatch;
pub mod error;
pub mod event;
pub mod ingest;
pub mod registry;
pub mod server;
pub mod session;
pub mod stats;
pub mod transport;

pub use dispatch::{Dispatch, FanoutDispatcher};
pub use error::{RelayError, Result};
pub use event::{decode, DecodeError, DomainEvent, EntityKind, EventAction, EventDetail, OPS_ROOM};
pub use ingest::{InMemoryConsumer, InMemoryLog, IngestLoop, IngestPhase, LogConsumer, LogError, LogRecord};
pub use registry::RoomRegistry;
pub use server::{RelayConfig, RelayServer};
pub use session::{ConnectionGateway, ConnectionId};
pub use stats::{RelayStats, RelayStatsSnapshot};
pub use transport::{EventPush, WsTransport};
