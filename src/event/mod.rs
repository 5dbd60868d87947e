//! Domain events and topic decoding
//!
//! A change-event enters the relay as a raw log record, is decoded here into
//! a typed [`DomainEvent`], and is fanned out by the dispatcher. The topic
//! fixes the entity kind (`flight-events` → flight, `baggage-events` →
//! baggage); the routing key (`flightNo` / `tagId`) fixes the entity room.

pub mod decode;
pub mod types;

pub use decode::{decode, DecodeError};
pub use types::{DomainEvent, EntityKind, EventAction, EventDetail, OPS_ROOM};
