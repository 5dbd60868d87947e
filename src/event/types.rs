//! Domain event types
//!
//! The typed form of a change-event pulled off the durable log. Events are
//! constructed once by the decoder, dispatched, and discarded; nothing here
//! is persisted.

use serde::Serialize;
use serde_json::{Map, Value};

/// The global room that receives every event regardless of routing key
pub const OPS_ROOM: &str = "dash:ops";

/// Entity kind an event belongs to
///
/// Each kind has a fixed two-way association with one log topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Flight change-events (`flight-events` topic)
    Flight,
    /// Baggage change-events (`baggage-events` topic)
    Baggage,
}

impl EntityKind {
    /// Map a log topic to its entity kind
    pub fn from_topic(topic: &str) -> Option<Self> {
        match topic {
            "flight-events" => Some(EntityKind::Flight),
            "baggage-events" => Some(EntityKind::Baggage),
            _ => None,
        }
    }

    /// The log topic carrying this kind's events
    pub fn topic(&self) -> &'static str {
        match self {
            EntityKind::Flight => "flight-events",
            EntityKind::Baggage => "baggage-events",
        }
    }

    /// The event name used when pushing to live connections
    pub fn event_name(&self) -> &'static str {
        match self {
            EntityKind::Flight => "flight-update",
            EntityKind::Baggage => "baggage-update",
        }
    }

    /// All known kinds, in topic subscription order
    pub fn all() -> [EntityKind; 2] {
        [EntityKind::Flight, EntityKind::Baggage]
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Flight => write!(f, "flight"),
            EntityKind::Baggage => write!(f, "baggage"),
        }
    }
}

/// What happened to the entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventAction {
    Created,
    Updated,
    Deleted,
    Delayed,
}

impl EventAction {
    /// Parse the wire `subtype` field
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(EventAction::Created),
            "updated" => Some(EventAction::Updated),
            "deleted" => Some(EventAction::Deleted),
            "delayed" => Some(EventAction::Delayed),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::Created => write!(f, "created"),
            EventAction::Updated => write!(f, "updated"),
            EventAction::Deleted => write!(f, "deleted"),
            EventAction::Delayed => write!(f, "delayed"),
        }
    }
}

/// Entity-specific event fields
///
/// Tagged variant over the known entity kinds. Fields the relay does not
/// model are carried in `extra` and round-trip into the pushed payload
/// unmodified, so producers may add fields without breaking the relay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventDetail {
    Flight {
        /// Record-store identifier (may be absent on some producers)
        #[serde(rename = "flightId", skip_serializing_if = "Option::is_none")]
        flight_id: Option<String>,
        /// Flight number, the routing key for flight rooms
        #[serde(rename = "flightNo")]
        flight_no: String,
        /// Unmodeled producer fields
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    Baggage {
        /// Record-store identifier (may be absent on some producers)
        #[serde(rename = "baggageId", skip_serializing_if = "Option::is_none")]
        baggage_id: Option<String>,
        /// Bag tag, the routing key for baggage rooms
        #[serde(rename = "tagId")]
        tag_id: String,
        /// Unmodeled producer fields
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

/// A decoded change-event flowing through the relay
///
/// Serializes back to the producer's wire shape, so the pushed payload is
/// what the producer appended (plus any normalization the decoder applied).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainEvent {
    /// What happened
    #[serde(rename = "subtype")]
    pub action: EventAction,

    /// Producer timestamp, when present
    #[serde(rename = "timestamp", skip_serializing_if = "Option::is_none")]
    pub occurred_at: Option<String>,

    /// Entity-specific fields
    #[serde(flatten)]
    pub detail: EventDetail,
}

impl DomainEvent {
    /// The entity kind this event belongs to
    pub fn entity(&self) -> EntityKind {
        match self.detail {
            EventDetail::Flight { .. } => EntityKind::Flight,
            EventDetail::Baggage { .. } => EntityKind::Baggage,
        }
    }

    /// The secondary identifier used to build the entity room name
    pub fn routing_key(&self) -> &str {
        match &self.detail {
            EventDetail::Flight { flight_no, .. } => flight_no,
            EventDetail::Baggage { tag_id, .. } => tag_id,
        }
    }

    /// Record-store identifier, when the producer supplied one
    pub fn entity_id(&self) -> Option<&str> {
        match &self.detail {
            EventDetail::Flight { flight_id, .. } => flight_id.as_deref(),
            EventDetail::Baggage { baggage_id, .. } => baggage_id.as_deref(),
        }
    }

    /// The entity-scoped room this event targets (e.g. `flight:UA123`)
    ///
    /// Pure function of (entity kind, routing key); the room exists
    /// implicitly the moment any connection joins it.
    pub fn room(&self) -> String {
        format!("{}:{}", self.entity(), self.routing_key())
    }

    /// The event name used when pushing this event
    pub fn event_name(&self) -> &'static str {
        self.entity().event_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_kind_association_is_two_way() {
        for kind in EntityKind::all() {
            assert_eq!(EntityKind::from_topic(kind.topic()), Some(kind));
        }
        assert_eq!(EntityKind::from_topic("user-events"), None);
    }

    #[test]
    fn test_action_parse() {
        assert_eq!(EventAction::parse("created"), Some(EventAction::Created));
        assert_eq!(EventAction::parse("delayed"), Some(EventAction::Delayed));
        assert_eq!(EventAction::parse("rerouted"), None);
        assert_eq!(EventAction::parse("Created"), None);
    }

    #[test]
    fn test_room_name_is_pure_function_of_kind_and_key() {
        let event = DomainEvent {
            action: EventAction::Updated,
            occurred_at: None,
            detail: EventDetail::Flight {
                flight_id: Some("65a1".into()),
                flight_no: "UA123".into(),
                extra: Map::new(),
            },
        };

        assert_eq!(event.room(), "flight:UA123");
        assert_eq!(event.event_name(), "flight-update");
        assert_eq!(event.entity(), EntityKind::Flight);
    }

    #[test]
    fn test_serializes_to_wire_shape() {
        let mut extra = Map::new();
        extra.insert("status".into(), Value::String("loaded".into()));

        let event = DomainEvent {
            action: EventAction::Updated,
            occurred_at: Some("2024-03-01T10:00:00Z".into()),
            detail: EventDetail::Baggage {
                baggage_id: Some("65b2".into()),
                tag_id: "BG100".into(),
                extra,
            },
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "baggage");
        assert_eq!(value["subtype"], "updated");
        assert_eq!(value["tagId"], "BG100");
        assert_eq!(value["baggageId"], "65b2");
        assert_eq!(value["status"], "loaded");
        assert_eq!(value["timestamp"], "2024-03-01T10:00:00Z");
    }

    #[test]
    fn test_absent_timestamp_is_omitted() {
        let event = DomainEvent {
            action: EventAction::Created,
            occurred_at: None,
            detail: EventDetail::Flight {
                flight_id: None,
                flight_no: "UA1".into(),
                extra: Map::new(),
            },
        };

        let value = serde_json::to_value(&event).unwrap();
        assert!(value.get("timestamp").is_none());
        assert!(value.get("flightId").is_none());
    }
}
