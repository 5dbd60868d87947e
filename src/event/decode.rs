//! Topic decoder
//!
//! Parses a raw log record into a [`DomainEvent`]. Pure: no state, no side
//! effects. A failure here is always recoverable; the ingestion loop logs
//! the error and moves on to the next record.

use serde_json::{Map, Value};

use super::types::{DomainEvent, EntityKind, EventAction, EventDetail};

/// Why a record could not be decoded
#[derive(Debug)]
pub enum DecodeError {
    /// Record arrived on a topic with no entity-kind association
    UnknownTopic(String),
    /// Record value is not valid JSON
    InvalidJson(serde_json::Error),
    /// Record value is JSON but not an object
    NotAnObject,
    /// Missing `type` discriminator
    MissingType,
    /// `type` discriminator disagrees with the topic's fixed association
    TypeMismatch {
        /// Kind implied by the topic
        expected: EntityKind,
        /// What the record declared
        declared: String,
    },
    /// Missing `subtype` action field
    MissingAction,
    /// `subtype` is not a known action
    UnknownAction(String),
    /// Missing the kind-specific routing key field
    MissingRoutingKey(&'static str),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::UnknownTopic(topic) => write!(f, "unknown topic: {}", topic),
            DecodeError::InvalidJson(e) => write!(f, "invalid JSON: {}", e),
            DecodeError::NotAnObject => write!(f, "record value is not a JSON object"),
            DecodeError::MissingType => write!(f, "missing type discriminator"),
            DecodeError::TypeMismatch { expected, declared } => {
                write!(f, "type '{}' does not match topic kind '{}'", declared, expected)
            }
            DecodeError::MissingAction => write!(f, "missing subtype field"),
            DecodeError::UnknownAction(s) => write!(f, "unknown subtype: {}", s),
            DecodeError::MissingRoutingKey(field) => {
                write!(f, "missing routing key field: {}", field)
            }
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::InvalidJson(e) => Some(e),
            _ => None,
        }
    }
}

/// Decode a raw log record into a typed domain event
///
/// The topic determines the entity kind; the record must carry a `type`
/// discriminator that agrees, a known `subtype`, and the kind-specific
/// routing key (`flightNo` / `tagId`). All other fields pass through into
/// the event's extra bucket.
pub fn decode(topic: &str, raw: &[u8]) -> Result<DomainEvent, DecodeError> {
    let kind = EntityKind::from_topic(topic).ok_or_else(|| DecodeError::UnknownTopic(topic.to_string()))?;

    let value: Value = serde_json::from_slice(raw).map_err(DecodeError::InvalidJson)?;
    let mut fields = match value {
        Value::Object(map) => map,
        _ => return Err(DecodeError::NotAnObject),
    };

    let declared = take_string(&mut fields, "type").ok_or(DecodeError::MissingType)?;
    if declared != kind.to_string() {
        return Err(DecodeError::TypeMismatch {
            expected: kind,
            declared,
        });
    }

    let subtype = take_string(&mut fields, "subtype").ok_or(DecodeError::MissingAction)?;
    let action = EventAction::parse(&subtype).ok_or(DecodeError::UnknownAction(subtype))?;

    let occurred_at = take_string(&mut fields, "timestamp");

    let detail = match kind {
        EntityKind::Flight => {
            let flight_no =
                take_string(&mut fields, "flightNo").ok_or(DecodeError::MissingRoutingKey("flightNo"))?;
            EventDetail::Flight {
                flight_id: take_string(&mut fields, "flightId"),
                flight_no,
                extra: fields,
            }
        }
        EntityKind::Baggage => {
            let tag_id =
                take_string(&mut fields, "tagId").ok_or(DecodeError::MissingRoutingKey("tagId"))?;
            EventDetail::Baggage {
                baggage_id: take_string(&mut fields, "baggageId"),
                tag_id,
                extra: fields,
            }
        }
    };

    Ok(DomainEvent {
        action,
        occurred_at,
        detail,
    })
}

/// Remove `key` from the map if it holds a string
///
/// Non-string values stay in place and end up in the extra bucket.
fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key) {
        Some(Value::String(_)) => match fields.remove(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        },
        _ => None,
    }
}
