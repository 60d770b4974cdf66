use serde::Serialize;
use serde_json::{Map, Value};

// ============================================================================
// Domain Events - Canonical names and flattened payloads
// ============================================================================
//
// Every event that leaves an aggregate is persisted as a flat mapping of its
// declared fields to primitive values (`EventData`). That mapping is the
// durable, replayable form projectors consume, so its shape must stay
// backward-compatible.
//
// ============================================================================

/// Flattened event snapshot: field name → primitive value, in declaration order
pub type EventData = Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum EventDataError {
    #[error("Event {event_type} did not serialize to a flat object")]
    NotAnObject { event_type: &'static str },

    #[error("Event {event_type} field {field} is not a primitive value")]
    NestedField {
        event_type: &'static str,
        field: String,
    },

    #[error("Failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Generic Domain Event trait
///
/// Events serialize to their bare field set (an untagged enum over
/// per-event structs works well); the variant identity travels separately
/// as `event_name`.
pub trait DomainEvent: Serialize + Clone + Send + Sync {
    /// Canonical event name, e.g. `"OrderPlaced"`
    fn event_name(&self) -> &'static str;

    /// Flatten into the outbox wire representation
    fn to_event_data(&self) -> Result<EventData, EventDataError> {
        let event_type = self.event_name();
        match serde_json::to_value(self)? {
            Value::Object(map) => {
                if let Some((field, _)) = map
                    .iter()
                    .find(|(_, v)| matches!(v, Value::Object(_) | Value::Array(_)))
                {
                    return Err(EventDataError::NestedField {
                        event_type,
                        field: field.clone(),
                    });
                }
                Ok(map)
            }
            _ => Err(EventDataError::NotAnObject { event_type }),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Clone, Debug)]
    struct TestEvent {
        zeta: String,
        alpha: u32,
    }

    impl DomainEvent for TestEvent {
        fn event_name(&self) -> &'static str {
            "TestEvent"
        }
    }

    #[derive(Serialize, Clone, Debug)]
    struct NestedEvent {
        items: Vec<u32>,
    }

    impl DomainEvent for NestedEvent {
        fn event_name(&self) -> &'static str {
            "NestedEvent"
        }
    }

    #[test]
    fn test_event_data_keeps_declaration_order() {
        let event = TestEvent {
            zeta: "z".to_string(),
            alpha: 7,
        };

        let data = event.to_event_data().unwrap();
        let keys: Vec<&str> = data.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        assert_eq!(data["alpha"], Value::from(7));
    }

    #[test]
    fn test_nested_fields_are_rejected() {
        let event = NestedEvent { items: vec![1, 2] };
        let err = event.to_event_data().unwrap_err();
        assert!(matches!(err, EventDataError::NestedField { .. }));
    }
}
