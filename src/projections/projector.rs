use async_trait::async_trait;
use futures_util::future::BoxFuture;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

use crate::event_sourcing::core::EventData;

// ============================================================================
// Projector - Idempotent event → read model mapping
// ============================================================================
//
// The processor may redeliver an event whose projection partially succeeded,
// so every handler must tolerate seeing the same event twice:
// - creation events: no-op if the read model exists
// - incremental events: no-op if the sub-item is already present
// - state transitions: set the field unconditionally, skip if the read model
//   has not been created yet
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("Event {event_type} is missing field {field}")]
    MissingField {
        event_type: &'static str,
        field: &'static str,
    },

    #[error("Event {event_type} field {field} has an invalid value: {value}")]
    InvalidField {
        event_type: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Projector {projector} does not handle event type {event_type}")]
    UnhandledEventType {
        projector: &'static str,
        event_type: String,
    },

    #[error("Read model storage error: {0}")]
    Storage(String),
}

pub type ProjectionResult<T> = Result<T, ProjectionError>;

#[async_trait]
pub trait Projector: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Event types this projector is registered for
    fn handled_event_types(&self) -> Vec<&'static str>;

    /// Apply one event to the read model store
    async fn project(&self, event_type: &str, event_data: &EventData) -> ProjectionResult<()>;
}

// ============================================================================
// Handler Table - Explicit event type → handler registration
// ============================================================================

/// Handler bound to its projector instance
pub type HandlerFn<P> =
    for<'a> fn(&'a P, &'a EventData) -> BoxFuture<'a, ProjectionResult<()>>;

/// Tagged dispatch map, built once when the projector is constructed
pub struct HandlerTable<P> {
    projector: &'static str,
    handlers: HashMap<&'static str, HandlerFn<P>>,
    order: Vec<&'static str>,
}

impl<P> HandlerTable<P> {
    pub fn new(projector: &'static str) -> Self {
        Self {
            projector,
            handlers: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register `handler` for `event_type`. Later registrations for the same
    /// type replace earlier ones inside a single projector.
    pub fn on(mut self, event_type: &'static str, handler: HandlerFn<P>) -> Self {
        if self.handlers.insert(event_type, handler).is_none() {
            self.order.push(event_type);
        }
        self
    }

    pub fn event_types(&self) -> Vec<&'static str> {
        self.order.clone()
    }

    pub async fn dispatch(
        &self,
        projector: &P,
        event_type: &str,
        event_data: &EventData,
    ) -> ProjectionResult<()> {
        match self.handlers.get(event_type) {
            Some(handler) => handler(projector, event_data).await,
            None => Err(ProjectionError::UnhandledEventType {
                projector: self.projector,
                event_type: event_type.to_string(),
            }),
        }
    }
}

// ============================================================================
// Event Data Accessors
// ============================================================================

/// Typed view over a flattened event payload
pub struct Fields<'a> {
    event_type: &'static str,
    data: &'a EventData,
}

impl<'a> Fields<'a> {
    pub fn new(event_type: &'static str, data: &'a EventData) -> Self {
        Self { event_type, data }
    }

    fn get(&self, field: &'static str) -> ProjectionResult<&'a Value> {
        self.data.get(field).ok_or(ProjectionError::MissingField {
            event_type: self.event_type,
            field,
        })
    }

    fn invalid(&self, field: &'static str, value: &Value) -> ProjectionError {
        ProjectionError::InvalidField {
            event_type: self.event_type,
            field,
            value: value.to_string(),
        }
    }

    pub fn string(&self, field: &'static str) -> ProjectionResult<String> {
        match self.get(field)? {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(self.invalid(field, other)),
        }
    }

    pub fn u32(&self, field: &'static str) -> ProjectionResult<u32> {
        let value = self.get(field)?;
        let parsed = match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        parsed
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| self.invalid(field, value))
    }

    pub fn decimal(&self, field: &'static str) -> ProjectionResult<Decimal> {
        let value = self.get(field)?;
        let parsed = match value {
            Value::String(s) => Decimal::from_str(s.trim()).ok(),
            Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
            _ => None,
        };
        parsed.ok_or_else(|| self.invalid(field, value))
    }
}
