use uuid::Uuid;

/// Opaque identifier source for entities and outbox entries
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random v4 UUIDs rendered as hyphenated strings
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
