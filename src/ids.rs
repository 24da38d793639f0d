//! Unique identifier capability

use uuid::Uuid;

/// Source of unique string identifiers
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random RFC 4122 version 4 UUIDs in hyphenated lowercase form
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV4Generator;

impl IdGenerator for UuidV4Generator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
