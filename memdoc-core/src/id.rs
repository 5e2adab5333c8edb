//! Identifier generation for inserted documents.

use std::fmt::Debug;
use uuid::Uuid;

/// Default name of the field holding a document's identifier.
pub const DEFAULT_ID_FIELD: &str = "objectid";

/// Source of unique identifier strings.
///
/// Implementations must never return the same string twice for the lifetime of a store.
/// They are called while the target collection's exclusive lock is held, so they should
/// be cheap.
pub trait IdGenerator: Send + Sync + Debug {
    /// Returns a fresh identifier.
    fn generate(&self) -> String;
}

/// Generates random (version 4) UUIDs in their hyphenated text form.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
