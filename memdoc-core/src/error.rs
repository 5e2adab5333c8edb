//! Error types and result types for document store operations.
//!
//! This module provides error handling for every store operation.
//! Use [`DocumentStoreResult<T>`] as the return type for fallible operations.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a document store.
///
/// Errors are always returned to the immediate caller. The store never retries or
/// recovers internally, and a failed mutating operation leaves the collection unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentStoreError {
    /// Serialization/deserialization error when converting between document formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Invalid store configuration detected while building a backend.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// The requested document was not found in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document not found {0} in collection {1}")]
    DocumentNotFound(String, String),
    /// A dotted update path crosses a missing segment or a value that is not a document.
    #[error("Invalid field path: {0}")]
    InvalidPath(String),
    /// A query expression is malformed (logical operators, operator documents).
    #[error("Invalid query syntax: {0}")]
    InvalidQuerySyntax(String),
    /// Comparison operands differ in type or use a type that cannot be ordered.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    /// An update payload tried to overwrite a field the store owns.
    #[error("Field {0} cannot be modified")]
    ImmutableField(String),
    /// A collection lock could not be acquired within the configured timeout.
    #[error("Timed out waiting for the lock of collection {0}")]
    LockTimeout(String),
}

/// A specialized `Result` type for document store operations.
///
/// This type alias is used throughout the crate to indicate operations that may fail
/// with a [`DocumentStoreError`].
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}
