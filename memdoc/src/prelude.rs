//! Convenient re-exports of commonly used types from memdoc.
//!
//! ```ignore
//! use memdoc::prelude::*;
//! ```
//!
//! This provides access to:
//! - Document traits and JSON helpers
//! - Store backends and builders
//! - Query construction and parsing
//! - Collection interfaces
//! - Error types and identifier generators

pub use memdoc_core::{
    collection::{Collection, TypedCollection},
    store::DocumentStore,
    document::{Document, DocumentExt, json_to_document, document_to_json},
    backend::{StoreBackend, StoreBackendBuilder, QueryUpdateOutcome},
    query::{Query, QueryVisitor, Expr, CompareOp, QueryBuilder, Filter},
    id::{IdGenerator, UuidGenerator},
    error::{DocumentStoreError, DocumentStoreResult},
};
