//! Storage backend abstraction for the document store.
//!
//! This module defines the traits that abstract over storage implementations, so the
//! [`DocumentStore`](crate::store::DocumentStore) and collection handles can work with
//! any backend that provides the operations below.
//!
//! # Overview
//!
//! Every operation takes the collection name as its partition key. Collections are created
//! implicitly by the first insertion and never removed. Identifiers are minted by the
//! backend and returned from the insert operations.
//!
//! Read operations hand out owned copies of the stored documents. Mutating a returned
//! document never changes the store.
//!
//! # Examples
//!
//! ```ignore
//! use memdoc::backend::StoreBackend;
//! use bson::doc;
//!
//! let id = backend.insert_document("animals", doc! { "Name": "Platypus" }).await?;
//! let animal = backend.find_document("animals", &id).await?;
//! assert_eq!(animal.get_str("Name")?, "Platypus");
//! ```

use async_trait::async_trait;
use bson::Document;
use std::fmt::Debug;

use crate::{error::DocumentStoreResult, query::Query};

/// Result of a combined query-and-update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryUpdateOutcome {
    /// Copies of the matched documents, taken after the update was applied.
    pub documents: Vec<Document>,
    /// Whether at least one document was updated.
    pub updated: bool,
}

/// Abstract interface for document storage backends.
///
/// # Thread Safety
///
/// Implementations must be safe to share across tasks. Operations on one collection are
/// linearizable: every mutating operation runs under exclusive access to its collection,
/// and readers observe either the state before or after a mutation, never a partial one.
///
/// # Error Handling
///
/// Operations return [`DocumentStoreResult<T>`](crate::error::DocumentStoreResult).
/// A failed mutating operation leaves the collection unchanged.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts a document, assigning it a fresh identifier.
    ///
    /// The identifier is written into the document's identifier field, replacing any
    /// value the caller put there. The collection is created if it does not exist.
    ///
    /// # Returns
    ///
    /// The identifier of the stored document.
    async fn insert_document(&self, collection: &str, document: Document) -> DocumentStoreResult<String>;

    /// Inserts several documents under a single acquisition of the collection lock.
    ///
    /// # Returns
    ///
    /// The identifiers of the stored documents, in input order.
    async fn insert_documents(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> DocumentStoreResult<Vec<String>>;

    /// Retrieves a document by its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DocumentNotFound`](crate::error::DocumentStoreError::DocumentNotFound)
    /// if no document in the collection carries the identifier.
    async fn find_document(&self, collection: &str, id: &str) -> DocumentStoreResult<Document>;

    /// Retrieves every document of a collection in insertion order.
    ///
    /// An unknown collection yields an empty list.
    async fn find_all_documents(&self, collection: &str) -> DocumentStoreResult<Vec<Document>>;

    /// Applies a partial update to the document with the given identifier.
    ///
    /// Plain payload keys are set or overwritten; dotted keys address fields of nested
    /// documents that must already exist. The update is applied atomically: either every
    /// payload entry is applied or none is.
    ///
    /// # Errors
    ///
    /// - `DocumentNotFound` if the identifier is absent
    /// - `InvalidPath` if a dotted key crosses a missing segment or a non-document value
    /// - `ImmutableField` if the payload targets the identifier field
    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        payload: &Document,
    ) -> DocumentStoreResult<bool>;

    /// Removes the document with the given identifier, preserving the order of the others.
    ///
    /// # Errors
    ///
    /// Returns `DocumentNotFound` if the identifier is absent.
    async fn delete_document(&self, collection: &str, id: &str) -> DocumentStoreResult<bool>;

    /// Returns the documents matching the query, in insertion order.
    ///
    /// The scan stops as soon as `query.limit` matches were collected.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` or `InvalidQuerySyntax` if the filter cannot be evaluated
    /// against some scanned document. No partial result is returned.
    async fn query_documents(&self, collection: &str, query: &Query) -> DocumentStoreResult<Vec<Document>>;

    /// Applies `payload` to every document matching the query, up to `query.limit`.
    ///
    /// The whole scan runs under exclusive access. Updates are staged and committed only
    /// if every matched document accepted the payload; on failure nothing is changed.
    async fn query_and_update(
        &self,
        collection: &str,
        query: &Query,
        payload: &Document,
    ) -> DocumentStoreResult<QueryUpdateOutcome>;

    /// Returns the number of documents in a collection.
    async fn count_documents(&self, collection: &str) -> DocumentStoreResult<usize>;

    /// Lists the names of all collections in the store.
    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>>;
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn insert_document(&self, collection: &str, document: Document) -> DocumentStoreResult<String> {
        (*self)
            .insert_document(collection, document)
            .await
    }

    async fn insert_documents(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> DocumentStoreResult<Vec<String>> {
        (*self)
            .insert_documents(collection, documents)
            .await
    }

    async fn find_document(&self, collection: &str, id: &str) -> DocumentStoreResult<Document> {
        (*self).find_document(collection, id).await
    }

    async fn find_all_documents(&self, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        (*self).find_all_documents(collection).await
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        payload: &Document,
    ) -> DocumentStoreResult<bool> {
        (*self)
            .update_document(collection, id, payload)
            .await
    }

    async fn delete_document(&self, collection: &str, id: &str) -> DocumentStoreResult<bool> {
        (*self).delete_document(collection, id).await
    }

    async fn query_documents(&self, collection: &str, query: &Query) -> DocumentStoreResult<Vec<Document>> {
        (*self)
            .query_documents(collection, query)
            .await
    }

    async fn query_and_update(
        &self,
        collection: &str,
        query: &Query,
        payload: &Document,
    ) -> DocumentStoreResult<QueryUpdateOutcome> {
        (*self)
            .query_and_update(collection, query, payload)
            .await
    }

    async fn count_documents(&self, collection: &str) -> DocumentStoreResult<usize> {
        (*self).count_documents(collection).await
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        (*self).list_collections().await
    }
}

/// Factory for backend instances.
///
/// Builders carry the backend's configuration and validate it in [`build`](Self::build).
#[async_trait]
pub trait StoreBackendBuilder: Send {
    /// The backend type this builder produces.
    type Backend: StoreBackend;

    /// Validates the configuration and creates the backend.
    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
