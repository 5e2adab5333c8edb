//! Collection handles for document store operations.
//!
//! A collection handle binds a collection name to a backend reference, so callers do not
//! have to repeat the partition key on every call.
//!
//! # Collection Types
//!
//! - [`Collection`] - Untyped collection working on raw [`bson::Document`] values
//! - [`TypedCollection`] - Collection mapping documents onto a serde type
//!
//! # Example
//!
//! ```ignore
//! use bson::doc;
//! use memdoc::query::Query;
//!
//! let animals = store.collection("animals");
//! let id = animals.insert(doc! { "Name": "Platypus", "Order": "Monotremata" }).await?;
//! animals.update(&id, &doc! { "Name": "Echidna" }).await?;
//!
//! let monotremes = animals
//!     .query(&Query::parse(&doc! { "Order": "Monotremata" })?)
//!     .await?;
//! ```

use bson::Document as RawDocument;
use std::marker::PhantomData;

use crate::{
    backend::{QueryUpdateOutcome, StoreBackend},
    document::{Document, DocumentExt},
    error::DocumentStoreResult,
    query::Query,
};

/// An untyped collection with a reference to a storage backend.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the backend reference
/// * `B` - The storage backend type
#[derive(Debug)]
pub struct Collection<'a, B: StoreBackend> {
    name: String,
    backend: &'a B,
}

impl<'a, B: StoreBackend> Collection<'a, B> {
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self { name, backend }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts a document and returns its new identifier.
    pub async fn insert(&self, document: RawDocument) -> DocumentStoreResult<String> {
        self.backend
            .insert_document(&self.name, document)
            .await
    }

    /// Inserts several documents at once and returns their identifiers in input order.
    pub async fn insert_many(&self, documents: Vec<RawDocument>) -> DocumentStoreResult<Vec<String>> {
        self.backend
            .insert_documents(&self.name, documents)
            .await
    }

    /// Retrieves a document by identifier.
    ///
    /// # Errors
    ///
    /// Returns `DocumentNotFound` if the identifier is absent.
    pub async fn find(&self, id: &str) -> DocumentStoreResult<RawDocument> {
        self.backend.find_document(&self.name, id).await
    }

    /// Retrieves every document in insertion order.
    pub async fn find_all(&self) -> DocumentStoreResult<Vec<RawDocument>> {
        self.backend.find_all_documents(&self.name).await
    }

    /// Applies a partial update to one document.
    ///
    /// # Errors
    ///
    /// Returns `DocumentNotFound`, `InvalidPath` or `ImmutableField`; the document is left
    /// unchanged in every error case.
    pub async fn update(&self, id: &str, payload: &RawDocument) -> DocumentStoreResult<bool> {
        self.backend
            .update_document(&self.name, id, payload)
            .await
    }

    /// Removes one document.
    pub async fn delete(&self, id: &str) -> DocumentStoreResult<bool> {
        self.backend.delete_document(&self.name, id).await
    }

    /// Returns the documents matching the query, in insertion order.
    pub async fn query(&self, query: &Query) -> DocumentStoreResult<Vec<RawDocument>> {
        self.backend
            .query_documents(&self.name, query)
            .await
    }

    /// Parses a Mongo-style filter and returns up to `limit` matches (`0` for all).
    pub async fn query_raw(&self, filter: &RawDocument, limit: usize) -> DocumentStoreResult<Vec<RawDocument>> {
        self.query(&Query::parse(filter)?.with_limit(limit)).await
    }

    /// Updates every document matching the query in one atomic step.
    pub async fn query_and_update(
        &self,
        query: &Query,
        payload: &RawDocument,
    ) -> DocumentStoreResult<QueryUpdateOutcome> {
        self.backend
            .query_and_update(&self.name, query, payload)
            .await
    }

    /// Returns the number of documents in the collection.
    pub async fn count(&self) -> DocumentStoreResult<usize> {
        self.backend.count_documents(&self.name).await
    }
}

/// A collection whose documents are mapped onto the serde type `D`.
///
/// The collection name comes from [`Document::collection_name`]. Update payloads and
/// queries stay untyped, since they describe partial documents.
#[derive(Debug)]
pub struct TypedCollection<'a, B: StoreBackend, D: Document> {
    name: String,
    backend: &'a B,
    _marker: PhantomData<D>,
}

impl<'a, B: StoreBackend, D: Document> TypedCollection<'a, B, D> {
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self {
            name,
            backend,
            _marker: PhantomData,
        }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Serializes and inserts a record, returning its new identifier.
    pub async fn insert(&self, record: &D) -> DocumentStoreResult<String> {
        self.backend
            .insert_document(&self.name, record.to_document()?)
            .await
    }

    /// Serializes and inserts several records.
    pub async fn insert_many(&self, records: &[D]) -> DocumentStoreResult<Vec<String>> {
        self.backend
            .insert_documents(
                &self.name,
                records
                    .iter()
                    .map(DocumentExt::to_document)
                    .collect::<DocumentStoreResult<Vec<_>>>()?,
            )
            .await
    }

    /// Retrieves and deserializes a record by identifier.
    pub async fn find(&self, id: &str) -> DocumentStoreResult<D> {
        D::from_document(self.backend.find_document(&self.name, id).await?)
    }

    /// Retrieves and deserializes every record in insertion order.
    pub async fn find_all(&self) -> DocumentStoreResult<Vec<D>> {
        self.backend
            .find_all_documents(&self.name)
            .await?
            .into_iter()
            .map(D::from_document)
            .collect()
    }

    /// Applies a partial update to one record.
    pub async fn update(&self, id: &str, payload: &RawDocument) -> DocumentStoreResult<bool> {
        self.backend
            .update_document(&self.name, id, payload)
            .await
    }

    /// Removes one record.
    pub async fn delete(&self, id: &str) -> DocumentStoreResult<bool> {
        self.backend.delete_document(&self.name, id).await
    }

    /// Returns the records matching the query, in insertion order.
    pub async fn query(&self, query: &Query) -> DocumentStoreResult<Vec<D>> {
        self.backend
            .query_documents(&self.name, query)
            .await?
            .into_iter()
            .map(D::from_document)
            .collect()
    }
}
