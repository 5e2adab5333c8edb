//! In-memory storage implementation for document stores.
//!
//! Every collection is an insertion-ordered vector of BSON documents guarded by its own
//! async-aware read-write lock. Collections never share a lock, so operations on
//! different collections run fully in parallel.

use std::{fmt, future::Future, sync::Arc, time::Duration};
use async_trait::async_trait;
use bson::Document;
use tracing::{debug, trace, warn};

use memdoc_core::{
    backend::{QueryUpdateOutcome, StoreBackend, StoreBackendBuilder},
    error::{DocumentStoreError, DocumentStoreResult},
    id::{DEFAULT_ID_FIELD, IdGenerator, UuidGenerator},
    query::Query,
};

use crate::{
    evaluator::DocumentEvaluator,
    path::apply_update,
    registry::{CollectionRegistry, Documents},
};

/// Thread-safe in-memory document storage backend.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses `Arc`-wrapped internal state, so clones share the
/// same collections. Read-only operations hold their collection's lock shared; every
/// mutating operation, including [`query_and_update`](StoreBackend::query_and_update),
/// holds it exclusively from the first scanned document to the last write. No lock is
/// held across an await point other than its own acquisition.
///
/// Read operations return copies; documents inside the store are never aliased.
///
/// # Performance
///
/// Lookups by identifier and queries scan the collection linearly (no indexing).
///
/// # Example
///
/// ```ignore
/// use memdoc_memory::InMemoryStore;
/// use memdoc::backend::StoreBackend;
/// use bson::doc;
///
/// let store = InMemoryStore::new();
///
/// let id = store.insert_document("animals", doc! { "Name": "Platypus" }).await?;
/// let animal = store.find_document("animals", &id).await?;
/// assert_eq!(animal.get_str("objectid")?, id);
/// ```
#[derive(Clone)]
pub struct InMemoryStore {
    /// Collection name -> lock owning the collection's documents
    registry: Arc<CollectionRegistry>,
    /// Name of the field holding each document's identifier
    id_field: String,
    /// Source of identifiers for inserted documents
    id_generator: Arc<dyn IdGenerator>,
    /// Upper bound on the wait for a collection lock, unbounded when `None`
    lock_timeout: Option<Duration>,
}

impl InMemoryStore {
    /// Creates a new empty store with the default configuration.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(CollectionRegistry::new()),
            id_field: DEFAULT_ID_FIELD.to_string(),
            id_generator: Arc::new(UuidGenerator),
            lock_timeout: None,
        }
    }

    /// Creates a builder for constructing an `InMemoryStore` with custom options.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use std::time::Duration;
    /// use memdoc_memory::InMemoryStore;
    ///
    /// let store = InMemoryStore::builder()
    ///     .id_field("_id")
    ///     .lock_timeout(Duration::from_secs(1))
    ///     .build()
    ///     .await?;
    /// ```
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    /// Returns the name of the identifier field.
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    async fn acquire<F, G>(&self, collection: &str, lock: F) -> DocumentStoreResult<G>
    where
        F: Future<Output = G> + Send,
    {
        match self.lock_timeout {
            Some(limit) => tokio::time::timeout(limit, lock)
                .await
                .map_err(|_| DocumentStoreError::LockTimeout(collection.to_string())),
            None => Ok(lock.await),
        }
    }

    fn position(&self, documents: &Documents, id: &str) -> Option<usize> {
        documents
            .iter()
            .position(|document| document.get_str(&self.id_field).is_ok_and(|value| value == id))
    }

    fn stamp(&self, document: &mut Document) -> String {
        let id = self.id_generator.generate();
        document.insert(self.id_field.clone(), id.clone());
        id
    }

    fn check_payload(&self, payload: &Document) -> DocumentStoreResult<()> {
        if payload.contains_key(&self.id_field) {
            return Err(DocumentStoreError::ImmutableField(self.id_field.clone()));
        }

        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("id_field", &self.id_field)
            .field("id_generator", &self.id_generator)
            .field("lock_timeout", &self.lock_timeout)
            .finish_non_exhaustive()
    }
}

/// Returns the indexes of the documents matching `query`, in order, stopping at its limit.
fn scan(documents: &Documents, query: &Query) -> DocumentStoreResult<Vec<usize>> {
    let limit = query.limit.filter(|&limit| limit > 0);
    let mut matched = Vec::new();

    for (index, document) in documents.iter().enumerate() {
        if !DocumentEvaluator::matches(document, query.filter.as_ref())? {
            continue;
        }

        matched.push(index);
        if limit.is_some_and(|limit| matched.len() >= limit) {
            break;
        }
    }

    Ok(matched)
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_document(&self, collection: &str, mut document: Document) -> DocumentStoreResult<String> {
        let lock = self.registry.get_or_create(collection).await;
        let mut documents = self.acquire(collection, lock.write()).await?;

        let id = self.stamp(&mut document);
        documents.push(document);

        debug!(collection, id = %id, "Inserted document");
        Ok(id)
    }

    async fn insert_documents(&self, collection: &str, documents: Vec<Document>) -> DocumentStoreResult<Vec<String>> {
        let lock = self.registry.get_or_create(collection).await;
        let mut stored = self.acquire(collection, lock.write()).await?;

        let mut ids = Vec::with_capacity(documents.len());
        stored.reserve(documents.len());

        for mut document in documents {
            ids.push(self.stamp(&mut document));
            stored.push(document);
        }

        debug!(collection, count = ids.len(), "Inserted documents");
        Ok(ids)
    }

    async fn find_document(&self, collection: &str, id: &str) -> DocumentStoreResult<Document> {
        let not_found = || DocumentStoreError::DocumentNotFound(id.to_string(), collection.to_string());

        let lock = self.registry
            .get(collection)
            .await
            .ok_or_else(not_found)?;
        let documents = self.acquire(collection, lock.read()).await?;

        self.position(&documents, id)
            .map(|index| documents[index].clone())
            .ok_or_else(not_found)
    }

    async fn find_all_documents(&self, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        let Some(lock) = self.registry.get(collection).await else {
            return Ok(vec![]);
        };

        let documents = self.acquire(collection, lock.read()).await?;
        Ok(documents.to_vec())
    }

    async fn update_document(&self, collection: &str, id: &str, payload: &Document) -> DocumentStoreResult<bool> {
        self.check_payload(payload)?;

        let not_found = || DocumentStoreError::DocumentNotFound(id.to_string(), collection.to_string());

        let lock = self.registry
            .get(collection)
            .await
            .ok_or_else(not_found)?;
        let mut documents = self.acquire(collection, lock.write()).await?;

        let index = self.position(&documents, id).ok_or_else(not_found)?;

        // Staged on a copy so a failing entry leaves the stored document untouched.
        let mut staged = documents[index].clone();
        apply_update(&mut staged, payload)?;
        documents[index] = staged;

        debug!(collection, id, "Updated document");
        Ok(true)
    }

    async fn delete_document(&self, collection: &str, id: &str) -> DocumentStoreResult<bool> {
        let not_found = || DocumentStoreError::DocumentNotFound(id.to_string(), collection.to_string());

        let lock = self.registry
            .get(collection)
            .await
            .ok_or_else(not_found)?;
        let mut documents = self.acquire(collection, lock.write()).await?;

        let index = self.position(&documents, id).ok_or_else(not_found)?;
        documents.remove(index);

        debug!(collection, id, "Deleted document");
        Ok(true)
    }

    async fn query_documents(&self, collection: &str, query: &Query) -> DocumentStoreResult<Vec<Document>> {
        let Some(lock) = self.registry.get(collection).await else {
            return Ok(vec![]);
        };

        let documents = self.acquire(collection, lock.read()).await?;
        let matched = scan(&documents, query)?;

        trace!(collection, scanned = documents.len(), matched = matched.len(), "Queried documents");
        Ok(
            matched
                .into_iter()
                .map(|index| documents[index].clone())
                .collect()
        )
    }

    async fn query_and_update(
        &self,
        collection: &str,
        query: &Query,
        payload: &Document,
    ) -> DocumentStoreResult<QueryUpdateOutcome> {
        self.check_payload(payload)?;

        let Some(lock) = self.registry.get(collection).await else {
            return Ok(QueryUpdateOutcome::default());
        };

        let mut documents = self.acquire(collection, lock.write()).await?;
        let matched = scan(&documents, query)?;

        // Every update is staged before any is committed: the batch applies fully or not at all.
        let staged = matched
            .into_iter()
            .map(|index| {
                let mut document = documents[index].clone();
                apply_update(&mut document, payload).map(|()| (index, document))
            })
            .collect::<DocumentStoreResult<Vec<_>>>()
            .inspect_err(|err| warn!(collection, error = %err, "Rolled back query and update"))?;

        let mut outcome = QueryUpdateOutcome {
            documents: Vec::with_capacity(staged.len()),
            updated: !staged.is_empty(),
        };

        for (index, document) in staged {
            documents[index] = document.clone();
            outcome.documents.push(document);
        }

        debug!(collection, updated = outcome.documents.len(), "Queried and updated documents");
        Ok(outcome)
    }

    async fn count_documents(&self, collection: &str) -> DocumentStoreResult<usize> {
        let Some(lock) = self.registry.get(collection).await else {
            return Ok(0);
        };

        let documents = self.acquire(collection, lock.read()).await?;
        Ok(documents.len())
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        Ok(self.registry.names().await)
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use memdoc_memory::InMemoryStore;
/// use memdoc::backend::StoreBackendBuilder;
///
/// let store = InMemoryStore::builder().build().await?;
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryStoreBuilder {
    id_field: String,
    id_generator: Arc<dyn IdGenerator>,
    lock_timeout: Option<Duration>,
}

impl Default for InMemoryStoreBuilder {
    fn default() -> Self {
        Self {
            id_field: DEFAULT_ID_FIELD.to_string(),
            id_generator: Arc::new(UuidGenerator),
            lock_timeout: None,
        }
    }
}

impl InMemoryStoreBuilder {
    /// Sets the name of the field that receives each document's identifier.
    ///
    /// Defaults to `objectid`.
    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Sets the identifier source. Defaults to random UUIDs.
    pub fn id_generator(mut self, generator: impl IdGenerator + 'static) -> Self {
        self.id_generator = Arc::new(generator);
        self
    }

    /// Bounds the wait for a collection lock. Operations that cannot acquire their lock in
    /// time fail with [`DocumentStoreError::LockTimeout`].
    ///
    /// The timer requires a Tokio runtime with the time driver enabled.
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Builds a new [`InMemoryStore`].
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Initialization`] if the identifier field name is empty,
    /// contains a `.` or starts with `$`, since queries could not address it.
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        if self.id_field.is_empty() || self.id_field.contains('.') || self.id_field.starts_with('$') {
            return Err(DocumentStoreError::Initialization(format!(
                "invalid identifier field name {:?}",
                self.id_field
            )));
        }

        Ok(InMemoryStore {
            registry: Arc::new(CollectionRegistry::new()),
            id_field: self.id_field,
            id_generator: self.id_generator,
            lock_timeout: self.lock_timeout,
        })
    }
}
