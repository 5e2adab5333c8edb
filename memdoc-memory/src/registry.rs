//! Registry of named collections and their locks.

use std::{collections::HashMap, sync::Arc};
use bson::Document;
use mea::rwlock::RwLock;
use tracing::debug;

/// The documents of one collection, in insertion order.
pub(crate) type Documents = Vec<Document>;

/// A collection's lock. It owns the collection's documents, so holding the lock is the
/// only way to reach them.
pub(crate) type CollectionLock = Arc<RwLock<Documents>>;

/// Maps collection names to their locks.
///
/// Entries are created lazily and never removed, so a lock handed out for a name stays
/// the lock of that name for the lifetime of the registry. The map itself sits behind a
/// second, coarse lock that is only held long enough to look up or insert an entry.
#[derive(Debug, Default)]
pub(crate) struct CollectionRegistry {
    collections: RwLock<HashMap<String, CollectionLock>>,
}

impl CollectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lock of an existing collection.
    pub async fn get(&self, name: &str) -> Option<CollectionLock> {
        self.collections
            .read()
            .await
            .get(name)
            .cloned()
    }

    /// Returns the lock of a collection, creating an empty collection on first use.
    ///
    /// Lookups take the registry lock shared. Only a miss takes it exclusively, and the
    /// entry is checked again under the exclusive lock in case another task created it
    /// in between.
    pub async fn get_or_create(&self, name: &str) -> CollectionLock {
        if let Some(lock) = self.get(name).await {
            return lock;
        }

        self.collections
            .write()
            .await
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(collection = name, "Created collection");
                CollectionLock::default()
            })
            .clone()
    }

    /// Returns the names of all collections, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names = self.collections
            .read()
            .await
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        names.sort();
        names
    }
}
