//! Main memdoc crate providing an embeddable, in-process document store.
//!
//! This crate is the primary entry point for users of memdoc. It re-exports the core
//! types from `memdoc-core` and the in-memory engine from `memdoc-memory`.
//!
//! # Features
//!
//! - **Schema-less collections** - Named, insertion-ordered collections of BSON documents
//! - **Mongo-style queries** - Literal equality, `$eq`/`$ne`/`$gt`/`$gte`/`$lt`/`$lte`,
//!   `$in`/`$nin`, `$and`/`$or`, and dotted paths into nested documents
//! - **Atomic read-modify-write** - Query-and-update batches commit fully or not at all
//! - **Per-collection concurrency** - Readers share a collection, writers own it, and
//!   different collections never contend
//! - **Typed records** - Map serde types onto collections
//!
//! # Quick Start
//!
//! ```ignore
//! use memdoc::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//!     let animals = store.collection("animals");
//!
//!     let id = animals.insert(doc! { "Name": "Platypus", "Order": "Monotremata" }).await?;
//!     animals.update(&id, &doc! { "Name": "Echidna" }).await?;
//!
//!     let monotremes = animals
//!         .query(&Query::parse(&doc! { "Order": "Monotremata" })?.with_limit(10))
//!         .await?;
//!     println!("Queried animals: {:?}", monotremes);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Query and update
//!
//! ```ignore
//! let outcome = orders
//!     .query_and_update(
//!         &Query::parse(&doc! { "Status": "open", "Total": { "$gte": 100 } })?,
//!         &doc! { "Status": "review", "Audit.Flagged": true },
//!     )
//!     .await?;
//!
//! // Either every matched order was updated, or the call failed and none was.
//! println!("{} orders flagged", outcome.documents.len());
//! ```
//!
//! # Typed records
//!
//! ```ignore
//! use memdoc::{prelude::*, memory::InMemoryStore};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Animal {
//!     #[serde(default, skip_serializing)]
//!     pub objectid: Option<String>,
//!     pub name: String,
//! }
//!
//! impl Document for Animal {
//!     fn collection_name() -> &'static str { "animals" }
//! }
//!
//! let animals = store.typed_collection::<Animal>();
//! let id = animals.insert(&Animal { objectid: None, name: "Platypus".into() }).await?;
//! assert_eq!(animals.find(&id).await?.objectid.as_deref(), Some(id.as_str()));
//! ```

pub mod prelude;

pub use memdoc_core::{backend, collection, document, error, id, query, store};

// Re-export BSON and JSON types for convenience
pub use bson;
pub use serde_json;

/// In-memory storage backend implementations.
pub mod memory {
    pub use memdoc_memory::{InMemoryStore, InMemoryStoreBuilder};
}
