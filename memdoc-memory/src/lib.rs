//! In-memory document storage backend for memdoc.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It is the query matching and read-modify-write engine of the store.
//!
//! # Features
//!
//! - **Per-collection locking** - Each collection has its own async-aware RwLock
//! - **Mongo-style queries** - Equality, ordering and membership operators, `$and`/`$or`,
//!   dotted paths into nested documents
//! - **Atomic updates** - Partial updates and query-and-update batches are staged and
//!   committed only when every document accepts the payload
//! - **Bounded waits** - Optional timeout on lock acquisition
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
//!     animals.insert(doc! { "Name": "Platypus", "Order": { "Name": "Monotremata" } }).await?;
//!
//!     let found = animals.query_raw(&doc! { "Order.Name": "Monotremata" }, 0).await?;
//!     assert_eq!(found.len(), 1);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as memdoc_memory;

pub mod store;

mod compare;
mod evaluator;
mod path;
mod registry;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
