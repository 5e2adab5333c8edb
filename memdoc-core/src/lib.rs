//! Core abstractions of memdoc, an embeddable in-process document store.
//!
//! This crate provides:
//!
//! - **Store backend abstraction** ([`backend`]) - The operation surface every backend implements
//! - **Query language** ([`query`]) - Mongo-style query parsing and a typed expression tree
//! - **Collections interface** ([`collection`]) - Handles bound to one collection
//! - **Document store** ([`store`]) - Entry point handing out collection handles
//! - **Typed records** ([`document`]) - Mapping serde types onto stored documents
//! - **Identifiers** ([`id`]) - Pluggable identifier generation
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use memdoc::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//! let animals = store.collection("animals");
//!
//! let id = animals.insert(doc! { "Name": "Platypus", "Order": "Monotremata" }).await?;
//! let found = animals.query_raw(&doc! { "Name": "Platypus" }, 1).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as memdoc_core;

pub mod backend;
pub mod collection;
pub mod document;
pub mod error;
pub mod id;
pub mod query;
pub mod store;
