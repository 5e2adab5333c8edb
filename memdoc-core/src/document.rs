//! Typed records and format conversion for stored documents.
//!
//! The store itself works on schema-less [`bson::Document`] values. This module lets
//! callers map their own serde types onto collections and convert documents to and
//! from JSON at the API boundary.

use bson::{Bson, Document as RawDocument, de::deserialize_from_bson, ser::serialize_to_bson};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// A serde type that can be stored in a collection.
///
/// Identifiers are minted by the store on insertion, so a record does not need to carry
/// one. Types that want to read it back can declare an optional field named after the
/// store's identifier field (`objectid` by default).
///
/// # Example
///
/// ```ignore
/// use memdoc::document::Document;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct Animal {
///     #[serde(default, skip_serializing)]
///     pub objectid: Option<String>,
///     pub name: String,
///     pub order: String,
/// }
///
/// impl Document for Animal {
///     fn collection_name() -> &'static str {
///         "animals"
///     }
/// }
/// ```
pub trait Document: Serialize + for<'de> Deserialize<'de> + Send + Sync + Clone + 'static {
    /// Returns the name of the collection this document belongs to.
    fn collection_name() -> &'static str;
}

/// Conversion helpers, implemented for every [`Document`].
pub trait DocumentExt: Document {
    /// Converts this record into a raw document for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the record does not serialize to a map.
    fn to_document(&self) -> DocumentStoreResult<RawDocument>;

    /// Creates a record from a stored raw document.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the structure is invalid.
    fn from_document(document: RawDocument) -> DocumentStoreResult<Self>;
}

impl<D: Document> DocumentExt for D {
    fn to_document(&self) -> DocumentStoreResult<RawDocument> {
        into_document(serialize_to_bson(self)?)
    }

    fn from_document(document: RawDocument) -> DocumentStoreResult<Self> {
        Ok(deserialize_from_bson(Bson::Document(document))?)
    }
}

/// Converts a JSON object into a raw document.
///
/// Integers become `Int64` (or `Int32` where the serializer narrows them) and floating
/// point numbers become `Double`; the store treats all of them as one numeric type.
///
/// # Errors
///
/// Returns [`DocumentStoreError::Serialization`] if the value is not a JSON object.
pub fn json_to_document(value: Value) -> DocumentStoreResult<RawDocument> {
    into_document(serialize_to_bson(&value)?)
}

/// Converts a raw document into a JSON object.
pub fn document_to_json(document: &RawDocument) -> DocumentStoreResult<Value> {
    Ok(serde_json::to_value(document)?)
}

fn into_document(bson: Bson) -> DocumentStoreResult<RawDocument> {
    match bson {
        Bson::Document(document) => Ok(document),
        other => Err(DocumentStoreError::Serialization(format!(
            "expected a document, found {:?}",
            other.element_type()
        ))),
    }
}
