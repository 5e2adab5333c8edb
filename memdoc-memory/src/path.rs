//! Dotted field paths: reading values out of nested documents and applying partial updates.

use bson::{Bson, Document};

use memdoc_core::error::{DocumentStoreError, DocumentStoreResult};

const PATH_SEPARATOR: char = '.';
const OPERATOR_SIGIL: char = '$';

/// Resolves a plain or dotted field path against a document.
///
/// Returns `None` if a segment is missing or an intermediate value is not a nested
/// document. Arrays are not traversed.
pub(crate) fn resolve<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split(PATH_SEPARATOR);
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }

    Some(current)
}

/// Applies every entry of `payload` to `document` in payload order.
///
/// A plain key is set or overwritten on the document itself. A dotted key walks all but
/// its last segment, each of which must already exist and hold a nested document, and
/// sets the last segment on the innermost document.
///
/// Entries are applied one by one, so on error the document may be partially updated.
/// Callers that need atomicity apply the payload to a copy.
///
/// # Errors
///
/// Returns [`DocumentStoreError::InvalidPath`] if a key starts with `$`, or if a dotted key
/// crosses a missing segment or a value that is not a document.
pub(crate) fn apply_update(document: &mut Document, payload: &Document) -> DocumentStoreResult<()> {
    for (key, value) in payload {
        // Keys starting with `$` are reserved for query operators.
        if key.starts_with(OPERATOR_SIGIL) {
            return Err(DocumentStoreError::InvalidPath(key.clone()));
        }

        match key.rsplit_once(PATH_SEPARATOR) {
            None => {
                document.insert(key.clone(), value.clone());
            }
            Some((parent, last)) => {
                parent_document_mut(document, parent)
                    .ok_or_else(|| DocumentStoreError::InvalidPath(key.clone()))?
                    .insert(last, value.clone());
            }
        }
    }

    Ok(())
}

fn parent_document_mut<'a>(document: &'a mut Document, path: &str) -> Option<&'a mut Document> {
    path.split(PATH_SEPARATOR)
        .try_fold(document, |current, segment| {
            current
                .get_mut(segment)
                .and_then(Bson::as_document_mut)
        })
}
