//! Value equality and type-checked ordering comparisons.

use std::{cmp::Ordering, collections::HashMap};
use bson::Bson;

use memdoc_core::{
    error::{DocumentStoreError, DocumentStoreResult},
    query::CompareOp,
};

const DIFFERENT_TYPES: &str = "Cannot compare values of different types";
const INVALID_TYPE: &str = "Invalid type for comparison";

/// Comparable view of a BSON value.
///
/// Integers and doubles are one numeric kind: they compare equal when they denote the
/// same number. Comparisons are exact, including integers beyond the `f64` mantissa.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
    /// Any other BSON value, equal only to a structurally identical value.
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Int(i64::from(*value)),
            Bson::Int64(value) => Comparable::Int(*value),
            Bson::Double(value) => Comparable::Double(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            other => Comparable::Other(other),
        }
    }
}

impl<'a> Comparable<'a> {
    fn is_orderable(&self) -> bool {
        matches!(self, Comparable::Int(_) | Comparable::Double(_) | Comparable::String(_))
    }

    fn is_number(&self) -> bool {
        matches!(self, Comparable::Int(_) | Comparable::Double(_))
    }

    fn same_kind(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::String(_), Comparable::String(_)) => true,
            _ => self.is_number() && other.is_number(),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Int(a), Comparable::Int(b)) => a == b,
            (Comparable::Double(a), Comparable::Double(b)) => a == b,
            (Comparable::Int(a), Comparable::Double(b)) => cmp_int_double(*a, *b) == Some(Ordering::Equal),
            (Comparable::Double(a), Comparable::Int(b)) => cmp_int_double(*b, *a) == Some(Ordering::Equal),
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Int(a), Comparable::Int(b)) => a.partial_cmp(b),
            (Comparable::Double(a), Comparable::Double(b)) => a.partial_cmp(b),
            (Comparable::Int(a), Comparable::Double(b)) => cmp_int_double(*a, *b),
            (Comparable::Double(a), Comparable::Int(b)) => cmp_int_double(*b, *a).map(Ordering::reverse),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Orders an integer against a double without rounding the integer through `f64`.
///
/// `None` when the double is NaN.
fn cmp_int_double(int: i64, double: f64) -> Option<Ordering> {
    // 2^63, the first double past i64::MAX
    const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

    if double.is_nan() {
        return None;
    }
    if double >= I64_BOUND {
        return Some(Ordering::Less);
    }
    if double < -I64_BOUND {
        return Some(Ordering::Greater);
    }

    let whole = double.trunc();
    match int.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(double - whole)),
        ordering => Some(ordering),
    }
}

/// Exact equality of two values: same kind and same value.
pub(crate) fn values_equal(left: &Bson, right: &Bson) -> bool {
    Comparable::from(left) == Comparable::from(right)
}

/// Evaluates `value <op> operand`.
///
/// Ordering operators require both sides to be strings or both to be numbers. `$in` and
/// `$nin` test `value` for equality against each element of the operand list.
///
/// # Errors
///
/// - [`DocumentStoreError::TypeMismatch`] if the operand is not a string or number, or if
///   the value is of a different kind than the operand
/// - [`DocumentStoreError::InvalidQuerySyntax`] if a membership operand is not a list
pub(crate) fn compare(op: CompareOp, value: &Bson, operand: &Bson) -> DocumentStoreResult<bool> {
    if op.is_membership() {
        let Bson::Array(candidates) = operand else {
            return Err(DocumentStoreError::InvalidQuerySyntax(format!(
                "{} expects a list of values",
                op.as_operator()
            )));
        };

        let value = Comparable::from(value);
        let found = candidates
            .iter()
            .any(|candidate| Comparable::from(candidate) == value);

        return Ok(found == (op == CompareOp::In));
    }

    let operand = Comparable::from(operand);
    if !operand.is_orderable() {
        return Err(DocumentStoreError::TypeMismatch(INVALID_TYPE.to_string()));
    }

    let value = Comparable::from(value);
    if !value.same_kind(&operand) {
        return Err(DocumentStoreError::TypeMismatch(DIFFERENT_TYPES.to_string()));
    }

    let ordering = value.partial_cmp(&operand);

    Ok(match op {
        CompareOp::Eq => ordering == Some(Ordering::Equal),
        CompareOp::Ne => ordering != Some(Ordering::Equal),
        CompareOp::Gt => ordering == Some(Ordering::Greater),
        CompareOp::Gte => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        CompareOp::Lt => ordering == Some(Ordering::Less),
        CompareOp::Lte => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        CompareOp::In | CompareOp::Nin => unreachable!(),
    })
}
