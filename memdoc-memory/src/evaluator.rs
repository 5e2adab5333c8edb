//! Query expression evaluation for in-memory document filtering.
//!
//! This module decides whether a single stored document satisfies a parsed [`Expr`].
//! Field paths are resolved with [`crate::path::resolve`]; comparisons are delegated to
//! [`crate::compare`].

use bson::{Bson, Document};

use memdoc_core::{
    error::{DocumentStoreError, DocumentStoreResult},
    query::{CompareOp, Expr, QueryVisitor, validate_operand},
};

use crate::{
    compare::{compare, values_equal},
    path::resolve,
};

/// Evaluates expressions against one document.
///
/// Every operand of an `And` or `Or` is evaluated, so the result and any error do not
/// depend on the order of sibling keys. When several operands fail, the error of the
/// first one in expression order is returned.
///
/// A path that does not resolve (missing field, or a non-document along the way) never
/// matches and never raises an error.
pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> DocumentStoreResult<bool> {
        self.visit_expr(expr)
    }

    /// Shorthand for evaluating an optional filter; `None` matches every document.
    pub fn matches(document: &'a Document, filter: Option<&Expr>) -> DocumentStoreResult<bool> {
        match filter {
            Some(expr) => DocumentEvaluator::new(document).evaluate(expr),
            None => Ok(true),
        }
    }
}

impl<'a> QueryVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        let mut matched = true;
        for expr in exprs {
            matched &= self.visit_expr(expr)?;
        }

        Ok(matched)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        let mut matched = false;
        for expr in exprs {
            matched |= self.visit_expr(expr)?;
        }

        Ok(matched)
    }

    fn visit_equals(&mut self, field: &str, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(resolve(self.document, field).is_some_and(|field_value| values_equal(field_value, value)))
    }

    fn visit_field(&mut self, field: &str, op: CompareOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        validate_operand(op, value)?;

        match resolve(self.document, field) {
            Some(field_value) => compare(op, field_value, value),
            None => Ok(false),
        }
    }
}
