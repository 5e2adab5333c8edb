//! Query construction and parsing for document stores.
//!
//! Queries are written as Mongo-style documents and parsed into an [`Expr`] tree before
//! any document is examined, so syntax errors surface once per query instead of once per
//! scanned document.
//!
//! # Query documents
//!
//! ```ignore
//! use bson::doc;
//! use memdoc::query::Query;
//!
//! // Implicit AND of sibling keys, dotted paths reach into nested documents.
//! let query = Query::parse(&doc! {
//!     "Order.OrderID": 7,
//!     "$or": [ { "status": "open" }, { "priority": { "$gte": 3 } } ],
//! })?
//! .with_limit(10);
//! ```
//!
//! Supported keys:
//!
//! - `$and` / `$or` with a list of sub-queries
//! - a field path with a literal value (exact equality)
//! - a field path with an operator document using `$eq`, `$ne`, `$gt`, `$gte`, `$lt`,
//!   `$lte`, `$in` or `$nin`; several operators on one field must all hold
//!
//! # Filter Expression API
//!
//! The [`Filter`] struct builds the same trees programmatically:
//!
//! ```ignore
//! use memdoc::query::{Filter, Query};
//!
//! let query = Query::builder()
//!     .filter(Filter::eq("name", "Alice").and(Filter::gt("age", 18)))
//!     .limit(1)
//!     .build();
//! ```

use bson::{Bson, Document};

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// Logical AND operator key.
pub const AND: &str = "$and";
/// Logical OR operator key.
pub const OR: &str = "$or";

const OPERATOR_SIGIL: char = '$';
const LOGICAL_SYNTAX_ERROR: &str = "Logical operator query has invalid syntax. Expected a list of queries.";
const INVALID_COMPARISON_TYPE: &str = "Invalid type for comparison";

/// Field comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// Equal to (`$eq`), type-checked.
    Eq,
    /// Not equal to (`$ne`), type-checked.
    Ne,
    /// Greater than (`$gt`).
    Gt,
    /// Greater than or equal to (`$gte`).
    Gte,
    /// Less than (`$lt`).
    Lt,
    /// Less than or equal to (`$lte`).
    Lte,
    /// Value equals one of the listed values (`$in`).
    In,
    /// Value equals none of the listed values (`$nin`).
    Nin,
}

impl CompareOp {
    /// Looks up an operator by its query-document key.
    pub fn from_operator(key: &str) -> Option<Self> {
        match key {
            "$eq" => Some(CompareOp::Eq),
            "$ne" => Some(CompareOp::Ne),
            "$gt" => Some(CompareOp::Gt),
            "$gte" => Some(CompareOp::Gte),
            "$lt" => Some(CompareOp::Lt),
            "$lte" => Some(CompareOp::Lte),
            "$in" => Some(CompareOp::In),
            "$nin" => Some(CompareOp::Nin),
            _ => None,
        }
    }

    /// Returns the query-document key of this operator.
    pub fn as_operator(&self) -> &'static str {
        match self {
            CompareOp::Eq => "$eq",
            CompareOp::Ne => "$ne",
            CompareOp::Gt => "$gt",
            CompareOp::Gte => "$gte",
            CompareOp::Lt => "$lt",
            CompareOp::Lte => "$lte",
            CompareOp::In => "$in",
            CompareOp::Nin => "$nin",
        }
    }

    /// Whether the operand is a list of candidate values rather than a single scalar.
    pub fn is_membership(&self) -> bool {
        matches!(self, CompareOp::In | CompareOp::Nin)
    }
}

/// A filter expression for matching documents.
///
/// Field paths may be plain names (`"age"`) or dotted paths into nested documents
/// (`"Order.OrderID"`).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Logical AND of multiple expressions (all must match, vacuously true when empty).
    And(Vec<Expr>),
    /// Logical OR of multiple expressions (any must match, false when empty).
    Or(Vec<Expr>),
    /// Exact equality between the value at `field` and a literal of any type.
    Equals {
        /// The field path to resolve.
        field: String,
        /// The literal to compare against.
        value: Bson,
    },
    /// Type-checked comparison between the value at `field` and an operand.
    Field {
        /// The field path to resolve.
        field: String,
        /// The comparison operator.
        op: CompareOp,
        /// A string or number, or a list of values for membership operators.
        value: Bson,
    },
}

impl Expr {
    /// Creates a field comparison expression.
    pub fn field(field: String, op: CompareOp, value: Bson) -> Self {
        Expr::Field { field, op, value }
    }

    /// Parses a Mongo-style query document.
    ///
    /// Sibling keys form an implicit AND. An empty document matches every document.
    ///
    /// # Errors
    ///
    /// - [`DocumentStoreError::InvalidQuerySyntax`] for a `$and`/`$or` value that is not a
    ///   list of documents, unknown `$` operators, or operator documents mixing operators
    ///   and plain keys
    /// - [`DocumentStoreError::TypeMismatch`] for an ordering operand that is not a string
    ///   or number
    pub fn parse(query: &Document) -> DocumentStoreResult<Self> {
        let mut exprs = query
            .iter()
            .map(|(key, value)| parse_key(key, value))
            .collect::<DocumentStoreResult<Vec<_>>>()?;

        Ok(match exprs.len() {
            1 => exprs.remove(0),
            _ => Expr::And(exprs),
        })
    }

    /// Combines this expression with another using logical AND.
    ///
    /// If this expression is already an AND, the other expression is appended
    /// to the list. Otherwise, a new AND expression is created.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Combines this expression with another using logical OR.
    ///
    /// If this expression is already an OR, the other expression is appended
    /// to the list. Otherwise, a new OR expression is created.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut list) => {
                list.push(other);
                Expr::Or(list)
            }
            _ => Expr::Or(vec![self, other]),
        }
    }
}

fn parse_key(key: &str, value: &Bson) -> DocumentStoreResult<Expr> {
    if key == AND || key == OR {
        let exprs = parse_logical_operands(value)?;
        return Ok(if key == AND { Expr::And(exprs) } else { Expr::Or(exprs) });
    }

    if key.starts_with(OPERATOR_SIGIL) {
        return Err(DocumentStoreError::InvalidQuerySyntax(format!(
            "Unsupported logical operator {key}"
        )));
    }

    match value {
        Bson::Document(operators) if is_operator_document(operators) => {
            parse_operator_document(key, operators)
        }
        _ => Ok(Expr::Equals { field: key.to_string(), value: value.clone() }),
    }
}

fn parse_logical_operands(value: &Bson) -> DocumentStoreResult<Vec<Expr>> {
    let Bson::Array(items) = value else {
        return Err(DocumentStoreError::InvalidQuerySyntax(LOGICAL_SYNTAX_ERROR.to_string()));
    };

    items
        .iter()
        .map(|item| match item {
            Bson::Document(query) => Expr::parse(query),
            _ => Err(DocumentStoreError::InvalidQuerySyntax(LOGICAL_SYNTAX_ERROR.to_string())),
        })
        .collect()
}

fn is_operator_document(document: &Document) -> bool {
    document
        .keys()
        .any(|key| key.starts_with(OPERATOR_SIGIL))
}

fn parse_operator_document(field: &str, operators: &Document) -> DocumentStoreResult<Expr> {
    let mut exprs = Vec::with_capacity(operators.len());

    for (key, operand) in operators {
        if !key.starts_with(OPERATOR_SIGIL) {
            return Err(DocumentStoreError::InvalidQuerySyntax(format!(
                "Operator document for {field} mixes operators with the plain key {key}"
            )));
        }

        let op = CompareOp::from_operator(key).ok_or_else(|| {
            DocumentStoreError::InvalidQuerySyntax(format!("Unsupported comparison operator {key}"))
        })?;
        validate_operand(op, operand)?;

        exprs.push(Expr::field(field.to_string(), op, operand.clone()));
    }

    Ok(match exprs.len() {
        1 => exprs.remove(0),
        _ => Expr::And(exprs),
    })
}

/// Checks that an operand has a shape the operator can evaluate.
///
/// # Errors
///
/// - [`DocumentStoreError::InvalidQuerySyntax`] if a membership operand is not a list
/// - [`DocumentStoreError::TypeMismatch`] if an ordering operand is not a string or number
pub fn validate_operand(op: CompareOp, operand: &Bson) -> DocumentStoreResult<()> {
    if op.is_membership() {
        return match operand {
            Bson::Array(_) => Ok(()),
            _ => Err(DocumentStoreError::InvalidQuerySyntax(format!(
                "{} expects a list of values",
                op.as_operator()
            ))),
        };
    }

    match operand {
        Bson::String(_) | Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) => Ok(()),
        _ => Err(DocumentStoreError::TypeMismatch(INVALID_COMPARISON_TYPE.to_string())),
    }
}

/// A structured query: an optional filter and an optional cap on the number of matches.
///
/// # Example
///
/// ```ignore
/// use memdoc::query::{Query, Filter};
///
/// let first_open = Query::builder()
///     .filter(Filter::eq("status", "open"))
///     .limit(1)
///     .build();
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Optional filter expression to match documents. `None` matches everything.
    pub filter: Option<Expr>,
    /// Maximum number of matching documents to collect before the scan stops.
    /// `None` and `Some(0)` are both unbounded.
    pub limit: Option<usize>,
}

impl Query {
    /// Creates a new query matching every document, with no limit.
    pub fn new() -> Self {
        Query { filter: None, limit: None }
    }

    /// Parses a Mongo-style query document into an unlimited query.
    ///
    /// See [`Expr::parse`] for the accepted syntax and errors.
    pub fn parse(filter: &Document) -> DocumentStoreResult<Self> {
        Ok(Query { filter: Some(Expr::parse(filter)?), limit: None })
    }

    /// Sets the match cap. `0` means unbounded, `1` means "first match only".
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    /// Creates a new query builder for fluent construction.
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }
}

/// Helper struct for constructing filter expressions.
///
/// # Example
///
/// ```ignore
/// use memdoc::query::Filter;
///
/// let expr = Filter::eq("name", "Alice")
///     .and(Filter::gt("age", 18));
/// ```
pub struct Filter;

impl Filter {
    /// Matches documents where the field equals the literal exactly.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::Equals { field: field.into(), value: value.into() }
    }

    /// Matches documents where the field is not equal to the specified value.
    pub fn ne(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), CompareOp::Ne, value.into())
    }

    /// Matches documents where the field is greater than the specified value.
    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), CompareOp::Gt, value.into())
    }

    /// Matches documents where the field is greater than or equal to the specified value.
    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), CompareOp::Gte, value.into())
    }

    /// Matches documents where the field is less than the specified value.
    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), CompareOp::Lt, value.into())
    }

    /// Matches documents where the field is less than or equal to the specified value.
    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), CompareOp::Lte, value.into())
    }

    /// Matches documents where the field equals any of the values.
    pub fn is_in<V: Into<Bson>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Expr {
        Expr::field(
            field.into(),
            CompareOp::In,
            Bson::Array(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Matches documents where the field equals none of the values.
    pub fn not_in<V: Into<Bson>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Expr {
        Expr::field(
            field.into(),
            CompareOp::Nin,
            Bson::Array(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Combines multiple expressions such that all must match.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    /// Combines multiple expressions such that any can match.
    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    /// Creates a new query builder.
    pub fn new() -> Self {
        QueryBuilder { query: Query::default() }
    }

    /// Sets the filter expression for this query.
    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.filter = Some(filter);
        self
    }

    /// Sets the match cap. `0` means unbounded.
    pub fn limit(mut self, limit: usize) -> Self {
        self.query = self.query.with_limit(limit);
        self
    }

    /// Builds and returns the final query.
    pub fn build(self) -> Query {
        self.query
    }
}

/// Walks an [`Expr`] tree, one callback per node kind.
pub trait QueryVisitor {
    type Output;
    type Error: Into<DocumentStoreError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_equals(&mut self, field: &str, value: &Bson) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: CompareOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Equals { field, value } => self.visit_equals(field, value),
            Expr::Field { field, op, value } => self.visit_field(field, *op, value),
        }
    }
}
