//! Error types for fluentsql

use thiserror::Error;

/// Result type alias for query building and compilation.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised while building or compiling a query.
///
/// Builder methods never return `Result`; instead the first error they hit is
/// recorded on the builder and returned by [`QueryBuilder::compile`](crate::QueryBuilder::compile).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Structural problem: missing table, empty insert payload, unknown binding type...
    #[error("SQL compile error: {0}")]
    Compile(String),

    /// Operator and value combination that cannot produce valid SQL.
    #[error("Illegal operator and value combination: '{operator}' {reason}")]
    InvalidOperator { operator: String, reason: String },
}

impl QueryError {
    /// Create a compile error
    pub fn compile(message: impl Into<String>) -> Self {
        Self::Compile(message.into())
    }

    /// Create an invalid operator error
    pub fn invalid_operator(operator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOperator {
            operator: operator.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a compile error
    pub fn is_compile(&self) -> bool {
        matches!(self, Self::Compile(_))
    }

    /// Check if this is an invalid operator error
    pub fn is_invalid_operator(&self) -> bool {
        matches!(self, Self::InvalidOperator { .. })
    }
}
