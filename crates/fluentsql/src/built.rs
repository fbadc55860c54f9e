use crate::grammar::{Quoter, count_placeholders, interpolate};
use crate::value::Value;
use std::fmt;

/// Compiled SQL with its positional `?` bindings, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub bindings: Vec<Value>,
}

impl BuiltQuery {
    pub fn new(sql: impl Into<String>, bindings: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            bindings,
        }
    }

    /// Number of `?` placeholders outside quoted literals.
    pub fn placeholder_count(&self) -> usize {
        count_placeholders(&self.sql)
    }

    /// SQL with every binding inlined as a literal. For logs and debugging only.
    pub fn interpolate(&self, quoter: &dyn Quoter) -> String {
        interpolate(&self.sql, &self.bindings, quoter)
    }
}

impl fmt::Display for BuiltQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
