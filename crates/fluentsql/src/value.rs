//! Binding values and raw SQL expressions.
//!
//! [`Value`] is what ends up in a binding list; [`Expression`] is SQL text that
//! is emitted verbatim and never bound. Clause methods accept a [`Param`], which
//! is either of the two.

use std::fmt;

/// A scalar bound to a positional `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
    Date(chrono::NaiveDate),
    DateTime(chrono::NaiveDateTime),
    Uuid(uuid::Uuid),
}

impl Value {
    /// Whether this is SQL `NULL`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The text payload, if this is a `Text` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident as $conv:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(<$conv>::from(v))
                }
            }
        )*
    };
}

value_from! {
    bool => Bool as bool,
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int as i64,
    u8 => Int as i64,
    u16 => Int as i64,
    u32 => Int as i64,
    u64 => UInt as u64,
    f32 => Float as f64,
    f64 => Float as f64,
    String => Text as String,
    &str => Text as String,
    Vec<u8> => Bytes as Vec<u8>,
    serde_json::Value => Json as serde_json::Value,
    chrono::NaiveDate => Date as chrono::NaiveDate,
    chrono::NaiveDateTime => DateTime as chrono::NaiveDateTime,
    uuid::Uuid => Uuid as uuid::Uuid,
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::UInt(v as u64)
    }
}

impl<Tz: chrono::TimeZone> From<chrono::DateTime<Tz>> for Value {
    fn from(v: chrono::DateTime<Tz>) -> Self {
        Value::DateTime(v.naive_utc())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// SQL text emitted verbatim: never quoted, escaped or parameterized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expression(String);

impl Expression {
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shorthand for [`Expression::new`].
pub fn raw(sql: impl Into<String>) -> Expression {
    Expression::new(sql)
}

/// Operand accepted by clause methods.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// Rendered as `?` and appended to the bindings.
    Value(Value),
    /// Rendered verbatim.
    Expr(Expression),
}

impl Param {
    /// The bound value, or `None` for an expression.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Param::Value(v) => Some(v),
            Param::Expr(_) => None,
        }
    }

    pub fn is_expression(&self) -> bool {
        matches!(self, Param::Expr(_))
    }

    pub(crate) fn is_null(&self) -> bool {
        matches!(self, Param::Value(Value::Null))
    }
}

impl From<Value> for Param {
    fn from(v: Value) -> Self {
        Param::Value(v)
    }
}

impl From<Expression> for Param {
    fn from(e: Expression) -> Self {
        Param::Expr(e)
    }
}

impl<T: Into<Value>> From<Option<T>> for Param {
    fn from(v: Option<T>) -> Self {
        Param::Value(v.into())
    }
}

macro_rules! param_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Param {
                fn from(v: $ty) -> Self {
                    Param::Value(Value::from(v))
                }
            }
        )*
    };
}

param_from_value!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    String,
    &str,
    &String,
    Vec<u8>,
    serde_json::Value,
    chrono::NaiveDate,
    chrono::NaiveDateTime,
    uuid::Uuid,
);

impl<Tz: chrono::TimeZone> From<chrono::DateTime<Tz>> for Param {
    fn from(v: chrono::DateTime<Tz>) -> Self {
        Param::Value(Value::from(v))
    }
}
