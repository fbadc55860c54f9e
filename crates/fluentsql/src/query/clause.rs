//! Clause entries stored in a [`QueryBuilder`].
//!
//! Each clause family is one sum type. Sub-queries are owned by the entry that
//! embeds them and are never shared.

use super::QueryBuilder;
use crate::error::QueryError;
use crate::value::{Expression, Param};
use std::str::FromStr;

/// Statement a builder compiles to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementKind {
    #[default]
    Select,
    Insert,
    Update,
    Delete,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Select => "select",
            StatementKind::Insert => "insert",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
        }
    }

    /// Whether the statement changes data.
    pub fn is_write(&self) -> bool {
        !matches!(self, StatementKind::Select)
    }
}

/// Conjunction prefixed to an entry rendered after the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boolean {
    #[default]
    And,
    Or,
}

impl Boolean {
    pub fn as_str(&self) -> &'static str {
        match self {
            Boolean::And => "and",
            Boolean::Or => "or",
        }
    }
}

/// One predicate of a where (or join `on`) list.
#[derive(Debug, Clone)]
pub enum WhereClause {
    Basic {
        column: String,
        operator: String,
        value: Param,
        boolean: Boolean,
    },
    Raw {
        sql: String,
        boolean: Boolean,
    },
    In {
        column: String,
        values: Vec<Param>,
        not: bool,
        boolean: Boolean,
    },
    InSub {
        column: String,
        query: Box<QueryBuilder>,
        not: bool,
        boolean: Boolean,
    },
    Null {
        column: String,
        not: bool,
        boolean: Boolean,
    },
    Between {
        column: String,
        low: Param,
        high: Param,
        not: bool,
        boolean: Boolean,
    },
    Nested {
        query: Box<QueryBuilder>,
        boolean: Boolean,
    },
    Sub {
        column: String,
        operator: String,
        query: Box<QueryBuilder>,
        boolean: Boolean,
    },
    Exists {
        query: Box<QueryBuilder>,
        not: bool,
        boolean: Boolean,
    },
    Column {
        first: String,
        operator: String,
        second: String,
        boolean: Boolean,
    },
}

impl WhereClause {
    pub fn boolean(&self) -> Boolean {
        match self {
            WhereClause::Basic { boolean, .. }
            | WhereClause::Raw { boolean, .. }
            | WhereClause::In { boolean, .. }
            | WhereClause::InSub { boolean, .. }
            | WhereClause::Null { boolean, .. }
            | WhereClause::Between { boolean, .. }
            | WhereClause::Nested { boolean, .. }
            | WhereClause::Sub { boolean, .. }
            | WhereClause::Exists { boolean, .. }
            | WhereClause::Column { boolean, .. } => *boolean,
        }
    }
}

/// One predicate of a having list.
#[derive(Debug, Clone)]
pub enum HavingClause {
    Basic {
        column: String,
        operator: String,
        value: Param,
        boolean: Boolean,
    },
    Raw {
        sql: String,
        boolean: Boolean,
    },
    Between {
        column: String,
        low: Param,
        high: Param,
        not: bool,
        boolean: Boolean,
    },
}

impl HavingClause {
    pub fn boolean(&self) -> Boolean {
        match self {
            HavingClause::Basic { boolean, .. }
            | HavingClause::Raw { boolean, .. }
            | HavingClause::Between { boolean, .. } => *boolean,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

impl FromStr for Direction {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            _ => Err(QueryError::compile(format!(
                "order direction must be \"asc\" or \"desc\", got {s:?}"
            ))),
        }
    }
}

/// One term of an `order by` list.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderClause {
    Column { column: String, direction: Direction },
    Raw(String),
    /// Dialect random function, with an optional seed.
    Random(Option<String>),
}

/// A selected or grouped column.
#[derive(Debug, Clone)]
pub enum Column {
    Name(String),
    Raw(Expression),
    /// `(subselect) as alias`
    Sub {
        query: Box<QueryBuilder>,
        alias: String,
    },
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Column::Name(name.to_string())
    }
}

impl From<String> for Column {
    fn from(name: String) -> Self {
        Column::Name(name)
    }
}

impl From<Expression> for Column {
    fn from(expr: Expression) -> Self {
        Column::Raw(expr)
    }
}

/// Statement target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableRef {
    /// Possibly aliased: `users as u`.
    Name(String),
    Raw(Expression),
}

impl TableRef {
    /// Table name as written, or the raw SQL.
    pub fn as_str(&self) -> &str {
        match self {
            TableRef::Name(name) => name,
            TableRef::Raw(expr) => expr.as_str(),
        }
    }
}

/// Join flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Cross,
    Outer,
}

impl JoinKind {
    /// SQL keywords preceding `join`.
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinKind::Inner => "inner",
            JoinKind::Left => "left",
            JoinKind::Right => "right",
            JoinKind::Cross => "cross",
            JoinKind::Outer => "full outer",
        }
    }
}

/// Row lock requested on a select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lock {
    /// `for update`
    Exclusive,
    /// `for share` / `lock in share mode`
    Shared,
    /// Emitted verbatim.
    Custom(String),
}

impl From<bool> for Lock {
    fn from(exclusive: bool) -> Self {
        if exclusive { Lock::Exclusive } else { Lock::Shared }
    }
}

impl From<&str> for Lock {
    fn from(sql: &str) -> Self {
        Lock::Custom(sql.to_string())
    }
}

/// Aggregate function replacing the column list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub function: String,
    pub columns: Vec<String>,
}

/// A union member.
#[derive(Debug, Clone)]
pub struct UnionClause {
    pub query: Box<QueryBuilder>,
    pub all: bool,
}

/// Active limit/offset pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Page {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Page {
    pub fn is_empty(&self) -> bool {
        self.limit.is_none() && self.offset.is_none()
    }
}

/// Rows queued for an insert.
#[derive(Debug, Clone, Default)]
pub struct InsertPayload {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Param>>,
}
