//! Dialect grammars: translate a [`QueryBuilder`] into SQL text plus bindings.
//!
//! Every dialect shares the clause skeleton in [`compile`] and overrides a small
//! set of hooks on [`Grammar`]:
//!
//! | Dialect     | Quoting  | Overrides                                                     |
//! |-------------|----------|---------------------------------------------------------------|
//! | ANSI        | `"a"`    | none                                                          |
//! | MySQL       | `` `a` ``| JSON paths, `json_set` updates, update/delete with joins, locks |
//! | Postgres    | `"a"`    | JSON paths, locks, `returning` for inserted ids                |
//! | SQLite      | `"a"`    | JSON paths, `limit -1` for offset-only paging                  |
//! | SQL Server  | `[a]`    | `top`, `offset .. fetch`, table lock hints, JSON paths         |
//!
//! Grammars never mutate the builder they compile.

mod ansi;
pub mod compile;
mod mysql;
mod postgres;
mod quoting;
mod sqlite;
mod sqlserver;


pub use ansi::AnsiGrammar;
pub use mysql::MySqlGrammar;
pub use postgres::PostgresGrammar;
pub use quoting::{
    GrammarConfig, NoConnectionQuoter, Quoter, Quoting, count_placeholders,
    escape_with_no_connection, interpolate,
};
pub use sqlite::SqliteGrammar;
pub use sqlserver::SqlServerGrammar;

use crate::built::BuiltQuery;
use crate::error::QueryResult;
use crate::query::{Aggregate, Column, Lock, OrderClause, Page, QueryBuilder, TableRef};
use crate::value::{Param, Value};
use std::fmt;
use std::sync::Arc;

/// Operators every dialect recognizes.
pub const GENERIC_OPERATORS: &[&str] = &[
    "=", "<", ">", "<=", ">=", "<>", "!=", "<=>", "like", "like binary", "not like", "between",
    "ilike", "&", "|", "^", "<<", ">>", "rlike", "regexp", "not regexp", "~", "~*", "!~", "!~*",
    "similar to", "not similar to", "not ilike", "~~*", "!~~*",
];

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    Ansi,
    MySql,
    Postgres,
    SqlServer,
    Sqlite,
}

impl Dialect {
    /// Pick a dialect from a driver name. Unknown names fall back to ANSI.
    pub fn from_driver(driver: &str) -> Self {
        match driver.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Dialect::MySql,
            "pgsql" | "postgres" | "postgresql" => Dialect::Postgres,
            "sqlsrv" | "mssql" | "dblib" => Dialect::SqlServer,
            "sqlite" => Dialect::Sqlite,
            _ => Dialect::Ansi,
        }
    }

    /// Canonical driver name.
    pub fn driver_name(&self) -> &'static str {
        match self {
            Dialect::Ansi => "ansi",
            Dialect::MySql => "mysql",
            Dialect::Postgres => "pgsql",
            Dialect::SqlServer => "sqlsrv",
            Dialect::Sqlite => "sqlite",
        }
    }

    /// Grammar with default settings.
    pub fn grammar(self) -> Arc<dyn Grammar> {
        self.grammar_with(GrammarConfig::default())
    }

    /// Grammar with explicit quoting / table prefix settings.
    pub fn grammar_with(self, config: GrammarConfig) -> Arc<dyn Grammar> {
        match self {
            Dialect::Ansi => Arc::new(AnsiGrammar::new(config)),
            Dialect::MySql => Arc::new(MySqlGrammar::new(config)),
            Dialect::Postgres => Arc::new(PostgresGrammar::new(config)),
            Dialect::SqlServer => Arc::new(SqlServerGrammar::new(config)),
            Dialect::Sqlite => Arc::new(SqliteGrammar::new(config)),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.driver_name())
    }
}

/// A SQL dialect.
///
/// Only [`dialect`](Grammar::dialect), [`config`](Grammar::config) and
/// [`quoting`](Grammar::quoting) are required; everything else defaults to the
/// shared skeleton in [`compile`].
pub trait Grammar: Send + Sync + fmt::Debug {
    fn dialect(&self) -> Dialect;

    fn config(&self) -> &GrammarConfig;

    /// Effective identifier quoting.
    fn quoting(&self) -> &Quoting;

    /// Dialect-specific operators, on top of [`GENERIC_OPERATORS`].
    fn operators(&self) -> &'static [&'static str] {
        &[]
    }

    fn table_prefix(&self) -> &str {
        &self.config().table_prefix
    }

    /// Whether `operator` is known to this dialect (case-insensitive).
    fn is_operator(&self, operator: &str) -> bool {
        let op = operator.to_ascii_lowercase();
        GENERIC_OPERATORS.contains(&op.as_str()) || self.operators().contains(&op.as_str())
    }

    // ==================== Identifiers ====================

    /// Quote one identifier segment.
    fn wrap_value(&self, segment: &str) -> String {
        self.quoting().quote_segment(segment)
    }

    /// Render `field->a->b`; `field` is already wrapped.
    ///
    /// `None` means the dialect has no JSON path syntax and the column is
    /// quoted as a plain identifier.
    fn wrap_json_selector(&self, _field: &str, _path: &[&str]) -> Option<String> {
        None
    }

    /// Quote a column reference (aliases, dotted names and JSON paths included).
    fn wrap(&self, value: &str) -> String {
        compile::wrap(self, value)
    }

    /// Quote a table reference, applying the table prefix.
    fn wrap_table(&self, table: &str) -> String {
        compile::wrap_table(self, table)
    }

    // ==================== Clause hooks ====================

    fn compile_columns(&self, query: &QueryBuilder, columns: &[Column]) -> QueryResult<String> {
        compile::columns(self, query, columns)
    }

    /// `select fn(columns) as aggregate`, used in place of the column list.
    fn compile_aggregate(&self, query: &QueryBuilder, aggregate: &Aggregate) -> String {
        compile::aggregate(self, query, aggregate)
    }

    fn compile_from(&self, _query: &QueryBuilder, table: &TableRef) -> String {
        compile::from(self, table)
    }

    fn compile_orders(&self, _query: &QueryBuilder, orders: &[OrderClause], _page: Page) -> String {
        compile::orders(self, orders)
    }

    fn compile_limit(&self, _query: &QueryBuilder, page: Page) -> String {
        page.limit.map(|n| format!("limit {n}")).unwrap_or_default()
    }

    fn compile_offset(&self, _query: &QueryBuilder, page: Page) -> String {
        page.offset.map(|n| format!("offset {n}")).unwrap_or_default()
    }

    /// Ordering and paging applied to the combined result of a union.
    fn compile_union_page(&self, query: &QueryBuilder) -> String {
        compile::union_page(self, query)
    }

    /// Whether union members are parenthesized.
    fn wraps_union_arms(&self) -> bool {
        false
    }

    fn compile_lock(&self, _query: &QueryBuilder, lock: &Lock) -> String {
        match lock {
            Lock::Custom(sql) => sql.clone(),
            Lock::Exclusive | Lock::Shared => String::new(),
        }
    }

    fn compile_random(&self, _seed: Option<&str>) -> String {
        "random()".to_string()
    }

    /// One `column = value` assignment of an update; pushes its binding if any.
    fn compile_update_column(&self, column: &str, value: &Param, bindings: &mut Vec<Value>) -> String {
        compile::update_column(self, column, value, bindings)
    }

    // ==================== Statements ====================

    fn compile_select(&self, query: &QueryBuilder) -> QueryResult<BuiltQuery> {
        compile::select(self, query)
    }

    fn compile_insert(&self, query: &QueryBuilder) -> QueryResult<BuiltQuery> {
        compile::insert(self, query)
    }

    /// Insert that reports the generated key; `sequence` names the key column.
    fn compile_insert_get_id(&self, query: &QueryBuilder, _sequence: &str) -> QueryResult<BuiltQuery> {
        self.compile_insert(query)
    }

    fn compile_update(&self, query: &QueryBuilder) -> QueryResult<BuiltQuery> {
        compile::update(self, query)
    }

    fn compile_delete(&self, query: &QueryBuilder) -> QueryResult<BuiltQuery> {
        compile::delete(self, query)
    }
}

/// Resolve quoting for a grammar: explicit override first, dialect default otherwise.
pub(crate) fn resolve_quoting(config: &GrammarConfig, default: fn() -> Quoting) -> Quoting {
    config.quoting.clone().unwrap_or_else(default)
}
