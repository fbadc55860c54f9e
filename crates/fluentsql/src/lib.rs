//! # fluentsql
//!
//! A fluent SQL query builder with a multi-dialect compiler.
//!
//! ## Features
//!
//! - **Mutable builder**: chain `&mut self` methods, then `compile()`
//! - **Positional bindings**: every `?` in the SQL has exactly one binding, in order
//! - **Dialects**: ANSI, MySQL, PostgreSQL, SQLite and SQL Server grammars
//! - **Raw escape hatch**: [`Expression`] values render verbatim and are never bound
//! - **Safe edge cases**: empty `IN` lists compile to `0 = 1` / `1 = 1`
//!
//! ## Example
//!
//! ```ignore
//! use fluentsql::{Dialect, QueryBuilder, WhereArgs};
//!
//! let mut q = QueryBuilder::for_dialect(Dialect::Postgres);
//! q.from("users")
//!     .where_(("active", true))
//!     .where_(WhereArgs::closure(|q| {
//!         q.where_(("role", "admin")).or_where(("votes", ">", 100));
//!     }))
//!     .order_by_desc("id")
//!     .limit(10);
//!
//! let built = q.compile()?;
//! assert_eq!(
//!     built.sql,
//!     r#"select * from "users" where "active" = ? and ("role" = ? or "votes" > ?) order by "id" desc limit 10"#
//! );
//! assert_eq!(built.bindings.len(), 3);
//! ```

pub mod built;
pub mod error;
pub mod grammar;
pub mod query;
pub mod value;

pub use built::BuiltQuery;
pub use error::{QueryError, QueryResult};
pub use grammar::{
    AnsiGrammar, Dialect, Grammar, GrammarConfig, MySqlGrammar, NoConnectionQuoter,
    PostgresGrammar, Quoter, Quoting, SqlServerGrammar, SqliteGrammar, escape_with_no_connection,
};
pub use query::{
    BindingType, Bindings, Boolean, Column, Direction, JoinClause, JoinKind, Lock, Page,
    QueryBuilder, StatementKind, WhereArgs, WhereClause,
};
pub use value::{Expression, Param, Value, raw};

/// Empty builder on `table` for a dialect with default grammar settings.
pub fn table(dialect: Dialect, table: &str) -> QueryBuilder {
    let mut q = QueryBuilder::for_dialect(dialect);
    q.from(table);
    q
}
