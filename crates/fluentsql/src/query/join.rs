//! JOIN clauses.

use super::{BindingType, Boolean, JoinKind, QueryBuilder, TableRef, WhereArgs};
use crate::value::{Param, Value};

/// One join: its kind, target table and `on` predicate list.
///
/// The predicate list is an ordinary [`QueryBuilder`] flagged as a join
/// clause, so nested groups compile with `on` and values bound here land in
/// the parent's `join` bindings.
#[derive(Clone, Debug)]
pub struct JoinClause {
    kind: JoinKind,
    table: TableRef,
    query: QueryBuilder,
}

impl JoinClause {
    fn new(parent: &QueryBuilder, kind: JoinKind, table: TableRef) -> Self {
        let mut query = parent.for_sub_query().into_join_clause();
        query.from_table(table.clone());
        Self { kind, table, query }
    }

    pub fn kind(&self) -> JoinKind {
        self.kind
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    /// Predicate list of the join.
    pub fn query(&self) -> &QueryBuilder {
        &self.query
    }

    /// Add ON first <operator> second.
    pub fn on(&mut self, first: &str, operator: &str, second: &str) -> &mut Self {
        self.query.push_column(first, operator, second, Boolean::And);
        self
    }

    /// Add OR first <operator> second.
    pub fn or_on(&mut self, first: &str, operator: &str, second: &str) -> &mut Self {
        self.query.push_column(first, operator, second, Boolean::Or);
        self
    }

    /// Add a parenthesized group of join predicates.
    pub fn on_nested(&mut self, f: impl FnOnce(&mut JoinClause)) -> &mut Self {
        let mut inner = JoinClause {
            kind: self.kind,
            table: self.table.clone(),
            query: self.query.new_query(),
        };
        f(&mut inner);
        self.query.add_nested_query(inner.query, Boolean::And);
        self
    }

    /// Add a value predicate, with `and`.
    pub fn where_<'a>(&mut self, args: impl Into<WhereArgs<'a>>) -> &mut Self {
        self.query.where_(args);
        self
    }

    /// Add a value predicate, with `or`.
    pub fn or_where<'a>(&mut self, args: impl Into<WhereArgs<'a>>) -> &mut Self {
        self.query.or_where(args);
        self
    }

    pub fn where_null(&mut self, column: &str) -> &mut Self {
        self.query.where_null(column);
        self
    }

    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.query.where_not_null(column);
        self
    }

    pub fn where_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Param>,
    {
        self.query.where_in(column, values);
        self
    }

    pub fn where_raw(&mut self, sql: &str, bindings: Vec<Value>) -> &mut Self {
        self.query.where_raw(sql, bindings);
        self
    }
}

impl QueryBuilder {
    pub(crate) fn from_table(&mut self, table: TableRef) {
        self.from = Some(table);
    }

    /// Add INNER JOIN table ON first <operator> second.
    pub fn join(&mut self, table: &str, first: &str, operator: &str, second: &str) -> &mut Self {
        self.join_with(JoinKind::Inner, table, |j| {
            j.on(first, operator, second);
        })
    }

    /// Add LEFT JOIN table ON first <operator> second.
    pub fn left_join(&mut self, table: &str, first: &str, operator: &str, second: &str) -> &mut Self {
        self.join_with(JoinKind::Left, table, |j| {
            j.on(first, operator, second);
        })
    }

    /// Add RIGHT JOIN table ON first <operator> second.
    pub fn right_join(
        &mut self,
        table: &str,
        first: &str,
        operator: &str,
        second: &str,
    ) -> &mut Self {
        self.join_with(JoinKind::Right, table, |j| {
            j.on(first, operator, second);
        })
    }

    /// Add FULL OUTER JOIN table ON first <operator> second.
    pub fn outer_join(
        &mut self,
        table: &str,
        first: &str,
        operator: &str,
        second: &str,
    ) -> &mut Self {
        self.join_with(JoinKind::Outer, table, |j| {
            j.on(first, operator, second);
        })
    }

    /// Add CROSS JOIN table.
    pub fn cross_join(&mut self, table: &str) -> &mut Self {
        self.join_with(JoinKind::Cross, table, |_| {})
    }

    /// Add a join whose predicates are built by `f`.
    ///
    /// ```ignore
    /// q.join_with(JoinKind::Left, "contacts as c", |j| {
    ///     j.on("users.id", "=", "c.user_id").where_(("c.kind", "email"));
    /// });
    /// ```
    pub fn join_with(
        &mut self,
        kind: JoinKind,
        table: &str,
        f: impl FnOnce(&mut JoinClause),
    ) -> &mut Self {
        let mut join = JoinClause::new(self, kind, TableRef::Name(table.to_string()));
        f(&mut join);
        self.absorb(&join.query, BindingType::Join);
        self.joins.push(join);
        self
    }
}
