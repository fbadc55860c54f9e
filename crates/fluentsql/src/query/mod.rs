//! The query model: a mutable, chainable description of one SQL statement.
//!
//! # Usage
//!
//! ```ignore
//! use fluentsql::{Dialect, QueryBuilder};
//!
//! let mut q = QueryBuilder::for_dialect(Dialect::MySql);
//! q.from("users")
//!     .where_(("status", "active"))
//!     .or_where(("votes", ">", 100))
//!     .order_by_desc("created_at")
//!     .limit(20);
//!
//! let built = q.compile()?;
//! // select * from `users` where `status` = ? or `votes` > ? order by `created_at` desc limit 20
//! ```
//!
//! Builder methods never fail. The first error they hit (an illegal operator
//! and value combination, an unknown order direction...) is kept and returned
//! by [`QueryBuilder::compile`].

mod bindings;
mod clause;
mod clauses;
mod join;
mod mutation;
mod where_clause;

#[cfg(test)]
mod tests;

pub use bindings::{BindingType, Bindings};
pub use clause::{
    Aggregate, Boolean, Column, Direction, HavingClause, InsertPayload, JoinKind, Lock,
    OrderClause, Page, StatementKind, TableRef, UnionClause, WhereClause,
};
pub use join::JoinClause;
pub use where_clause::WhereArgs;

use crate::built::BuiltQuery;
use crate::error::{QueryError, QueryResult};
use crate::grammar::{Dialect, Grammar};
use crate::value::{Expression, Param, Value};
use std::sync::Arc;

/// Mutable builder for one select, insert, update or delete statement.
#[derive(Clone, Debug)]
pub struct QueryBuilder {
    grammar: Arc<dyn Grammar>,
    kind: StatementKind,
    from: Option<TableRef>,
    pub(crate) columns: Option<Vec<Column>>,
    distinct: bool,
    pub(crate) aggregate: Option<Aggregate>,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) wheres: Vec<WhereClause>,
    pub(crate) groups: Vec<Column>,
    pub(crate) havings: Vec<HavingClause>,
    pub(crate) orders: Vec<OrderClause>,
    page: Page,
    pub(crate) unions: Vec<UnionClause>,
    pub(crate) union_orders: Vec<OrderClause>,
    union_page: Page,
    lock: Option<Lock>,
    bindings: Bindings,
    insert: Option<InsertPayload>,
    updates: Vec<(String, Param)>,
    sequence: Option<String>,
    use_writer: bool,
    is_join: bool,
    build_error: Option<QueryError>,
}

impl QueryBuilder {
    /// Create an empty select builder compiled by `grammar`.
    pub fn new(grammar: Arc<dyn Grammar>) -> Self {
        Self {
            grammar,
            kind: StatementKind::Select,
            from: None,
            columns: None,
            distinct: false,
            aggregate: None,
            joins: Vec::new(),
            wheres: Vec::new(),
            groups: Vec::new(),
            havings: Vec::new(),
            orders: Vec::new(),
            page: Page::default(),
            unions: Vec::new(),
            union_orders: Vec::new(),
            union_page: Page::default(),
            lock: None,
            bindings: Bindings::new(),
            insert: None,
            updates: Vec::new(),
            sequence: None,
            use_writer: false,
            is_join: false,
            build_error: None,
        }
    }

    /// Create an empty builder for a dialect with default grammar settings.
    pub fn for_dialect(dialect: Dialect) -> Self {
        Self::new(dialect.grammar())
    }

    /// Empty builder on the same grammar and table.
    ///
    /// Builders created from a join clause stay join clauses, so their
    /// predicates compile with `on`.
    pub fn new_query(&self) -> QueryBuilder {
        let mut q = QueryBuilder::new(Arc::clone(&self.grammar));
        q.from = self.from.clone();
        q.is_join = self.is_join;
        q
    }

    /// Empty builder on the same grammar, for sub-selects.
    pub(crate) fn for_sub_query(&self) -> QueryBuilder {
        QueryBuilder::new(Arc::clone(&self.grammar))
    }

    pub(crate) fn into_join_clause(mut self) -> Self {
        self.is_join = true;
        self
    }

    /// Record the first builder error; later ones are dropped.
    pub(crate) fn fail(&mut self, err: QueryError) {
        if self.build_error.is_none() {
            self.build_error = Some(err);
        }
    }

    /// Fold a sub-query into this one: its error and its flattened bindings.
    pub(crate) fn absorb(&mut self, sub: &QueryBuilder, ty: BindingType) {
        if let Some(err) = &sub.build_error {
            self.fail(err.clone());
        }
        self.bindings.extend(ty, sub.get_bindings());
    }

    pub(crate) fn push_binding(&mut self, ty: BindingType, param: &Param) {
        if let Some(value) = param.value() {
            self.bindings.push(ty, value.clone());
        }
    }

    // ==================== Accessors ====================

    pub fn grammar(&self) -> &Arc<dyn Grammar> {
        &self.grammar
    }

    pub fn dialect(&self) -> Dialect {
        self.grammar.dialect()
    }

    /// Statement the builder compiles to.
    pub fn statement_kind(&self) -> StatementKind {
        self.kind
    }

    pub fn table(&self) -> Option<&TableRef> {
        self.from.as_ref()
    }

    /// Selected columns; `None` means `*`.
    pub fn columns(&self) -> Option<&[Column]> {
        self.columns.as_deref()
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn aggregate(&self) -> Option<&Aggregate> {
        self.aggregate.as_ref()
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    pub fn wheres(&self) -> &[WhereClause] {
        &self.wheres
    }

    pub fn groups(&self) -> &[Column] {
        &self.groups
    }

    pub fn havings(&self) -> &[HavingClause] {
        &self.havings
    }

    pub fn orders(&self) -> &[OrderClause] {
        &self.orders
    }

    pub fn union_orders(&self) -> &[OrderClause] {
        &self.union_orders
    }

    /// Limit/offset of the statement itself.
    pub fn page(&self) -> Page {
        self.page
    }

    /// Limit/offset of the combined union result.
    pub fn union_page(&self) -> Page {
        self.union_page
    }

    pub fn unions(&self) -> &[UnionClause] {
        &self.unions
    }

    pub fn lock_mode(&self) -> Option<&Lock> {
        self.lock.as_ref()
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Bindings of one category.
    pub fn bindings_for(&self, ty: BindingType) -> &[Value] {
        self.bindings.get(ty)
    }

    /// Bindings of a category given by name (`"where"`, `"join"`...).
    pub fn bindings_named(&self, name: &str) -> QueryResult<&[Value]> {
        Ok(self.bindings.get(name.parse()?))
    }

    /// Every binding, flattened as select, join, where, having, order, union.
    pub fn get_bindings(&self) -> Vec<Value> {
        self.bindings.flatten()
    }

    pub fn insert_payload(&self) -> Option<&InsertPayload> {
        self.insert.as_ref()
    }

    pub fn update_values(&self) -> &[(String, Param)] {
        &self.updates
    }

    /// Key column requested by [`insert_get_id`](Self::insert_get_id).
    pub fn insert_sequence(&self) -> Option<&str> {
        self.sequence.as_deref()
    }

    /// Whether a select must be routed to the writer.
    pub fn uses_writer(&self) -> bool {
        self.use_writer
    }

    pub fn is_join_clause(&self) -> bool {
        self.is_join
    }

    /// First error recorded while building.
    pub fn build_error(&self) -> Option<&QueryError> {
        self.build_error.as_ref()
    }

    // ==================== Target and columns ====================

    /// Set the target table; `"users as u"` aliases it.
    pub fn from(&mut self, table: &str) -> &mut Self {
        self.from = Some(TableRef::Name(table.to_string()));
        self
    }

    /// Set a raw FROM expression.
    pub fn from_raw(&mut self, expr: Expression) -> &mut Self {
        self.from = Some(TableRef::Raw(expr));
        self
    }

    /// Replace the selected columns.
    pub fn select<I, C>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Column>,
    {
        self.kind = StatementKind::Select;
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self.bindings.clear(BindingType::Select);
        self
    }

    /// Append selected columns.
    pub fn add_select<I, C>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Column>,
    {
        self.columns
            .get_or_insert_with(Vec::new)
            .extend(columns.into_iter().map(Into::into));
        self
    }

    /// Append a raw select expression with its bindings.
    pub fn select_raw(&mut self, sql: &str, bindings: Vec<Value>) -> &mut Self {
        self.columns
            .get_or_insert_with(Vec::new)
            .push(Column::Raw(Expression::new(sql)));
        self.bindings.extend(BindingType::Select, bindings);
        self
    }

    /// Append `(subselect) as alias`.
    pub fn select_sub(&mut self, alias: &str, f: impl FnOnce(&mut QueryBuilder)) -> &mut Self {
        let mut sub = self.for_sub_query();
        f(&mut sub);
        self.absorb(&sub, BindingType::Select);
        self.columns.get_or_insert_with(Vec::new).push(Column::Sub {
            query: Box::new(sub),
            alias: alias.to_string(),
        });
        self
    }

    pub fn distinct(&mut self) -> &mut Self {
        self.distinct = true;
        self
    }

    /// Route this select to the writer connection.
    pub fn use_writer(&mut self) -> &mut Self {
        self.use_writer = true;
        self
    }

    // ==================== Compile ====================

    /// Return the first error recorded while building, if any.
    pub fn validate(&self) -> QueryResult<()> {
        match &self.build_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Compile to SQL text plus bindings. The builder is left untouched.
    pub fn compile(&self) -> QueryResult<BuiltQuery> {
        self.validate()?;
        match self.kind {
            StatementKind::Select => self.grammar.compile_select(self),
            StatementKind::Insert => match &self.sequence {
                Some(sequence) => self.grammar.compile_insert_get_id(self, sequence),
                None => self.grammar.compile_insert(self),
            },
            StatementKind::Update => self.grammar.compile_update(self),
            StatementKind::Delete => self.grammar.compile_delete(self),
        }
    }

    /// Compiled SQL text only.
    pub fn to_sql(&self) -> QueryResult<String> {
        self.compile().map(|built| built.sql)
    }
}
