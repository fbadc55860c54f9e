//! WHERE clause construction.

use super::{BindingType, Boolean, QueryBuilder, WhereClause};
use crate::error::QueryError;
use crate::value::{Expression, Param, Value};

/// Call shapes accepted by [`QueryBuilder::where_`].
///
/// - `(column, value)`: compare with `=`
/// - `(column, operator, value)`: an unknown operator is taken as the value
///   and compared with `=`; the third element is ignored
/// - [`WhereArgs::closure`]: parenthesized group built on a fresh builder
/// - `vec![(column, value), ...]`: parenthesized group of `and`-ed equalities
pub enum WhereArgs<'a> {
    TwoArg {
        column: &'a str,
        value: Param,
    },
    ThreeArg {
        column: &'a str,
        operator: &'a str,
        value: Param,
    },
    Closure(Box<dyn FnOnce(&mut QueryBuilder) + 'a>),
    Map(Vec<(&'a str, Param)>),
}

impl<'a> WhereArgs<'a> {
    pub fn closure(f: impl FnOnce(&mut QueryBuilder) + 'a) -> Self {
        WhereArgs::Closure(Box::new(f))
    }
}

impl<'a, V: Into<Param>> From<(&'a str, V)> for WhereArgs<'a> {
    fn from((column, value): (&'a str, V)) -> Self {
        WhereArgs::TwoArg {
            column,
            value: value.into(),
        }
    }
}

impl<'a, V: Into<Param>> From<(&'a str, &'a str, V)> for WhereArgs<'a> {
    fn from((column, operator, value): (&'a str, &'a str, V)) -> Self {
        WhereArgs::ThreeArg {
            column,
            operator,
            value: value.into(),
        }
    }
}

impl<'a, V: Into<Param>> From<Vec<(&'a str, V)>> for WhereArgs<'a> {
    fn from(pairs: Vec<(&'a str, V)>) -> Self {
        WhereArgs::Map(pairs.into_iter().map(|(c, v)| (c, v.into())).collect())
    }
}

impl QueryBuilder {
    // ==================== Basic ====================

    /// Add WHERE ... with `and`.
    ///
    /// ```ignore
    /// q.where_(("id", 1))
    ///     .where_(("votes", ">=", 100))
    ///     .where_(vec![("status", "active"), ("role", "admin")])
    ///     .where_(WhereArgs::closure(|q| {
    ///         q.where_(("a", 1)).or_where(("b", 2));
    ///     }));
    /// ```
    pub fn where_<'a>(&mut self, args: impl Into<WhereArgs<'a>>) -> &mut Self {
        self.add_where(args.into(), Boolean::And);
        self
    }

    /// Add WHERE ... with `or`.
    pub fn or_where<'a>(&mut self, args: impl Into<WhereArgs<'a>>) -> &mut Self {
        self.add_where(args.into(), Boolean::Or);
        self
    }

    fn add_where(&mut self, args: WhereArgs<'_>, boolean: Boolean) {
        match args {
            WhereArgs::TwoArg { column, value } => self.push_basic(column, "=", value, boolean),
            WhereArgs::ThreeArg {
                column,
                operator,
                value,
            } => {
                if self.grammar().is_operator(operator) {
                    self.push_basic(column, operator, value, boolean);
                } else {
                    self.push_basic(column, "=", Param::from(operator), boolean);
                }
            }
            WhereArgs::Closure(f) => self.nested(f, boolean),
            // Pairs inside the group join with the same boolean as the group.
            WhereArgs::Map(pairs) => self.nested(
                move |q: &mut QueryBuilder| {
                    for (column, value) in pairs {
                        q.push_basic(column, "=", value, boolean);
                    }
                },
                boolean,
            ),
        }
    }

    fn push_basic(&mut self, column: &str, operator: &str, value: Param, boolean: Boolean) {
        let operator = operator.to_ascii_lowercase();

        if value.is_null() {
            match operator.as_str() {
                "=" => self.push_null(column, false, boolean),
                "<>" | "!=" => self.push_null(column, true, boolean),
                _ => self.fail(QueryError::invalid_operator(
                    operator,
                    "cannot be used to compare with null",
                )),
            }
            return;
        }

        // JSON booleans compare as literals, not as bound 0/1.
        let value = match value {
            Param::Value(Value::Bool(b)) if column.contains("->") => {
                Param::Expr(Expression::new(if b { "true" } else { "false" }))
            }
            other => other,
        };

        self.push_binding(BindingType::Where, &value);
        self.wheres.push(WhereClause::Basic {
            column: column.to_string(),
            operator,
            value,
            boolean,
        });
    }

    // ==================== Nested ====================

    /// Add WHERE (...) built by `f` on a fresh builder, with `and`.
    pub fn where_nested(&mut self, f: impl FnOnce(&mut QueryBuilder)) -> &mut Self {
        self.nested(f, Boolean::And);
        self
    }

    /// Add WHERE (...) built by `f` on a fresh builder, with `or`.
    pub fn or_where_nested(&mut self, f: impl FnOnce(&mut QueryBuilder)) -> &mut Self {
        self.nested(f, Boolean::Or);
        self
    }

    fn nested(&mut self, f: impl FnOnce(&mut QueryBuilder), boolean: Boolean) {
        let mut q = self.new_query();
        f(&mut q);
        self.add_nested_query(q, boolean);
    }

    /// Embed the predicates of `query` as one parenthesized group.
    ///
    /// Only the predicates render, so only their bindings are taken; joins,
    /// columns, havings and orders on `query` are ignored. A group without
    /// predicates is dropped.
    pub fn add_nested_query(&mut self, query: QueryBuilder, boolean: Boolean) -> &mut Self {
        if let Some(err) = query.build_error() {
            self.fail(err.clone());
        }
        if query.wheres.is_empty() {
            return self;
        }
        self.bindings.extend(
            BindingType::Where,
            query.bindings_for(BindingType::Where).iter().cloned(),
        );
        self.wheres.push(WhereClause::Nested {
            query: Box::new(query),
            boolean,
        });
        self
    }

    /// Apply `f` only when `condition` holds.
    pub fn when(&mut self, condition: bool, f: impl FnOnce(&mut QueryBuilder)) -> &mut Self {
        if condition {
            f(self);
        }
        self
    }

    // ==================== Raw ====================

    /// Add a raw predicate with its bindings, with `and`.
    pub fn where_raw(&mut self, sql: &str, bindings: Vec<Value>) -> &mut Self {
        self.push_raw(sql, bindings, Boolean::And);
        self
    }

    /// Add a raw predicate with its bindings, with `or`.
    pub fn or_where_raw(&mut self, sql: &str, bindings: Vec<Value>) -> &mut Self {
        self.push_raw(sql, bindings, Boolean::Or);
        self
    }

    fn push_raw(&mut self, sql: &str, bindings: Vec<Value>, boolean: Boolean) {
        self.bindings.extend(BindingType::Where, bindings);
        self.wheres.push(WhereClause::Raw {
            sql: sql.to_string(),
            boolean,
        });
    }

    // ==================== IN ====================

    /// Add WHERE column IN (...). An empty list never matches.
    pub fn where_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Param>,
    {
        self.push_in(column, values, false, Boolean::And);
        self
    }

    /// Add WHERE column NOT IN (...). An empty list always matches.
    pub fn where_not_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Param>,
    {
        self.push_in(column, values, true, Boolean::And);
        self
    }

    pub fn or_where_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Param>,
    {
        self.push_in(column, values, false, Boolean::Or);
        self
    }

    pub fn or_where_not_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Param>,
    {
        self.push_in(column, values, true, Boolean::Or);
        self
    }

    fn push_in<I, V>(&mut self, column: &str, values: I, not: bool, boolean: Boolean)
    where
        I: IntoIterator<Item = V>,
        V: Into<Param>,
    {
        let values: Vec<Param> = values.into_iter().map(Into::into).collect();
        for value in &values {
            self.push_binding(BindingType::Where, value);
        }
        self.wheres.push(WhereClause::In {
            column: column.to_string(),
            values,
            not,
            boolean,
        });
    }

    /// Add WHERE column IN (subselect).
    pub fn where_in_sub(&mut self, column: &str, f: impl FnOnce(&mut QueryBuilder)) -> &mut Self {
        self.push_in_sub(column, f, false, Boolean::And);
        self
    }

    /// Add WHERE column NOT IN (subselect).
    pub fn where_not_in_sub(
        &mut self,
        column: &str,
        f: impl FnOnce(&mut QueryBuilder),
    ) -> &mut Self {
        self.push_in_sub(column, f, true, Boolean::And);
        self
    }

    fn push_in_sub(
        &mut self,
        column: &str,
        f: impl FnOnce(&mut QueryBuilder),
        not: bool,
        boolean: Boolean,
    ) {
        let mut sub = self.for_sub_query();
        f(&mut sub);
        self.absorb(&sub, BindingType::Where);
        self.wheres.push(WhereClause::InSub {
            column: column.to_string(),
            query: Box::new(sub),
            not,
            boolean,
        });
    }

    // ==================== NULL ====================

    /// Add WHERE column IS NULL
    pub fn where_null(&mut self, column: &str) -> &mut Self {
        self.push_null(column, false, Boolean::And);
        self
    }

    /// Add WHERE column IS NOT NULL
    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.push_null(column, true, Boolean::And);
        self
    }

    pub fn or_where_null(&mut self, column: &str) -> &mut Self {
        self.push_null(column, false, Boolean::Or);
        self
    }

    pub fn or_where_not_null(&mut self, column: &str) -> &mut Self {
        self.push_null(column, true, Boolean::Or);
        self
    }

    fn push_null(&mut self, column: &str, not: bool, boolean: Boolean) {
        self.wheres.push(WhereClause::Null {
            column: column.to_string(),
            not,
            boolean,
        });
    }

    // ==================== BETWEEN ====================

    /// Add WHERE column BETWEEN low AND high
    pub fn where_between(
        &mut self,
        column: &str,
        low: impl Into<Param>,
        high: impl Into<Param>,
    ) -> &mut Self {
        self.push_between(column, low.into(), high.into(), false, Boolean::And);
        self
    }

    /// Add WHERE column NOT BETWEEN low AND high
    pub fn where_not_between(
        &mut self,
        column: &str,
        low: impl Into<Param>,
        high: impl Into<Param>,
    ) -> &mut Self {
        self.push_between(column, low.into(), high.into(), true, Boolean::And);
        self
    }

    pub fn or_where_between(
        &mut self,
        column: &str,
        low: impl Into<Param>,
        high: impl Into<Param>,
    ) -> &mut Self {
        self.push_between(column, low.into(), high.into(), false, Boolean::Or);
        self
    }

    pub fn or_where_not_between(
        &mut self,
        column: &str,
        low: impl Into<Param>,
        high: impl Into<Param>,
    ) -> &mut Self {
        self.push_between(column, low.into(), high.into(), true, Boolean::Or);
        self
    }

    fn push_between(&mut self, column: &str, low: Param, high: Param, not: bool, boolean: Boolean) {
        self.push_binding(BindingType::Where, &low);
        self.push_binding(BindingType::Where, &high);
        self.wheres.push(WhereClause::Between {
            column: column.to_string(),
            low,
            high,
            not,
            boolean,
        });
    }

    // ==================== Sub-selects ====================

    /// Add WHERE column <operator> (subselect).
    pub fn where_sub(
        &mut self,
        column: &str,
        operator: &str,
        f: impl FnOnce(&mut QueryBuilder),
    ) -> &mut Self {
        self.push_sub(column, operator, f, Boolean::And);
        self
    }

    /// Add OR column <operator> (subselect).
    pub fn or_where_sub(
        &mut self,
        column: &str,
        operator: &str,
        f: impl FnOnce(&mut QueryBuilder),
    ) -> &mut Self {
        self.push_sub(column, operator, f, Boolean::Or);
        self
    }

    fn push_sub(
        &mut self,
        column: &str,
        operator: &str,
        f: impl FnOnce(&mut QueryBuilder),
        boolean: Boolean,
    ) {
        if !self.grammar().is_operator(operator) {
            self.fail(QueryError::invalid_operator(
                operator,
                "is not a recognized comparison operator",
            ));
            return;
        }
        let mut sub = self.for_sub_query();
        f(&mut sub);
        self.absorb(&sub, BindingType::Where);
        self.wheres.push(WhereClause::Sub {
            column: column.to_string(),
            operator: operator.to_ascii_lowercase(),
            query: Box::new(sub),
            boolean,
        });
    }

    /// Add WHERE EXISTS (subselect)
    pub fn where_exists(&mut self, f: impl FnOnce(&mut QueryBuilder)) -> &mut Self {
        self.push_exists(f, false, Boolean::And);
        self
    }

    /// Add WHERE NOT EXISTS (subselect)
    pub fn where_not_exists(&mut self, f: impl FnOnce(&mut QueryBuilder)) -> &mut Self {
        self.push_exists(f, true, Boolean::And);
        self
    }

    pub fn or_where_exists(&mut self, f: impl FnOnce(&mut QueryBuilder)) -> &mut Self {
        self.push_exists(f, false, Boolean::Or);
        self
    }

    pub fn or_where_not_exists(&mut self, f: impl FnOnce(&mut QueryBuilder)) -> &mut Self {
        self.push_exists(f, true, Boolean::Or);
        self
    }

    fn push_exists(&mut self, f: impl FnOnce(&mut QueryBuilder), not: bool, boolean: Boolean) {
        let mut sub = self.for_sub_query();
        f(&mut sub);
        self.absorb(&sub, BindingType::Where);
        self.wheres.push(WhereClause::Exists {
            query: Box::new(sub),
            not,
            boolean,
        });
    }

    // ==================== Column comparisons ====================

    /// Add WHERE first <operator> second, both sides identifiers.
    pub fn where_column(&mut self, first: &str, operator: &str, second: &str) -> &mut Self {
        self.push_column(first, operator, second, Boolean::And);
        self
    }

    pub fn or_where_column(&mut self, first: &str, operator: &str, second: &str) -> &mut Self {
        self.push_column(first, operator, second, Boolean::Or);
        self
    }

    pub(crate) fn push_column(&mut self, first: &str, operator: &str, second: &str, boolean: Boolean) {
        if !self.grammar().is_operator(operator) {
            self.fail(QueryError::invalid_operator(
                operator,
                "is not a recognized comparison operator",
            ));
            return;
        }
        self.wheres.push(WhereClause::Column {
            first: first.to_string(),
            operator: operator.to_ascii_lowercase(),
            second: second.to_string(),
            boolean,
        });
    }
}
