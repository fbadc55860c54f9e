//! GROUP BY / HAVING / ORDER BY / LIMIT / UNION / lock / aggregate clauses.
//!
//! Once a union is present, ordering and paging calls apply to the combined
//! result instead of the first arm.

use super::{
    Aggregate, BindingType, Boolean, Column, Direction, HavingClause, Lock, OrderClause,
    QueryBuilder, UnionClause,
};
use crate::value::{Expression, Param, Value};

impl QueryBuilder {
    // ==================== GROUP BY / HAVING ====================

    /// Add GROUP BY columns.
    pub fn group_by<I, C>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Column>,
    {
        self.groups.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Add a raw GROUP BY expression.
    pub fn group_by_raw(&mut self, sql: &str) -> &mut Self {
        self.groups.push(Column::Raw(Expression::new(sql)));
        self
    }

    /// Add HAVING column <operator> value, with `and`.
    pub fn having(&mut self, column: &str, operator: &str, value: impl Into<Param>) -> &mut Self {
        self.push_having(column, operator, value.into(), Boolean::And);
        self
    }

    /// Add HAVING column <operator> value, with `or`.
    pub fn or_having(
        &mut self,
        column: &str,
        operator: &str,
        value: impl Into<Param>,
    ) -> &mut Self {
        self.push_having(column, operator, value.into(), Boolean::Or);
        self
    }

    fn push_having(&mut self, column: &str, operator: &str, value: Param, boolean: Boolean) {
        let (operator, value) = if self.grammar().is_operator(operator) {
            (operator.to_ascii_lowercase(), value)
        } else {
            ("=".to_string(), Param::from(operator))
        };
        self.push_binding(BindingType::Having, &value);
        self.havings.push(HavingClause::Basic {
            column: column.to_string(),
            operator,
            value,
            boolean,
        });
    }

    /// Add a raw HAVING predicate with its bindings, with `and`.
    pub fn having_raw(&mut self, sql: &str, bindings: Vec<Value>) -> &mut Self {
        self.push_having_raw(sql, bindings, Boolean::And);
        self
    }

    /// Add a raw HAVING predicate with its bindings, with `or`.
    pub fn or_having_raw(&mut self, sql: &str, bindings: Vec<Value>) -> &mut Self {
        self.push_having_raw(sql, bindings, Boolean::Or);
        self
    }

    fn push_having_raw(&mut self, sql: &str, bindings: Vec<Value>, boolean: Boolean) {
        self.bindings.extend(BindingType::Having, bindings);
        self.havings.push(HavingClause::Raw {
            sql: sql.to_string(),
            boolean,
        });
    }

    /// Add HAVING column BETWEEN low AND high.
    pub fn having_between(
        &mut self,
        column: &str,
        low: impl Into<Param>,
        high: impl Into<Param>,
    ) -> &mut Self {
        let (low, high) = (low.into(), high.into());
        self.push_binding(BindingType::Having, &low);
        self.push_binding(BindingType::Having, &high);
        self.havings.push(HavingClause::Between {
            column: column.to_string(),
            low,
            high,
            not: false,
            boolean: Boolean::And,
        });
        self
    }

    // ==================== ORDER BY ====================

    fn push_order(&mut self, order: OrderClause) {
        if self.unions.is_empty() {
            self.orders.push(order);
        } else {
            self.union_orders.push(order);
        }
    }

    /// Add ORDER BY column with `"asc"` or `"desc"`.
    pub fn order_by(&mut self, column: &str, direction: &str) -> &mut Self {
        match direction.parse::<Direction>() {
            Ok(direction) => self.push_order(OrderClause::Column {
                column: column.to_string(),
                direction,
            }),
            Err(err) => self.fail(err),
        }
        self
    }

    /// Add ORDER BY column ASC
    pub fn order_by_asc(&mut self, column: &str) -> &mut Self {
        self.push_order(OrderClause::Column {
            column: column.to_string(),
            direction: Direction::Asc,
        });
        self
    }

    /// Add ORDER BY column DESC
    pub fn order_by_desc(&mut self, column: &str) -> &mut Self {
        self.push_order(OrderClause::Column {
            column: column.to_string(),
            direction: Direction::Desc,
        });
        self
    }

    /// Add a raw ORDER BY term with its bindings.
    pub fn order_by_raw(&mut self, sql: &str, bindings: Vec<Value>) -> &mut Self {
        if self.unions.is_empty() {
            self.bindings.extend(BindingType::Order, bindings);
        } else {
            self.bindings.extend_union_order(bindings);
        }
        self.push_order(OrderClause::Raw(sql.to_string()));
        self
    }

    /// Newest first.
    pub fn latest(&mut self, column: &str) -> &mut Self {
        self.order_by_desc(column)
    }

    /// Oldest first.
    pub fn oldest(&mut self, column: &str) -> &mut Self {
        self.order_by_asc(column)
    }

    /// Order with the dialect's random function.
    pub fn in_random_order(&mut self) -> &mut Self {
        self.push_order(OrderClause::Random(None));
        self
    }

    /// Order with the dialect's random function, seeded where supported.
    pub fn in_random_order_seeded(&mut self, seed: &str) -> &mut Self {
        self.push_order(OrderClause::Random(Some(seed.to_string())));
        self
    }

    // ==================== LIMIT / OFFSET ====================

    /// Set LIMIT.
    pub fn limit(&mut self, n: u64) -> &mut Self {
        if self.unions.is_empty() {
            self.page.limit = Some(n);
        } else {
            self.union_page.limit = Some(n);
        }
        self
    }

    /// Set OFFSET.
    pub fn offset(&mut self, n: u64) -> &mut Self {
        if self.unions.is_empty() {
            self.page.offset = Some(n);
        } else {
            self.union_page.offset = Some(n);
        }
        self
    }

    /// Alias for [`limit`](Self::limit).
    pub fn take(&mut self, n: u64) -> &mut Self {
        self.limit(n)
    }

    /// Alias for [`offset`](Self::offset).
    pub fn skip(&mut self, n: u64) -> &mut Self {
        self.offset(n)
    }

    /// Page through results; `page` is 1-based and clamped to at least 1.
    pub fn for_page(&mut self, page: u64, per_page: u64) -> &mut Self {
        let page = page.max(1);
        self.offset((page - 1).saturating_mul(per_page)).limit(per_page)
    }

    // ==================== Locks ====================

    /// Lock selected rows: `true` exclusive, `false` shared, or a custom clause.
    pub fn lock(&mut self, lock: impl Into<Lock>) -> &mut Self {
        self.lock = Some(lock.into());
        self
    }

    pub fn lock_for_update(&mut self) -> &mut Self {
        self.lock(Lock::Exclusive)
    }

    pub fn shared_lock(&mut self) -> &mut Self {
        self.lock(Lock::Shared)
    }

    // ==================== UNION ====================

    /// Add UNION query.
    pub fn union(&mut self, query: QueryBuilder) -> &mut Self {
        self.push_union(query, false)
    }

    /// Add UNION ALL query.
    pub fn union_all(&mut self, query: QueryBuilder) -> &mut Self {
        self.push_union(query, true)
    }

    /// Add a union member built by `f` on a fresh builder.
    pub fn union_with(&mut self, all: bool, f: impl FnOnce(&mut QueryBuilder)) -> &mut Self {
        let mut query = self.for_sub_query();
        f(&mut query);
        self.push_union(query, all)
    }

    fn push_union(&mut self, query: QueryBuilder, all: bool) -> &mut Self {
        self.absorb(&query, BindingType::Union);
        self.unions.push(UnionClause {
            query: Box::new(query),
            all,
        });
        self
    }

    // ==================== Aggregates ====================

    /// Copy of this query selecting `function(columns) as aggregate`.
    ///
    /// Selected columns and their bindings are dropped; without groups the
    /// ordering is dropped too. The source builder is left untouched.
    pub fn to_aggregate(&self, function: &str, columns: &[&str]) -> QueryBuilder {
        let mut q = self.clone();
        q.kind = super::StatementKind::Select;
        q.columns = None;
        q.bindings.clear(BindingType::Select);
        if q.groups.is_empty() {
            q.orders.clear();
            q.bindings.clear(BindingType::Order);
        }
        q.aggregate = Some(Aggregate {
            function: function.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        q
    }

    /// `select count(*) as aggregate ...`
    pub fn count_query(&self) -> QueryBuilder {
        self.to_aggregate("count", &["*"])
    }

    pub fn min_query(&self, column: &str) -> QueryBuilder {
        self.to_aggregate("min", &[column])
    }

    pub fn max_query(&self, column: &str) -> QueryBuilder {
        self.to_aggregate("max", &[column])
    }

    pub fn sum_query(&self, column: &str) -> QueryBuilder {
        self.to_aggregate("sum", &[column])
    }

    pub fn avg_query(&self, column: &str) -> QueryBuilder {
        self.to_aggregate("avg", &[column])
    }
}
