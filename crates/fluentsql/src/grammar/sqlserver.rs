use super::compile::{self, concat};
use super::{Dialect, Grammar, GrammarConfig, Quoting, resolve_quoting};
use crate::built::BuiltQuery;
use crate::error::QueryResult;
use crate::query::{
    Aggregate, BindingType, Column, Lock, OrderClause, Page, QueryBuilder, TableRef,
};

/// Microsoft SQL Server.
///
/// Paging uses `top` when there is no offset and `offset .. fetch next ..`
/// otherwise; locks are table hints on the FROM clause.
#[derive(Debug, Clone)]
pub struct SqlServerGrammar {
    config: GrammarConfig,
    quoting: Quoting,
}

impl SqlServerGrammar {
    pub fn new(config: GrammarConfig) -> Self {
        let quoting = resolve_quoting(&config, Quoting::bracket);
        Self { config, quoting }
    }

    /// ` top n` when a limit is set without an offset.
    fn top(page: Page) -> String {
        match (page.limit, page.offset) {
            (Some(n), None) => format!(" top {n}"),
            _ => String::new(),
        }
    }

    fn offset_fetch(offset: u64, limit: Option<u64>) -> String {
        match limit {
            Some(n) => format!("offset {offset} rows fetch next {n} rows only"),
            None => format!("offset {offset} rows"),
        }
    }
}

impl Default for SqlServerGrammar {
    fn default() -> Self {
        Self::new(GrammarConfig::default())
    }
}

impl Grammar for SqlServerGrammar {
    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
    }

    fn config(&self) -> &GrammarConfig {
        &self.config
    }

    fn quoting(&self) -> &Quoting {
        &self.quoting
    }

    fn operators(&self) -> &'static [&'static str] {
        &["!<", "!>", "&=", "|=", "^="]
    }

    fn wrap_json_selector(&self, field: &str, path: &[&str]) -> Option<String> {
        let path = path
            .iter()
            .map(|p| format!("\"{}\"", p.replace('\'', "''")))
            .collect::<Vec<_>>()
            .join(".");
        Some(format!("json_value({field}, '$.{path}')"))
    }

    fn compile_columns(&self, query: &QueryBuilder, columns: &[Column]) -> QueryResult<String> {
        let mut select = String::from("select");
        if query.is_distinct() {
            select.push_str(" distinct");
        }
        select.push_str(&Self::top(query.page()));

        let columns = columns
            .iter()
            .map(|c| compile::column(self, c))
            .collect::<QueryResult<Vec<_>>>()?;
        Ok(format!("{select} {}", columns.join(", ")))
    }

    fn compile_aggregate(&self, query: &QueryBuilder, aggregate: &Aggregate) -> String {
        let head = compile::aggregate(self, query, aggregate);
        match head.strip_prefix("select") {
            Some(rest) => format!("select{}{rest}", Self::top(query.page())),
            None => head,
        }
    }

    fn compile_from(&self, query: &QueryBuilder, table: &TableRef) -> String {
        let from = compile::from(self, table);
        match query.lock_mode() {
            Some(Lock::Exclusive) => format!("{from} with(rowlock,updlock,holdlock)"),
            Some(Lock::Shared) => format!("{from} with(rowlock,holdlock)"),
            Some(Lock::Custom(hint)) => format!("{from} {hint}"),
            None => from,
        }
    }

    fn compile_orders(&self, _query: &QueryBuilder, orders: &[OrderClause], page: Page) -> String {
        if orders.is_empty() && page.offset.is_some() {
            return "order by (select 0)".to_string();
        }
        compile::orders(self, orders)
    }

    fn compile_limit(&self, _query: &QueryBuilder, _page: Page) -> String {
        String::new()
    }

    fn compile_offset(&self, _query: &QueryBuilder, page: Page) -> String {
        match page.offset {
            Some(offset) => Self::offset_fetch(offset, page.limit),
            None => String::new(),
        }
    }

    /// A union result cannot use `top`, so any paging becomes `offset .. fetch`.
    fn compile_union_page(&self, query: &QueryBuilder) -> String {
        let page = query.union_page();
        if page.is_empty() {
            return compile::orders(self, query.union_orders());
        }
        let orders = if query.union_orders().is_empty() {
            "order by (select 0)".to_string()
        } else {
            compile::orders(self, query.union_orders())
        };
        concat([orders, Self::offset_fetch(page.offset.unwrap_or(0), page.limit)])
    }

    fn compile_lock(&self, _query: &QueryBuilder, _lock: &Lock) -> String {
        String::new()
    }

    fn compile_random(&self, _seed: Option<&str>) -> String {
        "newid()".to_string()
    }

    /// With joins: `update <alias> set .. from <table> <joins> <where>`.
    fn compile_update(&self, query: &QueryBuilder) -> QueryResult<BuiltQuery> {
        if query.joins().is_empty() {
            return compile::update(self, query);
        }

        let table = compile::require_table(query)?;
        let mut bindings = Vec::new();
        let set = compile::update_columns(self, query, &mut bindings)?;
        bindings.extend(query.bindings_for(BindingType::Join).iter().cloned());
        bindings.extend(query.bindings_for(BindingType::Where).iter().cloned());

        let sql = concat([
            format!("update {} set {set}", compile::table_alias(self, table)),
            format!("from {}", compile::table_sql(self, table)),
            compile::joins(self, query)?,
            compile::wheres(self, query)?,
        ]);
        Ok(BuiltQuery::new(sql, bindings))
    }

    fn compile_delete(&self, query: &QueryBuilder) -> QueryResult<BuiltQuery> {
        if query.joins().is_empty() {
            compile::delete(self, query)
        } else {
            compile::delete_with_joins(self, query)
        }
    }
}
