use super::compile::{self, concat, parameter};
use super::{Dialect, Grammar, GrammarConfig, Quoting, resolve_quoting};
use crate::built::BuiltQuery;
use crate::error::QueryResult;
use crate::query::{BindingType, Lock, Page, QueryBuilder};
use crate::value::{Param, Value};

/// Limit emitted when only an offset is set: MySQL has no offset without limit.
pub const MAX_LIMIT: &str = "18446744073709551615";

/// MySQL / MariaDB.
#[derive(Debug, Clone)]
pub struct MySqlGrammar {
    config: GrammarConfig,
    quoting: Quoting,
}

impl MySqlGrammar {
    pub fn new(config: GrammarConfig) -> Self {
        let quoting = resolve_quoting(&config, Quoting::backtick);
        Self { config, quoting }
    }

    fn json_path(path: &[&str]) -> String {
        let segments = path
            .iter()
            .map(|p| format!("\"{}\"", p.replace('\'', "''")))
            .collect::<Vec<_>>()
            .join(".");
        format!("'$.{segments}'")
    }

    /// Orders and limit honoured by single-table UPDATE and DELETE.
    fn compile_tail(&self, query: &QueryBuilder) -> String {
        let page = Page {
            limit: query.page().limit,
            offset: None,
        };
        concat([
            self.compile_orders(query, query.orders(), page),
            self.compile_limit(query, page),
        ])
    }
}

impl Default for MySqlGrammar {
    fn default() -> Self {
        Self::new(GrammarConfig::default())
    }
}

impl Grammar for MySqlGrammar {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn config(&self) -> &GrammarConfig {
        &self.config
    }

    fn quoting(&self) -> &Quoting {
        &self.quoting
    }

    fn operators(&self) -> &'static [&'static str] {
        &["sounds like"]
    }

    fn wrap_json_selector(&self, field: &str, path: &[&str]) -> Option<String> {
        Some(format!("{field}->{}", Self::json_path(path)))
    }

    fn compile_limit(&self, _query: &QueryBuilder, page: Page) -> String {
        match (page.limit, page.offset) {
            (Some(n), _) => format!("limit {n}"),
            (None, Some(_)) => format!("limit {MAX_LIMIT}"),
            (None, None) => String::new(),
        }
    }

    fn wraps_union_arms(&self) -> bool {
        true
    }

    fn compile_lock(&self, _query: &QueryBuilder, lock: &Lock) -> String {
        match lock {
            Lock::Exclusive => "for update".to_string(),
            Lock::Shared => "lock in share mode".to_string(),
            Lock::Custom(sql) => sql.clone(),
        }
    }

    fn compile_random(&self, seed: Option<&str>) -> String {
        format!("rand({})", seed.unwrap_or_default())
    }

    /// JSON path columns compile to `json_set`; booleans and numbers are inlined.
    fn compile_update_column(&self, column: &str, value: &Param, bindings: &mut Vec<Value>) -> String {
        let Some((field, path)) = column.split_once("->") else {
            return compile::update_column(self, column, value, bindings);
        };

        let field = self.wrap(field);
        let path: Vec<&str> = path.split("->").collect();
        let rendered = match value {
            Param::Value(Value::Bool(b)) => b.to_string(),
            Param::Value(Value::Int(n)) => n.to_string(),
            Param::Value(Value::UInt(n)) => n.to_string(),
            Param::Value(Value::Float(f)) => f.to_string(),
            other => {
                if let Some(v) = other.value() {
                    bindings.push(v.clone());
                }
                parameter(other).to_string()
            }
        };
        format!(
            "{field} = json_set({field}, {}, {rendered})",
            Self::json_path(&path)
        )
    }

    /// `update t <joins> set .. <where> <order by> <limit>`;
    /// bindings follow as join, set, where, order.
    fn compile_update(&self, query: &QueryBuilder) -> QueryResult<BuiltQuery> {
        let table = compile::require_table(query)?;
        let mut set_bindings = Vec::new();
        let set = compile::update_columns(self, query, &mut set_bindings)?;

        let mut bindings = query.bindings_for(BindingType::Join).to_vec();
        bindings.extend(set_bindings);
        bindings.extend(query.bindings_for(BindingType::Where).iter().cloned());
        bindings.extend(query.bindings_for(BindingType::Order).iter().cloned());

        let sql = concat([
            format!("update {}", compile::table_sql(self, table)),
            compile::joins(self, query)?,
            format!("set {set}"),
            compile::wheres(self, query)?,
            self.compile_tail(query),
        ]);
        Ok(BuiltQuery::new(sql, bindings))
    }

    fn compile_delete(&self, query: &QueryBuilder) -> QueryResult<BuiltQuery> {
        if !query.joins().is_empty() {
            return compile::delete_with_joins(self, query);
        }

        let table = compile::require_table(query)?;
        let sql = concat([
            format!("delete from {}", compile::table_sql(self, table)),
            compile::wheres(self, query)?,
            self.compile_tail(query),
        ]);
        let mut bindings = query.bindings_for(BindingType::Where).to_vec();
        bindings.extend(query.bindings_for(BindingType::Order).iter().cloned());
        Ok(BuiltQuery::new(sql, bindings))
    }
}
