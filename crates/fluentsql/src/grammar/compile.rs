//! Clause skeleton shared by every grammar.
//!
//! Functions here are generic over the grammar so that dialect hooks are used
//! whenever the skeleton recurses (sub-selects, unions, nested predicates).

use super::Grammar;
use crate::built::BuiltQuery;
use crate::error::{QueryError, QueryResult};
use crate::query::{
    Aggregate, BindingType, Column, HavingClause, OrderClause, QueryBuilder, TableRef, WhereClause,
};
use crate::value::{Param, Value};
use std::sync::OnceLock;

fn alias_regex() -> &'static regex::Regex {
    static ALIAS_RE: OnceLock<regex::Regex> = OnceLock::new();
    ALIAS_RE.get_or_init(|| {
        regex::Regex::new(r"(?i)\s+as\s+").expect("invalid built-in alias regex")
    })
}

fn leading_boolean_regex() -> &'static regex::Regex {
    static BOOLEAN_RE: OnceLock<regex::Regex> = OnceLock::new();
    BOOLEAN_RE.get_or_init(|| {
        regex::Regex::new(r"(?i)^(and|or) ").expect("invalid built-in boolean regex")
    })
}

/// Split `expr as alias` (case-insensitive) at the first `as`.
pub fn split_alias(value: &str) -> Option<(&str, &str)> {
    alias_regex()
        .find(value)
        .map(|m| (&value[..m.start()], &value[m.end()..]))
}

/// Remove the conjunction in front of the first rendered predicate.
pub fn strip_leading_boolean(sql: &str) -> &str {
    match leading_boolean_regex().find(sql) {
        Some(m) => &sql[m.end()..],
        None => sql,
    }
}

/// Join the non-empty fragments with single spaces.
pub fn concat<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for part in parts {
        let part = part.as_ref().trim();
        if part.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(part);
    }
    out
}

/// `?` for a bound value, the SQL text for an expression.
pub fn parameter(param: &Param) -> &str {
    match param {
        Param::Value(_) => "?",
        Param::Expr(expr) => expr.as_str(),
    }
}

pub fn parameterize(params: &[Param]) -> String {
    params.iter().map(parameter).collect::<Vec<_>>().join(", ")
}

// ==================== Identifiers ====================

fn wrap_segments<G: Grammar + ?Sized>(g: &G, value: &str) -> String {
    let segments: Vec<&str> = value.split('.').collect();
    let last = segments.len() - 1;
    segments
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            if i == 0 && last > 0 {
                g.wrap_table(segment)
            } else {
                g.wrap_value(segment)
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Quote a column reference.
pub fn wrap<G: Grammar + ?Sized>(g: &G, value: &str) -> String {
    if let Some((expr, alias)) = split_alias(value) {
        return format!("{} as {}", g.wrap(expr), g.wrap_value(alias));
    }

    if let Some(idx) = value.find("->") {
        let field = wrap_segments(g, &value[..idx]);
        let path: Vec<&str> = value[idx + 2..].split("->").collect();
        if let Some(selector) = g.wrap_json_selector(&field, &path) {
            return selector;
        }
    }

    wrap_segments(g, value)
}

/// Quote a table reference. The prefix goes on the table name and its alias.
pub fn wrap_table<G: Grammar + ?Sized>(g: &G, table: &str) -> String {
    let prefix = g.table_prefix();
    if let Some((name, alias)) = split_alias(table) {
        return format!(
            "{} as {}",
            g.wrap_table(name),
            g.wrap_value(&format!("{prefix}{alias}"))
        );
    }

    match table.rsplit_once('.') {
        Some((schema, name)) => format!(
            "{}.{}",
            g.wrap_value(schema),
            g.wrap_value(&format!("{prefix}{name}"))
        ),
        None => g.wrap_value(&format!("{prefix}{table}")),
    }
}

/// Comma-join quoted column names.
pub fn columnize<G: Grammar + ?Sized>(g: &G, columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| g.wrap(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Alias part of a possibly aliased table (`users as u` → `"u"`).
pub fn table_alias<G: Grammar + ?Sized>(g: &G, table: &TableRef) -> String {
    match table {
        TableRef::Name(name) => match split_alias(name) {
            Some((_, alias)) => g.wrap_value(&format!("{}{alias}", g.table_prefix())),
            None => g.wrap_table(name),
        },
        TableRef::Raw(expr) => expr.as_str().to_string(),
    }
}

pub(crate) fn require_table(query: &QueryBuilder) -> QueryResult<&TableRef> {
    query.table().ok_or_else(|| {
        QueryError::compile(format!(
            "cannot compile {} statement without a table",
            query.statement_kind().as_str()
        ))
    })
}

fn sub_select<G: Grammar + ?Sized>(g: &G, query: &QueryBuilder) -> QueryResult<String> {
    g.compile_select(query).map(|built| built.sql)
}

// ==================== Select components ====================

pub fn column<G: Grammar + ?Sized>(g: &G, column: &Column) -> QueryResult<String> {
    match column {
        Column::Name(name) => Ok(g.wrap(name)),
        Column::Raw(expr) => Ok(expr.as_str().to_string()),
        Column::Sub { query, alias } => Ok(format!(
            "({}) as {}",
            sub_select(g, query)?,
            g.wrap_value(alias)
        )),
    }
}

fn column_list<G: Grammar + ?Sized>(g: &G, columns: &[Column]) -> QueryResult<String> {
    let rendered = columns
        .iter()
        .map(|c| column(g, c))
        .collect::<QueryResult<Vec<_>>>()?;
    Ok(rendered.join(", "))
}

pub fn columns<G: Grammar + ?Sized>(
    g: &G,
    query: &QueryBuilder,
    columns: &[Column],
) -> QueryResult<String> {
    let select = if query.is_distinct() {
        "select distinct"
    } else {
        "select"
    };
    Ok(format!("{select} {}", column_list(g, columns)?))
}

pub fn aggregate<G: Grammar + ?Sized>(g: &G, query: &QueryBuilder, aggregate: &Aggregate) -> String {
    let mut column = columnize(g, &aggregate.columns);
    if column.is_empty() {
        column.push('*');
    }
    if query.is_distinct() && column != "*" {
        column = format!("distinct {column}");
    }
    format!("select {}({column}) as aggregate", aggregate.function)
}

pub fn from<G: Grammar + ?Sized>(g: &G, table: &TableRef) -> String {
    format!("from {}", table_sql(g, table))
}

pub fn joins<G: Grammar + ?Sized>(g: &G, query: &QueryBuilder) -> QueryResult<String> {
    let mut rendered = Vec::with_capacity(query.joins.len());
    for join in &query.joins {
        let table = table_sql(g, join.table());
        let on = wheres(g, join.query())?;
        rendered.push(concat([
            format!("{} join", join.kind().as_str()),
            table,
            on,
        ]));
    }
    Ok(rendered.join(" "))
}

/// Render the predicate list, prefixed with `where` (or `on` for a join clause).
pub fn wheres<G: Grammar + ?Sized>(g: &G, query: &QueryBuilder) -> QueryResult<String> {
    if query.wheres.is_empty() {
        return Ok(String::new());
    }

    let mut parts = Vec::with_capacity(query.wheres.len());
    for clause in &query.wheres {
        parts.push(format!(
            "{} {}",
            clause.boolean().as_str(),
            where_clause(g, clause)?
        ));
    }

    let joined = parts.join(" ");
    let keyword = if query.is_join_clause() { "on" } else { "where" };
    Ok(format!("{keyword} {}", strip_leading_boolean(&joined)))
}

fn where_clause<G: Grammar + ?Sized>(g: &G, clause: &WhereClause) -> QueryResult<String> {
    let sql = match clause {
        WhereClause::Basic {
            column,
            operator,
            value,
            ..
        } => format!("{} {} {}", g.wrap(column), operator, parameter(value)),
        WhereClause::Raw { sql, .. } => sql.clone(),
        WhereClause::In {
            column,
            values,
            not,
            ..
        } => {
            if values.is_empty() {
                if *not { "1 = 1" } else { "0 = 1" }.to_string()
            } else {
                let keyword = if *not { "not in" } else { "in" };
                format!("{} {keyword} ({})", g.wrap(column), parameterize(values))
            }
        }
        WhereClause::InSub {
            column,
            query: sub,
            not,
            ..
        } => {
            let keyword = if *not { "not in" } else { "in" };
            format!("{} {keyword} ({})", g.wrap(column), sub_select(g, sub)?)
        }
        WhereClause::Null { column, not, .. } => {
            let keyword = if *not { "is not null" } else { "is null" };
            format!("{} {keyword}", g.wrap(column))
        }
        WhereClause::Between {
            column,
            low,
            high,
            not,
            ..
        } => {
            let keyword = if *not { "not between" } else { "between" };
            format!(
                "{} {keyword} {} and {}",
                g.wrap(column),
                parameter(low),
                parameter(high)
            )
        }
        WhereClause::Nested { query: nested, .. } => {
            let inner = wheres(g, nested)?;
            let offset = if nested.is_join_clause() { 3 } else { 6 };
            format!("({})", inner.get(offset..).unwrap_or_default())
        }
        WhereClause::Sub {
            column,
            operator,
            query: sub,
            ..
        } => format!("{} {operator} ({})", g.wrap(column), sub_select(g, sub)?),
        WhereClause::Exists { query: sub, not, .. } => {
            let keyword = if *not { "not exists" } else { "exists" };
            format!("{keyword} ({})", sub_select(g, sub)?)
        }
        WhereClause::Column {
            first,
            operator,
            second,
            ..
        } => format!("{} {operator} {}", g.wrap(first), g.wrap(second)),
    };
    Ok(sql)
}

pub fn groups<G: Grammar + ?Sized>(g: &G, query: &QueryBuilder) -> QueryResult<String> {
    if query.groups.is_empty() {
        return Ok(String::new());
    }
    Ok(format!("group by {}", column_list(g, &query.groups)?))
}

pub fn havings<G: Grammar + ?Sized>(g: &G, query: &QueryBuilder) -> String {
    if query.havings.is_empty() {
        return String::new();
    }

    let joined = query
        .havings
        .iter()
        .map(|having| {
            let sql = match having {
                HavingClause::Basic {
                    column,
                    operator,
                    value,
                    ..
                } => format!("{} {operator} {}", g.wrap(column), parameter(value)),
                HavingClause::Raw { sql, .. } => sql.clone(),
                HavingClause::Between {
                    column,
                    low,
                    high,
                    not,
                    ..
                } => {
                    let keyword = if *not { "not between" } else { "between" };
                    format!(
                        "{} {keyword} {} and {}",
                        g.wrap(column),
                        parameter(low),
                        parameter(high)
                    )
                }
            };
            format!("{} {sql}", having.boolean().as_str())
        })
        .collect::<Vec<_>>()
        .join(" ");

    format!("having {}", strip_leading_boolean(&joined))
}

pub fn orders<G: Grammar + ?Sized>(g: &G, orders: &[OrderClause]) -> String {
    if orders.is_empty() {
        return String::new();
    }
    let terms = orders
        .iter()
        .map(|order| match order {
            OrderClause::Column { column, direction } => {
                format!("{} {}", g.wrap(column), direction.as_str())
            }
            OrderClause::Raw(sql) => sql.clone(),
            OrderClause::Random(seed) => g.compile_random(seed.as_deref()),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("order by {terms}")
}

pub fn union_page<G: Grammar + ?Sized>(g: &G, query: &QueryBuilder) -> String {
    let page = query.union_page();
    concat([
        g.compile_orders(query, &query.union_orders, page),
        g.compile_limit(query, page),
        g.compile_offset(query, page),
    ])
}

fn unions<G: Grammar + ?Sized>(g: &G, query: &QueryBuilder, base: String) -> QueryResult<String> {
    let wrap_arms = g.wraps_union_arms();
    let mut sql = if wrap_arms { format!("({base})") } else { base };

    for union in &query.unions {
        let arm = sub_select(g, &union.query)?;
        let keyword = if union.all { "union all" } else { "union" };
        if wrap_arms {
            sql = format!("{sql} {keyword} ({arm})");
        } else {
            sql = format!("{sql} {keyword} {arm}");
        }
    }

    Ok(concat([sql, g.compile_union_page(query)]))
}

fn union_aggregate<G: Grammar + ?Sized>(
    g: &G,
    query: &QueryBuilder,
    agg: &Aggregate,
) -> QueryResult<BuiltQuery> {
    let mut inner = query.clone();
    inner.aggregate = None;
    let built = g.compile_select(&inner)?;
    let sql = format!(
        "{} from ({}) as {}",
        aggregate(g, query, agg),
        built.sql,
        g.wrap_value("temp_table")
    );
    Ok(BuiltQuery::new(sql, built.bindings))
}

// ==================== Statements ====================

/// Compile a select in component order: aggregate, columns, from, joins,
/// wheres, groups, havings, orders, limit, offset, unions, lock.
pub fn select<G: Grammar + ?Sized>(g: &G, query: &QueryBuilder) -> QueryResult<BuiltQuery> {
    let table = require_table(query)?;

    if let Some(agg) = &query.aggregate {
        if !query.unions.is_empty() {
            return union_aggregate(g, query, agg);
        }
    }

    let default_columns = [Column::Name("*".to_string())];
    let columns = query.columns.as_deref().unwrap_or(&default_columns);

    let head = match &query.aggregate {
        Some(agg) => g.compile_aggregate(query, agg),
        None => g.compile_columns(query, columns)?,
    };
    let page = query.page();

    let mut sql = concat([
        head,
        g.compile_from(query, table),
        joins(g, query)?,
        wheres(g, query)?,
        groups(g, query)?,
        havings(g, query),
        g.compile_orders(query, &query.orders, page),
        g.compile_limit(query, page),
        g.compile_offset(query, page),
    ]);

    if !query.unions.is_empty() {
        sql = unions(g, query, sql)?;
    }

    if let Some(lock) = query.lock_mode() {
        sql = concat([sql, g.compile_lock(query, lock)]);
    }

    Ok(BuiltQuery::new(sql, query.get_bindings()))
}

pub fn insert<G: Grammar + ?Sized>(g: &G, query: &QueryBuilder) -> QueryResult<BuiltQuery> {
    let table = require_table(query)?;
    let payload = query
        .insert_payload()
        .filter(|p| !p.columns.is_empty() && !p.rows.is_empty())
        .ok_or_else(|| {
            QueryError::compile("cannot compile insert statement: columns and values cannot be empty")
        })?;

    let mut bindings = Vec::new();
    let mut groups = Vec::with_capacity(payload.rows.len());
    for row in &payload.rows {
        if row.len() != payload.columns.len() {
            return Err(QueryError::compile(format!(
                "cannot compile insert statement: expected {} values per row, got {}",
                payload.columns.len(),
                row.len()
            )));
        }
        bindings.extend(row.iter().filter_map(|p| p.value().cloned()));
        groups.push(format!("({})", parameterize(row)));
    }

    let sql = format!(
        "insert into {} ({}) values {}",
        table_sql(g, table),
        columnize(g, &payload.columns),
        groups.join(", ")
    );
    Ok(BuiltQuery::new(sql, bindings))
}

pub fn update_column<G: Grammar + ?Sized>(
    g: &G,
    column: &str,
    value: &Param,
    bindings: &mut Vec<Value>,
) -> String {
    if let Some(v) = value.value() {
        bindings.push(v.clone());
    }
    format!("{} = {}", g.wrap(column), parameter(value))
}

/// `set` assignments; their bindings are appended to `bindings`.
pub(crate) fn update_columns<G: Grammar + ?Sized>(
    g: &G,
    query: &QueryBuilder,
    bindings: &mut Vec<Value>,
) -> QueryResult<String> {
    if query.update_values().is_empty() {
        return Err(QueryError::compile(
            "cannot compile update statement: no values to set",
        ));
    }
    Ok(query
        .update_values()
        .iter()
        .map(|(column, value)| g.compile_update_column(column, value, bindings))
        .collect::<Vec<_>>()
        .join(", "))
}

/// `update t set .. <joins> <where>`; bindings follow as set, join, where.
pub fn update<G: Grammar + ?Sized>(g: &G, query: &QueryBuilder) -> QueryResult<BuiltQuery> {
    let table = require_table(query)?;
    let mut bindings = Vec::new();
    let set = update_columns(g, query, &mut bindings)?;
    let joins = joins(g, query)?;
    bindings.extend(query.bindings_for(BindingType::Join).iter().cloned());
    let wheres = wheres(g, query)?;
    bindings.extend(query.bindings_for(BindingType::Where).iter().cloned());

    let sql = concat([
        format!("update {} set {set}", table_sql(g, table)),
        joins,
        wheres,
    ]);
    Ok(BuiltQuery::new(sql, bindings))
}

/// `delete from t <where>`; joins are rejected.
pub fn delete<G: Grammar + ?Sized>(g: &G, query: &QueryBuilder) -> QueryResult<BuiltQuery> {
    let table = require_table(query)?;
    if !query.joins.is_empty() {
        return Err(QueryError::compile(format!(
            "delete with joins is not supported by the {} grammar",
            g.dialect()
        )));
    }
    let sql = concat([
        format!("delete from {}", table_sql(g, table)),
        wheres(g, query)?,
    ]);
    Ok(BuiltQuery::new(
        sql,
        query.bindings_for(BindingType::Where).to_vec(),
    ))
}

/// `delete <alias> from <table> <joins> <where>`; bindings follow as join, where.
pub fn delete_with_joins<G: Grammar + ?Sized>(
    g: &G,
    query: &QueryBuilder,
) -> QueryResult<BuiltQuery> {
    let table = require_table(query)?;
    let sql = concat([
        format!("delete {} from {}", table_alias(g, table), table_sql(g, table)),
        joins(g, query)?,
        wheres(g, query)?,
    ]);
    let mut bindings = query.bindings_for(BindingType::Join).to_vec();
    bindings.extend(query.bindings_for(BindingType::Where).iter().cloned());
    Ok(BuiltQuery::new(sql, bindings))
}

pub(crate) fn table_sql<G: Grammar + ?Sized>(g: &G, table: &TableRef) -> String {
    match table {
        TableRef::Name(name) => g.wrap_table(name),
        TableRef::Raw(expr) => expr.as_str().to_string(),
    }
}
