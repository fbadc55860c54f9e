use crate::config::LogConfig;
use fluentsql::StatementKind;

/// Cut `sql` to at most `max_bytes`, on a char boundary.
fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// Emits every routed statement on the `fluentsql.sql` target at debug level.
#[derive(Debug, Clone, Default)]
pub(crate) struct SqlLogger {
    config: LogConfig,
}

impl SqlLogger {
    pub(crate) fn new(config: LogConfig) -> Self {
        Self { config }
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        match self.config.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }

    pub(crate) fn statement(&self, kind: StatementKind, node: &str, sql: &str, param_count: usize) {
        if !self.config.enabled {
            return;
        }
        let sql = self.truncate_sql(sql);
        tracing::debug!(
            target: "fluentsql.sql",
            kind = kind.as_str(),
            node,
            param_count,
            sql = %sql,
        );
    }
}
