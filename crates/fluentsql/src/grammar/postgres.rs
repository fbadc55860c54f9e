use super::compile;
use super::{Dialect, Grammar, GrammarConfig, Quoting, resolve_quoting};
use crate::built::BuiltQuery;
use crate::error::QueryResult;
use crate::query::{Lock, QueryBuilder};

/// PostgreSQL.
#[derive(Debug, Clone)]
pub struct PostgresGrammar {
    config: GrammarConfig,
    quoting: Quoting,
}

impl PostgresGrammar {
    pub fn new(config: GrammarConfig) -> Self {
        let quoting = resolve_quoting(&config, Quoting::ansi);
        Self { config, quoting }
    }
}

impl Default for PostgresGrammar {
    fn default() -> Self {
        Self::new(GrammarConfig::default())
    }
}

fn json_key(segment: &str) -> String {
    if segment.parse::<i64>().is_ok() {
        segment.to_string()
    } else {
        format!("'{}'", segment.replace('\'', "''"))
    }
}

impl Grammar for PostgresGrammar {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn config(&self) -> &GrammarConfig {
        &self.config
    }

    fn quoting(&self) -> &Quoting {
        &self.quoting
    }

    fn operators(&self) -> &'static [&'static str] {
        &[
            "#", "<<=", ">>=", "&&", "@>", "<@", "?", "?|", "?&", "||", "-", "#-", "@?", "@@",
        ]
    }

    /// `"col"->'a'->>'b'`: text extraction on the last step.
    fn wrap_json_selector(&self, field: &str, path: &[&str]) -> Option<String> {
        let mut out = field.to_string();
        for (i, segment) in path.iter().enumerate() {
            out.push_str(if i + 1 == path.len() { "->>" } else { "->" });
            out.push_str(&json_key(segment));
        }
        Some(out)
    }

    fn wraps_union_arms(&self) -> bool {
        true
    }

    fn compile_lock(&self, _query: &QueryBuilder, lock: &Lock) -> String {
        match lock {
            Lock::Exclusive => "for update".to_string(),
            Lock::Shared => "for share".to_string(),
            Lock::Custom(sql) => sql.clone(),
        }
    }

    fn compile_insert_get_id(&self, query: &QueryBuilder, sequence: &str) -> QueryResult<BuiltQuery> {
        let mut built = compile::insert(self, query)?;
        built.sql = format!("{} returning {}", built.sql, self.wrap(sequence));
        Ok(built)
    }
}
