use super::{Dialect, Grammar, GrammarConfig, Quoting, resolve_quoting};
use crate::query::{Page, QueryBuilder};

/// SQLite.
#[derive(Debug, Clone)]
pub struct SqliteGrammar {
    config: GrammarConfig,
    quoting: Quoting,
}

impl SqliteGrammar {
    pub fn new(config: GrammarConfig) -> Self {
        let quoting = resolve_quoting(&config, Quoting::ansi);
        Self { config, quoting }
    }
}

impl Default for SqliteGrammar {
    fn default() -> Self {
        Self::new(GrammarConfig::default())
    }
}

impl Grammar for SqliteGrammar {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn config(&self) -> &GrammarConfig {
        &self.config
    }

    fn quoting(&self) -> &Quoting {
        &self.quoting
    }

    fn operators(&self) -> &'static [&'static str] {
        &["glob", "match"]
    }

    fn wrap_json_selector(&self, field: &str, path: &[&str]) -> Option<String> {
        let path = path
            .iter()
            .map(|p| format!("\"{}\"", p.replace('\'', "''")))
            .collect::<Vec<_>>()
            .join(".");
        Some(format!("json_extract({field}, '$.{path}')"))
    }

    // SQLite needs a limit before an offset; -1 means unbounded.
    fn compile_limit(&self, _query: &QueryBuilder, page: Page) -> String {
        match (page.limit, page.offset) {
            (Some(n), _) => format!("limit {n}"),
            (None, Some(_)) => "limit -1".to_string(),
            (None, None) => String::new(),
        }
    }
}
