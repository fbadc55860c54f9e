use super::{Dialect, Grammar, GrammarConfig, Quoting, resolve_quoting};

/// Standard SQL: double-quoted identifiers and the shared skeleton only.
#[derive(Debug, Clone, Default)]
pub struct AnsiGrammar {
    config: GrammarConfig,
    quoting: Quoting,
}

impl AnsiGrammar {
    pub fn new(config: GrammarConfig) -> Self {
        let quoting = resolve_quoting(&config, Quoting::ansi);
        Self { config, quoting }
    }
}

impl Grammar for AnsiGrammar {
    fn dialect(&self) -> Dialect {
        Dialect::Ansi
    }

    fn config(&self) -> &GrammarConfig {
        &self.config
    }

    fn quoting(&self) -> &Quoting {
        &self.quoting
    }
}
