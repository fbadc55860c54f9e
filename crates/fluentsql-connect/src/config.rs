//! Database topology configuration.
//!
//! Loadable from TOML or JSON, or built in code:
//!
//! ```toml
//! mode = "master_slave"
//! table_prefix = "app_"
//!
//! [master]
//! dsn = "mysql:host=db-1;dbname=app"
//! user = "app"
//! retry = 2
//!
//! [slaves.replica1]
//! dsn = "mysql:host=db-2;dbname=app"
//! ```

use crate::error::{ConnectError, ConnectResult};
use fluentsql::{Dialect, GrammarConfig, Quoting};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Most extra connect attempts a node may ask for.
pub const MAX_RETRY: u8 = 5;

/// Pause between connect attempts.
pub const RETRY_PAUSE: Duration = Duration::from_millis(50);

/// How nodes are arranged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// One `default` node serves reads and writes.
    #[default]
    Single,
    /// Writers (`master` / `writers`) and readers (`slaves` / `readers`).
    MasterSlave,
    /// Peer nodes; reads and writes rotate across all of them.
    Cluster,
}

/// One database server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Driver-prefixed DSN, e.g. `mysql:host=localhost;dbname=app`.
    pub dsn: String,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Driver options passed through untouched.
    pub options: BTreeMap<String, String>,
    /// Extra connect attempts after the first failure.
    pub retry: u8,
}

impl NodeConfig {
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            ..Self::default()
        }
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn retry(mut self, retry: u8) -> Self {
        self.retry = retry;
        self
    }

    /// Extra connect attempts; anything above [`MAX_RETRY`] means none.
    pub fn retries(&self) -> u8 {
        if self.retry <= MAX_RETRY { self.retry } else { 0 }
    }

    /// Driver name taken from the DSN prefix (`mysql:` → `mysql`).
    pub fn driver(&self) -> Option<&str> {
        self.dsn
            .split_once(':')
            .map(|(driver, _)| driver.trim())
            .filter(|driver| !driver.is_empty())
    }
}

/// SQL statement logging.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub enabled: bool,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_sql_length: Some(200),
        }
    }
}

/// Configuration for a [`ConnectionLocator`](crate::ConnectionLocator).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Driver name; inferred from the first node's DSN when absent.
    pub driver: Option<String>,
    pub mode: Mode,
    /// Prepended to table names and substituted for `{pfx}` in raw SQL.
    pub table_prefix: String,
    /// Overrides the dialect's identifier quoting.
    pub quoting: Option<Quoting>,
    pub log: LogConfig,

    /// Single mode.
    pub default: Option<NodeConfig>,

    /// Master/slave mode, classic spelling.
    pub master: Option<NodeConfig>,
    pub slaves: BTreeMap<String, NodeConfig>,

    /// Master/slave mode, named writers and readers.
    pub writers: BTreeMap<String, NodeConfig>,
    pub readers: BTreeMap<String, NodeConfig>,

    /// Cluster mode.
    pub nodes: BTreeMap<String, NodeConfig>,
}

impl DatabaseConfig {
    /// One node serving reads and writes.
    pub fn single(node: NodeConfig) -> Self {
        Self {
            mode: Mode::Single,
            default: Some(node),
            ..Self::default()
        }
    }

    /// A `master` writer plus named slaves.
    pub fn master_slave<I, S>(master: NodeConfig, slaves: I) -> Self
    where
        I: IntoIterator<Item = (S, NodeConfig)>,
        S: Into<String>,
    {
        Self {
            mode: Mode::MasterSlave,
            master: Some(master),
            slaves: slaves.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ..Self::default()
        }
    }

    /// Named peer nodes.
    pub fn cluster<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = (S, NodeConfig)>,
        S: Into<String>,
    {
        Self {
            mode: Mode::Cluster,
            nodes: nodes.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ..Self::default()
        }
    }

    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    pub fn table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    pub fn quoting(mut self, quoting: Quoting) -> Self {
        self.quoting = Some(quoting);
        self
    }

    pub fn log(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(text: &str) -> ConnectResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json(text: &str) -> ConnectResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the nodes required by [`mode`](Self::mode) are present.
    pub fn validate(&self) -> ConnectResult<()> {
        match self.mode {
            Mode::Single if self.default.is_none() => Err(ConnectError::config(
                "single mode needs a `default` node",
            )),
            Mode::MasterSlave if self.master.is_none() && self.writers.is_empty() => {
                Err(ConnectError::config(
                    "master_slave mode needs a `master` node or at least one `writers` entry",
                ))
            }
            Mode::Cluster if self.nodes.is_empty() => Err(ConnectError::config(
                "cluster mode needs at least one entry in `nodes`",
            )),
            _ => Ok(()),
        }
    }

    /// Every configured node, writers first.
    fn all_nodes(&self) -> impl Iterator<Item = &NodeConfig> {
        self.default
            .iter()
            .chain(self.master.iter())
            .chain(self.writers.values())
            .chain(self.slaves.values())
            .chain(self.readers.values())
            .chain(self.nodes.values())
    }

    /// Explicit driver, else the first DSN prefix, else `ansi`.
    pub fn driver_name(&self) -> &str {
        self.driver
            .as_deref()
            .or_else(|| self.all_nodes().find_map(NodeConfig::driver))
            .unwrap_or("ansi")
    }

    pub fn dialect(&self) -> Dialect {
        Dialect::from_driver(self.driver_name())
    }

    /// Settings handed to the grammar.
    pub fn grammar_config(&self) -> GrammarConfig {
        GrammarConfig {
            quoting: self.quoting.clone(),
            table_prefix: self.table_prefix.clone(),
        }
    }
}
