//! Connection locator: picks the node for each statement.
//!
//! - Nodes are registered as `default` (single), `writer.<name>` /
//!   `reader.<name>` (master/slave) or by their plain name (cluster)
//! - Connections open lazily, with bounded retry, and are re-opened when a
//!   cached connection no longer answers `ping`
//! - While a transaction is open every `writer()` and `reader()` call returns
//!   the pinned writer

use crate::config::{DatabaseConfig, Mode, NodeConfig, RETRY_PAUSE};
use crate::connection::{Connection, ConnectionHandle, Connector, LiveQuoter, Row};
use crate::error::{ConnectError, ConnectResult};
use crate::log::SqlLogger;
use fluentsql::{
    BuiltQuery, Dialect, Grammar, NoConnectionQuoter, QueryBuilder, QueryError, StatementKind,
    Value,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Placeholder replaced by the table prefix in raw SQL.
pub const PREFIX_PLACEHOLDER: &str = "{pfx}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Writer,
    Reader,
}

impl Role {
    fn as_str(&self) -> &'static str {
        match self {
            Role::Writer => "writer",
            Role::Reader => "reader",
        }
    }
}

#[derive(Debug)]
struct Node {
    /// Registered name (`writer.master`, `reader.r1`, `default`, `a`).
    name: String,
    /// Name used for lookups (`master`, `r1`, `default`, `a`).
    key: String,
    config: NodeConfig,
    conn: Option<ConnectionHandle>,
}

/// Routes statements to single, master/slave or cluster nodes.
///
/// ```ignore
/// let config = DatabaseConfig::from_toml(&text)?;
/// let mut db = ConnectionLocator::new(config, connector)?;
///
/// let mut q = db.query_builder("users");
/// q.where_(("active", 1)).limit(10);
/// let rows = db.select(&q)?;
///
/// db.transaction(|db| {
///     let mut q = db.query_builder("users");
///     q.update([("active", 0)]).where_(("id", 7));
///     db.execute(&q)
/// })?;
/// ```
pub struct ConnectionLocator {
    config: DatabaseConfig,
    connector: Connector,
    grammar: Arc<dyn Grammar>,
    nodes: Vec<Node>,
    writers: Vec<usize>,
    readers: Vec<usize>,
    next_writer: usize,
    next_reader: usize,
    pinned: Option<ConnectionHandle>,
    retry_pause: Duration,
    logger: SqlLogger,
}

impl ConnectionLocator {
    /// Register the configured nodes. Nothing is opened yet.
    pub fn new(config: DatabaseConfig, connector: Connector) -> ConnectResult<Self> {
        config.validate()?;

        let mut nodes = Vec::new();
        let mut writers = Vec::new();
        let mut readers = Vec::new();
        let mut register = |name: String, key: &str, config: &NodeConfig| {
            nodes.push(Node {
                name,
                key: key.to_string(),
                config: config.clone(),
                conn: None,
            });
            nodes.len() - 1
        };

        match config.mode {
            Mode::Single => {
                if let Some(node) = &config.default {
                    let idx = register("default".to_string(), "default", node);
                    writers.push(idx);
                    readers.push(idx);
                }
            }
            Mode::MasterSlave => {
                if let Some(node) = &config.master {
                    writers.push(register("writer.master".to_string(), "master", node));
                }
                for (key, node) in &config.writers {
                    writers.push(register(format!("writer.{key}"), key.as_str(), node));
                }
                for (key, node) in config.slaves.iter().chain(&config.readers) {
                    readers.push(register(format!("reader.{key}"), key.as_str(), node));
                }
            }
            Mode::Cluster => {
                for (key, node) in &config.nodes {
                    let idx = register(key.clone(), key.as_str(), node);
                    writers.push(idx);
                    readers.push(idx);
                }
            }
        }

        let grammar = config.dialect().grammar_with(config.grammar_config());
        let logger = SqlLogger::new(config.log.clone());
        tracing::debug!(
            mode = ?config.mode,
            driver = config.driver_name(),
            writers = writers.len(),
            readers = readers.len(),
            "connection locator configured"
        );

        Ok(Self {
            config,
            connector,
            grammar,
            nodes,
            writers,
            readers,
            next_writer: 0,
            next_reader: 0,
            pinned: None,
            retry_pause: RETRY_PAUSE,
            logger,
        })
    }

    /// Override the pause between connect attempts.
    pub fn with_retry_pause(mut self, pause: Duration) -> Self {
        self.retry_pause = pause;
        self
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn dialect(&self) -> Dialect {
        self.grammar.dialect()
    }

    pub fn grammar(&self) -> &Arc<dyn Grammar> {
        &self.grammar
    }

    /// Registered node names, in registration order.
    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name.as_str()).collect()
    }

    /// Whether a connection to `name` is currently open.
    pub fn is_connected(&self, name: &str) -> bool {
        self.nodes
            .iter()
            .any(|n| n.name == name && n.conn.is_some())
    }

    // ==================== Node selection ====================

    /// Writer named `name`, or the next writer in rotation.
    pub fn writer(&mut self, name: Option<&str>) -> ConnectResult<ConnectionHandle> {
        if let Some(pinned) = &self.pinned {
            return Ok(pinned.clone());
        }
        let idx = self.pick(Role::Writer, name)?;
        self.connect(idx)
    }

    /// Reader named `name`, or the next reader in rotation.
    pub fn reader(&mut self, name: Option<&str>) -> ConnectResult<ConnectionHandle> {
        if let Some(pinned) = &self.pinned {
            return Ok(pinned.clone());
        }
        let idx = self.pick(Role::Reader, name)?;
        self.connect(idx)
    }

    /// The writer registered as `master`.
    pub fn master(&mut self) -> ConnectResult<ConnectionHandle> {
        self.writer(Some("master"))
    }

    pub fn slave(&mut self, name: Option<&str>) -> ConnectResult<ConnectionHandle> {
        self.reader(name)
    }

    fn pick(&mut self, role: Role, name: Option<&str>) -> ConnectResult<usize> {
        let candidates = match role {
            Role::Writer => &self.writers,
            Role::Reader => &self.readers,
        };
        if candidates.is_empty() {
            return Err(match role {
                Role::Reader => ConnectError::NoReader,
                Role::Writer => ConnectError::config("no writer connection is configured"),
            });
        }

        if let Some(name) = name {
            return candidates
                .iter()
                .copied()
                .find(|&idx| self.nodes[idx].key == name)
                .ok_or_else(|| {
                    ConnectError::UnknownConnection(format!("{}.{name}", role.as_str()))
                });
        }

        let cursor = match role {
            Role::Writer => &mut self.next_writer,
            Role::Reader => &mut self.next_reader,
        };
        let idx = candidates[*cursor % candidates.len()];
        *cursor = cursor.wrapping_add(1);
        Ok(idx)
    }

    /// Cached connection of node `idx`, opened or re-opened as needed.
    fn connect(&mut self, idx: usize) -> ConnectResult<ConnectionHandle> {
        if let Some(handle) = &self.nodes[idx].conn {
            if handle.ping() {
                return Ok(handle.clone());
            }
            tracing::warn!(node = %self.nodes[idx].name, "connection lost, reconnecting");
        }

        let node = &self.nodes[idx];
        let conn = self.open(&node.name, &node.config)?;
        let handle = ConnectionHandle::new(&node.name, conn);
        self.nodes[idx].conn = Some(handle.clone());
        Ok(handle)
    }

    fn open(
        &self,
        name: &str,
        config: &NodeConfig,
    ) -> ConnectResult<Box<dyn Connection>> {
        let retries = config.retries();
        let mut attempt = 0;
        loop {
            match (self.connector)(config) {
                Ok(conn) => {
                    tracing::info!(node = name, attempt, "connected");
                    return Ok(conn);
                }
                Err(err) if attempt < retries => {
                    attempt += 1;
                    tracing::warn!(
                        node = name,
                        attempt,
                        retries,
                        error = %err,
                        "connect failed, retrying"
                    );
                    thread::sleep(self.retry_pause);
                }
                Err(err) => return Err(ConnectError::connect(name, err.to_string())),
            }
        }
    }

    // ==================== Transactions ====================

    pub fn in_transaction(&self) -> bool {
        self.pinned.is_some()
    }

    /// Begin a transaction on a writer and pin it until commit or rollback.
    pub fn begin_transaction(&mut self) -> ConnectResult<ConnectionHandle> {
        if self.pinned.is_some() {
            return Err(ConnectError::transaction("a transaction is already open"));
        }
        let writer = self.writer(None)?;
        writer.with(|conn| conn.begin())?;
        tracing::debug!(node = writer.name(), "transaction started, writer pinned");
        self.pinned = Some(writer.clone());
        Ok(writer)
    }

    /// Commit and release the pinned writer.
    pub fn commit(&mut self) -> ConnectResult<()> {
        let writer = self
            .pinned
            .take()
            .ok_or_else(|| ConnectError::transaction("no open transaction to commit"))?;
        writer.with(|conn| conn.commit())?;
        tracing::debug!(node = writer.name(), "transaction committed");
        Ok(())
    }

    /// Roll back and release the pinned writer.
    pub fn rollback(&mut self) -> ConnectResult<()> {
        let writer = self
            .pinned
            .take()
            .ok_or_else(|| ConnectError::transaction("no open transaction to roll back"))?;
        writer.with(|conn| conn.rollback())?;
        tracing::debug!(node = writer.name(), "transaction rolled back");
        Ok(())
    }

    /// Run `f` inside a transaction: commit on `Ok`, roll back on `Err`.
    pub fn transaction<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> ConnectResult<R>,
    ) -> ConnectResult<R> {
        self.begin_transaction()?;
        match f(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback() {
                    tracing::warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    // ==================== Execution ====================

    /// Builder on `table` wired to the configured grammar.
    pub fn query_builder(&self, table: &str) -> QueryBuilder {
        let mut q = QueryBuilder::new(Arc::clone(&self.grammar));
        q.from(table);
        q
    }

    /// Run a select on a reader, or on the writer when the builder asks for
    /// it or a transaction is open.
    pub fn select(&mut self, query: &QueryBuilder) -> ConnectResult<Vec<Row>> {
        if query.statement_kind() != StatementKind::Select {
            return Err(QueryError::compile(format!(
                "select() needs a select statement, got {}",
                query.statement_kind().as_str()
            ))
            .into());
        }
        let built = query.compile()?;
        let handle = if query.uses_writer() {
            self.writer(None)?
        } else {
            self.reader(None)?
        };
        self.log(StatementKind::Select, &handle, &built);
        handle.with(|conn| conn.query(&built.sql, &built.bindings))
    }

    /// Run an insert, update or delete on the writer; returns affected rows.
    pub fn execute(&mut self, query: &QueryBuilder) -> ConnectResult<u64> {
        let kind = query.statement_kind();
        if !kind.is_write() {
            return Err(QueryError::compile("execute() needs an insert, update or delete").into());
        }
        let built = query.compile()?;
        let handle = self.writer(None)?;
        self.log(kind, &handle, &built);
        handle.with(|conn| conn.execute(&built.sql, &built.bindings))
    }

    /// Run an insert built with `insert_get_id` and return the generated key.
    ///
    /// Postgres reads the key from `returning`; other dialects ask the driver.
    pub fn insert_get_id(&mut self, query: &QueryBuilder) -> ConnectResult<Option<Value>> {
        let Some(sequence) = query.insert_sequence() else {
            return Err(
                QueryError::compile("insert_get_id() needs a builder from insert_get_id").into(),
            );
        };
        let built = query.compile()?;
        let handle = self.writer(None)?;
        self.log(StatementKind::Insert, &handle, &built);

        if self.dialect() == Dialect::Postgres {
            let rows = handle.with(|conn| conn.query(&built.sql, &built.bindings))?;
            return Ok(rows
                .first()
                .and_then(|row| row.get(sequence).or_else(|| row.get_index(0)))
                .cloned());
        }
        handle.with(|conn| {
            conn.execute(&built.sql, &built.bindings)?;
            conn.last_insert_id(Some(sequence))
        })
    }

    /// Run raw SQL on a reader after `{pfx}` substitution.
    pub fn select_raw(&mut self, sql: &str, bindings: &[Value]) -> ConnectResult<Vec<Row>> {
        let sql = self.replace_table_prefix(sql);
        let handle = self.reader(None)?;
        self.log_raw(StatementKind::Select, &handle, &sql, bindings.len());
        handle.with(|conn| conn.query(&sql, bindings))
    }

    /// Run raw SQL on the writer after `{pfx}` substitution.
    pub fn execute_raw(&mut self, sql: &str, bindings: &[Value]) -> ConnectResult<u64> {
        let sql = self.replace_table_prefix(sql);
        let handle = self.writer(None)?;
        self.log_raw(StatementKind::Update, &handle, &sql, bindings.len());
        handle.with(|conn| conn.execute(&sql, bindings))
    }

    /// Substitute `{pfx}` with the configured table prefix.
    pub fn replace_table_prefix(&self, sql: &str) -> String {
        sql.replace(PREFIX_PLACEHOLDER, &self.config.table_prefix)
    }

    /// SQL with bindings inlined, quoted by an open connection when there is
    /// one. For logs and debugging only.
    pub fn interpolate(&self, built: &BuiltQuery) -> String {
        let live = self
            .pinned
            .as_ref()
            .or_else(|| self.nodes.iter().find_map(|n| n.conn.as_ref()));
        if let Some(handle) = live {
            if let Ok(sql) = handle.with(|conn| Ok(built.interpolate(&LiveQuoter(&*conn)))) {
                return sql;
            }
        }
        built.interpolate(&NoConnectionQuoter)
    }

    /// Drop every cached connection and any pinned writer.
    pub fn disconnect(&mut self) {
        if self.pinned.take().is_some() {
            tracing::warn!("disconnecting with an open transaction");
        }
        for node in &mut self.nodes {
            node.conn = None;
        }
        tracing::info!("all connections closed");
    }

    fn log(&self, kind: StatementKind, handle: &ConnectionHandle, built: &BuiltQuery) {
        self.log_raw(kind, handle, &built.sql, built.bindings.len());
    }

    fn log_raw(&self, kind: StatementKind, handle: &ConnectionHandle, sql: &str, params: usize) {
        self.logger.statement(kind, handle.name(), sql, params);
    }
}

impl std::fmt::Debug for ConnectionLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionLocator")
            .field("mode", &self.config.mode)
            .field("dialect", &self.dialect())
            .field("nodes", &self.nodes)
            .field("in_transaction", &self.in_transaction())
            .finish_non_exhaustive()
    }
}
