//! Driver capability interface.

use crate::config::NodeConfig;
use crate::error::{ConnectError, ConnectResult};
use fluentsql::{Dialect, Quoter, Value};
use std::fmt;
use std::sync::{Arc, Mutex};

/// One result row: column names with their values, in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    /// Value of the first column named `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    /// Value at position `idx`.
    pub fn get_index(&self, idx: usize) -> Option<&Value> {
        self.columns.get(idx).map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn into_inner(self) -> Vec<(String, Value)> {
        self.columns
    }
}

/// What the locator needs from a live database connection.
///
/// Statements arrive compiled, with positional `?` placeholders and their
/// bindings in order. `quote` is the driver's own literal quoting, used
/// instead of the no-connection fallback when rendering SQL for logs.
pub trait Connection: Quoter + Send {
    fn dialect(&self) -> Dialect;

    /// Run a statement; returns the affected row count.
    fn execute(&mut self, sql: &str, bindings: &[Value]) -> ConnectResult<u64>;

    /// Run a query and fetch every row.
    fn query(&mut self, sql: &str, bindings: &[Value]) -> ConnectResult<Vec<Row>>;

    /// Key generated by the last insert on this connection.
    fn last_insert_id(&mut self, sequence: Option<&str>) -> ConnectResult<Option<Value>>;

    fn begin(&mut self) -> ConnectResult<()>;

    fn commit(&mut self) -> ConnectResult<()>;

    fn rollback(&mut self) -> ConnectResult<()>;

    /// Whether the connection is still usable.
    fn ping(&mut self) -> bool;
}

/// Opens a connection for a node.
pub type Connector = Arc<dyn Fn(&NodeConfig) -> ConnectResult<Box<dyn Connection>> + Send + Sync>;

/// Shared handle to an open connection.
///
/// Clones refer to the same connection; the locator hands out the same
/// handle for every call made while a transaction is open.
#[derive(Clone)]
pub struct ConnectionHandle {
    name: Arc<str>,
    conn: Arc<Mutex<Box<dyn Connection>>>,
}

impl ConnectionHandle {
    pub(crate) fn new(name: &str, conn: Box<dyn Connection>) -> Self {
        Self {
            name: Arc::from(name),
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Registered node name, e.g. `writer.master` or `reader.replica1`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether both handles refer to the same open connection.
    pub fn same_connection(&self, other: &ConnectionHandle) -> bool {
        Arc::ptr_eq(&self.conn, &other.conn)
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with<R>(
        &self,
        f: impl FnOnce(&mut dyn Connection) -> ConnectResult<R>,
    ) -> ConnectResult<R> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| ConnectError::driver(format!("connection '{}' is poisoned", self.name)))?;
        f(&mut **guard)
    }

    pub fn ping(&self) -> bool {
        self.with(|conn| Ok(conn.ping())).unwrap_or(false)
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Borrowed connection used as a [`Quoter`].
pub(crate) struct LiveQuoter<'a>(pub(crate) &'a dyn Connection);

impl Quoter for LiveQuoter<'_> {
    fn quote(&self, value: &Value) -> String {
        self.0.quote(value)
    }
}
