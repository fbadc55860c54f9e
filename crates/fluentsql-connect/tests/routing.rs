use fluentsql::{Dialect, NoConnectionQuoter, Quoter, Value};
use fluentsql_connect::{
    ConnectError, ConnectResult, Connection, ConnectionLocator, Connector, DatabaseConfig,
    NodeConfig, Row,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// `(dsn, sql)` for every statement or transaction command sent.
type Log = Arc<Mutex<Vec<(String, String)>>>;

struct MockConnection {
    dsn: String,
    dialect: Dialect,
    log: Log,
    alive: Arc<AtomicBool>,
}

impl MockConnection {
    fn record(&self, sql: &str) {
        self.log
            .lock()
            .unwrap()
            .push((self.dsn.clone(), sql.to_string()));
    }
}

impl Quoter for MockConnection {
    fn quote(&self, value: &Value) -> String {
        match value {
            Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
            other => NoConnectionQuoter.quote(other),
        }
    }
}

impl Connection for MockConnection {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn execute(&mut self, sql: &str, _bindings: &[Value]) -> ConnectResult<u64> {
        self.record(sql);
        Ok(1)
    }

    fn query(&mut self, sql: &str, _bindings: &[Value]) -> ConnectResult<Vec<Row>> {
        self.record(sql);
        Ok(vec![Row::new(vec![
            ("id".to_string(), Value::Int(42)),
            ("dsn".to_string(), Value::Text(self.dsn.clone())),
        ])])
    }

    fn last_insert_id(&mut self, _sequence: Option<&str>) -> ConnectResult<Option<Value>> {
        Ok(Some(Value::Int(7)))
    }

    fn begin(&mut self) -> ConnectResult<()> {
        self.record("begin");
        Ok(())
    }

    fn commit(&mut self) -> ConnectResult<()> {
        self.record("commit");
        Ok(())
    }

    fn rollback(&mut self) -> ConnectResult<()> {
        self.record("rollback");
        Ok(())
    }

    fn ping(&mut self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

/// Fake driver: counts connect attempts per DSN and fails the first
/// `failures[dsn]` of them.
#[derive(Clone, Default)]
struct Driver {
    log: Log,
    attempts: Arc<Mutex<HashMap<String, usize>>>,
    failures: Arc<Mutex<HashMap<String, usize>>>,
    alive: Arc<AtomicBool>,
    connects: Arc<AtomicUsize>,
}

impl Driver {
    fn new() -> Self {
        let driver = Self::default();
        driver.alive.store(true, Ordering::SeqCst);
        driver
    }

    fn fail(&self, dsn: &str, times: usize) {
        self.failures.lock().unwrap().insert(dsn.to_string(), times);
    }

    fn attempts(&self, dsn: &str) -> usize {
        self.attempts.lock().unwrap().get(dsn).copied().unwrap_or(0)
    }

    fn statements(&self) -> Vec<(String, String)> {
        self.log.lock().unwrap().clone()
    }

    fn connector(&self, dialect: Dialect) -> Connector {
        let driver = self.clone();
        Arc::new(move |node: &NodeConfig| {
            let attempt = {
                let mut attempts = driver.attempts.lock().unwrap();
                let count = attempts.entry(node.dsn.clone()).or_insert(0);
                *count += 1;
                *count
            };
            let failures = driver
                .failures
                .lock()
                .unwrap()
                .get(&node.dsn)
                .copied()
                .unwrap_or(0);
            if attempt <= failures {
                return Err(ConnectError::driver(format!("{} refused", node.dsn)));
            }
            driver.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(MockConnection {
                dsn: node.dsn.clone(),
                dialect,
                log: Arc::clone(&driver.log),
                alive: Arc::clone(&driver.alive),
            }) as Box<dyn Connection>)
        })
    }
}

fn master_slave() -> DatabaseConfig {
    DatabaseConfig::master_slave(
        NodeConfig::new("mysql:host=master"),
        [
            ("r1", NodeConfig::new("mysql:host=r1")),
            ("r2", NodeConfig::new("mysql:host=r2")),
        ],
    )
}

fn locator(config: DatabaseConfig, driver: &Driver) -> ConnectionLocator {
    let dialect = config.dialect();
    ConnectionLocator::new(config, driver.connector(dialect))
        .unwrap()
        .with_retry_pause(Duration::ZERO)
}

#[test]
fn single_node_serves_reads_and_writes() {
    let driver = Driver::new();
    let mut db = locator(DatabaseConfig::single(NodeConfig::new("sqlite::memory:")), &driver);

    assert_eq!(db.node_names(), vec!["default"]);
    let writer = db.writer(None).unwrap();
    let reader = db.reader(None).unwrap();
    assert_eq!(writer.name(), "default");
    assert!(writer.same_connection(&reader));
    assert_eq!(driver.connects.load(Ordering::SeqCst), 1);
}

#[test]
fn master_slave_registers_prefixed_names() {
    let driver = Driver::new();
    let db = locator(master_slave(), &driver);

    assert_eq!(db.node_names(), vec!["writer.master", "reader.r1", "reader.r2"]);
    assert_eq!(db.dialect(), Dialect::MySql);
    assert!(!db.is_connected("writer.master"));
}

#[test]
fn readers_rotate_and_named_lookups_work() {
    let driver = Driver::new();
    let mut db = locator(master_slave(), &driver);

    let first = db.reader(None).unwrap();
    let second = db.reader(None).unwrap();
    let third = db.reader(None).unwrap();
    assert_eq!(first.name(), "reader.r1");
    assert_eq!(second.name(), "reader.r2");
    assert!(third.same_connection(&first));

    assert_eq!(db.slave(Some("r2")).unwrap().name(), "reader.r2");
    assert_eq!(db.master().unwrap().name(), "writer.master");
    assert_eq!(db.writer(Some("master")).unwrap().name(), "writer.master");
    assert!(db.is_connected("writer.master"));
}

#[test]
fn unknown_names_are_reported_with_role() {
    let driver = Driver::new();
    let mut db = locator(master_slave(), &driver);

    let err = db.reader(Some("r9")).unwrap_err();
    assert!(err.is_unknown_connection());
    assert_eq!(err.to_string(), "The connection 'reader.r9' does not exist");

    let err = db.writer(Some("r1")).unwrap_err();
    assert_eq!(err.to_string(), "The connection 'writer.r1' does not exist");
    assert_eq!(driver.connects.load(Ordering::SeqCst), 0);
}

#[test]
fn master_slave_without_readers_has_no_reader() {
    let driver = Driver::new();
    let config = DatabaseConfig::master_slave(
        NodeConfig::new("pgsql:host=master"),
        Vec::<(String, NodeConfig)>::new(),
    );
    let mut db = locator(config, &driver);

    assert!(matches!(db.reader(None), Err(ConnectError::NoReader)));
    assert!(db.writer(None).is_ok());
}

#[test]
fn named_writers_and_readers() {
    let driver = Driver::new();
    let mut config = DatabaseConfig::master_slave(
        NodeConfig::new("mysql:host=m"),
        Vec::<(String, NodeConfig)>::new(),
    );
    config.writers.insert("w2".to_string(), NodeConfig::new("mysql:host=w2"));
    config.readers.insert("ro".to_string(), NodeConfig::new("mysql:host=ro"));
    let mut db = locator(config, &driver);

    assert_eq!(
        db.node_names(),
        vec!["writer.master", "writer.w2", "reader.ro"]
    );
    assert_eq!(db.writer(None).unwrap().name(), "writer.master");
    assert_eq!(db.writer(None).unwrap().name(), "writer.w2");
    assert_eq!(db.reader(Some("ro")).unwrap().name(), "reader.ro");
}

#[test]
fn cluster_rotates_over_all_nodes() {
    let driver = Driver::new();
    let config = DatabaseConfig::cluster([
        ("a", NodeConfig::new("pgsql:host=a")),
        ("b", NodeConfig::new("pgsql:host=b")),
    ]);
    let mut db = locator(config, &driver);

    assert_eq!(db.node_names(), vec!["a", "b"]);
    assert_eq!(db.writer(None).unwrap().name(), "a");
    assert_eq!(db.writer(None).unwrap().name(), "b");
    assert_eq!(db.reader(None).unwrap().name(), "a");
    assert_eq!(db.reader(Some("b")).unwrap().name(), "b");
}

#[test]
fn transaction_pins_writer() {
    let driver = Driver::new();
    let mut db = locator(master_slave(), &driver);

    let writer = db.begin_transaction().unwrap();
    assert!(db.in_transaction());
    assert!(db.reader(None).unwrap().same_connection(&writer));
    assert!(db.reader(Some("r2")).unwrap().same_connection(&writer));
    assert!(db.writer(None).unwrap().same_connection(&writer));

    let mut q = db.query_builder("users");
    q.where_(("id", 1));
    db.select(&q).unwrap();

    db.commit().unwrap();
    assert!(!db.in_transaction());
    assert_eq!(db.reader(None).unwrap().name(), "reader.r1");

    let statements = driver.statements();
    assert_eq!(
        statements,
        vec![
            ("mysql:host=master".to_string(), "begin".to_string()),
            (
                "mysql:host=master".to_string(),
                "select * from `users` where `id` = ?".to_string()
            ),
            ("mysql:host=master".to_string(), "commit".to_string()),
        ]
    );
}

#[test]
fn transaction_misuse_is_an_error() {
    let driver = Driver::new();
    let mut db = locator(master_slave(), &driver);

    assert!(db.commit().unwrap_err().is_transaction());
    assert!(db.rollback().unwrap_err().is_transaction());

    db.begin_transaction().unwrap();
    assert!(db.begin_transaction().unwrap_err().is_transaction());
    db.rollback().unwrap();
    assert!(!db.in_transaction());
}

#[test]
fn transaction_helper_commits_or_rolls_back() {
    let driver = Driver::new();
    let mut db = locator(master_slave(), &driver);

    let affected = db
        .transaction(|db| {
            let mut q = db.query_builder("users");
            q.update([("active", 0)]).where_(("id", 7));
            db.execute(&q)
        })
        .unwrap();
    assert_eq!(affected, 1);

    let err = db
        .transaction(|_| -> ConnectResult<()> { Err(ConnectError::driver("boom")) })
        .unwrap_err();
    assert!(matches!(err, ConnectError::Driver(_)));
    assert!(!db.in_transaction());

    let commands: Vec<String> = driver.statements().into_iter().map(|(_, sql)| sql).collect();
    assert_eq!(
        commands,
        vec![
            "begin",
            "update `users` set `active` = ? where `id` = ?",
            "commit",
            "begin",
            "rollback",
        ]
    );
}

#[test]
fn connect_retries_until_success() {
    let driver = Driver::new();
    driver.fail("mysql:host=master", 2);
    let config = DatabaseConfig::master_slave(
        NodeConfig::new("mysql:host=master").retry(3),
        Vec::<(String, NodeConfig)>::new(),
    );
    let mut db = locator(config, &driver);

    assert_eq!(db.master().unwrap().name(), "writer.master");
    assert_eq!(driver.attempts("mysql:host=master"), 3);
}

#[test]
fn connect_gives_up_after_retries() {
    let driver = Driver::new();
    driver.fail("mysql:host=master", 10);
    let config = DatabaseConfig::master_slave(
        NodeConfig::new("mysql:host=master").retry(2),
        Vec::<(String, NodeConfig)>::new(),
    );
    let mut db = locator(config, &driver);

    let err = db.master().unwrap_err();
    assert!(err.is_connect());
    assert!(err.to_string().contains("writer.master"));
    assert_eq!(driver.attempts("mysql:host=master"), 3);
}

#[test]
fn out_of_range_retry_tries_once() {
    let driver = Driver::new();
    driver.fail("sqlite::memory:", 1);
    let config = DatabaseConfig::single(NodeConfig::new("sqlite::memory:").retry(6));
    let mut db = locator(config, &driver);

    assert!(db.writer(None).unwrap_err().is_connect());
    assert_eq!(driver.attempts("sqlite::memory:"), 1);
}

#[test]
fn dead_connection_is_reopened() {
    let driver = Driver::new();
    let mut db = locator(DatabaseConfig::single(NodeConfig::new("sqlite::memory:")), &driver);

    db.writer(None).unwrap();
    db.writer(None).unwrap();
    assert_eq!(driver.connects.load(Ordering::SeqCst), 1);

    driver.alive.store(false, Ordering::SeqCst);
    db.writer(None).unwrap();
    assert_eq!(driver.connects.load(Ordering::SeqCst), 2);
}

#[test]
fn select_routes_to_reader_unless_writer_requested() {
    let driver = Driver::new();
    let mut db = locator(master_slave(), &driver);

    let mut q = db.query_builder("users");
    q.where_(("active", 1)).limit(5);
    let rows = db.select(&q).unwrap();
    assert_eq!(
        rows[0].get("dsn"),
        Some(&Value::Text("mysql:host=r1".to_string()))
    );

    q.use_writer();
    let rows = db.select(&q).unwrap();
    assert_eq!(
        rows[0].get("dsn"),
        Some(&Value::Text("mysql:host=master".to_string()))
    );
}

#[test]
fn select_and_execute_check_statement_kind() {
    let driver = Driver::new();
    let mut db = locator(master_slave(), &driver);

    let mut q = db.query_builder("users");
    q.delete().where_(("id", 1));
    assert!(matches!(db.select(&q), Err(ConnectError::Query(_))));
    assert_eq!(db.execute(&q).unwrap(), 1);

    let q = db.query_builder("users");
    assert!(matches!(db.execute(&q), Err(ConnectError::Query(_))));
    assert!(matches!(db.insert_get_id(&q), Err(ConnectError::Query(_))));

    let (dsn, sql) = driver.statements().pop().unwrap();
    assert_eq!(dsn, "mysql:host=master");
    assert_eq!(sql, "delete from `users` where `id` = ?");
}

#[test]
fn build_errors_surface_before_routing() {
    let driver = Driver::new();
    let mut db = locator(master_slave(), &driver);

    let mut q = db.query_builder("users");
    q.order_by("id", "sideways");
    assert!(matches!(db.select(&q), Err(ConnectError::Query(_))));
    assert_eq!(driver.connects.load(Ordering::SeqCst), 0);
}

#[test]
fn insert_get_id_uses_driver_key() {
    let driver = Driver::new();
    let mut db = locator(master_slave(), &driver);

    let mut q = db.query_builder("users");
    q.insert_get_id([("name", "ada")], None);
    assert_eq!(db.insert_get_id(&q).unwrap(), Some(Value::Int(7)));
}

#[test]
fn insert_get_id_reads_returning_on_postgres() {
    let driver = Driver::new();
    let config = DatabaseConfig::single(NodeConfig::new("pgsql:host=db"));
    let mut db = locator(config, &driver);

    let mut q = db.query_builder("users");
    q.insert_get_id([("name", "ada")], Some("id"));
    assert_eq!(db.insert_get_id(&q).unwrap(), Some(Value::Int(42)));

    let (_, sql) = driver.statements().pop().unwrap();
    assert_eq!(sql, r#"insert into "users" ("name") values (?) returning "id""#);
}

#[test]
fn table_prefix_applies_to_builders_and_raw_sql() {
    let driver = Driver::new();
    let config = master_slave().table_prefix("app_");
    let mut db = locator(config, &driver);

    assert_eq!(
        db.replace_table_prefix("select * from {pfx}users join {pfx}posts"),
        "select * from app_users join app_posts"
    );

    let q = db.query_builder("users");
    assert_eq!(q.to_sql().unwrap(), "select * from `app_users`");

    db.select_raw("select * from {pfx}users where id = ?", &[Value::Int(1)])
        .unwrap();
    db.execute_raw("delete from {pfx}users", &[]).unwrap();
    assert_eq!(
        driver.statements(),
        vec![
            (
                "mysql:host=r1".to_string(),
                "select * from app_users where id = ?".to_string()
            ),
            (
                "mysql:host=master".to_string(),
                "delete from app_users".to_string()
            ),
        ]
    );
}

#[test]
fn interpolate_prefers_live_connection() {
    let driver = Driver::new();
    let mut db = locator(master_slave(), &driver);

    let mut q = db.query_builder("users");
    q.where_(("name", "o'brien"));
    let built = q.compile().unwrap();

    assert_eq!(
        db.interpolate(&built),
        r"select * from `users` where `name` = 'o\'brien'"
    );

    db.master().unwrap();
    assert_eq!(
        db.interpolate(&built),
        "select * from `users` where `name` = 'o''brien'"
    );
}

#[test]
fn disconnect_drops_connections() {
    let driver = Driver::new();
    let mut db = locator(master_slave(), &driver);

    db.begin_transaction().unwrap();
    db.reader(Some("r1")).ok();
    db.disconnect();

    assert!(!db.in_transaction());
    assert!(!db.is_connected("writer.master"));
    db.reader(Some("r1")).unwrap();
    assert_eq!(driver.connects.load(Ordering::SeqCst), 2);
}

#[test]
fn invalid_config_is_rejected() {
    let driver = Driver::new();
    let err = ConnectionLocator::new(
        DatabaseConfig::cluster(Vec::<(String, NodeConfig)>::new()),
        driver.connector(Dialect::Ansi),
    )
    .unwrap_err();
    assert!(err.is_config());
}
