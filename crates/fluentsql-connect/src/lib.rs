//! # fluentsql-connect
//!
//! Routes compiled fluentsql statements to database nodes.
//!
//! ## Features
//!
//! - **Topologies**: single node, master/slave (named writers and readers) or cluster
//! - **Writer pinning**: an open transaction sends reads and writes to the same writer
//! - **Lazy connects**: nodes open on first use, with per-node retry
//! - **Driver agnostic**: plug any driver in through the [`Connection`] trait
//! - **SQL logging**: statements are traced on the `fluentsql.sql` target
//!
//! ## Example
//!
//! ```ignore
//! use fluentsql_connect::{ConnectionLocator, DatabaseConfig, NodeConfig};
//! use std::sync::Arc;
//!
//! let config = DatabaseConfig::master_slave(
//!     NodeConfig::new("mysql:host=db-1;dbname=app"),
//!     [("replica1", NodeConfig::new("mysql:host=db-2;dbname=app"))],
//! );
//! let mut db = ConnectionLocator::new(config, Arc::new(my_driver::connect))?;
//!
//! let mut q = db.query_builder("users");
//! q.where_(("active", true)).order_by_desc("id").limit(20);
//! let rows = db.select(&q)?; // runs on replica1
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod locator;
mod log;

pub use config::{DatabaseConfig, LogConfig, MAX_RETRY, Mode, NodeConfig, RETRY_PAUSE};
pub use connection::{Connection, ConnectionHandle, Connector, Row};
pub use error::{ConnectError, ConnectResult};
pub use locator::{ConnectionLocator, PREFIX_PLACEHOLDER};
