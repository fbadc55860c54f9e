//! Error types for fluentsql-connect

use fluentsql::QueryError;
use thiserror::Error;

/// Result type alias for connection routing operations
pub type ConnectResult<T> = Result<T, ConnectError>;

/// Errors raised while configuring, routing or executing
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Invalid or incomplete configuration
    #[error("Config error: {0}")]
    Config(String),

    /// A connection name that was never registered
    #[error("The connection '{0}' does not exist")]
    UnknownConnection(String),

    /// Master/slave topology without any reader
    #[error("No reader connection is configured")]
    NoReader,

    /// Connecting failed after every retry
    #[error("Connect error on '{node}': {message}")]
    Connect { node: String, message: String },

    /// Error reported by the driver while executing
    #[error("Driver error: {0}")]
    Driver(String),

    /// Transaction misuse (nested begin, commit without begin)
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Compiling the query failed
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("TOML config error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON config error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConnectError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn connect(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connect {
            node: node.into(),
            message: message.into(),
        }
    }

    /// Create a driver error
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver(message.into())
    }

    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction(message.into())
    }

    /// Check if this is an unknown connection error
    pub fn is_unknown_connection(&self) -> bool {
        matches!(self, Self::UnknownConnection(_))
    }

    /// Check if this is a connect error
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }

    pub fn is_transaction(&self) -> bool {
        matches!(self, Self::Transaction(_))
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Toml(_) | Self::Json(_))
    }
}
