use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// MongoDB connection settings
    pub mongo: MongoConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// MongoDB connection settings
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoConfig {
    /// User name, empty for unauthenticated servers
    pub username: String,

    /// Password, empty for unauthenticated servers
    pub password: String,

    /// Host name (SRV record name in remote mode)
    pub host: String,

    /// Port, ignored in remote mode
    pub port: u16,

    /// Authentication database appended to the URI path
    pub auth_database: String,

    /// Use the `mongodb+srv://` form
    pub remote: bool,

    /// Deadline applied to every database operation
    pub operation_timeout_secs: u64,

    /// Application name reported to the server
    pub app_name: Option<String>,

    /// Maximum number of pooled connections
    pub max_pool_size: Option<u32>,

    /// Minimum number of pooled connections
    pub min_pool_size: Option<u32>,

    /// Connection timeout
    pub connect_timeout_secs: Option<u64>,

    /// Server selection timeout
    pub server_selection_timeout_secs: Option<u64>,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            host: "localhost".to_string(),
            port: 27017,
            auth_database: String::new(),
            remote: false,
            operation_timeout_secs: 10,
            app_name: Some("mgo-rs".to_string()),
            max_pool_size: None,
            min_pool_size: None,
            connect_timeout_secs: None,
            server_selection_timeout_secs: None,
        }
    }
}

impl MongoConfig {
    /// Settings for a server at `host:port`
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            ..Self::default()
        }
    }

    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = username.to_string();
        self.password = password.to_string();
        self
    }

    pub fn with_auth_database(mut self, auth_database: &str) -> Self {
        self.auth_database = auth_database.to_string();
        self
    }

    pub fn with_remote(mut self, remote: bool) -> Self {
        self.remote = remote;
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout_secs = timeout.as_secs();
        self
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Validate connection settings
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::Config("MongoDB host cannot be empty".to_string()));
        }
        if !self.remote && self.port == 0 {
            return Err(Error::Config("MongoDB port cannot be zero".to_string()));
        }
        if self.operation_timeout_secs == 0 {
            return Err(Error::Config(
                "Operation timeout must be at least one second".to_string(),
            ));
        }
        if let (Some(min), Some(max)) = (self.min_pool_size, self.max_pool_size) {
            if min > max {
                return Err(Error::Config(format!(
                    "min_pool_size ({}) exceeds max_pool_size ({})",
                    min, max
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for MongoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoConfig")
            .field("username", &self.username)
            .field("password", &"****")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("auth_database", &self.auth_database)
            .field("remote", &self.remote)
            .field("operation_timeout_secs", &self.operation_timeout_secs)
            .field("app_name", &self.app_name)
            .field("max_pool_size", &self.max_pool_size)
            .field("min_pool_size", &self.min_pool_size)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field(
                "server_selection_timeout_secs",
                &self.server_selection_timeout_secs,
            )
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace); `RUST_LOG` overrides it
    pub level: String,

    /// Log format
    pub format: LogFormat,

    /// Write to stderr
    pub console: bool,

    /// Directory for log files, no file output when unset
    pub directory: Option<PathBuf>,

    /// File rotation
    pub rotation: LogRotation,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            console: true,
            directory: None,
            rotation: LogRotation::Daily,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogFormat {
    /// Pretty-printed format
    #[serde(rename = "pretty")]
    Pretty,

    /// JSON format
    #[serde(rename = "json")]
    Json,

    /// Compact format
    #[serde(rename = "compact")]
    Compact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogRotation {
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "hourly")]
    Hourly,
    #[serde(rename = "never")]
    Never,
}
