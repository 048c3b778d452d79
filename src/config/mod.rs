use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Settings for opening a connection to the store under test.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database path, e.g. `/local`.
    #[serde(default = "default_database", alias = "db")]
    pub database: String,
    #[serde(default)]
    pub use_tls: bool,
    /// Port used instead of `port` when TLS is on.
    #[serde(default = "default_tls_port")]
    pub tls_port: u16,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    2136
}

fn default_database() -> String {
    "/local".to_string()
}

fn default_tls_port() -> u16 {
    2135
}

fn default_test_parameters() -> bool {
    true
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: default_database(),
            use_tls: false,
            tls_port: default_tls_port(),
        }
    }
}

impl ConnectionConfig {
    pub fn effective_port(&self) -> u16 {
        if self.use_tls {
            self.tls_port
        } else {
            self.port
        }
    }

    /// Client connection string, e.g.
    /// `Host=localhost;Port=2136;Database=/local;UseTls=false`.
    pub fn connection_string(&self) -> String {
        format!(
            "Host={};Port={};Database={};UseTls={}",
            self.host,
            self.effective_port(),
            self.database,
            self.use_tls
        )
    }
}

/// Configuration handed to the round-trip harness.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HarnessConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Suite default for the bound-parameter verification cycle; cases may
    /// override it.
    #[serde(default = "default_test_parameters")]
    pub test_parameters: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            test_parameters: default_test_parameters(),
        }
    }
}

impl HarnessConfig {
    pub fn load(config_path: &str) -> Result<Self> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::File::with_name(config_path));

        // Environment variables with prefix YDB_, nested keys split on "__"
        // Example: YDB_CONNECTION__PORT=2136
        builder = builder.add_source(
            config::Environment::with_prefix("YDB")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let connection = &self.connection;

        if connection.host.trim().is_empty() {
            anyhow::bail!("Connection requires a non-empty 'host'");
        }
        if connection.port == 0 {
            anyhow::bail!("Connection 'port' must be non-zero");
        }
        if connection.use_tls && connection.tls_port == 0 {
            anyhow::bail!("TLS connections require a non-zero 'tls_port'");
        }
        if !connection.database.starts_with('/') {
            anyhow::bail!(
                "Database path must start with '/', got '{}'",
                connection.database
            );
        }
        if connection.database.len() < 2 {
            anyhow::bail!("Database path must name a database");
        }

        Ok(())
    }
}
