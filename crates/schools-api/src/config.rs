//! # Service Configuration
//!
//! Command-line flags with environment-variable fallbacks, parsed once at
//! startup by the binary. Defaults are suitable for local development.

use std::fmt;

use clap::{Args, Parser, ValueEnum};

/// Top-level server configuration.
#[derive(Clone, Parser)]
#[command(name = "schools-api", version, about = "School directory JSON API")]
pub struct Config {
    /// TCP port to listen on.
    #[arg(long, env = "PORT", default_value_t = 4000)]
    pub port: u16,

    /// Deployment environment, reported by the healthcheck.
    #[arg(long = "env", env = "SCHOOLS_ENV", value_enum, default_value_t = Environment::Development)]
    pub environment: Environment,

    #[command(flatten)]
    pub db: DbConfig,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Connection pool settings.
#[derive(Clone, Args)]
pub struct DbConfig {
    /// PostgreSQL DSN. When unset the service runs on the in-memory store.
    #[arg(long = "db-dsn", env = "DATABASE_URL", hide_env_values = true)]
    pub dsn: Option<String>,

    /// Maximum open connections in the pool.
    #[arg(long = "db-max-open-conns", default_value_t = 25)]
    pub max_open_conns: u32,

    /// Connections kept open while idle.
    #[arg(long = "db-max-idle-conns", default_value_t = 25)]
    pub max_idle_conns: u32,

    /// Seconds an idle connection may live before it is closed.
    #[arg(long = "db-max-idle-time", default_value_t = 900)]
    pub max_idle_time_secs: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            max_open_conns: 25,
            max_idle_conns: 25,
            max_idle_time_secs: 900,
        }
    }
}

/// Never print the DSN: it usually carries a password.
impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("dsn", &self.dsn.as_ref().map(|_| "[REDACTED]"))
            .field("max_open_conns", &self.max_open_conns)
            .field("max_idle_conns", &self.max_idle_conns)
            .field("max_idle_time_secs", &self.max_idle_time_secs)
            .finish()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("db", &self.db)
            .field("log_format", &self.log_format)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}
