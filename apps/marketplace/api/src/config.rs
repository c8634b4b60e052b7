use core_config::{ConfigError, FromEnv, env_parse, server::ServerConfig};
use database::postgres::PostgresConfig;
use domain_notifications::WorkerConfig;
use std::str::FromStr;

pub use core_config::Environment;

/// Which email provider delivers order confirmations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmailProviderKind {
    Smtp,
    /// Keeps emails in memory; for local development
    Mock,
}

impl FromStr for EmailProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "smtp" => Ok(Self::Smtp),
            "mock" => Ok(Self::Mock),
            other => Err(format!("unknown email provider '{}', expected smtp or mock", other)),
        }
    }
}

/// Order confirmation delivery settings
#[derive(Clone, Debug)]
pub struct NotificationConfig {
    pub provider: EmailProviderKind,
    /// Summaries that may wait for the worker before new ones are dropped
    pub queue_capacity: usize,
    pub worker: WorkerConfig,
}

impl FromEnv for NotificationConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let queue_capacity = env_parse("NOTIFICATION_QUEUE_CAPACITY", 1024usize)?;
        if queue_capacity == 0 {
            return Err(ConfigError::ParseError {
                key: "NOTIFICATION_QUEUE_CAPACITY".to_string(),
                details: "must be greater than 0".to_string(),
            });
        }

        Ok(Self {
            provider: env_parse("EMAIL_PROVIDER", EmailProviderKind::Smtp)?,
            queue_capacity,
            worker: WorkerConfig::from_env()?,
        })
    }
}

/// Application configuration, composed from the shared config components
#[derive(Clone, Debug)]
pub struct Config {
    pub database: PostgresConfig,
    pub server: ServerConfig,
    pub notifications: NotificationConfig,
    pub environment: Environment,
    /// Apply pending migrations before serving
    pub run_migrations: bool,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let database = PostgresConfig::from_env()?; // Required - will fail if not set
        let server = ServerConfig::from_env()?;
        let notifications = NotificationConfig::from_env()?;
        let run_migrations = env_parse("RUN_MIGRATIONS", environment.is_development())?;

        Ok(Self {
            database,
            server,
            notifications,
            environment,
            run_migrations,
        })
    }
}
