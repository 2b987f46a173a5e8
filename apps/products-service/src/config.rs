//! Configuration for the products service

use core_config::nats::NatsConfig;
use core_config::{ConfigError, FromEnv, env_parse};
use database::postgres::PostgresConfig;

pub use core_config::Environment;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub postgres: PostgresConfig,
    pub nats: NatsConfig,
    /// Apply pending migrations before serving
    pub run_migrations: bool,
}

impl FromEnv for Config {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            environment: Environment::from_env(),
            postgres: PostgresConfig::from_env()?,
            nats: NatsConfig::from_env()?,
            run_migrations: env_parse("RUN_MIGRATIONS", "true")?,
        })
    }
}
