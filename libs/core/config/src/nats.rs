use crate::{env_or_default, ConfigError, FromEnv};

/// NATS connection and subscription settings for message-pattern services
#[derive(Clone, Debug)]
pub struct NatsConfig {
    pub url: String,
    /// Queue group shared by all replicas, so each request is handled once
    pub queue_group: String,
    /// Prepended to every pattern name to form the subscribed subject
    pub subject_prefix: String,
    pub client_name: String,
}

impl NatsConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Subject a given message pattern is served on
    pub fn subject_for(&self, pattern: &str) -> String {
        if self.subject_prefix.is_empty() {
            pattern.to_string()
        } else {
            format!("{}.{}", self.subject_prefix.trim_end_matches('.'), pattern)
        }
    }
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
            queue_group: "products-service".to_string(),
            subject_prefix: String::new(),
            client_name: "products-service".to_string(),
        }
    }
}

impl FromEnv for NatsConfig {
    /// Reads from environment variables:
    /// - NATS_URL: defaults to nats://localhost:4222
    /// - NATS_QUEUE_GROUP: defaults to products-service
    /// - NATS_SUBJECT_PREFIX: defaults to empty (subject = pattern)
    /// - NATS_CLIENT_NAME: defaults to products-service
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            url: env_or_default("NATS_URL", &defaults.url),
            queue_group: env_or_default("NATS_QUEUE_GROUP", &defaults.queue_group),
            subject_prefix: env_or_default("NATS_SUBJECT_PREFIX", &defaults.subject_prefix),
            client_name: env_or_default("NATS_CLIENT_NAME", &defaults.client_name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nats_config_from_env_with_defaults() {
        temp_env::with_vars(
            [
                ("NATS_URL", None::<&str>),
                ("NATS_QUEUE_GROUP", None),
                ("NATS_SUBJECT_PREFIX", None),
                ("NATS_CLIENT_NAME", None),
            ],
            || {
                let config = NatsConfig::from_env().unwrap();
                assert_eq!(config.url, "nats://localhost:4222");
                assert_eq!(config.queue_group, "products-service");
                assert_eq!(config.subject_for("find_one_product"), "find_one_product");
            },
        );
    }

    #[test]
    fn test_nats_config_from_env_with_custom_values() {
        temp_env::with_vars(
            [
                ("NATS_URL", Some("nats://nats:4222")),
                ("NATS_QUEUE_GROUP", Some("products")),
                ("NATS_SUBJECT_PREFIX", Some("shop.")),
            ],
            || {
                let config = NatsConfig::from_env().unwrap();
                assert_eq!(config.url, "nats://nats:4222");
                assert_eq!(config.queue_group, "products");
                assert_eq!(config.subject_for("create_product"), "shop.create_product");
            },
        );
    }
}
