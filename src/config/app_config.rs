use serde::Deserialize;

use crate::domain::api_key::KeyCharset;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub keys: KeysConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Which backend holds keys, rate windows and the auxiliary entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Connection URL, used by the postgres backend
    pub url: String,
    pub max_connections: u32,
}

/// Default shape for newly generated keys
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    pub prefix: String,
    pub length: usize,
    pub charset: KeyCharset,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            url: "postgres://localhost/rapids_keys".to_string(),
            max_connections: 10,
        }
    }
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            prefix: "rapids_".to_string(),
            length: 32,
            charset: KeyCharset::default(),
        }
    }
}

impl AppConfig {
    /// Load from `config/default`, `config/local` and `APP__`-prefixed
    /// environment variables. `DATABASE_URL`, when set, overrides the
    /// configured storage URL.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        Ok(config.with_database_url(std::env::var("DATABASE_URL").ok()))
    }

    fn with_database_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.storage.url = url;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.keys.prefix, "rapids_");
        assert_eq!(config.keys.length, 32);
        assert_eq!(config.keys.charset, KeyCharset::Base64Url);
    }

    #[test]
    fn test_partial_deserialization_falls_back() {
        let json = serde_json::json!({
            "server": { "port": 9000 },
            "storage": { "backend": "postgres" }
        });

        let config: AppConfig = serde_json::from_value(json).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert_eq!(config.storage.max_connections, 10);
    }

    #[test]
    fn test_database_url_overrides_storage_url() {
        let config = AppConfig::default()
            .with_database_url(Some("postgres://db.internal/keys".to_string()));
        assert_eq!(config.storage.url, "postgres://db.internal/keys");

        let config = AppConfig::default().with_database_url(None);
        assert_eq!(config.storage.url, "postgres://localhost/rapids_keys");
    }
}
