//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, KeysConfig, LogFormat, LoggingConfig, ServerConfig, StorageBackend, StorageConfig,
};
