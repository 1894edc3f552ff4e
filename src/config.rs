//! 設定の読み込み
//!
//! config/default.toml → config/{RUN_MODE}.toml → LIBRARY__ で始まる環境変数の順に重ねる。
//! 例: `LIBRARY__SERVER__PORT=8080`, `LIBRARY__STORAGE__BACKEND=memory`

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// ストレージのバックエンド
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// プロセス内メモリ（再起動で消える）
    Memory,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_expiration_hours: u64,
    /// 両方設定されている場合、起動時に管理者アカウントを作成する
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl AuthConfig {
    pub fn seed_admin(&self) -> Option<(&str, &str)> {
        match (&self.admin_email, &self.admin_password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// 設定ファイルと環境変数から読み込む
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(
                Environment::with_prefix("LIBRARY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option("auth.jwt_secret", env::var("JWT_SECRET").ok())?
            .build()?;

        config.try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Result<AppConfig, ConfigError> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn test_default_file_deserializes() {
        let config = from_toml(include_str!("../config/default.toml")).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.auth.jwt_expiration_hours, 24);
        assert!(config.auth.seed_admin().is_none());
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_memory_backend_and_seed_admin() {
        let config = from_toml(
            r#"
            [server]
            host = "127.0.0.1"
            port = 8080

            [database]
            url = "postgres://localhost/test"
            max_connections = 1
            min_connections = 1

            [storage]
            backend = "memory"

            [auth]
            jwt_secret = "secret"
            jwt_issuer = "test"
            jwt_expiration_hours = 1
            admin_email = "admin@example.com"
            admin_password = "Admin@123"

            [logging]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(
            config.auth.seed_admin(),
            Some(("admin@example.com", "Admin@123"))
        );
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let result = from_toml(
            r#"
            [server]
            host = "127.0.0.1"
            port = 8080
            [database]
            url = "postgres://localhost/test"
            max_connections = 1
            min_connections = 1
            [storage]
            backend = "sqlite"
            [auth]
            jwt_secret = "secret"
            jwt_issuer = "test"
            jwt_expiration_hours = 1
            [logging]
            level = "info"
            "#,
        );

        assert!(result.is_err());
    }
}
