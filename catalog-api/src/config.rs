use serde::Deserialize;
use std::collections::HashMap;
use std::env;

use config::{Environment, File};

use crate::error::AppError;

/// Flat variables understood in addition to the `APP__SECTION__KEY` form.
const FLAT_ENV_KEYS: &[(&str, &str)] = &[
    ("PORT", "server.port"),
    ("PUBLIC_ORIGIN", "server.public_origin"),
    ("DB_HOST", "database.host"),
    ("DB_PORT", "database.port"),
    ("DB_USER", "database.user"),
    ("DB_PASSWORD", "database.password"),
    ("DB_NAME", "database.name"),
    ("STORAGE_BACKEND", "storage.backend"),
    ("UPLOAD_DIR", "storage.local.upload_dir"),
    ("AWS_REGION", "storage.s3.region"),
    ("S3_BUCKET", "storage.s3.bucket"),
    ("AWS_ACCESS_KEY_ID", "storage.s3.access_key_id"),
    ("AWS_SECRET_ACCESS_KEY", "storage.s3.secret_access_key"),
    ("S3_ENDPOINT", "storage.s3.endpoint"),
    ("LOG_LEVEL", "logging.level"),
    ("LOG_FORMAT", "logging.format"),
];

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin prepended to relative image locations in listings.
    pub public_origin: Option<String>,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Local,
    S3,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub local: LocalStorageConfig,
    #[serde(default)]
    pub s3: S3StorageConfig,
    /// Delete the uploaded object when the metadata insert fails.
    pub cleanup_on_failure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalStorageConfig {
    pub upload_dir: String,
    pub serve_prefix: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct S3StorageConfig {
    pub region: Option<String>,
    pub bucket: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// S3-compatible endpoint (MinIO etc.), path-style addressing when set.
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, AppError> {
        let config_path = env::var("CONFIG_PATH")
            .unwrap_or_else(|_| format!("{}/config/default", env!("CARGO_MANIFEST_DIR")));
        Self::from_sources(&config_path, env::vars().collect())
    }

    /// Layers defaults, the optional config file, `APP__*` variables and the
    /// flat deployment variables, in that order.
    pub fn from_sources(config_path: &str, vars: HashMap<String, String>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.max_upload_bytes", 10 * 1024 * 1024)?
            .set_default("database.host", "localhost")?
            .set_default("database.port", 3306)?
            .set_default("database.user", "root")?
            .set_default("database.password", "")?
            .set_default("database.name", "myapp")?
            .set_default("database.max_connections", 10)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("storage.backend", "local")?
            .set_default("storage.local.upload_dir", "uploads")?
            .set_default("storage.local.serve_prefix", "/uploads")?
            .set_default("storage.cleanup_on_failure", false)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name(config_path).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(vars.clone())),
            );

        for (var, key) in FLAT_ENV_KEYS {
            builder = builder.set_override_option(*key, vars.get(*var).cloned())?;
        }

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        let serve_prefix = self.storage.local.serve_prefix.trim_end_matches('/');
        if !serve_prefix.starts_with('/') {
            return Err(invalid("storage.local.serve_prefix must be a path below '/'"));
        }

        if self.storage.backend == StorageBackend::S3 {
            let s3 = &self.storage.s3;
            let required = [
                ("storage.s3.region", &s3.region),
                ("storage.s3.bucket", &s3.bucket),
                ("storage.s3.access_key_id", &s3.access_key_id),
                ("storage.s3.secret_access_key", &s3.secret_access_key),
            ];
            for (key, value) in required {
                if value.as_deref().is_none_or(str::is_empty) {
                    return Err(invalid(&format!("{key} is required for the s3 storage backend")));
                }
            }
        }

        Ok(())
    }

    pub fn public_origin(&self) -> String {
        match &self.server.public_origin {
            Some(origin) if !origin.is_empty() => origin.trim_end_matches('/').to_string(),
            _ => format!("http://localhost:{}", self.server.port),
        }
    }
}

fn invalid(message: &str) -> AppError {
    AppError::Config(config::ConfigError::Message(message.to_string()))
}
