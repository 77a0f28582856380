/// Configuration management for Earl Box
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Largest decoded upload accepted by default (200 MiB)
pub const DEFAULT_UPLOAD_LIMIT: usize = 200 * 1024 * 1024;

/// One year, in seconds
pub const DEFAULT_CACHE_MAX_AGE: u64 = 31_536_000;

/// Room left in the request body for the JSON envelope around the payload
const REQUEST_ENVELOPE_ALLOWANCE: usize = 64 * 1024;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    pub jobs: JobsConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// `max-age` sent with every served file
    pub cache_max_age: u64,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
    /// Root directory holding one blob per committed upload
    pub blob_location: PathBuf,
}

/// Upload limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum decoded payload size in bytes
    pub max_file_size: usize,
    /// Maximum RPC request body size in bytes (base64 payload plus envelope)
    pub max_request_body: usize,
}

/// Background job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Seconds between orphan blob sweeps; 0 disables the sweep
    pub orphan_sweep_interval: u64,
    /// Blobs younger than this many seconds are never swept
    pub orphan_grace_period: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::Validation(format!("Unknown log format: {}", other))),
        }
    }
}

/// Tracing filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "earl_box=debug,tower_http=debug";

/// Size of the standard base64 encoding of `decoded` bytes
pub fn base64_encoded_len(decoded: usize) -> usize {
    decoded.div_ceil(3) * 4
}

impl ServerConfig {
    /// Defaults rooted at `data_directory`, with no environment lookups
    pub fn with_data_directory(data_directory: PathBuf) -> Self {
        Self {
            service: ServiceConfig {
                hostname: "localhost".to_string(),
                port: 2022,
                cache_max_age: DEFAULT_CACHE_MAX_AGE,
            },
            storage: StorageConfig {
                database: data_directory.join("files.sqlite"),
                blob_location: data_directory.join("uploads"),
                data_directory,
            },
            upload: UploadConfig {
                max_file_size: DEFAULT_UPLOAD_LIMIT,
                max_request_body: base64_encoded_len(DEFAULT_UPLOAD_LIMIT)
                    + REQUEST_ENVELOPE_ALLOWANCE,
            },
            jobs: JobsConfig {
                orphan_sweep_interval: 3600,
                orphan_grace_period: 3600,
            },
            logging: LoggingConfig {
                level: DEFAULT_LOG_FILTER.to_string(),
                format: LogFormat::Pretty,
            },
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        dotenv::dotenv().ok();

        let data_directory: PathBuf = env::var("EARL_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let mut config = Self::with_data_directory(data_directory);

        if let Ok(hostname) = env::var("EARL_HOSTNAME") {
            config.service.hostname = hostname;
        }
        config.service.port = parse_env("EARL_PORT", config.service.port)?;
        config.service.cache_max_age =
            parse_env("EARL_CACHE_MAX_AGE", config.service.cache_max_age)?;

        if let Ok(database) = env::var("EARL_DATABASE_LOCATION") {
            config.storage.database = PathBuf::from(database);
        }
        if let Ok(location) = env::var("EARL_BLOB_LOCATION") {
            config.storage.blob_location = PathBuf::from(location);
        }

        config.upload.max_file_size =
            parse_env("EARL_UPLOAD_LIMIT", config.upload.max_file_size)?;
        let derived_body_limit =
            base64_encoded_len(config.upload.max_file_size) + REQUEST_ENVELOPE_ALLOWANCE;
        config.upload.max_request_body =
            parse_env("EARL_MAX_REQUEST_BODY", derived_body_limit)?;

        config.jobs.orphan_sweep_interval =
            parse_env("EARL_ORPHAN_SWEEP_INTERVAL", config.jobs.orphan_sweep_interval)?;
        config.jobs.orphan_grace_period =
            parse_env("EARL_ORPHAN_GRACE_PERIOD", config.jobs.orphan_grace_period)?;

        config.logging.level = env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
        config.logging.format = parse_env("EARL_LOG_FORMAT", config.logging.format)?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.service.hostname.is_empty() {
            return Err(AppError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.upload.max_file_size == 0 {
            return Err(AppError::Validation(
                "Upload limit must be greater than zero".to_string(),
            ));
        }

        let needed = base64_encoded_len(self.upload.max_file_size);
        if self.upload.max_request_body < needed {
            return Err(AppError::Validation(format!(
                "Request body limit {} cannot carry a {} byte upload ({} bytes encoded)",
                self.upload.max_request_body, self.upload.max_file_size, needed
            )));
        }

        Ok(())
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> AppResult<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Validation(format!("Invalid value for {}: {}", key, raw))),
        Err(_) => Ok(default),
    }
}
