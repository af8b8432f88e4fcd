//! Runtime configuration, read from command-line flags with environment
//! variable fallbacks.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use clap::{Args, Parser};

use crate::error::AppError;

/// Default request body limit (50 MiB), large enough for a base64-encoded book.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Default display format for upload dates (US locale short date).
pub const DEFAULT_DATE_FORMAT: &str = "%-m/%-d/%Y";

/// Top-level configuration for the `docshelf` server binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "docshelf", version, about = "PDF document sharing service")]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub storage: StorageConfig,

    /// Shared admin password checked by `POST /api/auth`.
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: String,

    /// strftime format used for the `uploadDate` field of listed documents.
    #[arg(long, env = "DATE_FORMAT", default_value = DEFAULT_DATE_FORMAT)]
    pub date_format: String,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Host address to bind the server to.
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// TCP port to listen on.
    #[arg(short = 'p', long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Maximum accepted request body size in bytes.
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Directory of static front-end assets served for non-API paths.
    #[arg(long, env = "SITE_ROOT")]
    pub site_root: Option<PathBuf>,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// S3-compatible blob store configuration.
///
/// Credentials are resolved through the AWS default provider chain
/// (`AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, profiles, instance roles).
#[derive(Debug, Clone, Args)]
pub struct StorageConfig {
    /// Bucket holding the documents.
    #[arg(long, env = "S3_BUCKET")]
    pub s3_bucket: String,

    /// Custom endpoint for MinIO / LocalStack.
    #[arg(long, env = "S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// Region override; falls back to the SDK's region chain.
    #[arg(long, env = "S3_REGION")]
    pub s3_region: Option<String>,

    /// Use path-style addressing (required by most MinIO setups).
    #[arg(long, env = "S3_FORCE_PATH_STYLE")]
    pub s3_force_path_style: bool,

    /// Upload objects with the `public-read` canned ACL.
    #[arg(long, env = "S3_PUBLIC_ACL")]
    pub s3_public_acl: bool,

    /// Public base URL of the bucket. When unset, documents are served
    /// through `/api/files/`.
    #[arg(long, env = "PUBLIC_BASE_URL")]
    pub public_base_url: Option<String>,
}

/// A validated strftime format for rendering upload dates.
#[derive(Debug, Clone)]
pub struct DateFormat(String);

impl DateFormat {
    pub fn new(format: impl Into<String>) -> Result<Self, AppError> {
        let format = format.into();
        if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
            return Err(AppError::Config(format!("Invalid date format '{format}'")));
        }
        Ok(Self(format))
    }

    pub fn render(&self, instant: &DateTime<Utc>) -> String {
        instant.format(&self.0).to_string()
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        Self(DEFAULT_DATE_FORMAT.to_string())
    }
}
