// ABOUTME: Configuration loading and validation for the bookshelf server.
// ABOUTME: Reads BOOKSHELF_* environment variables and derives database and upload paths.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Default cap on a single cover image upload (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BOOKSHELF_BIND is not a valid socket address: {0}")]
    InvalidBind(String),

    #[error("BOOKSHELF_MAX_UPLOAD_BYTES must be a positive integer: {0}")]
    InvalidMaxUpload(String),
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct BookshelfConfig {
    pub home: PathBuf,
    pub bind: SocketAddr,
    /// Explicit database location; `None` means `<home>/stories.db`.
    pub database: Option<PathBuf>,
    pub public_base_url: Option<String>,
    pub max_upload_bytes: usize,
}

impl BookshelfConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - BOOKSHELF_HOME: data directory (default: ~/.bookshelf)
    /// - BOOKSHELF_BIND: socket address to bind (default: 127.0.0.1:3000)
    /// - BOOKSHELF_DATABASE: SQLite file for stories (default: $BOOKSHELF_HOME/stories.db)
    /// - BOOKSHELF_PUBLIC_BASE_URL: prefix for uploaded image URLs (optional)
    /// - BOOKSHELF_MAX_UPLOAD_BYTES: largest accepted cover image (default: 5 MiB)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let home = var("BOOKSHELF_HOME").map(PathBuf::from).unwrap_or_else(|| {
            var("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".bookshelf")
        });

        let bind_str = var("BOOKSHELF_BIND").unwrap_or_else(|| "127.0.0.1:3000".to_string());
        let bind: SocketAddr = bind_str
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind_str))?;

        let database = var("BOOKSHELF_DATABASE").map(PathBuf::from);

        let public_base_url = var("BOOKSHELF_PUBLIC_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string());

        let max_upload_bytes = match var("BOOKSHELF_MAX_UPLOAD_BYTES") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::InvalidMaxUpload(raw)),
            },
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            home,
            bind,
            database,
            public_base_url,
            max_upload_bytes,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| self.home.join("stories.db"))
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.home.join("uploads")
    }
}
