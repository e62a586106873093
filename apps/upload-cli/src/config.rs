//! Uploader configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/coursemart/upload.toml`
//! - Windows: `%APPDATA%/coursemart/upload.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use coursemart_protocol::{DEFAULT_BACKOFF_STEP, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_RETRIES};
use coursemart_uploader::UploadConfig;
use serde::{Deserialize, Serialize};

/// Uploader configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Chunk upload endpoint. The combine request goes to `<endpoint>/combine`.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Bytes per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Attempts per chunk before giving up.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Linear backoff unit in milliseconds.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Per-request timeout in seconds (0 = transport default).
    #[serde(default)]
    pub request_timeout_secs: u64,

    /// Bearer token sent with every request.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub auth_token: String,
}

fn default_endpoint() -> String {
    "http://localhost:3000/api/upload".into()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_backoff_ms() -> u64 {
    DEFAULT_BACKOFF_STEP.as_millis() as u64
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            chunk_size: default_chunk_size(),
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
            request_timeout_secs: 0,
            auth_token: String::new(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or creates a default file if not found.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            tracing::debug!(path = %path.display(), "configuration loaded");
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // The file may hold an auth token.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Library-level upload tuning.
    pub fn upload_config(&self) -> UploadConfig {
        UploadConfig {
            chunk_size: self.chunk_size,
            max_retries: self.max_retries,
            backoff_step: Duration::from_millis(self.backoff_ms),
        }
    }

    /// Applies command-line overrides.
    pub fn merge_args(mut self, args: &crate::Args) -> Self {
        if let Some(endpoint) = &args.endpoint {
            self.endpoint = endpoint.clone();
        }
        if let Some(chunk_size) = args.chunk_size {
            self.chunk_size = chunk_size;
        }
        if let Some(max_retries) = args.max_retries {
            self.max_retries = max_retries;
        }
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

/// Returns the platform-specific configuration file path.
pub fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("coursemart").join("upload.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("coursemart")
            .join("upload.toml")
    }
}
