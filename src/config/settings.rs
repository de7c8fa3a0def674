//! Configuration settings for the Trellis classification service.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub oracle: OracleConfig,
    pub taxonomy: TaxonomyConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            oracle: OracleConfig::default(),
            taxonomy: TaxonomyConfig::default(),
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations or use defaults.
    pub fn load() -> Result<Self> {
        // Try standard config locations
        let config_paths = [
            // Current directory
            PathBuf::from("trellis.toml"),
            PathBuf::from("config.toml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("trellis/config.toml"))
                .unwrap_or_default(),
            // Home directory
            dirs::home_dir()
                .map(|p| p.join(".trellis/config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        // Validate oracle config
        if self.oracle.base_url.is_empty() {
            return Err(ConfigError::MissingField("oracle.base_url".to_string()).into());
        }
        if self.oracle.model.is_empty() {
            return Err(ConfigError::MissingField("oracle.model".to_string()).into());
        }
        if self.oracle.timeout_secs == 0 {
            return Err(ConfigError::Invalid("oracle.timeout_secs must be > 0".to_string()).into());
        }

        // Validate taxonomy config
        if self.taxonomy.path.is_empty() {
            return Err(ConfigError::MissingField("taxonomy.path".to_string()).into());
        }
        if self.taxonomy.area_roots.is_empty() {
            return Err(ConfigError::Invalid(
                "taxonomy.area_roots must name at least one root".to_string(),
            )
            .into());
        }

        // Validate server config
        if self.server.max_upload_bytes == 0 {
            return Err(
                ConfigError::Invalid("server.max_upload_bytes must be > 0".to_string()).into(),
            );
        }

        // Validate cache config
        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::Invalid("cache.ttl_secs must be > 0".to_string()).into());
        }

        Ok(())
    }

    /// Expand the taxonomy file path.
    pub fn taxonomy_path(&self) -> Result<PathBuf> {
        let expanded = shellexpand::full(&self.taxonomy.path)
            .map_err(|e| ConfigError::PathExpansion(e.to_string()))?;
        Ok(PathBuf::from(expanded.as_ref()))
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address for the HTTP listener
    pub bind_addr: String,
    /// HTTP port
    pub http_port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
    /// Accepted MIME types for uploads; empty disables the check
    pub allowed_mime_types: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            http_port: 8080,
            enable_cors: true,
            cors_origins: vec!["*".to_string()],
            max_upload_bytes: 20 * 1024 * 1024,
            allowed_mime_types: vec![
                "application/pdf".to_string(),
                "text/plain".to_string(),
                "text/markdown".to_string(),
                "text/html".to_string(),
                "image/png".to_string(),
                "image/jpeg".to_string(),
                "image/webp".to_string(),
                "video/mp4".to_string(),
            ],
        }
    }
}

/// Classification oracle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Base URL for the generative API
    pub base_url: String,
    /// Model name
    pub model: String,
    /// API key (loaded from GEMINI_API_KEY if not set)
    pub api_key: Option<String>,
    /// Generation request timeout in seconds
    pub timeout_secs: u64,
    /// File upload timeout in seconds
    pub upload_timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
            timeout_secs: 30,
            upload_timeout_secs: 120,
        }
    }
}

/// Taxonomy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyConfig {
    /// Path to the taxonomy JSON file
    pub path: String,
    /// Designated root entities for the Area dimension
    pub area_roots: Vec<String>,
    /// Designated root entities for the Ability dimension
    pub ability_roots: Vec<String>,
    /// Designated root entities for the Scope dimension
    pub scope_roots: Vec<String>,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            path: "data/taxonomy.json".to_string(),
            area_roots: vec!["Mathematics".to_string()],
            ability_roots: vec!["AnalyticalCapability".to_string()],
            scope_roots: vec![
                "RepresentationalScope".to_string(),
                "AbstractionScope".to_string(),
                "MeasurementScope".to_string(),
            ],
        }
    }
}

/// Classification cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL for cached classifications in seconds
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 3600 }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (overridable by RUST_LOG)
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Log output format enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}
