//! Configuration management for HD.
//!
//! Parses `hd.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `repository.origin`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override the documentation mirror directory.
    pub repository_path: Option<PathBuf>,
    /// Override the upstream origin URL (empty string disables sync).
    pub repository_origin: Option<String>,
    /// Override the sync interval in minutes.
    pub interval_minutes: Option<u64>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "hd.toml";

/// Upper bound for `sync.interval_minutes` (one week).
const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Repository configuration (path is a relative string from TOML).
    repository: RepositoryConfigRaw,
    /// Background sync configuration.
    pub sync: SyncConfig,
    /// Product metadata configuration.
    pub metadata: MetadataConfig,

    /// Resolved repository configuration (set after loading).
    #[serde(skip)]
    pub repository_resolved: RepositoryConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
        }
    }
}

/// Raw repository configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RepositoryConfigRaw {
    path: Option<String>,
    origin: Option<String>,
}

/// Resolved repository configuration with absolute paths.
#[derive(Debug, Default)]
pub struct RepositoryConfig {
    /// Local mirror of the docs repository.
    pub path: PathBuf,
    /// Upstream clone URL. `None` runs the mirror in static mode.
    pub origin: Option<String>,
}

/// Background sync configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Minutes between sync passes.
    pub interval_minutes: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 10,
        }
    }
}

impl SyncConfig {
    /// Sync interval as a [`Duration`].
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }
}

/// Product metadata configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Product list filename inside the repository mirror.
    pub name: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            name: "products.json".to_owned(),
        }
    }
}

impl MetadataConfig {
    /// Full path of the product list inside `repository_path`.
    #[must_use]
    pub fn path_in(&self, repository_path: &Path) -> PathBuf {
        repository_path.join(&self.name)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`repository.origin`").
        field: String,
        /// Error message (e.g., "${`DOCS_ORIGIN`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Treat an empty origin as "no origin".
fn non_empty_origin(origin: Option<&str>) -> Option<String> {
    origin.filter(|o| !o.trim().is_empty()).map(str::to_owned)
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `hd.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(path) = &settings.repository_path {
            self.repository_resolved.path.clone_from(path);
        }
        if let Some(origin) = &settings.repository_origin {
            self.repository_resolved.origin = non_empty_origin(Some(origin));
        }
        if let Some(minutes) = settings.interval_minutes {
            self.sync.interval_minutes = minutes;
        }
    }

    /// Full path of the product metadata file.
    #[must_use]
    pub fn metadata_path(&self) -> PathBuf {
        self.metadata.path_in(&self.repository_resolved.path)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            repository: RepositoryConfigRaw::default(),
            sync: SyncConfig::default(),
            metadata: MetadataConfig::default(),
            repository_resolved: RepositoryConfig {
                path: base.join("docs"),
                origin: None,
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        // Port 0 lets the OS pick a port, which is never what a docs server wants
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        if self.sync.interval_minutes == 0 {
            return Err(ConfigError::Validation(
                "sync.interval_minutes must be at least 1".to_owned(),
            ));
        }
        if self.sync.interval_minutes > MAX_INTERVAL_MINUTES {
            return Err(ConfigError::Validation(format!(
                "sync.interval_minutes must be at most {MAX_INTERVAL_MINUTES}"
            )));
        }

        require_non_empty(&self.metadata.name, "metadata.name")?;

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        if let Some(ref origin) = self.repository.origin {
            self.repository.origin = Some(expand::expand_env(origin, "repository.origin")?);
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.repository_resolved = RepositoryConfig {
            path: config_dir.join(self.repository.path.as_deref().unwrap_or("docs")),
            origin: non_empty_origin(self.repository.origin.as_deref()),
        };
    }
}
