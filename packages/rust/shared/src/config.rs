//! Application configuration for Refinery.
//!
//! User config lives at `~/.refinery/refinery.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RefineryError, Result};
use crate::query::ResultOrder;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "refinery.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".refinery";

// ---------------------------------------------------------------------------
// Config structs (matching refinery.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Page lookup policy.
    #[serde(default)]
    pub pages: PagesConfig,

    /// Locale settings.
    #[serde(default)]
    pub i18n: I18nConfig,

    /// Database location.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// `[pages]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesConfig {
    /// Slugs are unique per parent, so pages are addressed by their full path.
    #[serde(default = "default_true")]
    pub scope_slug_by_parent: bool,

    /// Ordering applied when several translation rows match one lookup.
    #[serde(default)]
    pub result_order: ResultOrder,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            scope_slug_by_parent: true,
            result_order: ResultOrder::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// `[i18n]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct I18nConfig {
    /// Locale used for title lookups and as the implicit `locale` condition.
    #[serde(default = "default_locale")]
    pub current_locale: String,

    /// Locales served on the frontend, in preference order.
    #[serde(default = "default_frontend_locales")]
    pub frontend_locales: Vec<String>,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            current_locale: default_locale(),
            frontend_locales: default_frontend_locales(),
        }
    }
}

fn default_locale() -> String {
    "en".into()
}
fn default_frontend_locales() -> Vec<String> {
    vec![default_locale()]
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the libSQL database file. A leading `~/` expands to the home directory.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "~/.refinery/pages.db".into()
}

impl AppConfig {
    /// Check invariants that serde defaults cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.i18n.current_locale.trim().is_empty() {
            return Err(RefineryError::config("i18n.current_locale must not be empty"));
        }
        if self.i18n.frontend_locales.is_empty() {
            return Err(RefineryError::config(
                "i18n.frontend_locales must list at least one locale",
            ));
        }
        if self.storage.database_path.trim().is_empty() {
            return Err(RefineryError::config("storage.database_path must not be empty"));
        }
        Ok(())
    }

    /// The database path with `~/` expanded.
    pub fn database_path(&self) -> Result<PathBuf> {
        expand_home(&self.storage.database_path)
    }
}

fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| RefineryError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.refinery/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| RefineryError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.refinery/refinery.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| RefineryError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        RefineryError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
///
/// An existing file is only replaced when `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    init_config_at(&config_file_path()?, force)
}

/// Write a default config file at `path`, creating its parent directory.
pub fn init_config_at(path: &Path, force: bool) -> Result<PathBuf> {
    if path.exists() {
        if !force {
            return Err(RefineryError::config(format!(
                "{} already exists",
                path.display()
            )));
        }
        tracing::warn!(?path, "replacing existing config file");
    }

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| RefineryError::io(dir, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| RefineryError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| RefineryError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path.to_path_buf())
}
