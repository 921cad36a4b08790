//! Configuration loading and root folder resolution
//!
//! The data root holds a `datasets/` directory with one sub-directory per
//! dataset. Its location is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. `APTDM_ROOT_FOLDER` environment variable
//! 3. `root_folder` key of the TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the data root
pub const ROOT_FOLDER_ENV: &str = "APTDM_ROOT_FOLDER";

/// Name of the directory under the root that holds datasets
pub const DATASETS_DIR: &str = "datasets";

/// Compiled-in defaults used when nothing else is configured
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub bind_address: String,
    pub port: u16,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            bind_address: "127.0.0.1".to_string(),
            port: 5810,
        }
    }
}

/// Logging section of the TOML config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_file: None,
        }
    }
}

/// Contents of `aptdm-ds.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub root_folder: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub bind_address: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML {} failed: {}", path.display(), e)))
}

/// Write a TOML config file atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Locate the config file for the dataset service, if one exists.
///
/// Looks in `<config_dir>/aptdm/aptdm-ds.toml`, then on Linux
/// `/etc/aptdm/aptdm-ds.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("aptdm").join("aptdm-ds.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/aptdm/aptdm-ds.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    // ~/.local/share/aptdm, ~/Library/Application Support/aptdm, %LOCALAPPDATA%\aptdm
    dirs::data_local_dir()
        .map(|d| d.join("aptdm"))
        .unwrap_or_else(|| PathBuf::from("./aptdm_data"))
}

/// Resolves the data root following the documented priority order
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    config_path: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            config_path: None,
        }
    }

    /// Root folder given on the command line
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    /// Explicit TOML config file, instead of the default search locations
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Resolve the root folder. Never fails; falls back to compiled default.
    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!(module = %self.module_name, "Root folder from command line");
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                info!(module = %self.module_name, "Root folder from {}", ROOT_FOLDER_ENV);
                return PathBuf::from(path);
            }
        }

        let config_path = self.config_path.clone().or_else(default_config_path);
        if let Some(config_path) = config_path {
            match load_toml_config(&config_path) {
                Ok(TomlConfig {
                    root_folder: Some(root),
                    ..
                }) => {
                    info!(
                        module = %self.module_name,
                        config = %config_path.display(),
                        "Root folder from TOML config"
                    );
                    return root;
                }
                Ok(_) => {}
                Err(e) => warn!("Ignoring unreadable config file: {}", e),
            }
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder layout on first start
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create the root folder and its `datasets/` directory if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        let datasets = self.datasets_path();
        if !datasets.is_dir() {
            std::fs::create_dir_all(&datasets)?;
            info!("Created datasets directory: {}", datasets.display());
        }
        Ok(())
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Directory containing one sub-directory per dataset
    pub fn datasets_path(&self) -> PathBuf {
        self.root_folder.join(DATASETS_DIR)
    }
}
