pub mod settings;

pub use settings::{GitSettings, LinkSettings, ReviewSettings, Settings};

use crate::errors::{PrStackError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that relocates the config root (used by tests and CI)
pub const HOME_ENV_VAR: &str = "PRSTACK_HOME";

/// Name of the single-value file holding the currently selected stack
pub const POINTER_FILE_NAME: &str = "current";

/// Name of the settings file inside the config root
pub const SETTINGS_FILE_NAME: &str = "config.toml";

/// Get the prstack configuration directory (`$PRSTACK_HOME` or `~/.prstack/`)
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(HOME_ENV_VAR).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    let home_dir =
        dirs::home_dir().ok_or_else(|| PrStackError::config("Could not find home directory"))?;
    Ok(home_dir.join(".prstack"))
}

/// Ensure the configuration directory exists
pub fn ensure_config_dir(config_dir: &Path) -> Result<()> {
    if !config_dir.exists() {
        fs::create_dir_all(config_dir).map_err(|e| {
            PrStackError::config(format!("Failed to create config directory: {e}"))
        })?;
    }
    Ok(())
}

/// Load settings from the config root, falling back to defaults
pub fn load_settings(config_dir: &Path) -> Result<Settings> {
    let settings = Settings::load_from_file(&config_dir.join(SETTINGS_FILE_NAME))?;
    settings.validate()?;
    Ok(settings)
}

/// Persist settings into the config root
pub fn save_settings(config_dir: &Path, settings: &Settings) -> Result<()> {
    ensure_config_dir(config_dir)?;
    settings.save_to_file(&config_dir.join(SETTINGS_FILE_NAME))
}
