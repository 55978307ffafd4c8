use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::WrapErr;
use tracing::debug;

use crate::config::AppConfig;

const CONFIG_DIR: &str = "lazyroster";
const CONFIG_FILE: &str = "config.toml";

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load the configuration from `path`, or from the default location.
///
/// An explicit path must exist. At the default location a missing file
/// yields the defaults. An unreadable or invalid file is always an error.
pub fn load(path: Option<&Path>) -> color_eyre::Result<AppConfig> {
    if let Some(path) = path {
        return read(path);
    }

    let Some(path) = config_path() else {
        debug!("No config directory found, using defaults");
        return Ok(AppConfig::default());
    };
    load_or_default(&path)
}

fn load_or_default(path: &Path) -> color_eyre::Result<AppConfig> {
    if !path.exists() {
        debug!("Config file not found at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }
    read(path)
}

fn read(path: &Path) -> color_eyre::Result<AppConfig> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read config file {}", path.display()))?;
    let config = parse(&content)
        .wrap_err_with(|| format!("Invalid config file {}", path.display()))?;
    debug!("Loaded config from {}", path.display());
    Ok(config)
}

pub fn parse(content: &str) -> color_eyre::Result<AppConfig> {
    Ok(toml::from_str(content)?)
}
