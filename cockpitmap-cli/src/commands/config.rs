//! `cockpitmap config`: print the effective configuration.

use std::path::{Path, PathBuf};

use cockpitmap::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Load the configuration from `path` or the default location.
pub fn load(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);
    Ok(ConfigFile::load_from(&path)?)
}

pub fn run(path: Option<PathBuf>) -> Result<(), CliError> {
    let path = path.unwrap_or_else(config_file_path);
    let config = load(Some(&path))?;

    if path.exists() {
        println!("; {}", path.display());
    } else {
        println!("; {} (not found, showing defaults)", path.display());
    }
    print!("{}", config.to_ini_string());
    Ok(())
}
