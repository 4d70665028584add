//! Standard locations for scrubline configuration files

use std::path::PathBuf;

/// Name of the per-user configuration directory
const APP_DIR: &str = "scrubline";

/// Get the scrubline configuration directory
///
/// Returns `<platform config dir>/scrubline` (e.g. `~/.config/scrubline` on
/// Linux), or `./scrubline` when the platform has no config directory.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Get the default config file path for `filename`
pub fn default_config_path(filename: &str) -> PathBuf {
    config_dir().join(filename)
}
