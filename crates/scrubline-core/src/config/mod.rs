//! Configuration for scrubline hosts
//!
//! - Generic YAML config loading/saving
//! - Standard config file locations
//! - Overview widget settings (colours, padding, access strategy, transcoding)
//!
//! # Usage
//!
//! ```ignore
//! use scrubline_core::config::{default_config_path, load_config, save_config, OverviewConfig};
//!
//! let path = default_config_path("overview.yaml");
//! let config: OverviewConfig = load_config(&path);
//! save_config(&config, &path)?;
//! ```

mod io;
mod overview;
mod paths;

pub use io::{load_config, save_config, try_load_config};
pub use overview::{OverviewConfig, TranscodeConfig};
pub use paths::{config_dir, default_config_path};
