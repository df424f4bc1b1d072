//! Where mutheme keeps its files.
//!
//! The config directory holds `config.toml`. The data directory holds the
//! settings store, `settings.json`, which every page agent and control surface
//! started from the CLI shares. `MUTHEME_CONFIG_DIR` and `MUTHEME_DATA_DIR`
//! relocate either one, which keeps test runs away from the user's store.

use std::env;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use directories::ProjectDirs;

const CONFIG_DIR_ENV: &str = "MUTHEME_CONFIG_DIR";
const DATA_DIR_ENV: &str = "MUTHEME_DATA_DIR";

/// File name of the settings store inside the data directory.
pub const SETTINGS_FILE: &str = "settings.json";

fn project_dirs() -> Result<ProjectDirs> {
	ProjectDirs::from("io", "mutheme", "mutheme")
		.ok_or_else(|| anyhow!("no home directory to place mutheme config and settings in"))
}

// Unset and empty both mean "no override".
fn override_dir(name: &str) -> Option<PathBuf> {
	env::var_os(name)
		.filter(|value| !value.is_empty())
		.map(PathBuf::from)
}

/// Directory searched for `config.toml`.
pub fn get_config_dir() -> Result<PathBuf> {
	match override_dir(CONFIG_DIR_ENV) {
		Some(dir) => Ok(dir),
		None => Ok(project_dirs()?.config_local_dir().to_path_buf()),
	}
}

/// Directory holding [`SETTINGS_FILE`].
pub fn get_data_dir() -> Result<PathBuf> {
	match override_dir(DATA_DIR_ENV) {
		Some(dir) => Ok(dir),
		None => Ok(project_dirs()?.data_local_dir().to_path_buf()),
	}
}

/// The settings store used when `store.path` is not configured.
pub fn default_store_path() -> Result<PathBuf> {
	Ok(get_data_dir()?.join(SETTINGS_FILE))
}
