use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use config::{Config, File};
use serde::Deserialize;
use thiserror::Error;

use mutheme::app_dirs;
use mutheme::logging::DEFAULT_FILTER;
use mutheme::schedule::DEFAULT_DEBOUNCE;

use crate::cli::CliArgs;

/// Longest accepted apply debounce.
const MAX_DEBOUNCE_MS: u64 = 5_000;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
	catalog: CatalogSection,
	store: StoreSection,
	apply: ApplySection,
	log: LogSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct CatalogSection {
	path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct StoreSection {
	path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ApplySection {
	debounce_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct LogSection {
	filter: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
	#[error("apply.debounce_ms must be at most 5000, got {0}")]
	DebounceTooLong(u64),
	#[error("log.filter must not be empty")]
	EmptyLogFilter,
}

/// Settings for one run of the binary after every layer has been merged.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
	/// `None` selects the built-in catalog.
	pub catalog_path: Option<PathBuf>,
	pub store_path: PathBuf,
	pub debounce: Duration,
	pub log_filter: String,
}

impl ResolvedConfig {
	pub fn print_summary(&self) {
		println!("Effective configuration:");
		match &self.catalog_path {
			Some(path) => println!("  Catalog: {}", path.display()),
			None => println!("  Catalog: built-in"),
		}
		println!("  Store: {}", self.store_path.display());
		println!("  Debounce: {}ms", self.debounce.as_millis());
		println!("  Log filter: {}", self.log_filter);
	}
}

/// Merge config files, `MUTHEME__*` variables and CLI flags.
pub fn load(cli: &CliArgs) -> Result<ResolvedConfig> {
	let config = build_config(cli)?;
	let mut raw: RawConfig = config
		.try_deserialize()
		.context("failed to parse configuration")?;
	apply_cli_overrides(&mut raw, cli);
	resolve(raw)
}

fn build_config(cli: &CliArgs) -> Result<Config> {
	let mut builder = Config::builder();

	if !cli.no_config {
		for path in default_config_files() {
			builder = builder.add_source(File::from(path).required(false));
		}
	}

	for path in &cli.config {
		builder = builder.add_source(File::from(path.clone()).required(true));
	}

	builder = builder.add_source(
		config::Environment::with_prefix("mutheme")
			.separator("__")
			.try_parsing(true),
	);

	builder
		.build()
		.map_err(|err| anyhow!("failed to load configuration: {err}"))
}

fn default_config_files() -> Vec<PathBuf> {
	let mut files = Vec::new();

	if let Ok(dir) = app_dirs::get_config_dir() {
		files.push(dir.join("config.toml"));
	}

	if let Ok(current_dir) = env::current_dir() {
		files.push(current_dir.join(".mutheme.toml"));
		files.push(current_dir.join("mutheme.toml"));
	}

	files
}

fn apply_cli_overrides(raw: &mut RawConfig, cli: &CliArgs) {
	if let Some(path) = &cli.catalog {
		raw.catalog.path = Some(path.clone());
	}
	if let Some(path) = &cli.store {
		raw.store.path = Some(path.clone());
	}
	if let Some(filter) = &cli.log_filter {
		raw.log.filter = Some(filter.clone());
	}
}

fn resolve(raw: RawConfig) -> Result<ResolvedConfig> {
	let debounce = match raw.apply.debounce_ms {
		Some(ms) if ms > MAX_DEBOUNCE_MS => return Err(ConfigError::DebounceTooLong(ms).into()),
		Some(ms) => Duration::from_millis(ms),
		None => DEFAULT_DEBOUNCE,
	};

	let log_filter = match raw.log.filter {
		Some(filter) if filter.trim().is_empty() => return Err(ConfigError::EmptyLogFilter.into()),
		Some(filter) => filter.trim().to_string(),
		None => DEFAULT_FILTER.to_string(),
	};

	let store_path = match raw.store.path {
		Some(path) => path,
		None => app_dirs::default_store_path()?,
	};

	Ok(ResolvedConfig {
		catalog_path: raw.catalog.path,
		store_path,
		debounce,
		log_filter,
	})
}
