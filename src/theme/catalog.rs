use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use thiserror::Error;

use super::types::ThemeDefinition;

const BUILTIN_CATALOG: &str = include_str!("../../themes/catalog.json");

/// Errors raised while fetching or decoding a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
	#[error("failed to read theme catalog {path}")]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("theme catalog is not a valid list of themes")]
	Parse(#[from] serde_json::Error),
}

/// Ordered theme list plus an id index into it.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
	list: Vec<ThemeDefinition>,
	index: HashMap<String, usize>,
}

impl Catalog {
	#[must_use]
	pub fn empty() -> Self {
		Self::default()
	}

	/// Index `list` by id. A repeated id keeps every list entry while the
	/// index resolves to the last occurrence.
	#[must_use]
	pub fn from_definitions(list: Vec<ThemeDefinition>) -> Self {
		let mut index = HashMap::with_capacity(list.len());
		for (position, theme) in list.iter().enumerate() {
			if index.insert(theme.id.clone(), position).is_some() {
				tracing::warn!(id = %theme.id, "duplicate theme id in catalog");
			}
		}

		Self { list, index }
	}

	pub fn from_json(bytes: &[u8]) -> Result<Self, CatalogError> {
		let list: Vec<ThemeDefinition> = serde_json::from_slice(bytes)?;
		Ok(Self::from_definitions(list))
	}

	#[must_use]
	pub fn list(&self) -> &[ThemeDefinition] {
		&self.list
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.list.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.list.is_empty()
	}

	#[must_use]
	pub fn get(&self, id: &str) -> Option<&ThemeDefinition> {
		self.index.get(id).map(|&position| &self.list[position])
	}

	#[must_use]
	pub fn contains(&self, id: &str) -> bool {
		self.index.contains_key(id)
	}

	#[must_use]
	pub fn first(&self) -> Option<&ThemeDefinition> {
		self.list.first()
	}

	/// Look up `id`, falling back to the first entry when it is unknown.
	#[must_use]
	pub fn theme_or_first(&self, id: &str) -> Option<&ThemeDefinition> {
		self.get(id).or_else(|| self.first())
	}
}

/// Somewhere a catalog document can be fetched from.
pub trait CatalogSource: Send + Sync {
	fn fetch(&self) -> Result<Vec<u8>, CatalogError>;

	/// Human readable origin used in log output.
	fn describe(&self) -> String;
}

/// The catalog compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedCatalog;

impl CatalogSource for EmbeddedCatalog {
	fn fetch(&self) -> Result<Vec<u8>, CatalogError> {
		Ok(BUILTIN_CATALOG.as_bytes().to_vec())
	}

	fn describe(&self) -> String {
		"built-in catalog".to_string()
	}
}

/// A catalog JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileCatalog {
	path: PathBuf,
}

impl FileCatalog {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl CatalogSource for FileCatalog {
	fn fetch(&self) -> Result<Vec<u8>, CatalogError> {
		fs::read(&self.path).map_err(|source| CatalogError::Read {
			path: self.path.clone(),
			source,
		})
	}

	fn describe(&self) -> String {
		self.path.display().to_string()
	}
}

/// Fetches a catalog at most once and shares the result.
///
/// Callers racing on the first [`load`](Self::load) all wait on the same
/// fetch. A failed fetch is cached as an empty catalog for the lifetime of
/// the loader.
pub struct CatalogLoader {
	source: Box<dyn CatalogSource>,
	cached: OnceLock<Arc<Catalog>>,
}

impl CatalogLoader {
	pub fn new(source: impl CatalogSource + 'static) -> Self {
		Self {
			source: Box::new(source),
			cached: OnceLock::new(),
		}
	}

	#[must_use]
	pub fn builtin() -> Self {
		Self::new(EmbeddedCatalog)
	}

	/// Start from an already indexed catalog without fetching anything.
	#[must_use]
	pub fn preloaded(catalog: Catalog) -> Self {
		let loader = Self::builtin();
		let _ = loader.cached.set(Arc::new(catalog));
		loader
	}

	pub fn load(&self) -> Arc<Catalog> {
		Arc::clone(self.cached.get_or_init(|| Arc::new(self.fetch_catalog())))
	}

	/// Resolve `id` against the catalog, falling back to its first entry.
	/// Returns `None` only when the catalog is empty.
	pub fn theme(&self, id: &str) -> Option<ThemeDefinition> {
		self.load().theme_or_first(id).cloned()
	}

	fn fetch_catalog(&self) -> Catalog {
		let origin = self.source.describe();
		let result = self
			.source
			.fetch()
			.and_then(|bytes| Catalog::from_json(&bytes));

		match result {
			Ok(catalog) => {
				tracing::debug!(%origin, themes = catalog.len(), "theme catalog loaded");
				catalog
			}
			Err(error) => {
				tracing::error!(%origin, error = %error, "theme catalog failed to load");
				Catalog::empty()
			}
		}
	}
}

impl std::fmt::Debug for CatalogLoader {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CatalogLoader")
			.field("source", &self.source.describe())
			.field("loaded", &self.cached.get().is_some())
			.finish()
	}
}
