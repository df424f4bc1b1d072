use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};

/// Id of the one style element this crate owns in a page.
pub const STYLE_ELEMENT_ID: &str = "__mut_theme_style__";

/// Dataset key recording the applied theme id on the root element.
pub const THEME_DATASET_KEY: &str = "mutTheme";

/// The page a style sheet is installed into.
pub trait StyleHost: Send + Sync {
	/// Create the style element `element_id` if needed and replace its
	/// entire content with `css`.
	fn upsert_style(&self, element_id: &str, css: &str) -> Result<()>;

	/// Set a `data-*` attribute on the document root.
	fn set_dataset(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Default)]
struct DocumentState {
	styles: BTreeMap<String, String>,
	dataset: BTreeMap<String, String>,
	installs: usize,
}

/// In-memory page used by tests and embedders that render elsewhere.
#[derive(Debug, Default)]
pub struct MemoryDocument {
	state: Mutex<DocumentState>,
}

impl MemoryDocument {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn style(&self, element_id: &str) -> Option<String> {
		self.lock().styles.get(element_id).cloned()
	}

	#[must_use]
	pub fn style_count(&self) -> usize {
		self.lock().styles.len()
	}

	#[must_use]
	pub fn dataset(&self, key: &str) -> Option<String> {
		self.lock().dataset.get(key).cloned()
	}

	/// How many times any style element has been written.
	#[must_use]
	pub fn installs(&self) -> usize {
		self.lock().installs
	}

	fn lock(&self) -> MutexGuard<'_, DocumentState> {
		self.state
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

impl StyleHost for MemoryDocument {
	fn upsert_style(&self, element_id: &str, css: &str) -> Result<()> {
		let mut state = self.lock();
		state.styles.insert(element_id.to_string(), css.to_string());
		state.installs += 1;
		Ok(())
	}

	fn set_dataset(&self, key: &str, value: &str) -> Result<()> {
		self.lock()
			.dataset
			.insert(key.to_string(), value.to_string());
		Ok(())
	}
}

/// Writes the installed style sheet to a file, overwriting it each time.
///
/// Dataset attributes are only logged.
#[derive(Debug)]
pub struct FileDocument {
	path: PathBuf,
}

impl FileDocument {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl StyleHost for FileDocument {
	fn upsert_style(&self, element_id: &str, css: &str) -> Result<()> {
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent)
				.with_context(|| format!("failed to create {}", parent.display()))?;
		}
		fs::write(&self.path, css)
			.with_context(|| format!("failed to write style {element_id} to {}", self.path.display()))
	}

	fn set_dataset(&self, key: &str, value: &str) -> Result<()> {
		tracing::debug!(key, value, "document dataset updated");
		Ok(())
	}
}
