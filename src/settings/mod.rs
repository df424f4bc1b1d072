//! User settings: the stored model, scope resolution and the shared store.

mod model;
mod resolve;
mod store;

pub use model::{
	ApplyScope, DEFAULT_BLEND, DEFAULT_THEME_ID, HostTheme, INSTALL_FAVORITES, MAX_BLEND,
	MIN_BLEND, SettingKey, Settings, clamp_blend, normalize_host, per_host_value,
};
pub use resolve::{ResolvedTheme, resolve};
pub use store::{
	JsonFileStore, MemoryStore, Record, SettingsStore, StorageArea, StorageChange, StoreError,
	ValueChange,
};

/// Read the settings from `store`, filling in defaults for absent keys.
pub fn load(store: &dyn SettingsStore) -> Result<Settings, StoreError> {
	let record = store.get_with_defaults(&Settings::read_defaults())?;
	Ok(Settings::from_record(&record))
}

/// Seed any settings key that has never been written. Existing values are
/// left untouched. Returns the keys that were written.
pub fn install_defaults(store: &dyn SettingsStore) -> Result<Vec<String>, StoreError> {
	let defaults = Settings::install_defaults();
	let keys: Vec<&str> = defaults.keys().map(String::as_str).collect();
	let existing = store.get(&keys)?;

	let missing: Record = defaults
		.into_iter()
		.filter(|(key, _)| !existing.contains_key(key))
		.collect();
	let written: Vec<String> = missing.keys().cloned().collect();

	if !missing.is_empty() {
		store.set(missing)?;
		tracing::info!(keys = ?written, "installed default settings");
	}
	Ok(written)
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn load_from_empty_store_gives_defaults() {
		let store = MemoryStore::new();
		assert_eq!(load(&store).expect("load"), Settings::default());
	}

	#[test]
	fn install_defaults_only_fills_missing_keys() {
		let store = MemoryStore::with_record(
			serde_json::from_value(json!({ "blend": 0.3, "favorites": [] })).expect("record"),
		);

		let written = install_defaults(&store).expect("install");
		assert!(written.contains(&"selectedThemeId".to_string()));
		assert!(!written.contains(&"blend".to_string()));
		assert!(!written.contains(&"favorites".to_string()));

		let snapshot = store.snapshot();
		assert_eq!(snapshot["blend"], json!(0.3));
		assert_eq!(snapshot["favorites"], json!([]));
		assert_eq!(snapshot["selectedThemeId"], json!(DEFAULT_THEME_ID));
		assert_eq!(snapshot["applyScope"], json!("global"));

		assert!(install_defaults(&store).expect("second install").is_empty());
	}

	#[test]
	fn fresh_install_seeds_favorites() {
		let store = MemoryStore::new();
		install_defaults(&store).expect("install");
		let settings = load(&store).expect("load");
		assert_eq!(settings.favorites.len(), INSTALL_FAVORITES.len());
		assert!(settings.favorites.contains("nord"));
	}
}
