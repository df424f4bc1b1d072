use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::events::{ListenerSet, Subscription};

/// A flat key-value record as held by the store.
pub type Record = serde_json::Map<String, Value>;

/// Errors raised by store reads and writes.
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("failed to access settings file {path}")]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("settings file {path} does not contain a JSON object")]
	Parse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},
}

/// Which storage area a change happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageArea {
	/// Synchronised across the user's browsers; settings live here.
	Sync,
	/// Device-local storage.
	Local,
}

/// Old and new value of one key. `None` means absent.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChange {
	pub old_value: Option<Value>,
	pub new_value: Option<Value>,
}

/// Notification delivered to store subscribers after a write.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
	pub area: StorageArea,
	pub changes: BTreeMap<String, ValueChange>,
}

impl StorageChange {
	#[must_use]
	pub fn touches(&self, key: &str) -> bool {
		self.changes.contains_key(key)
	}
}

/// A shared key-value store with change notification.
///
/// Writes are plain read-modify-write with no isolation between writers; the
/// last write to a key wins.
pub trait SettingsStore: Send + Sync {
	/// Read the listed keys. Absent keys are omitted from the result.
	fn get(&self, keys: &[&str]) -> Result<Record, StoreError>;

	/// Merge `partial` into the store and notify subscribers of keys whose
	/// value changed.
	fn set(&self, partial: Record) -> Result<(), StoreError>;

	#[must_use = "dropping the subscription removes the listener"]
	fn subscribe(&self, listener: Box<dyn Fn(&StorageChange) + Send + Sync>) -> Subscription;

	/// Read every key in `defaults`, substituting the default for any that are
	/// absent.
	fn get_with_defaults(&self, defaults: &Record) -> Result<Record, StoreError> {
		let keys: Vec<&str> = defaults.keys().map(String::as_str).collect();
		let mut values = self.get(&keys)?;
		for (key, default) in defaults {
			values
				.entry(key.clone())
				.or_insert_with(|| default.clone());
		}
		Ok(values)
	}
}

/// Merge `partial` into `data`, returning the per-key changes.
fn merge(data: &mut Record, partial: Record) -> BTreeMap<String, ValueChange> {
	let mut changes = BTreeMap::new();
	for (key, value) in partial {
		let old_value = data.insert(key.clone(), value.clone());
		if old_value.as_ref() != Some(&value) {
			changes.insert(
				key,
				ValueChange {
					old_value,
					new_value: Some(value),
				},
			);
		}
	}
	changes
}

/// Per-key differences between two snapshots, including removed keys.
fn diff(old: &Record, new: &Record) -> BTreeMap<String, ValueChange> {
	let removed = old
		.iter()
		.filter(|(key, _)| !new.contains_key(*key))
		.map(|(key, value)| {
			(
				key.clone(),
				ValueChange {
					old_value: Some(value.clone()),
					new_value: None,
				},
			)
		});
	let updated = new
		.iter()
		.filter(|(key, value)| old.get(*key) != Some(*value))
		.map(|(key, value)| {
			(
				key.clone(),
				ValueChange {
					old_value: old.get(key).cloned(),
					new_value: Some(value.clone()),
				},
			)
		});
	removed.chain(updated).collect()
}

fn pick(data: &Record, keys: &[&str]) -> Record {
	keys.iter()
		.filter_map(|key| data.get(*key).map(|value| ((*key).to_string(), value.clone())))
		.collect()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-process store, mainly for tests and embedding.
pub struct MemoryStore {
	area: StorageArea,
	data: Mutex<Record>,
	listeners: ListenerSet<StorageChange>,
}

impl MemoryStore {
	#[must_use]
	pub fn new() -> Self {
		Self::with_area(StorageArea::Sync)
	}

	#[must_use]
	pub fn with_area(area: StorageArea) -> Self {
		Self {
			area,
			data: Mutex::new(Record::new()),
			listeners: ListenerSet::new(),
		}
	}

	#[must_use]
	pub fn with_record(record: Record) -> Self {
		let store = Self::new();
		*lock(&store.data) = record;
		store
	}

	#[must_use]
	pub fn snapshot(&self) -> Record {
		lock(&self.data).clone()
	}
}

impl Default for MemoryStore {
	fn default() -> Self {
		Self::new()
	}
}

impl SettingsStore for MemoryStore {
	fn get(&self, keys: &[&str]) -> Result<Record, StoreError> {
		Ok(pick(&lock(&self.data), keys))
	}

	fn set(&self, partial: Record) -> Result<(), StoreError> {
		let changes = merge(&mut lock(&self.data), partial);
		if !changes.is_empty() {
			self.listeners.emit(&StorageChange {
				area: self.area,
				changes,
			});
		}
		Ok(())
	}

	fn subscribe(&self, listener: Box<dyn Fn(&StorageChange) + Send + Sync>) -> Subscription {
		self.listeners.add(listener)
	}
}

/// Store persisted as a single pretty-printed JSON object on disk.
///
/// Writes made through this handle notify its subscribers directly. Writes
/// from other processes are picked up by [`JsonFileStore::reload`].
pub struct JsonFileStore {
	path: PathBuf,
	write_guard: Mutex<()>,
	// Contents as of the last write or reload through this handle.
	seen: Mutex<Option<Record>>,
	listeners: ListenerSet<StorageChange>,
}

impl JsonFileStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			write_guard: Mutex::new(()),
			seen: Mutex::new(None),
			listeners: ListenerSet::new(),
		}
	}

	#[must_use]
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Re-read the file and notify subscribers of keys changed since the last
	/// write or reload through this handle. The first call only records a
	/// baseline, and a blank file never replaces a non-empty snapshot.
	/// Returns whether anything changed.
	pub fn reload(&self) -> Result<bool, StoreError> {
		let changes = {
			let _guard = lock(&self.write_guard);
			let mut seen = lock(&self.seen);
			let current = match self.read_contents()? {
				Some(current) => current,
				// A blank file after real contents is a partial write from a
				// writer that does not replace atomically.
				None if seen.as_ref().is_some_and(|previous| !previous.is_empty()) => {
					tracing::debug!(path = %self.path.display(), "settings file is blank; keeping last snapshot");
					return Ok(false);
				}
				None => Record::new(),
			};
			let changes = seen
				.as_ref()
				.map(|previous| diff(previous, &current))
				.unwrap_or_default();
			*seen = Some(current);
			changes
		};

		if changes.is_empty() {
			return Ok(false);
		}
		tracing::debug!(path = %self.path.display(), keys = ?changes.keys().collect::<Vec<_>>(), "settings changed on disk");
		self.listeners.emit(&StorageChange {
			area: StorageArea::Sync,
			changes,
		});
		Ok(true)
	}

	fn read_all(&self) -> Result<Record, StoreError> {
		Ok(self.read_contents()?.unwrap_or_default())
	}

	// `None` for a blank file; a missing file reads as an empty record.
	fn read_contents(&self) -> Result<Option<Record>, StoreError> {
		let bytes = match fs::read(&self.path) {
			Ok(bytes) => bytes,
			Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Some(Record::new())),
			Err(source) => {
				return Err(StoreError::Io {
					path: self.path.clone(),
					source,
				});
			}
		};
		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(None);
		}

		serde_json::from_slice(&bytes)
			.map(Some)
			.map_err(|source| StoreError::Parse {
				path: self.path.clone(),
				source,
			})
	}

	fn write_all(&self, data: &Record) -> Result<(), StoreError> {
		let io_error = |source| StoreError::Io {
			path: self.path.clone(),
			source,
		};

		let parent = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			Some(parent) => {
				fs::create_dir_all(parent).map_err(io_error)?;
				parent
			}
			None => Path::new("."),
		};
		let body = serde_json::to_vec_pretty(data).map_err(|source| StoreError::Parse {
			path: self.path.clone(),
			source,
		})?;

		// Readers see either the old file or the new one, never a partial write.
		let mut staged = NamedTempFile::new_in(parent).map_err(io_error)?;
		staged.write_all(&body).map_err(io_error)?;
		staged.as_file().sync_all().map_err(io_error)?;
		staged
			.persist(&self.path)
			.map_err(|err| io_error(err.error))?;
		Ok(())
	}
}

impl SettingsStore for JsonFileStore {
	fn get(&self, keys: &[&str]) -> Result<Record, StoreError> {
		Ok(pick(&self.read_all()?, keys))
	}

	fn set(&self, partial: Record) -> Result<(), StoreError> {
		let changes = {
			let _guard = lock(&self.write_guard);
			let mut data = self.read_all()?;
			let changes = merge(&mut data, partial);
			if !changes.is_empty() {
				self.write_all(&data)?;
			}
			*lock(&self.seen) = Some(data);
			changes
		};

		if !changes.is_empty() {
			tracing::debug!(path = %self.path.display(), keys = ?changes.keys().collect::<Vec<_>>(), "settings written");
			self.listeners.emit(&StorageChange {
				area: StorageArea::Sync,
				changes,
			});
		}
		Ok(())
	}

	fn subscribe(&self, listener: Box<dyn Fn(&StorageChange) + Send + Sync>) -> Subscription {
		self.listeners.add(listener)
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use serde_json::json;

	use super::*;

	fn record(value: Value) -> Record {
		serde_json::from_value(value).expect("record")
	}

	#[test]
	fn get_omits_absent_keys_and_defaults_fill_them() {
		let store = MemoryStore::with_record(record(json!({ "blend": 0.4 })));
		let values = store.get(&["blend", "applyScope"]).expect("get");
		assert_eq!(values, record(json!({ "blend": 0.4 })));

		let defaults = record(json!({ "blend": 0.9, "applyScope": "global" }));
		let values = store.get_with_defaults(&defaults).expect("get");
		assert_eq!(values, record(json!({ "blend": 0.4, "applyScope": "global" })));
	}

	#[test]
	fn set_notifies_only_changed_keys() {
		let store = MemoryStore::with_record(record(json!({ "blend": 0.4 })));
		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink = Arc::clone(&seen);
		let _subscription = store.subscribe(Box::new(move |change: &StorageChange| {
			lock(&sink).push(change.clone());
		}));

		store
			.set(record(json!({ "blend": 0.4, "applyScope": "site" })))
			.expect("set");
		store.set(record(json!({ "blend": 0.4 }))).expect("set");

		let seen = lock(&seen);
		assert_eq!(seen.len(), 1);
		assert_eq!(seen[0].area, StorageArea::Sync);
		assert!(seen[0].touches("applyScope"));
		assert!(!seen[0].touches("blend"));
		assert_eq!(
			seen[0].changes["applyScope"],
			ValueChange {
				old_value: None,
				new_value: Some(json!("site")),
			}
		);
	}

	#[test]
	fn file_store_round_trips_and_notifies() {
		let dir = tempfile::tempdir().expect("temp dir");
		let path = dir.path().join("nested").join("settings.json");
		let store = JsonFileStore::new(&path);
		assert!(store.get(&["blend"]).expect("empty read").is_empty());

		let calls = Arc::new(Mutex::new(0));
		let counter = Arc::clone(&calls);
		let _subscription = store.subscribe(Box::new(move |_: &StorageChange| *lock(&counter) += 1));

		store
			.set(record(json!({ "blend": 0.5, "favorites": ["nord"] })))
			.expect("set");
		store.set(record(json!({ "blend": 0.6 }))).expect("set");

		let reopened = JsonFileStore::new(&path);
		let values = reopened.get(&["blend", "favorites"]).expect("get");
		assert_eq!(values, record(json!({ "blend": 0.6, "favorites": ["nord"] })));
		assert_eq!(*lock(&calls), 2);
	}

	#[test]
	fn reload_reports_writes_from_other_handles() {
		let dir = tempfile::tempdir().expect("temp dir");
		let path = dir.path().join("settings.json");
		let watcher = JsonFileStore::new(&path);
		let writer = JsonFileStore::new(&path);
		writer
			.set(record(json!({ "blend": 0.5, "applyScope": "site" })))
			.expect("set");

		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink = Arc::clone(&seen);
		let _subscription = watcher.subscribe(Box::new(move |change: &StorageChange| {
			lock(&sink).push(change.clone());
		}));

		assert!(!watcher.reload().expect("baseline"));
		fs::write(&path, r#"{ "blend": 0.7 }"#).expect("external write");
		assert!(watcher.reload().expect("reload"));
		assert!(!watcher.reload().expect("unchanged"));

		let seen = lock(&seen);
		assert_eq!(seen.len(), 1);
		assert_eq!(
			seen[0].changes["blend"],
			ValueChange {
				old_value: Some(json!(0.5)),
				new_value: Some(json!(0.7)),
			}
		);
		assert_eq!(
			seen[0].changes["applyScope"],
			ValueChange {
				old_value: Some(json!("site")),
				new_value: None,
			}
		);
	}

	#[test]
	fn blank_file_during_external_write_is_not_a_deletion() {
		let dir = tempfile::tempdir().expect("temp dir");
		let path = dir.path().join("settings.json");
		let watcher = JsonFileStore::new(&path);
		let writer = JsonFileStore::new(&path);
		writer
			.set(record(json!({
				"selectedThemeId": "nord",
				"blend": 0.5,
				"applyScope": "site"
			})))
			.expect("set");

		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink = Arc::clone(&seen);
		let _subscription = watcher.subscribe(Box::new(move |change: &StorageChange| {
			lock(&sink).push(change.clone());
		}));
		assert!(!watcher.reload().expect("baseline"));

		fs::write(&path, "").expect("truncate");
		assert!(!watcher.reload().expect("blank file"));
		assert!(lock(&seen).is_empty());

		writer
			.set(record(json!({
				"selectedThemeId": "nord",
				"blend": 0.6,
				"applyScope": "site"
			})))
			.expect("set");
		assert!(watcher.reload().expect("reload"));

		let seen = lock(&seen);
		assert_eq!(seen.len(), 1);
		assert_eq!(seen[0].changes.keys().collect::<Vec<_>>(), ["blend"]);
	}

	#[test]
	fn writes_replace_the_file_without_leftovers() {
		let dir = tempfile::tempdir().expect("temp dir");
		let path = dir.path().join("settings.json");
		let store = JsonFileStore::new(&path);
		store.set(record(json!({ "blend": 0.5 }))).expect("set");
		store.set(record(json!({ "blend": 0.7 }))).expect("set");

		let entries: Vec<_> = fs::read_dir(dir.path())
			.expect("read dir")
			.map(|entry| entry.expect("entry").file_name())
			.collect();
		assert_eq!(entries, ["settings.json"]);

		let on_disk: Record = serde_json::from_slice(&fs::read(&path).expect("read")).expect("json");
		assert_eq!(on_disk, record(json!({ "blend": 0.7 })));
	}

	#[test]
	fn corrupt_file_is_a_read_error() {
		let dir = tempfile::tempdir().expect("temp dir");
		let path = dir.path().join("settings.json");
		fs::write(&path, "[1, 2").expect("write");

		let store = JsonFileStore::new(&path);
		assert!(matches!(store.get(&["blend"]), Err(StoreError::Parse { .. })));
		assert!(store.set(record(json!({ "blend": 0.5 }))).is_err());
	}
}
