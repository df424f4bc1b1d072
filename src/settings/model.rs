use std::collections::{BTreeMap, BTreeSet};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::store::Record;

pub const DEFAULT_THEME_ID: &str = "serika-dark";
pub const DEFAULT_BLEND: f64 = 0.9;
pub const MIN_BLEND: f64 = 0.15;
pub const MAX_BLEND: f64 = 1.0;

/// Favorites seeded on first install.
pub const INSTALL_FAVORITES: [&str; 3] = ["serika-dark", "nord", "dracula"];

/// Keys the settings occupy in the shared store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
	SelectedThemeId,
	Blend,
	ApplyScope,
	PerHostThemes,
	Favorites,
}

impl SettingKey {
	/// Keys whose change alters what a page should look like.
	pub const APPEARANCE: [Self; 4] = [
		Self::SelectedThemeId,
		Self::PerHostThemes,
		Self::ApplyScope,
		Self::Blend,
	];

	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			Self::SelectedThemeId => "selectedThemeId",
			Self::Blend => "blend",
			Self::ApplyScope => "applyScope",
			Self::PerHostThemes => "perHostThemes",
			Self::Favorites => "favorites",
		}
	}
}

/// Whether the selection is shared by all sites or bound to one host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyScope {
	#[default]
	Global,
	Site,
}

impl ApplyScope {
	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Global => "global",
			Self::Site => "site",
		}
	}
}

impl std::str::FromStr for ApplyScope {
	type Err = String;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value.trim().to_ascii_lowercase().as_str() {
			"global" => Ok(Self::Global),
			"site" => Ok(Self::Site),
			other => Err(format!("unknown scope `{other}` (expected global or site)")),
		}
	}
}

/// A per-host override. Either half may be missing, in which case the global
/// value shows through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostTheme {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub theme_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub blend: Option<f64>,
}

/// Typed view of the stored settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
	pub selected_theme_id: String,
	pub blend: f64,
	pub apply_scope: ApplyScope,
	pub per_host_themes: BTreeMap<String, HostTheme>,
	pub favorites: BTreeSet<String>,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			selected_theme_id: DEFAULT_THEME_ID.to_string(),
			blend: DEFAULT_BLEND,
			apply_scope: ApplyScope::Global,
			per_host_themes: BTreeMap::new(),
			favorites: BTreeSet::new(),
		}
	}
}

impl Settings {
	/// Defaults passed to a store read.
	#[must_use]
	pub fn read_defaults() -> Record {
		let mut record = Record::new();
		record.insert(SettingKey::SelectedThemeId.as_str().into(), json!(DEFAULT_THEME_ID));
		record.insert(SettingKey::Blend.as_str().into(), json!(DEFAULT_BLEND));
		record.insert(
			SettingKey::ApplyScope.as_str().into(),
			json!(ApplyScope::Global.as_str()),
		);
		record.insert(SettingKey::PerHostThemes.as_str().into(), json!({}));
		record.insert(SettingKey::Favorites.as_str().into(), json!([]));
		record
	}

	/// Values written for keys that are missing at install time.
	#[must_use]
	pub fn install_defaults() -> Record {
		let mut record = Self::read_defaults();
		record.insert(SettingKey::Favorites.as_str().into(), json!(INSTALL_FAVORITES));
		record
	}

	/// Decode a stored record. Each malformed field falls back to its default
	/// on its own, so one bad value never hides the others.
	#[must_use]
	pub fn from_record(record: &Record) -> Self {
		let defaults = Self::default();

		let selected_theme_id = field::<String>(record, SettingKey::SelectedThemeId)
			.filter(|id| !id.is_empty())
			.unwrap_or(defaults.selected_theme_id);
		let blend = record
			.get(SettingKey::Blend.as_str())
			.and_then(Value::as_f64)
			.filter(|value| value.is_finite())
			.unwrap_or(defaults.blend);
		let apply_scope = field(record, SettingKey::ApplyScope).unwrap_or(defaults.apply_scope);
		let per_host_themes = record
			.get(SettingKey::PerHostThemes.as_str())
			.and_then(Value::as_object)
			.map(|hosts| {
				hosts
					.iter()
					.filter_map(|(host, value)| Some((host.clone(), host_theme(value)?)))
					.collect()
			})
			.unwrap_or_default();
		let favorites = record
			.get(SettingKey::Favorites.as_str())
			.and_then(Value::as_array)
			.map(|items| {
				items
					.iter()
					.filter_map(Value::as_str)
					.map(str::to_string)
					.collect()
			})
			.unwrap_or_default();

		Self {
			selected_theme_id,
			blend,
			apply_scope,
			per_host_themes,
			favorites,
		}
	}

	/// Encode the settings as a full store record.
	#[must_use]
	pub fn to_record(&self) -> Record {
		let mut record = Record::new();
		record.insert(
			SettingKey::SelectedThemeId.as_str().into(),
			json!(self.selected_theme_id),
		);
		record.insert(SettingKey::Blend.as_str().into(), json!(self.blend));
		record.insert(
			SettingKey::ApplyScope.as_str().into(),
			json!(self.apply_scope.as_str()),
		);
		record.insert(
			SettingKey::PerHostThemes.as_str().into(),
			per_host_value(&self.per_host_themes),
		);
		record.insert(SettingKey::Favorites.as_str().into(), json!(self.favorites));
		record
	}
}

/// Encode a per-host table for storage.
#[must_use]
pub fn per_host_value(hosts: &BTreeMap<String, HostTheme>) -> Value {
	serde_json::to_value(hosts).unwrap_or_else(|_| json!({}))
}

fn field<T: DeserializeOwned>(record: &Record, key: SettingKey) -> Option<T> {
	record
		.get(key.as_str())
		.and_then(|value| serde_json::from_value(value.clone()).ok())
}

// A host record with a wrong-typed member keeps whichever half is usable.
fn host_theme(value: &Value) -> Option<HostTheme> {
	let object = value.as_object()?;
	Some(HostTheme {
		theme_id: object
			.get("themeId")
			.and_then(Value::as_str)
			.map(str::to_string),
		blend: object.get("blend").and_then(Value::as_f64),
	})
}

/// Clamp a blend into `[MIN_BLEND, MAX_BLEND]`; non-finite input becomes
/// [`DEFAULT_BLEND`].
#[must_use]
pub fn clamp_blend(value: f64) -> f64 {
	if value.is_finite() {
		value.clamp(MIN_BLEND, MAX_BLEND)
	} else {
		DEFAULT_BLEND
	}
}

/// Lowercase a hostname and strip one leading `www.`.
#[must_use]
pub fn normalize_host(host: &str) -> String {
	let lowered = host.to_lowercase();
	match lowered.strip_prefix("www.") {
		Some(rest) => rest.to_string(),
		None => lowered,
	}
}
