use serde::Serialize;

use super::model::{ApplyScope, DEFAULT_BLEND, DEFAULT_THEME_ID, Settings, normalize_host};

/// The theme and blend in effect for one host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTheme {
	pub theme_id: String,
	pub blend: f64,
}

/// Work out which theme applies to `current_host`.
///
/// Global values apply unless the scope is [`ApplyScope::Site`] and a record
/// exists for the normalized host, in which case each half of the record that
/// is present and usable replaces its global counterpart. The blend is not
/// clamped here.
#[must_use]
pub fn resolve(settings: &Settings, current_host: Option<&str>) -> ResolvedTheme {
	let mut theme_id = if settings.selected_theme_id.is_empty() {
		DEFAULT_THEME_ID.to_string()
	} else {
		settings.selected_theme_id.clone()
	};
	let mut blend = if settings.blend.is_finite() {
		settings.blend
	} else {
		DEFAULT_BLEND
	};

	let host = current_host.map(normalize_host).unwrap_or_default();
	if settings.apply_scope == ApplyScope::Site
		&& !host.is_empty()
		&& let Some(record) = settings.per_host_themes.get(&host)
	{
		if let Some(id) = record.theme_id.as_deref().filter(|id| !id.is_empty()) {
			theme_id = id.to_string();
		}
		if let Some(value) = record.blend.filter(|value| value.is_finite()) {
			blend = value;
		}
	}

	ResolvedTheme { theme_id, blend }
}
