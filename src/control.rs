//! The control surface: browse the catalog and change settings.
//!
//! This is everything the popup does apart from drawing itself. Each action
//! writes the affected keys to the store and then nudges the active page with
//! an `APPLY_THEME` message. Writes are read-modify-write over a local copy of
//! the settings, so two surfaces editing at once can overwrite each other.

use std::cmp::Ordering;
use std::sync::Arc;

use serde_json::json;

use crate::messaging::{MessageTarget, RuntimeMessage, notify_best_effort};
use crate::settings::{
	self, ApplyScope, HostTheme, Record, SettingKey, Settings, SettingsStore, StoreError,
	clamp_blend, normalize_host, per_host_value,
};
use crate::theme::{Catalog, ThemeDefinition};

const RESTRICTED_SCHEMES: [&str; 2] = ["chrome", "edge"];
const RESTRICTED_HOSTS: [&str; 1] = ["chrome.google.com"];

/// Extract the hostname of `url`, or `None` when the page cannot be themed
/// (browser internal pages, the extension store, or an unparsable URL).
#[must_use]
pub fn host_from_url(url: &str) -> Option<String> {
	let (scheme, rest) = url.trim().split_once(':')?;
	let scheme = scheme.to_ascii_lowercase();
	if scheme.is_empty() || RESTRICTED_SCHEMES.contains(&scheme.as_str()) {
		return None;
	}

	let authority = rest.strip_prefix("//")?;
	let authority = authority
		.split(['/', '?', '#'])
		.next()
		.unwrap_or_default();
	let host_port = authority
		.rsplit_once('@')
		.map_or(authority, |(_, host)| host);

	let host = if let Some(bracketed) = host_port.strip_prefix('[') {
		bracketed.split_once(']').map(|(host, _)| host)?
	} else {
		host_port.split(':').next().unwrap_or_default()
	};

	let host = host.to_ascii_lowercase();
	if host.is_empty() || RESTRICTED_HOSTS.contains(&host.as_str()) {
		return None;
	}
	Some(host)
}

/// Popup state for one open control surface.
pub struct ControlSurface {
	store: Arc<dyn SettingsStore>,
	catalog: Arc<Catalog>,
	target: Option<Arc<dyn MessageTarget>>,
	host: Option<String>,
	normalized_host: Option<String>,
	scope: ApplyScope,
	settings: Settings,
	current_theme_id: String,
	current_blend: f64,
}

impl ControlSurface {
	/// Open the surface for the page at `host` (or no page at all).
	///
	/// Site scope is only honoured when there is a host to bind it to.
	pub fn open(
		store: Arc<dyn SettingsStore>,
		catalog: Arc<Catalog>,
		host: Option<String>,
		target: Option<Arc<dyn MessageTarget>>,
	) -> Result<Self, StoreError> {
		let settings = settings::load(store.as_ref())?;
		let host = host.filter(|host| !host.is_empty());
		let normalized_host = host.as_deref().map(normalize_host);
		let scope = match (settings.apply_scope, &host) {
			(ApplyScope::Site, Some(_)) => ApplyScope::Site,
			_ => ApplyScope::Global,
		};

		let mut surface = Self {
			store,
			catalog,
			target,
			host,
			normalized_host,
			scope,
			settings,
			current_theme_id: String::new(),
			current_blend: 0.0,
		};
		surface.refresh_current();
		Ok(surface)
	}

	#[must_use]
	pub fn host(&self) -> Option<&str> {
		self.host.as_deref()
	}

	#[must_use]
	pub fn scope(&self) -> ApplyScope {
		self.scope
	}

	#[must_use]
	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	#[must_use]
	pub fn current_theme_id(&self) -> &str {
		&self.current_theme_id
	}

	#[must_use]
	pub fn current_blend(&self) -> f64 {
		self.current_blend
	}

	/// Blend as shown next to the slider, e.g. `90%`.
	#[must_use]
	pub fn blend_label(&self) -> String {
		format!("{}%", (self.current_blend * 100.0).round())
	}

	#[must_use]
	pub fn is_favorite(&self, theme_id: &str) -> bool {
		self.settings.favorites.contains(theme_id)
	}

	#[must_use]
	pub fn has_site_override(&self) -> bool {
		self.site_key()
			.is_some_and(|host| self.settings.per_host_themes.contains_key(host))
	}

	/// Themes matching `query`, favorites first and then by name.
	#[must_use]
	pub fn filter_catalog(&self, query: &str, favorites_only: bool) -> Vec<&ThemeDefinition> {
		let mut themes: Vec<&ThemeDefinition> = self
			.catalog
			.list()
			.iter()
			.filter(|theme| !favorites_only || self.is_favorite(&theme.id))
			.filter(|theme| theme.matches(query))
			.collect();

		themes.sort_by(|a, b| {
			let favorite = self.is_favorite(&b.id).cmp(&self.is_favorite(&a.id));
			favorite.then_with(|| compare_names(&a.name, &b.name))
		});
		themes
	}

	/// Flip `theme_id` in the favorites set, returning whether it is now a
	/// favorite.
	pub fn toggle_favorite(&mut self, theme_id: &str) -> Result<bool, StoreError> {
		let favorites = &mut self.settings.favorites;
		let now_favorite = if favorites.remove(theme_id) {
			false
		} else {
			favorites.insert(theme_id.to_string());
			true
		};

		self.write(SettingKey::Favorites, json!(self.settings.favorites))?;
		Ok(now_favorite)
	}

	/// Pick `theme_id` for the current scope.
	///
	/// In site scope this writes a per-host record carrying the current blend;
	/// otherwise it changes the global selection.
	pub fn select_theme(&mut self, theme_id: &str) -> Result<(), StoreError> {
		let mut updates = Record::new();
		match self.site_key().map(str::to_string) {
			Some(host) => {
				self.settings.per_host_themes.insert(
					host,
					HostTheme {
						theme_id: Some(theme_id.to_string()),
						blend: Some(self.current_blend),
					},
				);
				updates.insert(
					SettingKey::PerHostThemes.as_str().into(),
					per_host_value(&self.settings.per_host_themes),
				);
			}
			None => {
				self.settings.selected_theme_id = theme_id.to_string();
				updates.insert(SettingKey::SelectedThemeId.as_str().into(), json!(theme_id));
			}
		}
		self.settings.apply_scope = self.scope;
		updates.insert(
			SettingKey::ApplyScope.as_str().into(),
			json!(self.scope.as_str()),
		);

		self.store.set(updates)?;
		self.current_theme_id = theme_id.to_string();
		self.notify_page();
		Ok(())
	}

	/// Change the blend for the current scope. The value is clamped.
	pub fn update_blend(&mut self, value: f64) -> Result<(), StoreError> {
		self.current_blend = clamp_blend(value);

		match self.site_key().map(str::to_string) {
			Some(host) => {
				let current_theme_id = self.current_theme_id.clone();
				let record = self
					.settings
					.per_host_themes
					.entry(host)
					.or_insert_with(|| HostTheme {
						theme_id: Some(current_theme_id),
						blend: None,
					});
				record.blend = Some(self.current_blend);
				let value = per_host_value(&self.settings.per_host_themes);
				self.write(SettingKey::PerHostThemes, value)?;
			}
			None => {
				self.settings.blend = self.current_blend;
				self.write(SettingKey::Blend, json!(self.current_blend))?;
			}
		}

		self.notify_page();
		Ok(())
	}

	/// Switch between global and site scope. Returns `false` when site scope
	/// was requested without a host, leaving everything unchanged.
	pub fn change_scope(&mut self, scope: ApplyScope) -> Result<bool, StoreError> {
		if scope == ApplyScope::Site && self.host.is_none() {
			return Ok(false);
		}

		self.scope = scope;
		self.settings.apply_scope = scope;
		self.write(SettingKey::ApplyScope, json!(scope.as_str()))?;
		self.refresh_current();
		self.notify_page();
		Ok(true)
	}

	/// Drop the override for the current host. Returns `false` when there is
	/// no host to clear.
	pub fn clear_site_override(&mut self) -> Result<bool, StoreError> {
		let Some(host) = self.normalized_host.clone() else {
			return Ok(false);
		};

		self.settings.per_host_themes.remove(&host);
		let value = per_host_value(&self.settings.per_host_themes);
		self.write(SettingKey::PerHostThemes, value)?;
		self.refresh_current();
		self.notify_page();
		Ok(true)
	}

	// Host key for per-host writes, only while in site scope.
	fn site_key(&self) -> Option<&str> {
		match self.scope {
			ApplyScope::Site => self.normalized_host.as_deref(),
			ApplyScope::Global => None,
		}
	}

	fn refresh_current(&mut self) {
		let record = self
			.site_key()
			.and_then(|host| self.settings.per_host_themes.get(host));
		let theme_id = record
			.and_then(|record| record.theme_id.clone())
			.unwrap_or_else(|| self.settings.selected_theme_id.clone());
		let blend = record
			.and_then(|record| record.blend)
			.unwrap_or(self.settings.blend);

		self.current_theme_id = theme_id;
		self.current_blend = blend;
	}

	fn write(&self, key: SettingKey, value: serde_json::Value) -> Result<(), StoreError> {
		let mut record = Record::new();
		record.insert(key.as_str().into(), value);
		self.store.set(record)
	}

	fn notify_page(&self) {
		let message = RuntimeMessage::apply_theme(&self.current_theme_id, self.current_blend);
		notify_best_effort(self.target.as_deref(), &message);
	}
}

fn compare_names(a: &str, b: &str) -> Ordering {
	a.to_lowercase()
		.cmp(&b.to_lowercase())
		.then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests;
