use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;

use super::derive::derive_style;
use super::document::{STYLE_ELEMENT_ID, StyleHost, THEME_DATASET_KEY};
use crate::settings::{self, DEFAULT_THEME_ID, SettingsStore, clamp_blend, resolve};
use crate::theme::CatalogLoader;

/// Blends closer than this count as unchanged.
pub const BLEND_TOLERANCE: f64 = 0.01;

/// The theme and blend most recently installed into the page.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedState {
	pub theme_id: String,
	pub blend: f64,
}

/// What an [`StyleApplicator::apply`] call did.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
	/// A style sheet was derived and installed.
	Applied(AppliedState),
	/// The requested state matched the last install and was skipped.
	Unchanged,
	/// The catalog is empty, so there was nothing to apply.
	NoTheme,
}

/// Installs theme style sheets into one page and remembers what it last
/// installed there.
pub struct StyleApplicator<D> {
	catalog: Arc<CatalogLoader>,
	document: D,
	last_applied: Mutex<Option<AppliedState>>,
}

impl<D: StyleHost> StyleApplicator<D> {
	pub fn new(catalog: Arc<CatalogLoader>, document: D) -> Self {
		Self {
			catalog,
			document,
			last_applied: Mutex::new(None),
		}
	}

	#[must_use]
	pub fn document(&self) -> &D {
		&self.document
	}

	#[must_use]
	pub fn last_applied(&self) -> Option<AppliedState> {
		self.lock().clone()
	}

	/// Install `theme_id` at `blend` unless it is already in place.
	///
	/// An unknown or empty id falls back to the catalog's first theme. With
	/// `force` unset, a request matching the last install (same theme, blend
	/// within [`BLEND_TOLERANCE`]) is skipped. The last-applied record only
	/// advances when installation succeeds.
	pub fn apply(&self, theme_id: Option<&str>, blend: f64, force: bool) -> Result<ApplyOutcome> {
		let requested = theme_id.filter(|id| !id.is_empty()).unwrap_or(DEFAULT_THEME_ID);
		let Some(theme) = self.catalog.theme(requested) else {
			tracing::debug!(requested, "no theme available; skipping apply");
			return Ok(ApplyOutcome::NoTheme);
		};
		let blend = clamp_blend(blend);

		let mut last_applied = self.lock();
		if !force
			&& let Some(last) = last_applied.as_ref()
			&& last.theme_id == theme.id
			&& (last.blend - blend).abs() < BLEND_TOLERANCE
		{
			tracing::trace!(theme = %theme.id, blend, "theme already applied");
			return Ok(ApplyOutcome::Unchanged);
		}

		let css = derive_style(&theme, blend);
		self.document.upsert_style(STYLE_ELEMENT_ID, &css)?;
		self.document.set_dataset(THEME_DATASET_KEY, &theme.id)?;

		let state = AppliedState {
			theme_id: theme.id,
			blend,
		};
		*last_applied = Some(state.clone());
		tracing::debug!(theme = %state.theme_id, blend, force, "theme applied");
		Ok(ApplyOutcome::Applied(state))
	}

	/// Read the settings, resolve them for `host` and apply the result.
	///
	/// Store failures propagate to the caller.
	pub fn apply_from_settings(
		&self,
		store: &dyn SettingsStore,
		host: Option<&str>,
		force: bool,
	) -> Result<ApplyOutcome> {
		let settings = settings::load(store)?;
		let resolved = resolve(&settings, host);
		self.apply(Some(&resolved.theme_id), resolved.blend, force)
	}

	fn lock(&self) -> MutexGuard<'_, Option<AppliedState>> {
		self.last_applied
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}
