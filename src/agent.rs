//! Page-context wiring.
//!
//! A [`PageAgent`] connects the three apply triggers of a page (store
//! changes, the page becoming visible, and `APPLY_THEME` messages) to a single
//! [`ApplyScheduler`], and schedules a forced apply on start. Each trigger is
//! held as a [`Subscription`]; stopping the agent revokes them all.

use std::sync::Arc;
use std::time::Duration;

use crate::events::Subscription;
use crate::messaging::RuntimeMessage;
use crate::page::{PageEvents, Visibility};
use crate::schedule::{ApplyScheduler, DEFAULT_DEBOUNCE, Trigger};
use crate::settings::{SettingKey, SettingsStore, StorageArea, StorageChange};
use crate::style::{StyleApplicator, StyleHost};

/// Per-page parameters.
#[derive(Debug, Clone)]
pub struct AgentOptions {
	/// Hostname of the page, as reported by the browser.
	pub host: Option<String>,
	pub debounce: Duration,
}

impl Default for AgentOptions {
	fn default() -> Self {
		Self {
			host: None,
			debounce: DEFAULT_DEBOUNCE,
		}
	}
}

impl AgentOptions {
	pub fn for_host(host: impl Into<String>) -> Self {
		Self {
			host: Some(host.into()),
			..Self::default()
		}
	}
}

/// Keeps one page styled according to the shared settings.
pub struct PageAgent<D> {
	// Revoked before the scheduler is dropped.
	subscriptions: Vec<Subscription>,
	scheduler: Arc<ApplyScheduler>,
	applicator: Arc<StyleApplicator<D>>,
}

impl<D: StyleHost + 'static> PageAgent<D> {
	pub fn start(
		store: Arc<dyn SettingsStore>,
		events: &PageEvents,
		applicator: Arc<StyleApplicator<D>>,
		options: AgentOptions,
	) -> Self {
		let AgentOptions { host, debounce } = options;

		let scheduler = {
			let store = Arc::clone(&store);
			let applicator = Arc::clone(&applicator);
			let host = host.clone();
			Arc::new(ApplyScheduler::spawn(debounce, move |request| {
				applicator
					.apply_from_settings(store.as_ref(), host.as_deref(), request.force)
					.map(|_| ())
			}))
		};

		let on_store = {
			let scheduler = Arc::clone(&scheduler);
			store.subscribe(Box::new(move |change: &StorageChange| {
				if affects_appearance(change) {
					scheduler.schedule(Trigger::StoreChanged);
				}
			}))
		};

		let on_visibility = {
			let scheduler = Arc::clone(&scheduler);
			events.on_visibility_change(move |visibility| {
				if *visibility == Visibility::Visible {
					scheduler.schedule(Trigger::VisibilityRegained);
				}
			})
		};

		let on_message = {
			let scheduler = Arc::clone(&scheduler);
			events.on_message(move |message| match message {
				RuntimeMessage::ApplyTheme { .. } => scheduler.schedule(Trigger::ApplyNow),
			})
		};

		tracing::debug!(host = host.as_deref().unwrap_or(""), ?debounce, "page agent started");
		scheduler.schedule(Trigger::Startup);

		Self {
			subscriptions: vec![on_store, on_visibility, on_message],
			scheduler,
			applicator,
		}
	}

	/// Request a forced re-apply, as if the control surface had asked.
	pub fn apply_now(&self) {
		self.scheduler.schedule(Trigger::ApplyNow);
	}

	#[must_use]
	pub fn applicator(&self) -> &StyleApplicator<D> {
		&self.applicator
	}

	/// Revoke every trigger and stop the scheduler. A pending apply is
	/// dropped.
	pub fn stop(self) {
		drop(self);
	}
}

fn affects_appearance(change: &StorageChange) -> bool {
	change.area == StorageArea::Sync
		&& SettingKey::APPEARANCE
			.iter()
			.any(|key| change.touches(key.as_str()))
}
