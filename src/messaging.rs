//! Cross-context messages between the control surface and page contexts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A message addressed to a page context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RuntimeMessage {
	/// Ask the page to re-apply its theme right away. The payload names what
	/// the sender just selected; the page still resolves from the store.
	#[serde(rename = "APPLY_THEME", rename_all = "camelCase")]
	ApplyTheme { theme_id: String, blend: f64 },
}

impl RuntimeMessage {
	pub fn apply_theme(theme_id: impl Into<String>, blend: f64) -> Self {
		Self::ApplyTheme {
			theme_id: theme_id.into(),
			blend,
		}
	}
}

/// Why a message could not be delivered.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
	/// Nothing in the target context is listening.
	#[error("no receiver is listening in the target page")]
	NoReceiver,

	/// The page does not accept extension content (browser internal pages).
	#[error("page {0} does not accept messages")]
	Restricted(String),
}

/// Something a [`RuntimeMessage`] can be sent to.
pub trait MessageTarget: Send + Sync {
	fn send(&self, message: &RuntimeMessage) -> Result<(), DeliveryError>;
}

/// Send `message` if there is a target, ignoring delivery failures.
pub fn notify_best_effort(target: Option<&dyn MessageTarget>, message: &RuntimeMessage) {
	let Some(target) = target else {
		return;
	};
	if let Err(error) = target.send(message) {
		tracing::debug!(%error, "page notification dropped");
	}
}
