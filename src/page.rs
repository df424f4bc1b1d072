//! Events raised by a page context: visibility changes and incoming messages.

use crate::events::{ListenerSet, Subscription};
use crate::messaging::{DeliveryError, MessageTarget, RuntimeMessage};

/// Document visibility as reported by the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
	Visible,
	Hidden,
}

/// Event hub for one page context. The embedding environment reports events
/// here; the page agent listens.
#[derive(Default)]
pub struct PageEvents {
	visibility: ListenerSet<Visibility>,
	messages: ListenerSet<RuntimeMessage>,
}

impl PageEvents {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use = "dropping the subscription removes the listener"]
	pub fn on_visibility_change<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&Visibility) + Send + Sync + 'static,
	{
		self.visibility.add(listener)
	}

	#[must_use = "dropping the subscription removes the listener"]
	pub fn on_message<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&RuntimeMessage) + Send + Sync + 'static,
	{
		self.messages.add(listener)
	}

	pub fn set_visibility(&self, visibility: Visibility) {
		self.visibility.emit(&visibility);
	}
}

impl MessageTarget for PageEvents {
	fn send(&self, message: &RuntimeMessage) -> Result<(), DeliveryError> {
		match self.messages.emit(message) {
			0 => Err(DeliveryError::NoReceiver),
			_ => Ok(()),
		}
	}
}
