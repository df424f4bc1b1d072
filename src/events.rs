//! Listener registration with revocable handles.
//!
//! Every event source in the crate (store changes, page visibility, runtime
//! messages) keeps its callbacks in a [`ListenerSet`]. Registering returns a
//! [`Subscription`]; dropping or revoking it removes the callback.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T> {
	next_id: u64,
	entries: Vec<(u64, Callback<T>)>,
}

/// A set of callbacks interested in events of type `T`.
pub struct ListenerSet<T> {
	inner: Arc<Mutex<Registry<T>>>,
}

impl<T: 'static> ListenerSet<T> {
	#[must_use]
	pub fn new() -> Self {
		Self {
			inner: Arc::new(Mutex::new(Registry {
				next_id: 0,
				entries: Vec::new(),
			})),
		}
	}

	#[must_use = "dropping the subscription removes the listener"]
	pub fn add<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&T) + Send + Sync + 'static,
	{
		let mut registry = lock(&self.inner);
		let id = registry.next_id;
		registry.next_id += 1;
		registry.entries.push((id, Arc::new(listener)));
		drop(registry);

		let weak: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.inner);
		Subscription {
			revoke: Some(Box::new(move || {
				if let Some(inner) = weak.upgrade() {
					lock(&inner).entries.retain(|(entry, _)| *entry != id);
				}
			})),
		}
	}

	/// Invoke every listener with `event`, returning how many were called.
	///
	/// Callbacks run after the registry lock is released, so a listener may
	/// subscribe or revoke without deadlocking.
	pub fn emit(&self, event: &T) -> usize {
		let snapshot: Vec<Callback<T>> = lock(&self.inner)
			.entries
			.iter()
			.map(|(_, callback)| Arc::clone(callback))
			.collect();

		for callback in &snapshot {
			callback(event);
		}
		snapshot.len()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		lock(&self.inner).entries.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl<T: 'static> Default for ListenerSet<T> {
	fn default() -> Self {
		Self::new()
	}
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Handle to a registered listener. The listener is removed on drop.
pub struct Subscription {
	revoke: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
	/// Remove the listener now.
	pub fn revoke(mut self) {
		self.run_revoke();
	}

	fn run_revoke(&mut self) {
		if let Some(revoke) = self.revoke.take() {
			revoke();
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		self.run_revoke();
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("active", &self.revoke.is_some())
			.finish()
	}
}
