//! Debounced apply scheduling.
//!
//! Every trigger funnels into [`ApplyScheduler::schedule`]. A request replaces
//! whatever is pending and restarts the delay, so a burst of triggers results
//! in one apply carrying the last request's parameters.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::Result;

/// Delay between the last request in a burst and the apply it causes.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

/// Why an apply was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
	/// The page context just started.
	Startup,
	/// A settings key affecting appearance changed in the store.
	StoreChanged,
	/// The page became visible again.
	VisibilityRegained,
	/// The control surface asked for an immediate re-apply.
	ApplyNow,
}

impl Trigger {
	/// Explicit requests bypass the idempotence check; passive ones rely on it.
	#[must_use]
	pub fn forces(self) -> bool {
		matches!(self, Self::Startup | Self::ApplyNow)
	}
}

/// Parameters of one scheduled apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyRequest {
	pub trigger: Trigger,
	pub force: bool,
}

impl From<Trigger> for ApplyRequest {
	fn from(trigger: Trigger) -> Self {
		Self {
			trigger,
			force: trigger.forces(),
		}
	}
}

enum SchedulerCommand {
	Schedule(ApplyRequest),
	Shutdown,
}

/// Owns the debounce timer and the worker thread that runs applies.
///
/// Applies run one at a time on the worker. Errors returned by the apply
/// callback are logged and dropped. Dropping the scheduler cancels any
/// pending request and joins the worker.
pub struct ApplyScheduler {
	commands: Sender<SchedulerCommand>,
	worker: Option<JoinHandle<()>>,
}

impl ApplyScheduler {
	pub fn spawn<F>(delay: Duration, run: F) -> Self
	where
		F: FnMut(ApplyRequest) -> Result<()> + Send + 'static,
	{
		let (commands, receiver) = mpsc::channel();
		let worker = thread::Builder::new()
			.name("mutheme-apply".into())
			.spawn(move || worker_loop(delay, receiver, run))
			.map_err(|error| tracing::error!(%error, "failed to start apply scheduler"))
			.ok();

		Self { commands, worker }
	}

	/// Schedule an apply for `trigger`, replacing any pending one.
	pub fn schedule(&self, trigger: Trigger) {
		self.request(ApplyRequest::from(trigger));
	}

	pub fn request(&self, request: ApplyRequest) {
		if self
			.commands
			.send(SchedulerCommand::Schedule(request))
			.is_err()
		{
			tracing::warn!(?request, "apply scheduler is no longer running");
		}
	}

	/// Stop the worker, dropping any pending request.
	pub fn shutdown(mut self) {
		self.stop();
	}

	fn stop(&mut self) {
		let _ = self.commands.send(SchedulerCommand::Shutdown);
		if let Some(worker) = self.worker.take()
			&& worker.thread().id() != thread::current().id()
			&& worker.join().is_err()
		{
			tracing::error!("apply scheduler worker panicked");
		}
	}
}

impl Drop for ApplyScheduler {
	fn drop(&mut self) {
		self.stop();
	}
}

fn worker_loop<F>(delay: Duration, receiver: Receiver<SchedulerCommand>, mut run: F)
where
	F: FnMut(ApplyRequest) -> Result<()>,
{
	let mut pending: Option<(ApplyRequest, Instant)> = None;

	loop {
		let command = match pending {
			Some((request, deadline)) => {
				let wait = deadline.saturating_duration_since(Instant::now());
				match receiver.recv_timeout(wait) {
					Ok(command) => command,
					Err(RecvTimeoutError::Timeout) => {
						pending = None;
						fire(&mut run, request);
						continue;
					}
					Err(RecvTimeoutError::Disconnected) => break,
				}
			}
			None => match receiver.recv() {
				Ok(command) => command,
				Err(_) => break,
			},
		};

		match command {
			SchedulerCommand::Schedule(request) => {
				if let Some((replaced, _)) = pending {
					tracing::trace!(?replaced, ?request, "pending apply superseded");
				}
				pending = Some((request, Instant::now() + delay));
			}
			SchedulerCommand::Shutdown => break,
		}
	}
}

fn fire<F>(run: &mut F, request: ApplyRequest)
where
	F: FnMut(ApplyRequest) -> Result<()>,
{
	if let Err(error) = run(request) {
		tracing::error!(trigger = ?request.trigger, error = %format!("{error:#}"), "scheduled apply failed");
	}
}
