//! Waiting primitive used for retry backoff, token retry windows, and inter-page delays.
//!
//! Waits suspend the calling task only; nothing runs in the background. Swap the default
//! [`TokioPause`] for a custom [`Pause`] to observe or shorten delays.

// std
use std::time::Duration as StdDuration;
// self
use crate::_prelude::*;

/// Boxed future returned by [`Pause::pause`].
pub type PauseFuture<'a> = Pin<Box<dyn Future<Output = ()> + 'a + Send>>;

/// Suspends the caller for a given duration.
pub trait Pause
where
	Self: Send + Sync,
{
	/// Waits for `delay` before resolving.
	fn pause(&self, delay: StdDuration) -> PauseFuture<'_>;
}

/// Default [`Pause`] backed by the Tokio timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioPause;
impl Pause for TokioPause {
	fn pause(&self, delay: StdDuration) -> PauseFuture<'_> {
		Box::pin(async move {
			if !delay.is_zero() {
				tokio::time::sleep(delay).await;
			}
		})
	}
}

/// [`Pause`] that resolves immediately and records every requested delay.
///
/// Useful for tests and dry runs where retry and pagination waits should be observable but
/// not slow.
#[derive(Clone, Debug, Default)]
pub struct RecordingPause(Arc<Mutex<Vec<StdDuration>>>);
impl RecordingPause {
	/// Returns every delay requested so far, in order.
	pub fn recorded(&self) -> Vec<StdDuration> {
		self.0.lock().clone()
	}

	/// Sum of every delay requested so far.
	pub fn total(&self) -> StdDuration {
		self.0.lock().iter().sum()
	}
}
impl Pause for RecordingPause {
	fn pause(&self, delay: StdDuration) -> PauseFuture<'_> {
		self.0.lock().push(delay);

		Box::pin(async {})
	}
}
