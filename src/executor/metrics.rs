// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for executor activity, available without any metrics backend.
#[derive(Debug, Default)]
pub struct ExecutorMetrics {
	calls: AtomicU64,
	attempts: AtomicU64,
	retries: AtomicU64,
	reauths: AtomicU64,
	continuations: AtomicU64,
	failures: AtomicU64,
}
impl ExecutorMetrics {
	/// Logical calls started through `execute`.
	pub fn calls(&self) -> u64 {
		self.calls.load(Ordering::Relaxed)
	}

	/// HTTP round trips sent, retries and continuations included.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Round trips repeated after a server failure.
	pub fn retries(&self) -> u64 {
		self.retries.load(Ordering::Relaxed)
	}

	/// Token refreshes forced by server failures.
	pub fn reauths(&self) -> u64 {
		self.reauths.load(Ordering::Relaxed)
	}

	/// Follow-up calls made for continuation keys.
	pub fn continuations(&self) -> u64 {
		self.continuations.load(Ordering::Relaxed)
	}

	/// Logical calls that returned an error.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_call(&self) {
		self.calls.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_retry(&self) {
		self.retries.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_reauth(&self) {
		self.reauths.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_continuation(&self) {
		self.continuations.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
