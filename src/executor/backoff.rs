// std
use std::time::Duration as StdDuration;
// crates.io
use rand::Rng;
// self
use crate::config::RetryPolicy;

/// Exponential backoff with additive jitter.
///
/// Each delay is `min(base + jitter, max)` where `jitter` is drawn from
/// `[0, jitter_ratio * base)`; `base` then doubles, capped at `max`.
#[derive(Clone, Debug)]
pub(crate) struct Backoff {
	current: StdDuration,
	max: StdDuration,
	jitter_ratio: f64,
}
impl Backoff {
	pub(crate) fn new(policy: &RetryPolicy) -> Self {
		Self {
			current: policy.initial_backoff.min(policy.max_backoff),
			max: policy.max_backoff,
			jitter_ratio: policy.jitter_ratio,
		}
	}

	pub(crate) fn next_delay(&mut self) -> StdDuration {
		self.next_delay_with(&mut rand::rng())
	}

	fn next_delay_with(&mut self, rng: &mut impl Rng) -> StdDuration {
		let base = self.current;
		let jitter_cap = base.as_secs_f64() * self.jitter_ratio;
		let jitter = if jitter_cap.is_finite() && jitter_cap > 0.0 {
			StdDuration::try_from_secs_f64(rng.random_range(0.0..jitter_cap)).unwrap_or(self.max)
		} else {
			StdDuration::ZERO
		};

		self.current = base.saturating_mul(2).min(self.max);

		base.saturating_add(jitter).min(self.max)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use rand::{SeedableRng, rngs::StdRng};
	// self
	use super::*;

	#[test]
	fn delays_double_within_jitter_bounds_and_cap() {
		let policy = RetryPolicy::default();
		let mut rng = StdRng::seed_from_u64(7);

		for _ in 0..64 {
			let mut backoff = Backoff::new(&policy);
			let mut base = policy.initial_backoff;

			for _ in 0..6 {
				let delay = backoff.next_delay_with(&mut rng);

				assert!(delay >= base, "{delay:?} < {base:?}");
				assert!(delay <= policy.max_backoff);
				assert!(delay < base.mul_f64(1.1) || delay == policy.max_backoff);

				base = (base * 2).min(policy.max_backoff);
			}
		}
	}

	#[test]
	fn zero_jitter_is_deterministic() {
		let policy = RetryPolicy::default()
			.with_jitter_ratio(0.0)
			.with_backoff(StdDuration::from_millis(100), StdDuration::from_millis(350));
		let mut backoff = Backoff::new(&policy);
		let delays = (0..4).map(|_| backoff.next_delay()).collect::<Vec<_>>();

		assert_eq!(
			delays,
			[100, 200, 350, 350].map(StdDuration::from_millis).to_vec(),
		);
	}
}
