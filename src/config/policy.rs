// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, response};

/// Response code the service returns (wrapped in a 5xx) when the presented token expired.
pub const EXPIRED_TOKEN_CODE: &str = "IGW00121";

/// Exponential backoff for business calls answered with a 5xx status.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
	/// Total attempts, including the first one.
	pub max_attempts: u32,
	/// Delay before the first retry.
	pub initial_backoff: StdDuration,
	/// Upper bound for any single delay, jitter included.
	pub max_backoff: StdDuration,
	/// Jitter added on top of each delay, as a fraction of the current backoff.
	pub jitter_ratio: f64,
}
impl RetryPolicy {
	/// Overrides the attempt budget.
	pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
		self.max_attempts = max_attempts.max(1);

		self
	}

	/// Overrides the initial and maximum backoff.
	pub fn with_backoff(mut self, initial: StdDuration, max: StdDuration) -> Self {
		self.initial_backoff = initial;
		self.max_backoff = max.max(initial);

		self
	}

	/// Overrides the jitter ratio; negative values disable jitter.
	pub fn with_jitter_ratio(mut self, ratio: f64) -> Self {
		self.jitter_ratio = if ratio.is_finite() { ratio.max(0.0) } else { 0.0 };

		self
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			initial_backoff: StdDuration::from_secs(1),
			max_backoff: StdDuration::from_secs(10),
			jitter_ratio: 0.1,
		}
	}
}

/// Fixed-wait retry for the token endpoint, sized to clear its rate-limit window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenRetryPolicy {
	/// Total attempts, including the first one.
	pub max_attempts: u32,
	/// Wait between attempts.
	pub wait: StdDuration,
}
impl TokenRetryPolicy {
	/// Overrides the attempt budget.
	pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
		self.max_attempts = max_attempts.max(1);

		self
	}

	/// Overrides the wait between attempts.
	pub fn with_wait(mut self, wait: StdDuration) -> Self {
		self.wait = wait;

		self
	}
}
impl Default for TokenRetryPolicy {
	fn default() -> Self {
		Self { max_attempts: 3, wait: StdDuration::from_secs(70) }
	}
}

/// Continuation limits for paginated inquiries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationPolicy {
	/// Maximum number of follow-up calls per logical call.
	pub max_continuations: u32,
	/// Wait between consecutive pages; the service rate-limits continuation calls.
	pub page_delay: StdDuration,
}
impl PaginationPolicy {
	/// Overrides the continuation cap.
	pub fn with_max_continuations(mut self, max_continuations: u32) -> Self {
		self.max_continuations = max_continuations;

		self
	}

	/// Overrides the inter-page delay.
	pub fn with_page_delay(mut self, page_delay: StdDuration) -> Self {
		self.page_delay = page_delay;

		self
	}
}
impl Default for PaginationPolicy {
	fn default() -> Self {
		Self { max_continuations: 20, page_delay: StdDuration::from_secs(1) }
	}
}

/// Decides whether a 5xx answer forces a token refresh before the retry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReauthPolicy {
	/// Refresh on every 5xx; the service sometimes masks auth problems as server errors.
	#[default]
	EveryServerError,
	/// Refresh only when the 5xx body carries [`EXPIRED_TOKEN_CODE`].
	ExpiredTokenOnly,
}
impl ReauthPolicy {
	/// Returns `true` if a server failure with `body` should force a token refresh.
	pub fn should_reauth(self, body: &str) -> bool {
		match self {
			Self::EveryServerError => true,
			Self::ExpiredTokenOnly => serde_json::from_str::<JsonValue>(body)
				.is_ok_and(|value| response::response_code(&value) == Some(EXPIRED_TOKEN_CODE)),
		}
	}
}
