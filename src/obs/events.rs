// std
use std::time::Duration as StdDuration;
// self
use crate::_prelude::*;

/// Logs a freshly issued token (never its value).
pub fn token_issued(token_type: &str, expires_at: OffsetDateTime) {
	#[cfg(feature = "tracing")]
	tracing::info!(token_type, %expires_at, "New access token obtained.");
	#[cfg(not(feature = "tracing"))]
	let _ = (token_type, expires_at);
}

/// Logs a failed token exchange that will be retried after `wait`.
pub fn token_retry(attempt: u32, max_attempts: u32, status: Option<u16>, wait: StdDuration) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		attempt,
		max_attempts,
		status,
		wait_ms = wait.as_millis() as u64,
		"Token request failed; retrying."
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (attempt, max_attempts, status, wait);
}

/// Logs a token exchange that exhausted its attempts or hit a credential problem.
pub fn token_failed(status: Option<u16>, message: &str) {
	#[cfg(feature = "tracing")]
	tracing::error!(status, reason = message, "Failed to obtain access token.");
	#[cfg(not(feature = "tracing"))]
	let _ = (status, message);
}

/// Logs the outcome of a revoke call.
pub fn token_revoked(code: Option<i64>, cleared: bool) {
	#[cfg(feature = "tracing")]
	if cleared {
		tracing::info!(code, "Token successfully revoked.");
	} else {
		tracing::warn!(code, "Revoke endpoint did not confirm revocation; keeping token.");
	}
	#[cfg(not(feature = "tracing"))]
	let _ = (code, cleared);
}

/// Logs a revoke call skipped because no token is held.
pub fn revoke_skipped() {
	#[cfg(feature = "tracing")]
	tracing::warn!("No token to revoke.");
}

/// Logs a server failure that will be retried after `delay`.
pub fn server_retry(
	attempt: u32,
	max_attempts: u32,
	status: Option<u16>,
	reauth: bool,
	delay: StdDuration,
) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		attempt,
		max_attempts,
		status,
		reauth,
		delay_ms = delay.as_millis() as u64,
		"Server error; retrying."
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (attempt, max_attempts, status, reauth, delay);
}

/// Logs a call that failed without further retries.
pub fn request_failed(status: Option<u16>, body: Option<&str>) {
	#[cfg(feature = "tracing")]
	tracing::error!(status, body, "API request failed.");
	#[cfg(not(feature = "tracing"))]
	let _ = (status, body);
}

/// Logs a continuation round trip.
pub fn continuation(count: u32, max_continuations: u32) {
	#[cfg(feature = "tracing")]
	tracing::debug!(count, max_continuations, "Following continuation key.");
	#[cfg(not(feature = "tracing"))]
	let _ = (count, max_continuations);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn events_are_safe_without_subscriber() {
		token_issued("Bearer", OffsetDateTime::now_utc());
		token_retry(1, 3, Some(503), StdDuration::from_secs(70));
		token_failed(Some(401), "invalid_client");
		token_revoked(Some(200), true);
		token_revoked(None, false);
		revoke_skipped();
		server_retry(1, 3, Some(500), true, StdDuration::from_secs(1));
		request_failed(Some(400), Some("{}"));
		continuation(1, 20);
	}
}
