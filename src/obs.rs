//! Optional observability helpers for gateway calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (default) to emit structured spans named `trading_gateway.call` with the
//!   `call` (kind), `stage` (call site), `target` (request path), and `pages` fields, plus
//!   events for token lifecycle changes, retries, and continuations.
//! - Enable `metrics` to increment `trading_gateway_call_total{call, outcome}`,
//!   `trading_gateway_retry_total{call, reauth}`, and `trading_gateway_continuation_total`.

mod events;
mod metrics;
mod tracing;

pub use events::*;
pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Call kinds observed by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
	/// Client-credentials exchange.
	IssueToken,
	/// Token revocation.
	RevokeToken,
	/// Business call routed through the executor.
	Execute,
}
impl CallKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallKind::IssueToken => "issue_token",
			CallKind::RevokeToken => "revoke_token",
			CallKind::Execute => "execute",
		}
	}
}
impl Display for CallKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to a gateway operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
