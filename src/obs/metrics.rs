// self
use crate::obs::{CallKind, CallOutcome};

/// Records a call outcome as `trading_gateway_call_total{call, outcome}`.
pub fn record_call_outcome(kind: CallKind, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"trading_gateway_call_total",
		"call" => kind.as_str(),
		"outcome" => outcome.as_str()
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

/// Records one repeated round trip as `trading_gateway_retry_total{call, reauth}`.
///
/// Token issuance retries never refresh a token, so they are always `reauth="false"`.
pub fn record_retry(kind: CallKind, reauth: bool) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"trading_gateway_retry_total",
		"call" => kind.as_str(),
		"reauth" => if reauth { "true" } else { "false" }
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, reauth);
}

/// Records one follow-up page request as `trading_gateway_continuation_total`.
pub fn record_continuation() {
	#[cfg(feature = "metrics")]
	metrics::counter!("trading_gateway_continuation_total").increment(1);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn counters_are_noops_without_recorder() {
		record_call_outcome(CallKind::Execute, CallOutcome::Failure);
		record_retry(CallKind::IssueToken, false);
		record_retry(CallKind::Execute, true);
		record_continuation();
	}
}
