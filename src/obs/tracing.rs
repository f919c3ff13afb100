// self
use crate::{_prelude::*, obs::CallKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// Span wrapped around one issuer or executor operation.
///
/// Besides `call` and `stage` the span declares two late-bound fields: `target` (the
/// request path of business calls) and `pages` (payloads returned by a finished call).
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a span tagged with the call kind and stage.
	pub fn new(kind: CallKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"trading_gateway.call",
				call = kind.as_str(),
				stage,
				target = tracing::field::Empty,
				pages = tracing::field::Empty,
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Records the request path the call is aimed at.
	pub fn with_target(self, target: &str) -> Self {
		#[cfg(feature = "tracing")]
		self.span.record("target", target);
		#[cfg(not(feature = "tracing"))]
		let _ = target;

		self
	}

	/// Records how many payloads the finished call produced.
	pub fn record_pages(&self, pages: usize) {
		#[cfg(feature = "tracing")]
		self.span.record("pages", pages as u64);
		#[cfg(not(feature = "tracing"))]
		let _ = pages;
	}

	/// Instruments a future without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}
