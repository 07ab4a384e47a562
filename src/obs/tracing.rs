// self
#[cfg(feature = "tracing")]
use crate::auth::token::secret;
use crate::{_prelude::*, obs::StoreOp, store::StoreError};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span wrapping one store operation.
#[derive(Clone, Debug)]
pub struct StoreSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl StoreSpan {
	/// Creates a span tagged with the operation, backend, and a fingerprint of `key`.
	///
	/// The raw key never reaches the span; only its
	/// [`fingerprint`](crate::auth::token::secret::fingerprint) does.
	pub fn new(op: StoreOp, backend: &'static str, key: Option<&str>) -> Self {
		#[cfg(feature = "tracing")]
		{
			let key = key.map(secret::fingerprint).unwrap_or_default();
			let span =
				tracing::info_span!("oauth2_store.op", op = op.as_str(), backend, key = key.as_str());

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (op, backend, key);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
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

	/// Emits a `warn` event for a failed operation inside this span.
	pub fn record_failure(&self, error: &StoreError) {
		#[cfg(feature = "tracing")]
		{
			self.span.in_scope(|| tracing::warn!(error = %error, "store operation failed"));
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = error;
		}
	}
}

/// Emits a `debug` event in the current span for a transaction abort that failed.
///
/// The caller still returns the error that triggered the abort.
pub fn record_abort_failure(error: &impl Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(error = %error, "transaction abort failed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = error;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::TokenKind;

	#[test]
	fn span_builds_with_and_without_keys() {
		let _with = StoreSpan::new(StoreOp::Get(TokenKind::Code), "memory", Some("abc123"));
		let _without = StoreSpan::new(StoreOp::EnsureSchema, "mongo", None);
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = StoreSpan::new(StoreOp::Create, "memory", None);
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}

	#[tokio::test]
	async fn abort_failures_are_recorded_inside_the_op_span() {
		let span = StoreSpan::new(StoreOp::Create, "mongo", Some("1_2_1"));
		let value = span
			.instrument(async {
				record_abort_failure(&"connection reset during abortTransaction");

				7
			})
			.await;

		assert_eq!(value, 7);
	}
}
