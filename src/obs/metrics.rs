// self
use crate::obs::{OpOutcome, StoreOp};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_op_outcome(op: StoreOp, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_store_op_total",
			"op" => op.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (op, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::TokenKind;

	#[test]
	fn record_op_outcome_noop_without_recorder() {
		record_op_outcome(StoreOp::Remove(TokenKind::Access), OpOutcome::Success);
	}
}
