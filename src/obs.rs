//! Optional observability helpers for store operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (default) to wrap every operation in a span named `oauth2_store.op` with
//!   the `op`, `backend`, and `key` (token fingerprint) fields, and to emit a `warn` event when
//!   an operation fails.
//! - Enable `metrics` to increment the `oauth2_store_op_total` counter for every
//!   attempt/hit/miss/success/failure, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{
	_prelude::*,
	store::{StoreError, TokenKind},
};

/// Store operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreOp {
	/// Collection + expiry index setup.
	EnsureSchema,
	/// Grant creation.
	Create,
	/// Lookup by code, access token, or refresh token.
	Get(TokenKind),
	/// Removal by code, access token, or refresh token.
	Remove(TokenKind),
}
impl StoreOp {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StoreOp::EnsureSchema => "ensure_schema",
			StoreOp::Create => "create",
			StoreOp::Get(TokenKind::Code) => "get_by_code",
			StoreOp::Get(TokenKind::Access) => "get_by_access",
			StoreOp::Get(TokenKind::Refresh) => "get_by_refresh",
			StoreOp::Remove(TokenKind::Code) => "remove_by_code",
			StoreOp::Remove(TokenKind::Access) => "remove_by_access",
			StoreOp::Remove(TokenKind::Refresh) => "remove_by_refresh",
		}
	}
}
impl Display for StoreOp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to a store operation.
	Attempt,
	/// Lookup found a live grant.
	Hit,
	/// Lookup found nothing live.
	Miss,
	/// Write or removal completed.
	Success,
	/// Error propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Hit => "hit",
			OpOutcome::Miss => "miss",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Maps an operation's successful output to the outcome it is recorded as.
pub trait Observed {
	/// Outcome for this value.
	fn outcome(&self) -> OpOutcome;
}
impl Observed for () {
	fn outcome(&self) -> OpOutcome {
		OpOutcome::Success
	}
}
impl<T> Observed for Option<T> {
	fn outcome(&self) -> OpOutcome {
		if self.is_some() { OpOutcome::Hit } else { OpOutcome::Miss }
	}
}

/// Runs `fut` inside an operation span and records its attempt and outcome.
pub async fn observe<T, F>(span: StoreSpan, op: StoreOp, fut: F) -> Result<T, StoreError>
where
	T: Observed,
	F: Future<Output = Result<T, StoreError>>,
{
	record_op_outcome(op, OpOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(value) => record_op_outcome(op, value.outcome()),
		Err(e) => {
			span.record_failure(e);
			record_op_outcome(op, OpOutcome::Failure);
		},
	}

	result
}
