//! Write planning: derives the records a grant is persisted as before any I/O happens.

// self
use crate::{
	_prelude::*,
	auth::{GrantKind, IssuedToken, TokenGrant},
	store::{
		BasicRecord, IndexRecord, KeyEncoding, KeyError, RecordKey, StoreError, TokenKind, codec,
	},
};

/// Expiry instants for an access/refresh grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpiryPlan {
	/// Basic record expiry; the latest instant any index still needs it.
	pub basic: OffsetDateTime,
	/// Access index expiry, never later than the refresh expiry.
	pub access: OffsetDateTime,
	/// Refresh index expiry.
	pub refresh: Option<OffsetDateTime>,
}
impl ExpiryPlan {
	/// Computes expiries for an access token and optional refresh token.
	pub fn new(access: &IssuedToken, refresh: Option<&IssuedToken>) -> Self {
		let access_at = access.expires_at();

		match refresh.map(IssuedToken::expires_at) {
			Some(refresh_at) => Self {
				basic: refresh_at,
				access: access_at.min(refresh_at),
				refresh: Some(refresh_at),
			},
			None => Self { basic: access_at, access: access_at, refresh: None },
		}
	}
}

/// Records produced for one grant.
#[derive(Clone, Debug, PartialEq)]
pub struct GrantWrite {
	/// The canonical record.
	pub basic: BasicRecord,
	/// Access index entry; absent for code grants.
	pub access: Option<IndexRecord>,
	/// Refresh index entry; present only when the grant carries a refresh token.
	pub refresh: Option<IndexRecord>,
}
impl GrantWrite {
	/// Encodes `grant` and derives every record it is stored as.
	///
	/// Key encoding happens before payload encoding so malformed tokens are reported as input
	/// errors without touching the codec or the database.
	pub fn plan(grant: &TokenGrant, encoding: KeyEncoding) -> Result<Self, StoreError> {
		match (grant.kind(), &grant.code, &grant.access) {
			(GrantKind::AuthorizationCode, Some(code), _) => {
				let id = encoding.encode(TokenKind::Code, code.value.expose())?;
				let payload = codec::encode(grant)?;

				Ok(Self {
					basic: BasicRecord::new(id, payload, code.expires_at()),
					access: None,
					refresh: None,
				})
			},
			(_, _, Some(access)) => {
				let access_key = encoding.encode(TokenKind::Access, access.value.expose())?;
				let refresh_key = grant
					.refresh
					.as_ref()
					.map(|r| encoding.encode(TokenKind::Refresh, r.value.expose()))
					.transpose()?;
				let expiry = ExpiryPlan::new(access, grant.refresh.as_ref());
				let payload = codec::encode(grant)?;
				let basic = BasicRecord::new(RecordKey::generate(), payload, expiry.basic);
				let access = IndexRecord::new(access_key, basic.id.clone(), expiry.access);
				let refresh = refresh_key.zip(expiry.refresh).map(|(key, expires_at)| {
					IndexRecord::new(key, basic.id.clone(), expires_at)
				});

				Ok(Self { basic, access: Some(access), refresh })
			},
			_ => Err(KeyError::Empty { kind: TokenKind::Access }.into()),
		}
	}

	#[cfg(test)]
	fn record_count(&self) -> usize {
		1 + usize::from(self.access.is_some()) + usize::from(self.refresh.is_some())
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::{auth::ClientId, store::to_bson_datetime};

	const T0: OffsetDateTime = macros::datetime!(2025-06-01 12:00:00 UTC);

	fn client() -> ClientId {
		ClientId::new("1").expect("Client fixture should be valid.")
	}

	#[test]
	fn code_grants_produce_a_single_record() {
		let grant = TokenGrant::builder(client())
			.code("abc123", T0, Duration::seconds(5))
			.build()
			.expect("Code grant should build.");
		let write = GrantWrite::plan(&grant, KeyEncoding::Text).expect("Code grant should plan.");

		assert_eq!(write.record_count(), 1);
		assert_eq!(write.basic.id, RecordKey::Text("abc123".into()));
		assert_eq!(write.basic.expires_at, to_bson_datetime(T0 + Duration::seconds(5)));
		assert_eq!(
			codec::decode(&write.basic.payload.bytes).expect("Payload should decode."),
			grant
		);
	}

	#[test]
	fn refresh_grants_reference_one_generated_basic_id() {
		let grant = TokenGrant::builder(client())
			.access_token("1_2_1", T0, Duration::seconds(5))
			.refresh_token("1_2_2", T0, Duration::seconds(15))
			.build()
			.expect("Refresh grant should build.");
		let write = GrantWrite::plan(&grant, KeyEncoding::Text).expect("Refresh grant should plan.");
		let access = write.access.as_ref().expect("Access index should be planned.");
		let refresh = write.refresh.as_ref().expect("Refresh index should be planned.");

		assert_eq!(write.record_count(), 3);
		assert!(matches!(write.basic.id, RecordKey::ObjectId(_)));
		assert_eq!(access.id, RecordKey::Text("1_2_1".into()));
		assert_eq!(access.basic_id, write.basic.id);
		assert_eq!(refresh.basic_id, write.basic.id);
		assert_eq!(access.expires_at, to_bson_datetime(T0 + Duration::seconds(5)));
		assert_eq!(refresh.expires_at, to_bson_datetime(T0 + Duration::seconds(15)));
		assert_eq!(write.basic.expires_at, refresh.expires_at);
	}

	#[test]
	fn access_index_never_outlives_refresh() {
		let access = IssuedToken::new("a", T0, Duration::hours(2));
		let refresh = IssuedToken::new("r", T0, Duration::hours(1));
		let plan = ExpiryPlan::new(&access, Some(&refresh));

		assert_eq!(plan.access, T0 + Duration::hours(1));
		assert_eq!(plan.basic, T0 + Duration::hours(1));
	}

	#[test]
	fn expiry_comparison_uses_full_instants() {
		// Access expires at :50 of one minute, refresh at :10 of a later minute.
		let access = IssuedToken::new("a", T0, Duration::seconds(50));
		let refresh = IssuedToken::new("r", T0, Duration::seconds(70));
		let plan = ExpiryPlan::new(&access, Some(&refresh));

		assert_eq!(plan.access, T0 + Duration::seconds(50));
		assert_eq!(plan.basic, T0 + Duration::seconds(70));
	}

	#[test]
	fn access_only_grants_expire_together() {
		let access = IssuedToken::new("a", T0, Duration::minutes(10));
		let plan = ExpiryPlan::new(&access, None);

		assert_eq!(plan.basic, plan.access);
		assert_eq!(plan.refresh, None);
	}

	#[test]
	fn malformed_keys_fail_before_encoding() {
		let grant = TokenGrant::builder(client())
			.access_token("1_1_1", T0, Duration::seconds(5))
			.build()
			.expect("Access grant should build.");
		let err = GrantWrite::plan(&grant, KeyEncoding::ObjectIdHex)
			.expect_err("Non-hex access token must be rejected.");

		assert!(err.is_input());
	}
}
