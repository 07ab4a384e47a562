//! JSON codec turning grants into the opaque payload stored in basic records.

// self
use crate::{_prelude::*, auth::TokenGrant};

/// Serialization failures raised while encoding or decoding a stored grant.
#[derive(Debug, ThisError)]
pub enum CodecError {
	/// Grant could not be serialized.
	#[error("Failed to encode grant payload.")]
	Encode {
		/// Underlying serializer failure.
		#[source]
		source: serde_json::Error,
	},
	/// Stored payload could not be deserialized into a grant.
	#[error("Failed to decode grant payload at `{path}`.")]
	Decode {
		/// Path of the field that failed to decode.
		path: String,
		/// Underlying deserializer failure.
		#[source]
		source: serde_json::Error,
	},
}

/// Encodes a grant into payload bytes.
pub fn encode(grant: &TokenGrant) -> Result<Vec<u8>, CodecError> {
	serde_json::to_vec(grant).map_err(|source| CodecError::Encode { source })
}

/// Decodes payload bytes back into a grant.
pub fn decode(payload: &[u8]) -> Result<TokenGrant, CodecError> {
	let mut de = serde_json::Deserializer::from_slice(payload);

	serde_path_to_error::deserialize(&mut de).map_err(|e| CodecError::Decode {
		path: e.path().to_string(),
		source: e.into_inner(),
	})
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::auth::{ClientId, ScopeSet, UserId};

	#[test]
	fn payload_preserves_every_field() {
		let issued = macros::datetime!(2025-03-01 08:30:15.25 UTC);
		let grant = TokenGrant::builder(ClientId::new("1").expect("Client should be valid."))
			.user_id(UserId::new("1_2").expect("User should be valid."))
			.redirect_uri(Url::parse("http://localhost/").expect("Redirect should parse."))
			.scope(ScopeSet::from_str("all").expect("Scope should parse."))
			.access_token("1_2_1", issued, Duration::seconds(5))
			.refresh_token("1_2_2", issued, Duration::seconds(15))
			.build()
			.expect("Grant fixture should build.");
		let payload = encode(&grant).expect("Grant should encode.");

		assert_eq!(decode(&payload).expect("Payload should decode."), grant);
	}

	#[test]
	fn free_form_identifiers_survive_the_payload() {
		let issued = macros::datetime!(2025-03-01 08:30 UTC);
		let client = ClientId::new("c".repeat(300)).expect("Client should be valid.");
		let grant = TokenGrant::builder(client)
			.user_id(UserId::new("john smith").expect("User should be valid."))
			.code("abc123", issued, Duration::seconds(5))
			.build()
			.expect("Grant fixture should build.");
		let payload = encode(&grant).expect("Grant should encode.");
		let decoded = decode(&payload).expect("Payload should decode.");

		assert_eq!(decoded.user_id.as_deref(), Some("john smith"));
		assert_eq!(decoded, grant);
	}

	#[test]
	fn decode_reports_failing_path() {
		let err = decode(br#"{"client_id":""}"#).expect_err("Empty client must fail.");

		match err {
			CodecError::Decode { path, .. } => assert_eq!(path, "client_id"),
			other => panic!("Unexpected codec error: {other:?}."),
		}
	}

	#[test]
	fn decode_rejects_garbage() {
		assert!(matches!(decode(b"\x00\x01"), Err(CodecError::Decode { .. })));
	}
}
