//! Persisted record shapes and primary-key encoding.

// crates.io
use mongodb::bson::{Binary, Bson, DateTime, oid::ObjectId, spec::BinarySubtype};
use serde::{Deserializer, Serializer, de::Error as DeError};
// self
use crate::{
	_prelude::*,
	store::{KeyError, TokenKind},
};

/// How token strings are turned into `_id` values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyEncoding {
	/// Token strings are stored verbatim as string ids.
	#[default]
	Text,
	/// Token strings must be 24-character hex ObjectIds and are stored as ObjectIds.
	ObjectIdHex,
}
impl KeyEncoding {
	/// Converts a caller-supplied token string into a record key.
	pub fn encode(self, kind: TokenKind, raw: &str) -> Result<RecordKey, KeyError> {
		if raw.is_empty() {
			return Err(KeyError::Empty { kind });
		}

		match self {
			KeyEncoding::Text => Ok(RecordKey::Text(raw.to_owned())),
			KeyEncoding::ObjectIdHex => ObjectId::parse_str(raw)
				.map(RecordKey::ObjectId)
				.map_err(|source| KeyError::InvalidObjectId { kind, source }),
		}
	}
}

/// Primary key of a stored record.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RecordKey {
	/// String key (token value under [`KeyEncoding::Text`]).
	Text(String),
	/// ObjectId key (generated basic ids, or tokens under [`KeyEncoding::ObjectIdHex`]).
	ObjectId(ObjectId),
}
impl RecordKey {
	/// Generates a fresh, store-owned key for an access/refresh basic record.
	pub fn generate() -> Self {
		Self::ObjectId(ObjectId::new())
	}
}
impl From<&RecordKey> for Bson {
	fn from(key: &RecordKey) -> Self {
		match key {
			RecordKey::Text(s) => Bson::String(s.clone()),
			RecordKey::ObjectId(oid) => Bson::ObjectId(*oid),
		}
	}
}
impl Display for RecordKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			RecordKey::Text(s) => f.write_str(s),
			RecordKey::ObjectId(oid) => write!(f, "{}", oid.to_hex()),
		}
	}
}
impl Serialize for RecordKey {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match self {
			RecordKey::Text(s) => serializer.serialize_str(s),
			RecordKey::ObjectId(oid) => oid.serialize(serializer),
		}
	}
}
impl<'de> Deserialize<'de> for RecordKey {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		match Bson::deserialize(deserializer)? {
			Bson::String(s) => Ok(RecordKey::Text(s)),
			Bson::ObjectId(oid) => Ok(RecordKey::ObjectId(oid)),
			other => Err(DeError::custom(format!(
				"record key must be a string or ObjectId, found {:?}",
				other.element_type()
			))),
		}
	}
}

/// Canonical stored grant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicRecord {
	/// Code value for code grants, generated id otherwise.
	#[serde(rename = "_id")]
	pub id: RecordKey,
	/// Encoded grant.
	pub payload: Binary,
	/// Instant after which the record is dead and eligible for reaping.
	pub expires_at: DateTime,
}
impl BasicRecord {
	/// Builds a record from raw payload bytes.
	pub fn new(id: RecordKey, payload: Vec<u8>, expires_at: OffsetDateTime) -> Self {
		Self {
			id,
			payload: Binary { subtype: BinarySubtype::Generic, bytes: payload },
			expires_at: to_bson_datetime(expires_at),
		}
	}

	/// Returns `true` while the record is still readable at `now`.
	pub fn is_live_at(&self, now: DateTime) -> bool {
		self.expires_at > now
	}
}

/// Secondary record mapping a token string to its basic record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRecord {
	/// Encoded token string.
	#[serde(rename = "_id")]
	pub id: RecordKey,
	/// Key of the owning basic record.
	pub basic_id: RecordKey,
	/// Instant after which this index entry is dead.
	pub expires_at: DateTime,
}
impl IndexRecord {
	/// Builds an index record pointing at `basic_id`.
	pub fn new(id: RecordKey, basic_id: RecordKey, expires_at: OffsetDateTime) -> Self {
		Self { id, basic_id, expires_at: to_bson_datetime(expires_at) }
	}

	/// Returns `true` while the record is still readable at `now`.
	pub fn is_live_at(&self, now: DateTime) -> bool {
		self.expires_at > now
	}
}

/// Converts an [`OffsetDateTime`] to BSON's millisecond-precision datetime.
pub fn to_bson_datetime(instant: OffsetDateTime) -> DateTime {
	let millis = instant.unix_timestamp_nanos() / 1_000_000;

	DateTime::from_millis(millis.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
}

#[cfg(test)]
mod tests {
	// crates.io
	use mongodb::bson::{self, doc};
	use time::macros;
	// self
	use super::*;

	#[test]
	fn text_encoding_keeps_raw_strings() {
		let key = KeyEncoding::Text
			.encode(TokenKind::Access, "1_1_1")
			.expect("Plain keys should always encode.");

		assert_eq!(key, RecordKey::Text("1_1_1".into()));
		assert!(matches!(
			KeyEncoding::Text.encode(TokenKind::Code, ""),
			Err(KeyError::Empty { kind: TokenKind::Code })
		));
	}

	#[test]
	fn hex_encoding_requires_object_ids() {
		let oid = ObjectId::new();
		let key = KeyEncoding::ObjectIdHex
			.encode(TokenKind::Code, &oid.to_hex())
			.expect("Hex ObjectId should encode.");

		assert_eq!(key, RecordKey::ObjectId(oid));
		assert!(matches!(
			KeyEncoding::ObjectIdHex.encode(TokenKind::Access, "1_1_1"),
			Err(KeyError::InvalidObjectId { kind: TokenKind::Access, .. })
		));
	}

	#[test]
	fn records_serialize_with_mongo_field_names() {
		let basic_id = RecordKey::generate();
		let expires = macros::datetime!(2025-01-01 00:00:05 UTC);
		let index = IndexRecord::new(RecordKey::Text("tok".into()), basic_id.clone(), expires);
		let document = bson::to_document(&index).expect("Index record should serialize.");

		assert_eq!(
			document,
			doc! {
				"_id": "tok",
				"basicId": Bson::from(&basic_id),
				"expiresAt": DateTime::from_millis(1_735_689_605_000),
			}
		);

		let back: IndexRecord = bson::from_document(document).expect("Index record should decode.");

		assert_eq!(back, index);
	}

	#[test]
	fn liveness_is_exclusive_of_expiry() {
		let expires = macros::datetime!(2025-01-01 00:00 UTC);
		let record = BasicRecord::new(RecordKey::Text("abc123".into()), vec![1], expires);

		assert!(record.is_live_at(to_bson_datetime(expires - Duration::milliseconds(1))));
		assert!(!record.is_live_at(to_bson_datetime(expires)));
	}
}
