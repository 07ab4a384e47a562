//! Store configuration: collection names, key encoding, expiry delay, and connection target.

// self
use crate::{_prelude::*, error::ConfigError, store::KeyEncoding};

/// Physical collection names used by the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionNames {
	/// Reserved for transaction bookkeeping; not written by the store.
	pub transaction: String,
	/// Basic records holding encoded grants.
	pub basic: String,
	/// Access-token index records.
	pub access: String,
	/// Refresh-token index records.
	pub refresh: String,
}
impl CollectionNames {
	fn roles(&self) -> [(&'static str, &str); 4] {
		[
			("transaction", &self.transaction),
			("basic", &self.basic),
			("access", &self.access),
			("refresh", &self.refresh),
		]
	}
}
impl Default for CollectionNames {
	fn default() -> Self {
		Self {
			transaction: "oauth2_txn".into(),
			basic: "oauth2_basic".into(),
			access: "oauth2_access".into(),
			refresh: "oauth2_refresh".into(),
		}
	}
}

/// Behavioral settings shared by every store backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
	/// Collection names.
	pub collections: CollectionNames,
	/// Encoding applied to codes and token strings before they become `_id` values.
	pub key_encoding: KeyEncoding,
	/// Delay, in seconds past `expiresAt`, before the TTL monitor may reap a record.
	pub expire_after_secs: u64,
}
impl StoreConfig {
	const DEFAULT_EXPIRE_AFTER_SECS: u64 = 1;
	// TTL indexes take a 32-bit signed seconds value.
	const MAX_EXPIRE_AFTER_SECS: u64 = i32::MAX as u64;

	/// Overrides the collection names.
	pub fn with_collections(mut self, collections: CollectionNames) -> Self {
		self.collections = collections;

		self
	}

	/// Overrides the key encoding.
	pub fn with_key_encoding(mut self, encoding: KeyEncoding) -> Self {
		self.key_encoding = encoding;

		self
	}

	/// Overrides the expiry-index delay.
	pub fn with_expire_after_secs(mut self, secs: u64) -> Self {
		self.expire_after_secs = secs;

		self
	}

	/// Expiry-index delay as a [`std::time::Duration`].
	pub fn expire_after(&self) -> std::time::Duration {
		std::time::Duration::from_secs(self.expire_after_secs)
	}

	/// Validates collection names and the expiry delay.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let roles = self.collections.roles();

		for (role, name) in roles {
			if !is_valid_collection_name(name) {
				return Err(ConfigError::InvalidCollectionName { role, name: name.to_owned() });
			}
		}
		for (i, &(first, name)) in roles.iter().enumerate() {
			if let Some(&(second, _)) = roles[i + 1..].iter().find(|(_, other)| *other == name) {
				return Err(ConfigError::CollectionNameConflict {
					first,
					second,
					name: name.to_owned(),
				});
			}
		}
		if self.expire_after_secs > Self::MAX_EXPIRE_AFTER_SECS {
			return Err(ConfigError::ExpireAfterOutOfRange);
		}

		Ok(())
	}
}
impl Default for StoreConfig {
	fn default() -> Self {
		Self {
			collections: CollectionNames::default(),
			key_encoding: KeyEncoding::default(),
			expire_after_secs: Self::DEFAULT_EXPIRE_AFTER_SECS,
		}
	}
}

/// Connection target for [`MongoStore::connect`](crate::store::MongoStore::connect).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
	/// MongoDB connection string.
	pub uri: String,
	/// Database holding the grant collections.
	pub database: String,
	/// Server connect timeout in seconds.
	#[serde(default = "ConnectionConfig::default_connect_timeout_secs")]
	pub connect_timeout_secs: u64,
}
impl ConnectionConfig {
	/// Creates a connection target with the default connect timeout.
	pub fn new(uri: impl Into<String>, database: impl Into<String>) -> Self {
		Self {
			uri: uri.into(),
			database: database.into(),
			connect_timeout_secs: Self::default_connect_timeout_secs(),
		}
	}

	/// Overrides the connect timeout.
	pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
		self.connect_timeout_secs = secs;

		self
	}

	/// Connect timeout as a [`std::time::Duration`].
	pub fn connect_timeout(&self) -> std::time::Duration {
		std::time::Duration::from_secs(self.connect_timeout_secs)
	}

	/// Validates the database name.
	pub fn validate(&self) -> Result<(), ConfigError> {
		validate_database_name(&self.database)
	}

	fn default_connect_timeout_secs() -> u64 {
		10
	}
}

fn is_valid_collection_name(name: &str) -> bool {
	!name.is_empty() && !name.starts_with("system.") && !name.contains(['$', '\0'])
}

/// Rejects database names MongoDB would refuse.
pub fn validate_database_name(name: &str) -> Result<(), ConfigError> {
	let illegal = ['/', '\\', '.', ' ', '"', '$', '*', '<', '>', ':', '|', '?', '\0'];

	if name.is_empty() || name.len() >= 64 || name.contains(illegal) {
		return Err(ConfigError::InvalidDatabaseName { name: name.to_owned() });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_use_oauth2_prefixed_names() {
		let config = StoreConfig::default();

		assert_eq!(config.collections.transaction, "oauth2_txn");
		assert_eq!(config.collections.basic, "oauth2_basic");
		assert_eq!(config.collections.access, "oauth2_access");
		assert_eq!(config.collections.refresh, "oauth2_refresh");
		assert_eq!(config.key_encoding, KeyEncoding::Text);
		assert_eq!(config.expire_after(), std::time::Duration::from_secs(1));
		config.validate().expect("Default configuration should validate.");
	}

	#[test]
	fn validation_rejects_shared_and_illegal_names() {
		let shared = StoreConfig::default().with_collections(CollectionNames {
			access: "oauth2_basic".into(),
			..Default::default()
		});

		assert!(matches!(
			shared.validate(),
			Err(ConfigError::CollectionNameConflict { first: "basic", second: "access", .. })
		));

		let illegal = StoreConfig::default()
			.with_collections(CollectionNames { refresh: "bad$name".into(), ..Default::default() });

		assert!(matches!(
			illegal.validate(),
			Err(ConfigError::InvalidCollectionName { role: "refresh", .. })
		));
		assert!(matches!(
			StoreConfig::default().with_expire_after_secs(u64::MAX).validate(),
			Err(ConfigError::ExpireAfterOutOfRange)
		));
	}

	#[test]
	fn deserializes_partial_documents() {
		let config: StoreConfig = serde_json::from_str(
			r#"{"collections":{"basic":"grants"},"key_encoding":"object_id_hex"}"#,
		)
		.expect("Partial configuration should deserialize.");

		assert_eq!(config.collections.basic, "grants");
		assert_eq!(config.collections.access, "oauth2_access");
		assert_eq!(config.key_encoding, KeyEncoding::ObjectIdHex);
		assert_eq!(config.expire_after_secs, 1);

		let connection: ConnectionConfig =
			serde_json::from_str(r#"{"uri":"mongodb://localhost:27017","database":"oauth"}"#)
				.expect("Connection config should deserialize.");

		assert_eq!(connection.connect_timeout(), std::time::Duration::from_secs(10));
		connection.validate().expect("Database name should validate.");
		assert!(ConnectionConfig::new("mongodb://localhost", "bad.name").validate().is_err());
	}
}
