//! Crate-level error types shared across the grant model, configuration, and stores.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public constructors and helpers.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Grant value failed validation.
	#[error(transparent)]
	Grant(#[from] crate::auth::GrantBuilderError),
}

/// Configuration and validation failures raised while building a store.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Connection URI could not be parsed by the driver.
	#[error("Connection URI is invalid.")]
	InvalidConnectionUri {
		/// Underlying driver parsing failure.
		#[source]
		source: mongodb::error::Error,
	},
	/// Database name is empty or contains characters MongoDB rejects.
	#[error("Database name `{name}` is invalid.")]
	InvalidDatabaseName {
		/// Offending database name.
		name: String,
	},
	/// Collection name is empty or contains characters MongoDB rejects.
	#[error("Collection name `{name}` for the {role} collection is invalid.")]
	InvalidCollectionName {
		/// Collection role (basic, access, refresh, transaction).
		role: &'static str,
		/// Offending collection name.
		name: String,
	},
	/// Two physical collections were configured with the same name.
	#[error("The {first} and {second} collections share the name `{name}`.")]
	CollectionNameConflict {
		/// First collection role.
		first: &'static str,
		/// Second collection role.
		second: &'static str,
		/// Shared collection name.
		name: String,
	},
	/// Expiry-index delay exceeds what MongoDB accepts.
	#[error("The expire_after_secs value exceeds the supported range.")]
	ExpireAfterOutOfRange,
}
