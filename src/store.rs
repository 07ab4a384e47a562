//! Storage contracts and built-in grant store implementations.
//!
//! A grant is split across three collections: a basic collection holding the encoded grant,
//! and access/refresh index collections mapping token strings to the basic record's id.
//! Every record carries an `expiresAt` timestamp enforced by a TTL index.

pub mod codec;
pub mod config;
pub mod memory;
pub mod mongo;
pub mod plan;
pub mod record;
pub mod schema;

pub use codec::CodecError;
pub use config::*;
pub use memory::{MemoryStore, RecordCounts};
pub use mongo::MongoStore;
pub use record::*;

// self
use crate::{_prelude::*, auth::TokenGrant};

/// Boxed future returned by [`GrantStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract implemented by grant stores.
///
/// Lookups resolve to `Ok(None)` when nothing live matches; removals succeed when the key is
/// already gone. Only input, I/O, and codec failures surface as errors.
pub trait GrantStore
where
	Self: Send + Sync,
{
	/// Persists a grant, writing its basic and index records as one atomic unit.
	fn create<'a>(&'a self, grant: &'a TokenGrant) -> StoreFuture<'a, ()>;

	/// Resolves a code, access token, or refresh token to its grant.
	fn get<'a>(&'a self, kind: TokenKind, key: &'a str) -> StoreFuture<'a, Option<TokenGrant>>;

	/// Deletes the record keyed by `key` from the collection serving `kind`.
	fn remove<'a>(&'a self, kind: TokenKind, key: &'a str) -> StoreFuture<'a, ()>;

	/// Fetches the grant stored under an authorization code.
	fn get_by_code<'a>(&'a self, code: &'a str) -> StoreFuture<'a, Option<TokenGrant>> {
		self.get(TokenKind::Code, code)
	}

	/// Fetches the grant owning an access token.
	fn get_by_access<'a>(&'a self, access: &'a str) -> StoreFuture<'a, Option<TokenGrant>> {
		self.get(TokenKind::Access, access)
	}

	/// Fetches the grant owning a refresh token.
	fn get_by_refresh<'a>(&'a self, refresh: &'a str) -> StoreFuture<'a, Option<TokenGrant>> {
		self.get(TokenKind::Refresh, refresh)
	}

	/// Deletes the record stored under an authorization code.
	fn remove_by_code<'a>(&'a self, code: &'a str) -> StoreFuture<'a, ()> {
		self.remove(TokenKind::Code, code)
	}

	/// Deletes the access-token index record.
	fn remove_by_access<'a>(&'a self, access: &'a str) -> StoreFuture<'a, ()> {
		self.remove(TokenKind::Access, access)
	}

	/// Deletes the refresh-token index record.
	fn remove_by_refresh<'a>(&'a self, refresh: &'a str) -> StoreFuture<'a, ()> {
		self.remove(TokenKind::Refresh, refresh)
	}
}

/// Token kinds used as lookup keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
	/// Authorization code, the basic record's own key.
	Code,
	/// Access token, resolved through the access index.
	Access,
	/// Refresh token, resolved through the refresh index.
	Refresh,
}
impl TokenKind {
	/// Returns a stable label suitable for messages and span fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenKind::Code => "code",
			TokenKind::Access => "access",
			TokenKind::Refresh => "refresh",
		}
	}
}
impl Display for TokenKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Input errors raised when a token string cannot be used as a record key.
#[derive(Debug, ThisError)]
pub enum KeyError {
	/// The key was empty.
	#[error("The {kind} key cannot be empty.")]
	Empty {
		/// Token kind the key was supplied for.
		kind: TokenKind,
	},
	/// The key is not a 24-character hexadecimal ObjectId.
	#[error("The {kind} key is not a valid ObjectId.")]
	InvalidObjectId {
		/// Token kind the key was supplied for.
		kind: TokenKind,
		/// Underlying parsing failure.
		#[source]
		source: mongodb::bson::oid::Error,
	},
}

/// Error type produced by [`GrantStore`] implementations.
#[derive(Debug, ThisError)]
pub enum StoreError {
	/// Key could not be encoded; nothing was attempted.
	#[error(transparent)]
	InvalidKey(#[from] KeyError),
	/// Grant payload could not be encoded or decoded.
	#[error(transparent)]
	Codec(#[from] CodecError),
	/// A record with the same primary key already exists.
	#[error("A record with the same key already exists in `{collection}`.")]
	Duplicate {
		/// Collection that rejected the write.
		collection: String,
	},
	/// Database driver failure (connection, command, or transaction).
	#[error("Database operation `{operation}` failed.")]
	Database {
		/// Operation that failed.
		operation: &'static str,
		/// Underlying driver error.
		#[source]
		source: mongodb::error::Error,
	},
}
impl StoreError {
	/// Wraps a driver error raised by `operation`.
	pub fn database(operation: &'static str, source: mongodb::error::Error) -> Self {
		Self::Database { operation, source }
	}

	/// Returns `true` for caller input errors that were rejected before any I/O.
	pub fn is_input(&self) -> bool {
		matches!(self, Self::InvalidKey(_))
	}
}
