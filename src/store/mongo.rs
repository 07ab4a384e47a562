//! MongoDB [`GrantStore`] splitting grants across basic and index collections.
//!
//! Access/refresh grants are written inside a multi-document transaction, so the deployment
//! must be a replica set or sharded cluster. Dropping a `create` future mid-flight drops its
//! session, which aborts the open transaction. Reads filter on `expiresAt` so records become
//! unreachable at their expiry even before the TTL monitor reaps them.

// crates.io
use mongodb::{
	Client, ClientSession, Collection, Database,
	bson::{DateTime, Document, doc},
	error::{Error as DriverError, ErrorKind, WriteFailure},
	options::ClientOptions,
};
// self
use crate::{
	_prelude::*,
	auth::TokenGrant,
	error::ConfigError,
	obs::{self, StoreOp, StoreSpan},
	store::{
		BasicRecord, ConnectionConfig, GrantStore, IndexRecord, RecordKey, StoreConfig, StoreError,
		StoreFuture, TokenKind, codec,
		config::validate_database_name,
		plan::GrantWrite,
		schema::{self, EXPIRY_FIELD},
	},
};

const BACKEND: &str = "mongo";
const DUPLICATE_KEY: i32 = 11000;

/// Grant store backed by a MongoDB database.
///
/// Cloning is cheap; clones share the driver's connection pool.
#[derive(Clone, Debug)]
pub struct MongoStore {
	client: Client,
	database: Database,
	config: Arc<StoreConfig>,
}
impl MongoStore {
	/// Connects to `connection` and prepares the collections described by `config`.
	pub async fn connect(connection: &ConnectionConfig, config: StoreConfig) -> Result<Self> {
		connection.validate()?;

		let mut options = ClientOptions::parse(connection.uri.as_str())
			.await
			.map_err(|source| ConfigError::InvalidConnectionUri { source })?;

		options.connect_timeout = Some(connection.connect_timeout());

		let client = Client::with_options(options)
			.map_err(|source| ConfigError::InvalidConnectionUri { source })?;

		Self::with_client(client, &connection.database, config).await
	}

	/// Wraps an existing client and prepares the collections described by `config`.
	pub async fn with_client(
		client: Client,
		database: &str,
		config: StoreConfig,
	) -> Result<Self> {
		validate_database_name(database)?;
		config.validate()?;

		let store = Self { database: client.database(database), client, config: Arc::new(config) };

		store.ensure_schema().await?;

		Ok(store)
	}

	/// Re-runs collection and TTL index setup; safe to call repeatedly.
	pub async fn ensure_schema(&self) -> Result<(), StoreError> {
		let op = StoreOp::EnsureSchema;

		obs::observe(
			StoreSpan::new(op, BACKEND, None),
			op,
			schema::ensure_schema(&self.database, &self.config),
		)
		.await
	}

	/// Database holding the grant collections.
	pub fn database(&self) -> &Database {
		&self.database
	}

	/// Configuration the store was built with.
	pub fn config(&self) -> &StoreConfig {
		&self.config
	}

	fn basic(&self) -> Collection<BasicRecord> {
		self.database.collection(&self.config.collections.basic)
	}

	fn index(&self, kind: TokenKind) -> Collection<IndexRecord> {
		self.database.collection(self.collection_name(kind))
	}

	fn collection_name(&self, kind: TokenKind) -> &str {
		let names = &self.config.collections;

		match kind {
			TokenKind::Code => &names.basic,
			TokenKind::Access => &names.access,
			TokenKind::Refresh => &names.refresh,
		}
	}

	async fn create_now(&self, grant: &TokenGrant) -> Result<(), StoreError> {
		let write = GrantWrite::plan(grant, self.config.key_encoding)?;

		if write.access.is_none() {
			return self
				.basic()
				.insert_one(&write.basic)
				.await
				.map(|_| ())
				.map_err(|e| self.insert_error(&self.config.collections.basic, e));
		}

		let mut session = self
			.client
			.start_session()
			.await
			.map_err(|e| StoreError::database("start_session", e))?;

		session
			.start_transaction()
			.await
			.map_err(|e| StoreError::database("start_transaction", e))?;

		match self.insert_all(&write, &mut session).await {
			Ok(()) => session
				.commit_transaction()
				.await
				.map_err(|e| StoreError::database("commit_transaction", e)),
			Err(e) => {
				// A failed abort leaves the transaction to time out server-side.
				if let Err(abort) = session.abort_transaction().await {
					obs::record_abort_failure(&abort);
				}

				Err(e)
			},
		}
	}

	async fn insert_all(
		&self,
		write: &GrantWrite,
		session: &mut ClientSession,
	) -> Result<(), StoreError> {
		let names = &self.config.collections;

		self.basic()
			.insert_one(&write.basic)
			.session(&mut *session)
			.await
			.map_err(|e| self.insert_error(&names.basic, e))?;

		if let Some(access) = &write.access {
			self.index(TokenKind::Access)
				.insert_one(access)
				.session(&mut *session)
				.await
				.map_err(|e| self.insert_error(&names.access, e))?;
		}
		if let Some(refresh) = &write.refresh {
			self.index(TokenKind::Refresh)
				.insert_one(refresh)
				.session(&mut *session)
				.await
				.map_err(|e| self.insert_error(&names.refresh, e))?;
		}

		Ok(())
	}

	fn insert_error(&self, collection: &str, e: DriverError) -> StoreError {
		if is_duplicate_key(&e) {
			StoreError::Duplicate { collection: collection.to_owned() }
		} else {
			StoreError::database("insert_one", e)
		}
	}

	async fn get_now(&self, kind: TokenKind, raw: &str) -> Result<Option<TokenGrant>, StoreError> {
		let key = self.config.key_encoding.encode(kind, raw)?;
		let basic_id = match kind {
			TokenKind::Code => key,
			_ => match self.find_index(kind, &key).await? {
				Some(index) => index.basic_id,
				None => return Ok(None),
			},
		};
		let Some(basic) = self.find_basic(&basic_id).await? else {
			return Ok(None);
		};

		Ok(Some(codec::decode(&basic.payload.bytes)?))
	}

	async fn find_index(
		&self,
		kind: TokenKind,
		key: &RecordKey,
	) -> Result<Option<IndexRecord>, StoreError> {
		self.index(kind)
			.find_one(live_filter(key))
			.await
			.map_err(|e| StoreError::database("find_one", e))
	}

	async fn find_basic(&self, id: &RecordKey) -> Result<Option<BasicRecord>, StoreError> {
		self.basic().find_one(live_filter(id)).await.map_err(|e| StoreError::database("find_one", e))
	}

	async fn remove_now(&self, kind: TokenKind, raw: &str) -> Result<(), StoreError> {
		let key = self.config.key_encoding.encode(kind, raw)?;
		let filter = doc! { "_id": &key };
		let collection = self.database.collection::<Document>(self.collection_name(kind));

		// A zero delete count means the key was already gone.
		collection.delete_one(filter).await.map_err(|e| StoreError::database("delete_one", e))?;

		Ok(())
	}
}
impl GrantStore for MongoStore {
	fn create<'a>(&'a self, grant: &'a TokenGrant) -> StoreFuture<'a, ()> {
		let op = StoreOp::Create;
		let span = StoreSpan::new(op, BACKEND, grant.code_value().or(grant.access_value()));

		Box::pin(obs::observe(span, op, self.create_now(grant)))
	}

	fn get<'a>(&'a self, kind: TokenKind, key: &'a str) -> StoreFuture<'a, Option<TokenGrant>> {
		let op = StoreOp::Get(kind);

		Box::pin(obs::observe(StoreSpan::new(op, BACKEND, Some(key)), op, self.get_now(kind, key)))
	}

	fn remove<'a>(&'a self, kind: TokenKind, key: &'a str) -> StoreFuture<'a, ()> {
		let op = StoreOp::Remove(kind);

		Box::pin(obs::observe(
			StoreSpan::new(op, BACKEND, Some(key)),
			op,
			self.remove_now(kind, key),
		))
	}
}

fn live_filter(key: &RecordKey) -> Document {
	doc! { "_id": key, EXPIRY_FIELD: { "$gt": DateTime::now() } }
}

fn is_duplicate_key(err: &DriverError) -> bool {
	match *err.kind {
		ErrorKind::Write(WriteFailure::WriteError(ref e)) => e.code == DUPLICATE_KEY,
		ErrorKind::Command(ref e) => e.code == DUPLICATE_KEY,
		_ => false,
	}
}
