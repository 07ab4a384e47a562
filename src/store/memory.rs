//! Thread-safe in-memory [`GrantStore`] for local development and tests.

// crates.io
use mongodb::bson::DateTime;
// self
use crate::{
	_prelude::*,
	auth::TokenGrant,
	obs::{self, StoreOp, StoreSpan},
	store::{
		BasicRecord, GrantStore, IndexRecord, RecordKey, StoreConfig, StoreError, StoreFuture,
		TokenKind, codec, plan::GrantWrite,
	},
};

const BACKEND: &str = "memory";

/// Number of records held per collection, expired-but-unreaped records included.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecordCounts {
	/// Basic records.
	pub basic: usize,
	/// Access index records.
	pub access: usize,
	/// Refresh index records.
	pub refresh: usize,
}

#[derive(Debug, Default)]
struct Collections {
	basic: HashMap<RecordKey, BasicRecord>,
	access: HashMap<RecordKey, IndexRecord>,
	refresh: HashMap<RecordKey, IndexRecord>,
}
impl Collections {
	fn index(&self, kind: TokenKind) -> Option<&HashMap<RecordKey, IndexRecord>> {
		match kind {
			TokenKind::Code => None,
			TokenKind::Access => Some(&self.access),
			TokenKind::Refresh => Some(&self.refresh),
		}
	}

	// Mirrors the TTL monitor: anything whose expiry has passed may vanish.
	fn reap(&mut self, now: DateTime) {
		self.basic.retain(|_, r| r.is_live_at(now));
		self.access.retain(|_, r| r.is_live_at(now));
		self.refresh.retain(|_, r| r.is_live_at(now));
	}
}

/// Storage backend that keeps the three collections in-process.
///
/// Writes take a single lock, so a grant's records appear together or not at all, and primary
/// keys are unique per collection just like `_id` in MongoDB.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	inner: Arc<RwLock<Collections>>,
	config: Arc<StoreConfig>,
}
impl MemoryStore {
	/// Creates an empty store using `config` for key encoding and collection names.
	pub fn new(config: StoreConfig) -> Result<Self> {
		config.validate()?;

		Ok(Self { inner: Default::default(), config: Arc::new(config) })
	}

	/// Record counts per collection, as a direct collection scan would report them.
	pub fn counts(&self) -> RecordCounts {
		let guard = self.inner.read();

		RecordCounts {
			basic: guard.basic.len(),
			access: guard.access.len(),
			refresh: guard.refresh.len(),
		}
	}

	/// Returns the index record stored under `token`, live or not.
	///
	/// Always `None` for [`TokenKind::Code`], which has no index collection.
	pub fn index_record(
		&self,
		kind: TokenKind,
		token: &str,
	) -> Result<Option<IndexRecord>, StoreError> {
		let key = self.config.key_encoding.encode(kind, token)?;

		Ok(self.inner.read().index(kind).and_then(|index| index.get(&key)).cloned())
	}

	/// Deletes a basic record by id, bypassing the index collections.
	///
	/// Returns `true` if a record was removed.
	pub fn evict_basic(&self, id: &RecordKey) -> bool {
		self.inner.write().basic.remove(id).is_some()
	}

	/// Drops every record whose expiry has passed.
	pub fn purge_expired(&self) {
		self.inner.write().reap(DateTime::now());
	}

	fn create_now(&self, grant: &TokenGrant) -> Result<(), StoreError> {
		let write = GrantWrite::plan(grant, self.config.key_encoding)?;
		let names = &self.config.collections;
		let mut guard = self.inner.write();

		guard.reap(DateTime::now());

		if guard.basic.contains_key(&write.basic.id) {
			return Err(StoreError::Duplicate { collection: names.basic.clone() });
		}
		if write.access.as_ref().is_some_and(|r| guard.access.contains_key(&r.id)) {
			return Err(StoreError::Duplicate { collection: names.access.clone() });
		}
		if write.refresh.as_ref().is_some_and(|r| guard.refresh.contains_key(&r.id)) {
			return Err(StoreError::Duplicate { collection: names.refresh.clone() });
		}

		let GrantWrite { basic, access, refresh } = write;

		guard.basic.insert(basic.id.clone(), basic);

		if let Some(access) = access {
			guard.access.insert(access.id.clone(), access);
		}
		if let Some(refresh) = refresh {
			guard.refresh.insert(refresh.id.clone(), refresh);
		}

		Ok(())
	}

	fn get_now(&self, kind: TokenKind, raw: &str) -> Result<Option<TokenGrant>, StoreError> {
		let key = self.config.key_encoding.encode(kind, raw)?;
		let now = DateTime::now();
		let payload = {
			let guard = self.inner.read();
			let basic_id = match guard.index(kind) {
				None => Some(&key),
				Some(index) => index.get(&key).filter(|r| r.is_live_at(now)).map(|r| &r.basic_id),
			};

			basic_id
				.and_then(|id| guard.basic.get(id))
				.filter(|r| r.is_live_at(now))
				.map(|r| r.payload.bytes.clone())
		};

		payload.map(|bytes| codec::decode(&bytes)).transpose().map_err(Into::into)
	}

	fn remove_now(&self, kind: TokenKind, raw: &str) -> Result<(), StoreError> {
		let key = self.config.key_encoding.encode(kind, raw)?;
		let mut guard = self.inner.write();

		// Missing keys are not an error.
		match kind {
			TokenKind::Code => {
				guard.basic.remove(&key);
			},
			TokenKind::Access => {
				guard.access.remove(&key);
			},
			TokenKind::Refresh => {
				guard.refresh.remove(&key);
			},
		}

		Ok(())
	}
}
impl GrantStore for MemoryStore {
	fn create<'a>(&'a self, grant: &'a TokenGrant) -> StoreFuture<'a, ()> {
		let op = StoreOp::Create;
		let span = StoreSpan::new(op, BACKEND, grant.code_value().or(grant.access_value()));

		Box::pin(obs::observe(span, op, async move { self.create_now(grant) }))
	}

	fn get<'a>(&'a self, kind: TokenKind, key: &'a str) -> StoreFuture<'a, Option<TokenGrant>> {
		let op = StoreOp::Get(kind);
		let span = StoreSpan::new(op, BACKEND, Some(key));

		Box::pin(obs::observe(span, op, async move { self.get_now(kind, key) }))
	}

	fn remove<'a>(&'a self, kind: TokenKind, key: &'a str) -> StoreFuture<'a, ()> {
		let op = StoreOp::Remove(kind);
		let span = StoreSpan::new(op, BACKEND, Some(key));

		Box::pin(obs::observe(span, op, async move { self.remove_now(kind, key) }))
	}
}
