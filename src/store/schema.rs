//! Collection and TTL index setup for the MongoDB backend.

// std
use std::time::Duration as StdDuration;
// crates.io
use futures::TryStreamExt;
use mongodb::{
	Database, IndexModel,
	bson::{Document, doc},
	error::{Error as DriverError, ErrorKind},
	options::IndexOptions,
};
// self
use crate::{
	_prelude::*,
	store::{StoreConfig, StoreError},
};

/// Field every record expires on.
pub const EXPIRY_FIELD: &str = "expiresAt";
/// Name given to the TTL index.
pub const EXPIRY_INDEX_NAME: &str = "expire_after";

const NAMESPACE_EXISTS: i32 = 48;

/// Ensures the basic, access, and refresh collections exist with one TTL index each.
pub async fn ensure_schema(database: &Database, config: &StoreConfig) -> Result<(), StoreError> {
	let names = &config.collections;

	for name in [&names.basic, &names.access, &names.refresh] {
		ensure_collection(database, name).await?;
		ensure_expiry_index(database, name, config.expire_after()).await?;
	}

	Ok(())
}

/// Creates `name`, treating an existing collection as success.
pub async fn ensure_collection(database: &Database, name: &str) -> Result<(), StoreError> {
	match database.create_collection(name).await {
		Ok(()) => Ok(()),
		Err(e) if is_namespace_exists(&e) => Ok(()),
		Err(e) => Err(StoreError::database("create_collection", e)),
	}
}

/// Leaves exactly one TTL index on [`EXPIRY_FIELD`] with the requested delay.
///
/// Indexes on the expiry field with a different delay, and foreign indexes squatting on
/// [`EXPIRY_INDEX_NAME`], are dropped before the index is recreated.
pub async fn ensure_expiry_index(
	database: &Database,
	name: &str,
	expire_after: StdDuration,
) -> Result<(), StoreError> {
	let collection = database.collection::<Document>(name);
	let existing: Vec<IndexModel> = collection
		.list_indexes()
		.await
		.map_err(|e| StoreError::database("list_indexes", e))?
		.try_collect()
		.await
		.map_err(|e| StoreError::database("list_indexes", e))?;
	let mut satisfied = false;

	for index in &existing {
		let index_name = index.options.as_ref().and_then(|o| o.name.as_deref());
		let delay = index.options.as_ref().and_then(|o| o.expire_after);
		let keyed = is_expiry_index(index);

		if !keyed && index_name != Some(EXPIRY_INDEX_NAME) {
			continue;
		}
		if keyed && !satisfied && delay == Some(expire_after) {
			satisfied = true;

			continue;
		}
		if let Some(index_name) = index_name {
			collection
				.drop_index(index_name)
				.await
				.map_err(|e| StoreError::database("drop_index", e))?;
		}
	}

	if !satisfied {
		collection
			.create_index(expiry_index_model(expire_after))
			.await
			.map_err(|e| StoreError::database("create_index", e))?;
	}

	Ok(())
}

/// TTL index definition on [`EXPIRY_FIELD`].
pub fn expiry_index_model(expire_after: StdDuration) -> IndexModel {
	let options = IndexOptions::builder()
		.name(EXPIRY_INDEX_NAME.to_owned())
		.unique(false)
		.sparse(false)
		.expire_after(expire_after)
		.build();

	IndexModel::builder().keys(doc! { EXPIRY_FIELD: 1 }).options(options).build()
}

/// Returns `true` when `index` is keyed on [`EXPIRY_FIELD`] alone.
pub fn is_expiry_index(index: &IndexModel) -> bool {
	index.keys.len() == 1 && index.keys.contains_key(EXPIRY_FIELD)
}

fn is_namespace_exists(err: &DriverError) -> bool {
	matches!(*err.kind, ErrorKind::Command(ref command) if command.code == NAMESPACE_EXISTS)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn expiry_model_targets_expires_at() {
		let model = expiry_index_model(StdDuration::from_secs(1));
		let options = model.options.as_ref().expect("Expiry index should carry options.");

		assert!(is_expiry_index(&model));
		assert_eq!(options.name.as_deref(), Some(EXPIRY_INDEX_NAME));
		assert_eq!(options.expire_after, Some(StdDuration::from_secs(1)));
	}

	#[test]
	fn compound_indexes_are_not_expiry_indexes() {
		let compound = IndexModel::builder().keys(doc! { EXPIRY_FIELD: 1, "basicId": 1 }).build();
		let other = IndexModel::builder().keys(doc! { "basicId": 1 }).build();

		assert!(!is_expiry_index(&compound));
		assert!(!is_expiry_index(&other));
	}
}
