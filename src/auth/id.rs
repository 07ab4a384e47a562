//! Identifiers carried inside stored grants.
//!
//! Client and user ids are opaque to the store: any non-empty string is accepted and
//! round-trips byte for byte through the payload codec.

// std
use std::{borrow::Borrow, hash::Hash, marker::PhantomData, ops::Deref};
// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError};
// self
use crate::_prelude::*;

/// OAuth client identifier the grant was issued to.
pub type ClientId = Id<Client>;
/// Resource owner identifier the grant was issued for.
pub type UserId = Id<User>;

/// Marks what an [`Id`] identifies.
pub trait IdKind {
	/// Label used in `Debug` output and errors.
	const LABEL: &'static str;
}

/// [`IdKind`] for OAuth clients.
#[derive(Debug)]
pub enum Client {}
impl IdKind for Client {
	const LABEL: &'static str = "Client";
}

/// [`IdKind`] for resource owners.
#[derive(Debug)]
pub enum User {}
impl IdKind for User {
	const LABEL: &'static str = "User";
}

/// Error returned when an identifier cannot be built.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (client, user).
		kind: &'static str,
	},
}

/// Non-empty identifier tagged with its [`IdKind`].
pub struct Id<K> {
	value: String,
	kind: PhantomData<K>,
}
impl<K> Id<K>
where
	K: IdKind,
{
	/// Wraps `value`, rejecting only the empty string.
	pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
		let value = value.into();

		if value.is_empty() {
			return Err(IdentifierError::Empty { kind: K::LABEL });
		}

		Ok(Self { value, kind: PhantomData })
	}

	/// Borrows the raw identifier.
	pub fn as_str(&self) -> &str {
		&self.value
	}

	/// Returns the owned identifier string.
	pub fn into_inner(self) -> String {
		self.value
	}
}
impl<K> Clone for Id<K> {
	fn clone(&self) -> Self {
		Self { value: self.value.clone(), kind: PhantomData }
	}
}
impl<K> PartialEq for Id<K> {
	fn eq(&self, other: &Self) -> bool {
		self.value == other.value
	}
}
impl<K> Eq for Id<K> {}
impl<K> PartialOrd for Id<K> {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		Some(self.cmp(other))
	}
}
impl<K> Ord for Id<K> {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		self.value.cmp(&other.value)
	}
}
impl<K> Hash for Id<K> {
	fn hash<H>(&self, state: &mut H)
	where
		H: std::hash::Hasher,
	{
		self.value.hash(state);
	}
}
impl<K> Deref for Id<K> {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.value
	}
}
impl<K> AsRef<str> for Id<K> {
	fn as_ref(&self) -> &str {
		&self.value
	}
}
impl<K> Borrow<str> for Id<K> {
	fn borrow(&self) -> &str {
		&self.value
	}
}
impl<K> Debug for Id<K>
where
	K: IdKind,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}({})", K::LABEL, self.value)
	}
}
impl<K> Display for Id<K> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.value)
	}
}
impl<K> FromStr for Id<K>
where
	K: IdKind,
{
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl<K> Serialize for Id<K> {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.value)
	}
}
impl<'de, K> Deserialize<'de> for Id<K>
where
	K: IdKind,
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		Self::new(String::deserialize(deserializer)?).map_err(DeError::custom)
	}
}
