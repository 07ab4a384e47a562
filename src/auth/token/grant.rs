//! Immutable grant values (authorization code or access/refresh pair) and their builder.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeSet, UserId, token::secret::TokenSecret},
};

/// Which persistence branch a grant follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrantKind {
	/// Authorization code grant stored as a single record keyed by the code.
	AuthorizationCode,
	/// Access token (and optional refresh token) stored behind index records.
	AccessToken,
}

/// Errors produced by [`TokenGrantBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum GrantBuilderError {
	/// Neither an authorization code nor an access token was supplied.
	#[error("Grant requires an authorization code or an access token.")]
	MissingToken,
	/// A refresh token was supplied without an access token.
	#[error("Refresh token requires an access token.")]
	RefreshWithoutAccess,
	/// A token value was empty.
	#[error("The {token} value cannot be empty.")]
	EmptyToken {
		/// Token label.
		token: &'static str,
	},
	/// A token lifetime was zero or negative.
	#[error("The {token} lifetime must be positive.")]
	NonPositiveLifetime {
		/// Token label.
		token: &'static str,
	},
}

/// A single issued token value with its validity window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
	/// Token string; callers must avoid logging it.
	pub value: TokenSecret,
	/// Instant the token was issued.
	pub issued_at: OffsetDateTime,
	/// Lifetime counted from `issued_at`.
	pub expires_in: Duration,
}
impl IssuedToken {
	/// Creates a token issued at `issued_at` that lives for `expires_in`.
	pub fn new(value: impl Into<String>, issued_at: OffsetDateTime, expires_in: Duration) -> Self {
		Self { value: TokenSecret::new(value), issued_at, expires_in }
	}

	/// Instant the token stops being valid.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.issued_at + self.expires_in
	}

	/// Returns `true` if the token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at()
	}
}

/// Immutable description of one OAuth 2.0 issuance event.
///
/// A grant either carries an authorization code, or an access token with an optional refresh
/// token. When both a code and an access token are present the code wins and the grant is
/// stored as an authorization-code grant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
	/// Client the grant was issued to.
	pub client_id: ClientId,
	/// Resource owner, absent for client-only grants.
	pub user_id: Option<UserId>,
	/// Redirect URI bound to the grant, if any.
	pub redirect_uri: Option<Url>,
	/// Granted scopes.
	pub scope: ScopeSet,
	/// Authorization code.
	pub code: Option<IssuedToken>,
	/// Access token.
	pub access: Option<IssuedToken>,
	/// Refresh token.
	pub refresh: Option<IssuedToken>,
}
impl TokenGrant {
	/// Returns a builder for the provided client.
	pub fn builder(client_id: ClientId) -> TokenGrantBuilder {
		TokenGrantBuilder::new(client_id)
	}

	/// Persistence branch for this grant.
	pub fn kind(&self) -> GrantKind {
		match &self.code {
			Some(code) if !code.value.is_empty() => GrantKind::AuthorizationCode,
			_ => GrantKind::AccessToken,
		}
	}

	/// Authorization code string, if present.
	pub fn code_value(&self) -> Option<&str> {
		self.code.as_ref().map(|t| t.value.expose())
	}

	/// Access token string, if present.
	pub fn access_value(&self) -> Option<&str> {
		self.access.as_ref().map(|t| t.value.expose())
	}

	/// Refresh token string, if present.
	pub fn refresh_value(&self) -> Option<&str> {
		self.refresh.as_ref().map(|t| t.value.expose())
	}
}

/// Builder for [`TokenGrant`].
#[derive(Clone, Debug)]
pub struct TokenGrantBuilder {
	client_id: ClientId,
	user_id: Option<UserId>,
	redirect_uri: Option<Url>,
	scope: ScopeSet,
	code: Option<IssuedToken>,
	access: Option<IssuedToken>,
	refresh: Option<IssuedToken>,
}
impl TokenGrantBuilder {
	fn new(client_id: ClientId) -> Self {
		Self {
			client_id,
			user_id: None,
			redirect_uri: None,
			scope: ScopeSet::default(),
			code: None,
			access: None,
			refresh: None,
		}
	}

	/// Sets the resource owner.
	pub fn user_id(mut self, user_id: UserId) -> Self {
		self.user_id = Some(user_id);

		self
	}

	/// Sets the redirect URI.
	pub fn redirect_uri(mut self, uri: Url) -> Self {
		self.redirect_uri = Some(uri);

		self
	}

	/// Sets the granted scopes.
	pub fn scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	/// Provides the authorization code.
	pub fn code(
		mut self,
		code: impl Into<String>,
		issued_at: OffsetDateTime,
		expires_in: Duration,
	) -> Self {
		self.code = Some(IssuedToken::new(code, issued_at, expires_in));

		self
	}

	/// Provides the access token.
	pub fn access_token(
		mut self,
		token: impl Into<String>,
		issued_at: OffsetDateTime,
		expires_in: Duration,
	) -> Self {
		self.access = Some(IssuedToken::new(token, issued_at, expires_in));

		self
	}

	/// Provides the refresh token.
	pub fn refresh_token(
		mut self,
		token: impl Into<String>,
		issued_at: OffsetDateTime,
		expires_in: Duration,
	) -> Self {
		self.refresh = Some(IssuedToken::new(token, issued_at, expires_in));

		self
	}

	/// Consumes the builder and produces a [`TokenGrant`].
	pub fn build(self) -> Result<TokenGrant, GrantBuilderError> {
		if self.code.is_none() && self.access.is_none() {
			return Err(if self.refresh.is_some() {
				GrantBuilderError::RefreshWithoutAccess
			} else {
				GrantBuilderError::MissingToken
			});
		}
		if self.refresh.is_some() && self.access.is_none() {
			return Err(GrantBuilderError::RefreshWithoutAccess);
		}

		let supplied = [("code", &self.code), ("access", &self.access), ("refresh", &self.refresh)];

		for (token, issued) in supplied {
			let Some(issued) = issued else { continue };

			if issued.value.is_empty() {
				return Err(GrantBuilderError::EmptyToken { token });
			}
			if !issued.expires_in.is_positive() {
				return Err(GrantBuilderError::NonPositiveLifetime { token });
			}
		}

		Ok(TokenGrant {
			client_id: self.client_id,
			user_id: self.user_id,
			redirect_uri: self.redirect_uri,
			scope: self.scope,
			code: self.code,
			access: self.access,
			refresh: self.refresh,
		})
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn client() -> ClientId {
		ClientId::new("1").expect("Client fixture should be valid.")
	}

	#[test]
	fn code_grants_take_the_code_branch() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let grant = TokenGrant::builder(client())
			.user_id(UserId::new("1_1").expect("User fixture should be valid."))
			.code("abc123", issued, Duration::seconds(5))
			.build()
			.expect("Code grant should build.");

		assert_eq!(grant.kind(), GrantKind::AuthorizationCode);
		assert_eq!(grant.code_value(), Some("abc123"));
		assert_eq!(
			grant.code.as_ref().map(IssuedToken::expires_at),
			Some(macros::datetime!(2025-01-01 00:00:05 UTC))
		);
	}

	#[test]
	fn access_grants_take_the_index_branch() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let grant = TokenGrant::builder(client())
			.access_token("1_2_1", issued, Duration::seconds(5))
			.refresh_token("1_2_2", issued, Duration::seconds(15))
			.build()
			.expect("Access grant should build.");

		assert_eq!(grant.kind(), GrantKind::AccessToken);
		assert_eq!(grant.access_value(), Some("1_2_1"));
		assert_eq!(grant.refresh_value(), Some("1_2_2"));
	}

	#[test]
	fn builder_rejects_incomplete_grants() {
		let now = OffsetDateTime::now_utc();

		assert_eq!(
			TokenGrant::builder(client()).build().expect_err("Empty grant must be rejected."),
			GrantBuilderError::MissingToken
		);
		assert_eq!(
			TokenGrant::builder(client())
				.refresh_token("r", now, Duration::hours(1))
				.build()
				.expect_err("Refresh-only grant must be rejected."),
			GrantBuilderError::RefreshWithoutAccess
		);
		assert_eq!(
			TokenGrant::builder(client())
				.access_token("", now, Duration::hours(1))
				.build()
				.expect_err("Empty access token must be rejected."),
			GrantBuilderError::EmptyToken { token: "access" }
		);
		assert_eq!(
			TokenGrant::builder(client())
				.code("c", now, Duration::ZERO)
				.build()
				.expect_err("Zero lifetime must be rejected."),
			GrantBuilderError::NonPositiveLifetime { token: "code" }
		);
	}

	#[test]
	fn issued_token_expiry_is_exclusive() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let token = IssuedToken::new("t", issued, Duration::minutes(1));

		assert!(!token.is_expired_at(macros::datetime!(2025-01-01 00:00:59 UTC)));
		assert!(token.is_expired_at(macros::datetime!(2025-01-01 00:01 UTC)));
	}

	#[test]
	fn debug_output_redacts_token_values() {
		let grant = TokenGrant::builder(client())
			.access_token("very-secret", OffsetDateTime::now_utc(), Duration::hours(1))
			.build()
			.expect("Access grant should build.");

		assert!(!format!("{grant:?}").contains("very-secret"));
	}
}
