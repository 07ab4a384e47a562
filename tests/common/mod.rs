//! Grant fixtures shared by the store integration suites.

#![allow(dead_code)]

// crates.io
use time::{Duration, OffsetDateTime};
// self
use oauth2_mongo_store::{
	auth::{ClientId, ScopeSet, TokenGrant, UserId},
	url::Url,
};

pub fn client() -> ClientId {
	ClientId::new("1").expect("Client fixture should be valid.")
}

pub fn user(id: &str) -> UserId {
	UserId::new(id).expect("User fixture should be valid.")
}

fn base(user_id: &str) -> oauth2_mongo_store::auth::TokenGrantBuilder {
	TokenGrant::builder(client())
		.user_id(user(user_id))
		.redirect_uri(Url::parse("http://localhost/").expect("Redirect fixture should parse."))
		.scope(ScopeSet::new(["all"]).expect("Scope fixture should be valid."))
}

pub fn code_grant(
	user_id: &str,
	code: &str,
	issued_at: OffsetDateTime,
	expires_in: Duration,
) -> TokenGrant {
	base(user_id)
		.code(code, issued_at, expires_in)
		.build()
		.expect("Code grant fixture should build.")
}

pub fn access_grant(
	user_id: &str,
	access: &str,
	issued_at: OffsetDateTime,
	expires_in: Duration,
) -> TokenGrant {
	base(user_id)
		.access_token(access, issued_at, expires_in)
		.build()
		.expect("Access grant fixture should build.")
}

pub fn refresh_grant(
	user_id: &str,
	access: &str,
	refresh: &str,
	issued_at: OffsetDateTime,
) -> TokenGrant {
	base(user_id)
		.access_token(access, issued_at, Duration::seconds(5))
		.refresh_token(refresh, issued_at, Duration::seconds(15))
		.build()
		.expect("Refresh grant fixture should build.")
}

pub fn user_of(grant: &TokenGrant) -> Option<&str> {
	grant.user_id.as_deref()
}
