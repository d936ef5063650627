//! Token values returned by the OAuth flows and their lifecycle helpers.

// self
use crate::{
	_prelude::*,
	auth::{Scope, TokenSecret},
};

/// Lifecycle status of an issued token at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token is not yet valid because the issued-at instant is in the future.
	Pending,
	/// Token is currently valid.
	Active,
	/// Token exceeded its expiry instant.
	Expired,
}

/// Application token issued by the two-legged (client credentials) flow.
///
/// Two-legged tokens are never refreshable; request a new one once it expires.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Token {
	/// Bearer token to authorize API calls with.
	pub access_token: TokenSecret,
	/// Token type reported by the provider, normally `Bearer`.
	pub token_type: String,
	/// Lifetime counted from `issued_at`.
	pub expires_in: Duration,
	/// Scopes granted to the token, in the provider's order.
	pub scopes: Vec<Scope>,
	/// Instant the token response was received.
	pub issued_at: OffsetDateTime,
}
impl Token {
	/// Instant after which the token is no longer valid.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.issued_at + self.expires_in
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		status_at(self.issued_at, self.expires_at(), instant)
	}

	/// Returns `true` if the token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.status_at(instant) == TokenStatus::Expired
	}

	/// Returns `true` if the token is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}

/// User token issued by the three-legged (authorization code) flow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationToken {
	/// Bearer token to authorize API calls with.
	pub access_token: TokenSecret,
	/// Refresh token, present only when the provider's response carried one.
	pub refresh_token: Option<TokenSecret>,
	/// Token type reported by the provider, normally `Bearer`.
	pub token_type: String,
	/// Lifetime counted from `issued_at`.
	pub expires_in: Duration,
	/// Scopes granted to the token, in the provider's order.
	pub scopes: Vec<Scope>,
	/// Instant the token response was received.
	pub issued_at: OffsetDateTime,
}
impl AuthorizationToken {
	/// Instant after which the access token is no longer valid.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.issued_at + self.expires_in
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		status_at(self.issued_at, self.expires_at(), instant)
	}

	/// Returns `true` if the access token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.status_at(instant) == TokenStatus::Expired
	}

	/// Returns `true` if the access token is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` when the token can be refreshed.
	pub fn is_refreshable(&self) -> bool {
		self.refresh_token.is_some()
	}

	/// Returns `true` when the token should be refreshed within `leeway` of `instant`.
	pub fn needs_refresh_at(&self, instant: OffsetDateTime, leeway: Duration) -> bool {
		instant + leeway >= self.expires_at()
	}
}

fn status_at(
	issued_at: OffsetDateTime,
	expires_at: OffsetDateTime,
	instant: OffsetDateTime,
) -> TokenStatus {
	if instant < issued_at {
		return TokenStatus::Pending;
	}
	if instant >= expires_at {
		return TokenStatus::Expired;
	}

	TokenStatus::Active
}
