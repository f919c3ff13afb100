//! Bearer token model and the lock-guarded store shared across concurrent callers.
//!
//! The store keeps an `Option<AccessToken>` that is replaced wholesale, so a reader either
//! sees no token or a token whose value, type, and expiry were written together.

// self
use crate::{_prelude::*, auth::Secret};

/// Tokens closer than this to their expiry are treated as invalid so a call already in
/// flight never carries a token that expires mid-request.
pub const SAFETY_MARGIN: Duration = Duration::minutes(10);

/// Issued bearer token: value, type, and absolute expiry instant.
///
/// Never serialized; tokens live only in process memory.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
	value: Secret,
	token_type: String,
	expires_at: OffsetDateTime,
}
impl AccessToken {
	/// Creates a token from its three components.
	pub fn new(
		value: impl Into<String>,
		token_type: impl Into<String>,
		expires_at: OffsetDateTime,
	) -> Self {
		Self { value: Secret::new(value), token_type: token_type.into(), expires_at }
	}

	/// Token value; callers must avoid logging it.
	pub fn value(&self) -> &Secret {
		&self.value
	}

	/// Token type as returned by the authorization endpoint (e.g. `Bearer`).
	pub fn token_type(&self) -> &str {
		&self.token_type
	}

	/// Absolute expiry instant.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.expires_at
	}

	/// Returns `true` when `now` plus the [`SAFETY_MARGIN`] is still before the expiry.
	pub fn is_fresh_at(&self, now: OffsetDateTime) -> bool {
		!self.value.is_empty()
			&& !self.token_type.is_empty()
			&& now + SAFETY_MARGIN < self.expires_at
	}

	/// Renders the `Authorization` header value: `"<token_type> <token>"`.
	pub fn authorization_header(&self) -> String {
		format!("{} {}", self.token_type, self.value.expose())
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("value", &self.value)
			.field("token_type", &self.token_type)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Thread-safe holder for the current [`AccessToken`].
///
/// Readers take a short read lock and never block on token issuance; writers are the
/// [`TokenIssuer`](crate::issuer::TokenIssuer), which serializes its own mutations.
#[derive(Debug, Default)]
pub struct TokenStore(RwLock<Option<AccessToken>>);
impl TokenStore {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a store that already holds `token`.
	pub fn seeded(token: AccessToken) -> Self {
		Self(RwLock::new(Some(token)))
	}

	/// Returns `true` if a token is held and it is still fresh relative to the current clock.
	pub fn is_valid(&self) -> bool {
		self.is_valid_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` if a token is held and `now + SAFETY_MARGIN < expiry`.
	pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
		self.0.read().as_ref().is_some_and(|token| token.is_fresh_at(now))
	}

	/// Returns a copy of the held token, valid or not.
	pub fn snapshot(&self) -> Option<AccessToken> {
		self.0.read().clone()
	}

	/// Returns a copy of the held token only if it is fresh at `now`.
	///
	/// Reads validity and value under one lock acquisition so the pair is consistent.
	pub fn valid_snapshot_at(&self, now: OffsetDateTime) -> Option<AccessToken> {
		self.0.read().as_ref().filter(|token| token.is_fresh_at(now)).cloned()
	}

	/// Returns `true` if no token is held.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_none()
	}

	pub(crate) fn replace(&self, token: AccessToken) {
		*self.0.write() = Some(token);
	}

	pub(crate) fn clear(&self) -> Option<AccessToken> {
		self.0.write().take()
	}

	pub(crate) fn holds(&self, token: &AccessToken) -> bool {
		self.0.read().as_ref() == Some(token)
	}
}
