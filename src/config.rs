//! Gateway configuration: endpoints, default headers, and retry/pagination/reauth policies.
//!
//! [`GatewayConfig`] is plain data (serde-friendly, `#[serde(default)]`) so it can be loaded
//! from any format the embedding application already uses. Validation happens when the
//! token issuer or executor is constructed, through [`GatewayConfig::endpoint`].

mod policy;

pub use policy::*;

// std
use std::net::IpAddr;
// self
use crate::{_prelude::*, error::ConfigError};

/// Production base URL of the brokerage OpenAPI.
pub const DEFAULT_BASE_URL: &str = "https://openapi.dbsec.co.kr:8443";
/// Path of the client-credentials token endpoint.
pub const DEFAULT_TOKEN_PATH: &str = "/oauth2/token";
/// Path of the token revocation endpoint.
pub const DEFAULT_REVOKE_PATH: &str = "/oauth2/revoke";
/// Scope requested during the client-credentials exchange.
pub const DEFAULT_SCOPE: &str = "oob";

/// Complete configuration shared by the token issuer and the request executor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
	/// Scheme + authority every endpoint path is joined onto.
	pub base_url: String,
	/// Token endpoint path.
	pub token_path: String,
	/// Revoke endpoint path.
	pub revoke_path: String,
	/// Scope sent with the client-credentials exchange.
	pub scope: String,
	/// Headers attached to every business call before per-request headers.
	pub default_headers: BTreeMap<String, String>,
	/// Backoff policy for business calls answered with 5xx.
	pub retry: RetryPolicy,
	/// Fixed-wait policy for the token endpoint.
	pub token_retry: TokenRetryPolicy,
	/// Continuation limits.
	pub pagination: PaginationPolicy,
	/// When a server failure forces a token refresh.
	pub reauth: ReauthPolicy,
}
impl GatewayConfig {
	/// Overrides the base URL.
	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into();

		self
	}

	/// Overrides the token and revoke endpoint paths.
	pub fn with_auth_paths(
		mut self,
		token_path: impl Into<String>,
		revoke_path: impl Into<String>,
	) -> Self {
		self.token_path = token_path.into();
		self.revoke_path = revoke_path.into();

		self
	}

	/// Overrides the requested scope.
	pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = scope.into();

		self
	}

	/// Adds a header sent with every business call.
	pub fn with_default_header(
		mut self,
		name: impl Into<String>,
		value: impl Into<String>,
	) -> Self {
		self.default_headers.insert(name.into(), value.into());

		self
	}

	/// Overrides the business-call retry policy.
	pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;

		self
	}

	/// Overrides the token endpoint retry policy.
	pub fn with_token_retry(mut self, token_retry: TokenRetryPolicy) -> Self {
		self.token_retry = token_retry;

		self
	}

	/// Overrides the pagination policy.
	pub fn with_pagination(mut self, pagination: PaginationPolicy) -> Self {
		self.pagination = pagination;

		self
	}

	/// Overrides the reauth policy.
	pub fn with_reauth(mut self, reauth: ReauthPolicy) -> Self {
		self.reauth = reauth;

		self
	}

	/// Validated base URL.
	pub fn base(&self) -> Result<Url, ConfigError> {
		let url = Url::parse(&self.base_url)
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;

		validate_endpoint(&url)?;

		Ok(url)
	}

	/// Appends `path` to the base URL, keeping any path prefix the base carries.
	///
	/// `path` must be a plain path; scheme-relative (`//host/..`) and absolute URLs are
	/// rejected with [`ConfigError::ForeignEndpoint`] so the bearer token never leaves the
	/// configured origin.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		if path.starts_with("//") || Url::parse(path).is_ok_and(|url| url.has_host()) {
			return Err(ConfigError::ForeignEndpoint { path: path.into() });
		}

		let mut url = self.base()?;
		let prefix = url.path().trim_end_matches('/').to_owned();

		url.set_query(None);
		url.set_fragment(None);
		url.set_path(&format!("{prefix}/{}", path.trim_start_matches('/')));

		Ok(url)
	}

	/// Token endpoint URL.
	pub fn token_endpoint(&self) -> Result<Url, ConfigError> {
		self.endpoint(&self.token_path)
	}

	/// Revoke endpoint URL.
	pub fn revoke_endpoint(&self) -> Result<Url, ConfigError> {
		self.endpoint(&self.revoke_path)
	}
}
impl Default for GatewayConfig {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.into(),
			token_path: DEFAULT_TOKEN_PATH.into(),
			revoke_path: DEFAULT_REVOKE_PATH.into(),
			scope: DEFAULT_SCOPE.into(),
			default_headers: BTreeMap::from([("Accept".into(), "application/json".into())]),
			retry: RetryPolicy::default(),
			token_retry: TokenRetryPolicy::default(),
			pagination: PaginationPolicy::default(),
			reauth: ReauthPolicy::default(),
		}
	}
}

fn validate_endpoint(url: &Url) -> Result<(), ConfigError> {
	if url.scheme() == "https" || is_loopback(url) {
		Ok(())
	} else {
		Err(ConfigError::InsecureEndpoint { url: url.to_string() })
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
		Some(url::Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
		None => false,
	}
}
