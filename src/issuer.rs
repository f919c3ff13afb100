//! Client-credentials token issuer with singleflight refresh.
//!
//! [`TokenIssuer`] owns the app credentials and the [`TokenStore`] mutation rights. Readers
//! check the store without waiting on anyone; issuance is serialized by one async lock that
//! is held across the network round trip and followed by a re-check, so any number of
//! callers that discover an expired token at the same time share a single exchange.

mod wire;

pub use wire::{DEFAULT_EXPIRES_IN_SECS, RevokeOutcome};

// crates.io
use oauth2::http::{
	Method, Request,
	header::{ACCEPT, CONTENT_TYPE},
};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, AppCredentials, TokenStore},
	config::GatewayConfig,
	error::{ConfigError, DecodeError, TokenError, TransportError},
	http::{self, ApiHttpClient, HttpRequest, HttpResponse, TransportErrorMapper},
	obs::{self, CallKind, CallOutcome, CallSpan},
	pause::{Pause, TokioPause},
	response,
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};
use wire::{RevokeReply, TokenReply};

#[cfg(feature = "reqwest")]
/// Issuer specialized for the crate's default reqwest transport stack.
pub type ReqwestTokenIssuer = TokenIssuer<ReqwestHttpClient, ReqwestTransportErrorMapper>;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Obtains, caches, renews, and revokes the bearer token shared by every executor.
///
/// Share one issuer per credential pair behind an [`Arc`]; every executor built on it reuses
/// the same token and the same issuance lock.
pub struct TokenIssuer<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	config: GatewayConfig,
	credentials: AppCredentials,
	token_endpoint: Url,
	revoke_endpoint: Url,
	store: Arc<TokenStore>,
	issue_lock: AsyncMutex<()>,
	http_client: Arc<C>,
	mapper: Arc<M>,
	pause: Arc<dyn Pause>,
}
impl<C, M> TokenIssuer<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an issuer that reuses the caller-provided transport + mapper pair.
	///
	/// Fails with [`ConfigError`] when the token or revoke endpoint cannot be resolved or is
	/// not HTTPS.
	pub fn with_http_client(
		config: GatewayConfig,
		credentials: AppCredentials,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let token_endpoint = config.token_endpoint()?;
		let revoke_endpoint = config.revoke_endpoint()?;

		Ok(Self {
			config,
			credentials,
			token_endpoint,
			revoke_endpoint,
			store: Default::default(),
			issue_lock: AsyncMutex::new(()),
			http_client: http_client.into(),
			mapper: mapper.into(),
			pause: Arc::new(TokioPause),
		})
	}

	/// Replaces the waiting primitive used between issuance attempts.
	pub fn with_pause(mut self, pause: impl 'static + Pause) -> Self {
		self.pause = Arc::new(pause);

		self
	}

	/// Replaces the token store, e.g. to seed a token obtained earlier.
	pub fn with_store(mut self, store: Arc<TokenStore>) -> Self {
		self.store = store;

		self
	}

	/// Shared token store.
	pub fn store(&self) -> &Arc<TokenStore> {
		&self.store
	}

	/// Configuration the issuer was built with.
	pub fn config(&self) -> &GatewayConfig {
		&self.config
	}

	pub(crate) fn transport(&self) -> (Arc<C>, Arc<M>) {
		(self.http_client.clone(), self.mapper.clone())
	}

	/// Returns a valid token, issuing one when the cached token is missing or near expiry.
	///
	/// With `force_refresh` the cached token is ignored and a new one is always issued.
	/// Concurrent callers that find the token invalid wait on the same lock and re-check after
	/// acquiring it, so only the first one reaches the token endpoint.
	pub async fn get_token(&self, force_refresh: bool) -> Result<AccessToken> {
		if let Some(token) = self.cached(force_refresh) {
			return Ok(token);
		}

		let _singleflight = self.issue_lock.lock().await;

		if let Some(token) = self.cached(force_refresh) {
			return Ok(token);
		}

		self.issue_instrumented("get_token").await
	}

	/// Forces a refresh after `stale` was rejected by the server.
	///
	/// If another caller already replaced `stale` while this one waited for the lock, the
	/// current token is returned instead of issuing again.
	pub async fn renew(&self, stale: &AccessToken) -> Result<AccessToken> {
		let _singleflight = self.issue_lock.lock().await;

		if let Some(token) = self.cached(self.store.holds(stale)) {
			return Ok(token);
		}

		self.issue_instrumented("renew").await
	}

	/// Runs the client-credentials exchange unconditionally and stores the result.
	pub async fn request_token(&self) -> Result<AccessToken> {
		let _singleflight = self.issue_lock.lock().await;

		self.issue_instrumented("request_token").await
	}

	/// Returns the `Authorization` header value for a valid token, issuing one if needed.
	pub async fn authorization_header(&self) -> Result<String> {
		Ok(self.get_token(false).await?.authorization_header())
	}

	/// Revokes the held token at the authorization endpoint.
	///
	/// The store is cleared only when the endpoint answers with `code == 200`. Without a held
	/// token the call is skipped and [`RevokeOutcome::no_token`] is returned.
	pub async fn revoke_token(&self) -> Result<RevokeOutcome> {
		const KIND: CallKind = CallKind::RevokeToken;

		let _singleflight = self.issue_lock.lock().await;
		let Some(token) = self.store.snapshot() else {
			obs::revoke_skipped();

			return Ok(RevokeOutcome::no_token());
		};
		let span = CallSpan::new(KIND, "revoke_token");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.revoke(&token)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	fn cached(&self, bypass: bool) -> Option<AccessToken> {
		if bypass { None } else { self.store.valid_snapshot_at(OffsetDateTime::now_utc()) }
	}

	async fn issue_instrumented(&self, stage: &'static str) -> Result<AccessToken> {
		const KIND: CallKind = CallKind::IssueToken;

		let span = CallSpan::new(KIND, stage);

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.issue()).await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	// Caller must hold `issue_lock`.
	async fn issue(&self) -> Result<AccessToken> {
		let policy = &self.config.token_retry;
		let max_attempts = policy.max_attempts.max(1);
		let mut attempt = 0;

		loop {
			attempt += 1;

			let failure = match self.exchange().await? {
				Ok(token) => {
					self.store.replace(token.clone());
					obs::token_issued(token.token_type(), token.expires_at());

					return Ok(token);
				},
				Err(failure) => failure,
			};

			if !failure.is_retryable() || attempt >= max_attempts {
				let err = failure.into_token_error(attempt);

				obs::token_failed(err.status, &err.message);

				return Err(err.into());
			}

			obs::token_retry(attempt, max_attempts, failure.status(), policy.wait);
			obs::record_retry(CallKind::IssueToken, false);

			self.pause.pause(policy.wait).await;
		}
	}

	// Outer error: not worth retrying (bad configuration, undecodable reply).
	// Inner error: one failed attempt.
	async fn exchange(&self) -> Result<Result<AccessToken, IssueFailure>> {
		let request = form_request(
			&self.token_endpoint,
			&[
				("grant_type", "client_credentials"),
				("appkey", self.credentials.app_key()),
				("appsecretkey", self.credentials.app_secret().expose()),
				("scope", &self.config.scope),
			],
		)?;
		let response = match self.send(request).await {
			Ok(response) => response,
			Err(Error::Transport(err)) => return Ok(Err(IssueFailure::Transport(err))),
			Err(err) => return Err(err),
		};
		let status = response.status().as_u16();

		if !response.status().is_success() {
			return Ok(Err(IssueFailure::Rejected { status, body: http::body_text(&response) }));
		}

		let reply: TokenReply = decode(&response).map_err(|source| {
			DecodeError::TokenResponse { source, status, body: http::body_text(&response) }
		})?;

		if reply.access_token.is_empty() || reply.token_type.is_empty() {
			return Ok(Err(IssueFailure::Rejected { status, body: http::body_text(&response) }));
		}

		let expires_at =
			OffsetDateTime::now_utc().saturating_add(Duration::seconds(reply.expires_in));

		Ok(Ok(AccessToken::new(reply.access_token, reply.token_type, expires_at)))
	}

	async fn revoke(&self, token: &AccessToken) -> Result<RevokeOutcome> {
		let request = form_request(
			&self.revoke_endpoint,
			&[
				("appkey", self.credentials.app_key()),
				("appsecretkey", self.credentials.app_secret().expose()),
				("token", token.value().expose()),
				("token_type_hint", "access_token"),
			],
		)?;
		let response = self.send(request).await?;
		let status = response.status().as_u16();

		if !response.status().is_success() {
			let body = http::body_text(&response);
			let message = response::extract_message(&body, "Revoke request failed");

			obs::request_failed(Some(status), Some(&body));

			return Err(if response.status().is_server_error() {
				Error::TransientServer { status, message, body, attempts: 1 }
			} else {
				Error::ClientRequest { status, message, body }
			});
		}

		let decode_error = |source| DecodeError::RevokeResponse {
			source,
			status,
			body: http::body_text(&response),
		};
		let raw: JsonValue = decode(&response).map_err(decode_error)?;
		let reply: RevokeReply = serde_path_to_error::deserialize(&raw).map_err(decode_error)?;
		let outcome = RevokeOutcome { code: reply.code, message: reply.message, raw };
		let cleared = outcome.is_revoked();

		if cleared {
			self.store.clear();
		}

		obs::token_revoked(outcome.code, cleared);

		Ok(outcome)
	}

	async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
		http::dispatch(self.http_client.as_ref(), self.mapper.as_ref(), request).await
	}
}
#[cfg(feature = "reqwest")]
impl TokenIssuer<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates an issuer backed by a default reqwest transport.
	pub fn new(config: GatewayConfig, credentials: AppCredentials) -> Result<Self> {
		Self::with_http_client(
			config,
			credentials,
			ReqwestHttpClient::default(),
			ReqwestTransportErrorMapper,
		)
	}
}
impl<C, M> Debug for TokenIssuer<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenIssuer")
			.field("token_endpoint", &self.token_endpoint.as_str())
			.field("revoke_endpoint", &self.revoke_endpoint.as_str())
			.field("credentials", &self.credentials)
			.field("store", &self.store)
			.finish()
	}
}

/// One failed issuance attempt.
#[derive(Debug)]
enum IssueFailure {
	/// The endpoint answered, but not with a usable token.
	Rejected { status: u16, body: String },
	/// No usable response.
	Transport(TransportError),
}
impl IssueFailure {
	fn status(&self) -> Option<u16> {
		match self {
			Self::Rejected { status, .. } => Some(*status),
			Self::Transport(err) => err.status(),
		}
	}

	// Rate limits and server trouble clear up with time; other 4xx point at the credentials.
	fn is_retryable(&self) -> bool {
		match self {
			Self::Rejected { status, .. } => *status >= 500 || *status == 429,
			Self::Transport(_) => true,
		}
	}

	fn into_token_error(self, attempts: u32) -> TokenError {
		match self {
			Self::Rejected { status, body } => TokenError {
				status: Some(status),
				message: response::extract_message(&body, "Token endpoint returned no token"),
				body: Some(body),
				attempts,
				source: None,
			},
			Self::Transport(err) => TokenError {
				status: err.status(),
				message: err.to_string(),
				body: None,
				attempts,
				source: Some(err),
			},
		}
	}
}

fn form_request(endpoint: &Url, pairs: &[(&str, &str)]) -> Result<HttpRequest> {
	let body = form_urlencoded::Serializer::new(String::new()).extend_pairs(pairs).finish();

	Request::builder()
		.method(Method::POST)
		.uri(endpoint.as_str())
		.header(CONTENT_TYPE, FORM_CONTENT_TYPE)
		.header(ACCEPT, "application/json")
		.body(body.into_bytes())
		.map_err(|err| ConfigError::from(err).into())
}

fn decode<T>(response: &HttpResponse) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
where
	T: for<'de> Deserialize<'de>,
{
	let mut deserializer = serde_json::Deserializer::from_slice(response.body());

	serde_path_to_error::deserialize(&mut deserializer)
}
