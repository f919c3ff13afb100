//! Authenticated request execution with retry, reauth, and continuation handling.
//!
//! [`Executor::execute`] obtains a token from the shared [`TokenIssuer`], sends the call,
//! retries server failures under exponential backoff (forcing a token refresh according to
//! the configured [`ReauthPolicy`](crate::config::ReauthPolicy)), and follows `cont_yn` /
//! `cont_key` headers until the server stops paginating or the continuation cap is hit.

mod backoff;
mod continuation;
mod metrics;

pub use continuation::{CONT_KEY, CONT_YN};
pub use metrics::ExecutorMetrics;

// std
use std::ops::ControlFlow;
// crates.io
use oauth2::http::{
	HeaderMap, HeaderName, HeaderValue, Request,
	header::{AUTHORIZATION, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	config::GatewayConfig,
	error::ConfigError,
	http::{self, ApiHttpClient, HttpRequest, HttpResponse, TransportErrorMapper},
	issuer::{RevokeOutcome, TokenIssuer},
	obs::{self, CallKind, CallOutcome, CallSpan},
	pause::{Pause, TokioPause},
	request::{Continuation, PaginationOptions, RequestDescriptor},
	response::{self, ApiResponse},
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};
use backoff::Backoff;
use continuation::ContinuationState;

#[cfg(feature = "reqwest")]
/// Executor specialized for the crate's default reqwest transport stack.
pub type ReqwestExecutor = Executor<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Runs business calls on behalf of per-endpoint collaborators.
///
/// Executors are cheap to clone and may be used from many tasks at once; all of them share
/// the issuer's token, so concurrent retries never trigger more than one refresh.
pub struct Executor<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	config: GatewayConfig,
	issuer: Arc<TokenIssuer<C, M>>,
	http_client: Arc<C>,
	mapper: Arc<M>,
	pause: Arc<dyn Pause>,
	metrics: Arc<ExecutorMetrics>,
}
impl<C, M> Executor<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an executor that shares the issuer's configuration and transport.
	pub fn new(issuer: Arc<TokenIssuer<C, M>>) -> Result<Self> {
		let config = issuer.config().clone();
		let (http_client, mapper) = issuer.transport();

		Self::with_http_client(config, issuer, http_client, mapper)
	}

	/// Creates an executor with its own configuration and transport + mapper pair.
	///
	/// Fails with [`ConfigError`] when the base URL is invalid or not HTTPS.
	pub fn with_http_client(
		config: GatewayConfig,
		issuer: Arc<TokenIssuer<C, M>>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		config.base()?;

		Ok(Self {
			config,
			issuer,
			http_client: http_client.into(),
			mapper: mapper.into(),
			pause: Arc::new(TokioPause),
			metrics: Default::default(),
		})
	}

	/// Replaces the waiting primitive used for backoff and inter-page delays.
	pub fn with_pause(mut self, pause: impl 'static + Pause) -> Self {
		self.pause = Arc::new(pause);

		self
	}

	/// Shared token issuer.
	pub fn issuer(&self) -> &Arc<TokenIssuer<C, M>> {
		&self.issuer
	}

	/// Activity counters of this executor and its clones.
	pub fn metrics(&self) -> &Arc<ExecutorMetrics> {
		&self.metrics
	}

	/// Executes one logical call.
	///
	/// Returns [`ApiResponse::Single`] unless the server paginated, in which case every page
	/// is returned in order. Server failures exhaust into [`Error::TransientServer`]; other
	/// non-success statuses surface immediately as [`Error::ClientRequest`].
	pub async fn execute(
		&self,
		descriptor: &RequestDescriptor,
		pagination: &PaginationOptions,
	) -> Result<ApiResponse> {
		const KIND: CallKind = CallKind::Execute;

		let span = CallSpan::new(KIND, "execute").with_target(&descriptor.path);

		obs::record_call_outcome(KIND, CallOutcome::Attempt);
		self.metrics.record_call();

		let result = span.instrument(self.run(descriptor, pagination)).await;

		match &result {
			Ok(response) => {
				span.record_pages(response.pages().len());
				obs::record_call_outcome(KIND, CallOutcome::Success);
			},
			Err(_) => {
				obs::record_call_outcome(KIND, CallOutcome::Failure);
				self.metrics.record_failure();
			},
		}

		result
	}

	/// Revokes the shared token.
	pub async fn close(&self) -> Result<RevokeOutcome> {
		self.issuer.revoke_token().await
	}

	async fn run(
		&self,
		descriptor: &RequestDescriptor,
		pagination: &PaginationOptions,
	) -> Result<ApiResponse> {
		let url = self.resolve(descriptor)?;
		let body = descriptor.encode_body()?;
		let max_continuations =
			pagination.max_continuations.unwrap_or(self.config.pagination.max_continuations);
		let mut state =
			ContinuationState::new(pagination.start.clone().unwrap_or_default(), max_continuations);

		loop {
			let response = self.send_with_retry(descriptor, &url, &body, state.cursor()).await?;
			let next = Continuation {
				more: http::header_str(response.headers(), CONT_YN).as_deref() == Some("Y"),
				key: http::header_str(response.headers(), CONT_KEY).unwrap_or_default(),
			};

			match state.advance(response::decode_payload(&response), next) {
				ControlFlow::Break(outcome) => return Ok(outcome),
				ControlFlow::Continue(()) => {
					obs::continuation(state.count(), max_continuations);
					obs::record_continuation();
					self.metrics.record_continuation();
					self.pause.pause(self.config.pagination.page_delay).await;
				},
			}
		}
	}

	async fn send_with_retry(
		&self,
		descriptor: &RequestDescriptor,
		url: &Url,
		body: &[u8],
		cursor: &Continuation,
	) -> Result<HttpResponse> {
		let policy = &self.config.retry;
		let max_attempts = policy.max_attempts.max(1);
		let mut backoff = Backoff::new(policy);
		let mut token = self.issuer.get_token(false).await?;
		let mut attempt = 0;

		loop {
			attempt += 1;

			self.metrics.record_attempt();

			let request = self.build_request(descriptor, url, body, cursor, &token)?;
			let outcome =
				http::dispatch(self.http_client.as_ref(), self.mapper.as_ref(), request).await;
			let (status, failure_body, fallback) = match outcome {
				Ok(response) if response.status().is_success() => return Ok(response),
				Ok(response) if response.status().is_server_error() =>
					(response.status().as_u16(), http::body_text(&response), String::new()),
				Ok(response) => {
					let status = response.status().as_u16();
					let body = http::body_text(&response);

					obs::request_failed(Some(status), Some(&body));

					return Err(Error::ClientRequest {
						status,
						message: response::extract_message(&body, "Request rejected"),
						body,
					});
				},
				Err(Error::Transport(err)) if err.is_server_failure() => {
					let status = err.status().unwrap_or_default();

					(status, String::new(), err.to_string())
				},
				Err(err) => {
					obs::request_failed(err.status(), err.body());

					return Err(err);
				},
			};
			if attempt >= max_attempts {
				let message = response::extract_message(
					&failure_body,
					if fallback.is_empty() { "Server error" } else { &fallback },
				);

				obs::request_failed(Some(status), Some(&failure_body));

				return Err(Error::TransientServer {
					status,
					message,
					body: failure_body,
					attempts: attempt,
				});
			}

			let reauth = self.config.reauth.should_reauth(&failure_body);

			if reauth {
				token = self.issuer.renew(&token).await?;

				self.metrics.record_reauth();
			}

			let delay = backoff.next_delay();

			obs::server_retry(attempt, max_attempts, Some(status), reauth, delay);
			obs::record_retry(CallKind::Execute, reauth);
			self.metrics.record_retry();
			self.pause.pause(delay).await;
		}
	}

	fn resolve(&self, descriptor: &RequestDescriptor) -> Result<Url> {
		let mut url = self.config.endpoint(&descriptor.path)?;

		if !descriptor.query.is_empty() {
			url.query_pairs_mut().extend_pairs(&descriptor.query);
		}

		Ok(url)
	}

	fn build_request(
		&self,
		descriptor: &RequestDescriptor,
		url: &Url,
		body: &[u8],
		cursor: &Continuation,
		token: &AccessToken,
	) -> Result<HttpRequest> {
		let mut request = Request::builder()
			.method(descriptor.method.clone())
			.uri(url.as_str())
			.body(body.to_vec())
			.map_err(ConfigError::from)?;
		let headers = request.headers_mut();
		let mut authorization = HeaderValue::from_str(&token.authorization_header())
			.map_err(|err| ConfigError::from(oauth2::http::Error::from(err)))?;

		authorization.set_sensitive(true);
		headers.insert(AUTHORIZATION, authorization);
		headers.insert(CONTENT_TYPE, HeaderValue::from_static(descriptor.content_kind.mime()));

		for (name, value) in self.config.default_headers.iter().chain(&descriptor.headers) {
			set_header(headers, name, value)?;
		}

		set_header(headers, CONT_YN, cursor.flag())?;

		if !cursor.key.is_empty() {
			set_header(headers, CONT_KEY, &cursor.key)?;
		}

		Ok(request)
	}
}
#[cfg(feature = "reqwest")]
impl Executor<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a reqwest-backed issuer for `credentials` and an executor on top of it.
	pub fn connect(
		config: GatewayConfig,
		credentials: crate::auth::AppCredentials,
	) -> Result<Self> {
		Self::new(Arc::new(TokenIssuer::new(config, credentials)?))
	}
}
impl<C, M> Clone for Executor<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			issuer: self.issuer.clone(),
			http_client: self.http_client.clone(),
			mapper: self.mapper.clone(),
			pause: self.pause.clone(),
			metrics: self.metrics.clone(),
		}
	}
}
impl<C, M> Debug for Executor<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Executor")
			.field("base_url", &self.config.base_url)
			.field("issuer", &self.issuer)
			.field("metrics", &self.metrics)
			.finish()
	}
}

fn set_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), ConfigError> {
	let name = HeaderName::from_bytes(name.as_bytes()).map_err(oauth2::http::Error::from)?;
	let value = HeaderValue::from_str(value).map_err(oauth2::http::Error::from)?;

	headers.insert(name, value);

	Ok(())
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::{RecordingPause, build_reqwest_test_executor, test_config},
		request::ContentKind,
	};

	fn executor() -> (crate::_preludet::ReqwestTestExecutor, RecordingPause) {
		let (executor, _, pause) =
			build_reqwest_test_executor(test_config("https://127.0.0.1:9"), "key", "secret");

		(executor, pause)
	}

	fn token() -> AccessToken {
		AccessToken::new("tok", "Bearer", OffsetDateTime::now_utc() + Duration::hours(2))
	}

	#[test]
	fn headers_layer_defaults_extras_and_cursor() {
		let (executor, _) = executor();
		let descriptor = RequestDescriptor::post("/api/v1/trading/kr-stock/inquiry/balance")
			.with_header("Accept", "text/plain")
			.with_header("tr_cd", "T0001")
			.with_content_kind(ContentKind::Form);
		let url = executor.resolve(&descriptor).expect("Path should resolve.");
		let request = executor
			.build_request(&descriptor, &url, b"", &Continuation::resume("K1"), &token())
			.expect("Request should build.");
		let headers = request.headers();

		assert_eq!(headers[AUTHORIZATION], "Bearer tok");
		assert!(headers[AUTHORIZATION].is_sensitive());
		assert_eq!(headers[CONTENT_TYPE], "application/x-www-form-urlencoded");
		assert_eq!(headers["accept"], "text/plain");
		assert_eq!(headers.get_all("accept").iter().count(), 1);
		assert_eq!(headers["tr_cd"], "T0001");
		assert_eq!(headers[CONT_YN], "Y");
		assert_eq!(headers[CONT_KEY], "K1");
	}

	#[test]
	fn first_page_sends_no_key() {
		let (executor, _) = executor();
		let descriptor = RequestDescriptor::get("/quote").with_query("code", "005930");
		let url = executor.resolve(&descriptor).expect("Path should resolve.");
		let request = executor
			.build_request(&descriptor, &url, b"", &Continuation::default(), &token())
			.expect("Request should build.");

		assert_eq!(url.as_str(), "https://127.0.0.1:9/quote?code=005930");
		assert_eq!(request.headers()[CONT_YN], "N");
		assert!(request.headers().get(CONT_KEY).is_none());
	}

	#[tokio::test]
	async fn foreign_paths_fail_before_any_token_is_sent() {
		let (executor, pause) = executor();
		let err = executor
			.execute(
				&RequestDescriptor::get("//attacker.example.com/collect"),
				&PaginationOptions::default(),
			)
			.await
			.expect_err("Scheme-relative paths must be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::ForeignEndpoint { .. })));
		assert!(executor.issuer().store().is_empty());
		assert!(pause.recorded().is_empty());
	}

	#[test]
	fn invalid_header_names_are_config_errors() {
		let (executor, _) = executor();
		let descriptor = RequestDescriptor::get("/quote").with_header("bad header", "x");
		let url = executor.resolve(&descriptor).expect("Path should resolve.");
		let err = executor
			.build_request(&descriptor, &url, b"", &Continuation::default(), &token())
			.expect_err("Header names with spaces are invalid.");

		assert!(matches!(err, Error::Config(ConfigError::HttpRequest(_))));
	}
}
