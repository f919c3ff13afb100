//! Transport primitives for authorization and business calls.
//!
//! The module exposes [`ApiHttpClient`] alongside [`TransportErrorMapper`] so downstream
//! crates can integrate custom HTTP clients. Implementations return every HTTP response,
//! whatever its status, as `Ok`; only failures that never produced a usable response travel
//! through the error path, where the mapper turns them into gateway [`Error`] values.

pub use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};

// crates.io
use oauth2::http::{HeaderMap, header::CONTENT_TYPE};
// self
use crate::{_prelude::*, error::ConfigError, error::TransportError};

/// Abstraction over HTTP transports used by the token issuer and the executor.
///
/// The trait acts as the gateway's only dependency on an HTTP stack. Callers provide an
/// implementation (typically behind `Arc<T>` where `T: ApiHttpClient`) and the gateway
/// requests short-lived [`AsyncHttpClient`] handles for each exchange. Implementations must
/// be `Send + Sync + 'static` so one transport can be shared by the issuer and every executor,
/// and the handles they return must own whatever state is required so their request futures
/// remain `Send` for the lifetime of the in-flight call.
pub trait ApiHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle used for a single exchange.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds a handle for the next exchange.
	fn handle(&self) -> Self::Handle;
}

/// Maps HTTP transport failures into gateway [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a gateway error.
	///
	/// Failures that still carry a response status must keep it (see
	/// [`TransportError::network_with_status`]) so the executor can retry 5xx statuses.
	fn map_transport_error(&self, error: HttpClientError<E>) -> Error;
}

/// Free-form transport failure reported by [`HttpClientError::Other`].
#[derive(Debug, ThisError)]
#[error("{0}")]
pub struct TransportMessage(pub String);

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Configure timeouts on the wrapped client; the gateway itself never cancels a call.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiHttpClient for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn handle(&self) -> Self::Handle {
		ReqwestHandle(self.0.clone())
	}
}

/// Handle returned by [`ReqwestHttpClient`] that satisfies [`ApiHttpClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHandle(ReqwestClient);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, err: HttpClientError<ReqwestError>) -> Error {
		match err {
			HttpClientError::Reqwest(inner) if inner.is_builder() =>
				ConfigError::from(*inner).into(),
			HttpClientError::Reqwest(inner) => TransportError::from(*inner).into(),
			other => map_common_transport_error(other),
		}
	}
}

/// Maps the transport-independent [`HttpClientError`] variants.
pub fn map_common_transport_error<E>(err: HttpClientError<E>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Reqwest(inner) => TransportError::network(*inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) =>
			TransportError::network(TransportMessage(message)).into(),
		_ => TransportError::network(TransportMessage("Unknown HTTP client failure.".into()))
			.into(),
	}
}

/// Sends `request` through a fresh handle and maps transport failures.
pub(crate) async fn dispatch<C, M>(
	http_client: &C,
	mapper: &M,
	request: HttpRequest,
) -> Result<HttpResponse>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let handle = http_client.handle();

	handle.call(request).await.map_err(|err| mapper.map_transport_error(err))
}

/// Returns `true` when the response declares a JSON body.
pub(crate) fn is_json(headers: &HeaderMap) -> bool {
	headers
		.get(CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.is_some_and(|value| value.to_ascii_lowercase().contains("application/json"))
}

/// Returns the value of a response header as an owned string, if present and printable.
pub(crate) fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
	headers.get(name).and_then(|value| value.to_str().ok()).map(|value| value.trim().to_owned())
}

/// Decodes the response body as text, replacing invalid UTF-8 sequences.
pub(crate) fn body_text(response: &HttpResponse) -> String {
	String::from_utf8_lossy(response.body()).into_owned()
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::{HeaderValue, StatusCode};
	// self
	use super::*;

	#[test]
	fn json_detection_ignores_case_and_charset() {
		let mut headers = HeaderMap::new();

		assert!(!is_json(&headers));

		headers.insert(CONTENT_TYPE, HeaderValue::from_static("Application/JSON; charset=utf-8"));

		assert!(is_json(&headers));

		headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

		assert!(!is_json(&headers));
	}

	#[test]
	fn header_values_are_trimmed() {
		let mut headers = HeaderMap::new();

		headers.insert("cont_key", HeaderValue::from_static(" K1 "));

		assert_eq!(header_str(&headers, "cont_key").as_deref(), Some("K1"));
		assert_eq!(header_str(&headers, "cont_yn"), None);
	}

	#[test]
	fn body_text_is_lossy() {
		let mut response = HttpResponse::new(vec![b'o', b'k', 0xFF]);

		*response.status_mut() = StatusCode::OK;

		assert_eq!(body_text(&response), "ok\u{FFFD}");
	}

	#[test]
	fn common_mapper_keeps_io_and_messages() {
		let err = map_common_transport_error::<std::io::Error>(HttpClientError::Io(
			std::io::Error::other("socket closed"),
		));

		assert!(matches!(err, Error::Transport(TransportError::Io(_))));

		let err =
			map_common_transport_error::<std::io::Error>(HttpClientError::Other("boom".into()));

		assert!(matches!(err, Error::Transport(TransportError::Network { status: None, .. })));
	}
}
