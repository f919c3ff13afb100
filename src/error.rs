//! Gateway-level error types shared by the token issuer, the executor, and transports.

// self
use crate::_prelude::*;

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
///
/// Every variant that originates from an HTTP exchange keeps the status code and the raw
/// response body so callers can diagnose failures without re-issuing the call.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeouts).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Authorization endpoint reply could not be decoded.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// Credential exchange failed after the issuance retry budget.
	#[error(transparent)]
	TokenIssuance(#[from] TokenError),

	/// Business endpoint kept answering with a 5xx status until the retry budget ran out.
	#[error("Server failed with status {status} after {attempts} attempts: {message}.")]
	TransientServer {
		/// HTTP status code of the last response.
		status: u16,
		/// Message extracted from the last response body.
		message: String,
		/// Raw body of the last response.
		body: String,
		/// Total number of attempts performed.
		attempts: u32,
	},
	/// Business endpoint rejected the request; never retried.
	#[error("Request was rejected with status {status}: {message}.")]
	ClientRequest {
		/// HTTP status code returned by the endpoint.
		status: u16,
		/// Message extracted from the response body.
		message: String,
		/// Raw response body.
		body: String,
	},
}
impl Error {
	/// HTTP status code carried by the error, when one was observed.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::TransientServer { status, .. } | Self::ClientRequest { status, .. } =>
				Some(*status),
			Self::TokenIssuance(err) => err.status,
			Self::Transport(err) => err.status(),
			Self::Decode(err) => Some(err.status()),
			Self::Config(_) => None,
		}
	}

	/// Raw response body carried by the error, when one was observed.
	pub fn body(&self) -> Option<&str> {
		match self {
			Self::TransientServer { body, .. } | Self::ClientRequest { body, .. } => Some(body),
			Self::TokenIssuance(err) => err.body.as_deref(),
			Self::Decode(err) => Some(err.body()),
			Self::Config(_) | Self::Transport(_) => None,
		}
	}
}

/// Structured failure of the client-credentials exchange.
///
/// `status` is `None` when the last attempt never produced an HTTP response.
#[derive(Debug, ThisError)]
#[error("Token issuance failed after {attempts} attempts: {message}.")]
pub struct TokenError {
	/// HTTP status code of the last attempt, when available.
	pub status: Option<u16>,
	/// Message parsed from the authorization endpoint reply.
	pub message: String,
	/// Raw reply body of the last attempt, when available.
	pub body: Option<String>,
	/// Total number of attempts performed.
	pub attempts: u32,
	/// Transport failure behind the last attempt, if any.
	#[source]
	pub source: Option<TransportError>,
}
impl TokenError {
	/// Returns `true` when the last attempt was rejected with a 4xx status, which points at
	/// bad credentials rather than infrastructure trouble.
	pub fn is_credential_problem(&self) -> bool {
		self.status.is_some_and(|status| (400..500).contains(&status) && status != 429)
	}
}

/// Configuration and validation failures raised by the gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Base URL or endpoint path cannot be parsed.
	#[error("Endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request path would leave the configured base URL's origin.
	#[error("Request path must be relative to the base URL: {path}.")]
	ForeignEndpoint {
		/// Offending request path.
		path: String,
	},
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	BodySerialization {
		/// Underlying serializer failure.
		#[source]
		source: serde_json::Error,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for ConfigError {
	fn from(e: reqwest::Error) -> Self {
		Self::http_client_build(e)
	}
}

/// Authorization endpoint replies that did not match the expected JSON shape.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Token endpoint returned malformed JSON.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the reply.
		status: u16,
		/// Raw reply body.
		body: String,
	},
	/// Revoke endpoint returned malformed JSON.
	#[error("Revoke endpoint returned malformed JSON.")]
	RevokeResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the reply.
		status: u16,
		/// Raw reply body.
		body: String,
	},
}
impl DecodeError {
	/// HTTP status code of the undecodable reply.
	pub fn status(&self) -> u16 {
		match self {
			Self::TokenResponse { status, .. } | Self::RevokeResponse { status, .. } => *status,
		}
	}

	/// Raw body of the undecodable reply.
	pub fn body(&self) -> &str {
		match self {
			Self::TokenResponse { body, .. } | Self::RevokeResponse { body, .. } => body,
		}
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the remote API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
		/// Status code attached to the failure, when the transport observed a response.
		status: Option<u16>,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the remote API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src), status: None }
	}

	/// Wraps a transport-specific network error that carries a response status.
	pub fn network_with_status(
		src: impl 'static + Send + Sync + std::error::Error,
		status: Option<u16>,
	) -> Self {
		Self::Network { source: Box::new(src), status }
	}

	/// Response status attached to the failure, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Network { status, .. } => *status,
			Self::Io(_) => None,
		}
	}

	/// Returns `true` when the failure carries a 5xx response status.
	pub fn is_server_failure(&self) -> bool {
		matches!(self, Self::Network { status: Some(status), .. } if (500..600).contains(status))
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		let status = e.status().map(|code| code.as_u16());

		Self::network_with_status(e, status)
	}
}
