//! Authenticated request execution core for brokerage OpenAPI clients.
//!
//! A shared [`issuer::TokenIssuer`] keeps one client-credentials token alive for every caller,
//! and [`executor::Executor`] runs business calls with backoff, transparent reauth, and
//! continuation-key pagination on top of it.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod executor;
pub mod http;
pub mod issuer;
pub mod obs;
pub mod pause;
pub mod request;
pub mod response;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::{_prelude::*, pause::RecordingPause};

	// self
	use crate::{
		auth::AppCredentials,
		config::GatewayConfig,
		executor::Executor,
		http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
		issuer::TokenIssuer,
	};

	/// Executor type alias used by reqwest-backed integration tests.
	pub type ReqwestTestExecutor = Executor<ReqwestHttpClient, ReqwestTransportErrorMapper>;
	/// Issuer type alias used by reqwest-backed integration tests.
	pub type ReqwestTestIssuer = TokenIssuer<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Default gateway configuration pointed at a mock server.
	pub fn test_config(base_url: &str) -> GatewayConfig {
		GatewayConfig::default().with_base_url(base_url)
	}

	/// Constructs an [`Executor`] and its shared [`TokenIssuer`] backed by the reqwest
	/// transport and a [`RecordingPause`], so retry and pagination waits never block tests.
	pub fn build_reqwest_test_executor(
		config: GatewayConfig,
		app_key: &str,
		app_secret: &str,
	) -> (ReqwestTestExecutor, Arc<ReqwestTestIssuer>, RecordingPause) {
		let pause = RecordingPause::default();
		let http_client = Arc::new(test_reqwest_http_client());
		let mapper = Arc::new(ReqwestTransportErrorMapper);
		let credentials = AppCredentials::new(app_key, app_secret);
		let issuer = Arc::new(
			TokenIssuer::with_http_client(
				config.clone(),
				credentials,
				http_client.clone(),
				mapper.clone(),
			)
			.expect("Token issuer should build from the test configuration.")
			.with_pause(pause.clone()),
		);
		let executor =
			Executor::with_http_client(config, issuer.clone(), http_client, mapper)
				.expect("Executor should build from the test configuration.")
				.with_pause(pause.clone());

		(executor, issuer, pause)
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map as JsonMap, Value as JsonValue};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use serde_json;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
