#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
// self
use trading_gateway::{
	auth::AppCredentials,
	config::GatewayConfig,
	executor::ReqwestExecutor,
	issuer::ReqwestTokenIssuer,
	pause::RecordingPause,
};

pub const APP_KEY: &str = "app-key-it";
pub const APP_SECRET: &str = "app-secret-it";
pub const TOKEN_PATH: &str = "/oauth2/token";
pub const REVOKE_PATH: &str = "/oauth2/revoke";

// `base_url()` is HTTPS with a self-signed certificate; plain HTTP on loopback passes the
// endpoint check.
pub fn base_url(server: &MockServer) -> String {
	format!("http://{}", server.address())
}

pub fn config(server: &MockServer) -> GatewayConfig {
	GatewayConfig::default().with_base_url(base_url(server))
}

pub fn build(config: GatewayConfig) -> (ReqwestExecutor, Arc<ReqwestTokenIssuer>, RecordingPause) {
	let pause = RecordingPause::default();
	let issuer = Arc::new(
		ReqwestTokenIssuer::new(config, AppCredentials::new(APP_KEY, APP_SECRET))
			.expect("Token issuer should build against the mock server.")
			.with_pause(pause.clone()),
	);
	let executor = ReqwestExecutor::new(issuer.clone())
		.expect("Executor should build against the mock server.")
		.with_pause(pause.clone());

	(executor, issuer, pause)
}

pub async fn mock_token<'a>(server: &'a MockServer, token: &str) -> httpmock::Mock<'a> {
	let body = format!(r#"{{"access_token":"{token}","token_type":"Bearer","expires_in":86400}}"#);

	server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TOKEN_PATH)
				.header("content-type", "application/x-www-form-urlencoded")
				.body_includes("grant_type=client_credentials");
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await
}
