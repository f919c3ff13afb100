//! Runs a paginated inquiry against a local mock of the brokerage OpenAPI: one token
//! issuance, two continuation round trips, and a revoke on shutdown.

// std
use std::time::Duration;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use trading_gateway::{
	auth::AppCredentials,
	config::{GatewayConfig, PaginationPolicy},
	executor::{CONT_KEY, CONT_YN, ReqwestExecutor},
	request::{PaginationOptions, RequestDescriptor},
	response,
	serde_json::json,
};

const HISTORY_PATH: &str = "/api/v1/trading/kr-stock/inquiry/transaction-history";

// The first page is matched on `cont_yn: N`, later pages on the key they resume from.
async fn mock_page<'a>(
	server: &'a MockServer,
	cursor: &str,
	next: &str,
	page: u32,
) -> httpmock::Mock<'a> {
	let (match_name, match_value) =
		if cursor.is_empty() { (CONT_YN, "N") } else { (CONT_KEY, cursor) };
	let more = if next.is_empty() { "N" } else { "Y" };
	let body = json!({"rsp_cd": "00000", "Out1": [{"TrdDt": "20240102", "Page": page}]});

	server
		.mock_async(|when, then| {
			when.method(POST).path(HISTORY_PATH).header(match_name, match_value);
			then.status(200)
				.header("content-type", "application/json")
				.header(CONT_YN, more)
				.header(CONT_KEY, next)
				.body(body.to_string());
		})
		.await
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"expires_in\":86400}",
			);
		})
		.await;
	let revoke_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/revoke");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"code\":200,\"message\":\"revoked\"}");
		})
		.await;

	let pages = [
		mock_page(&server, "", "K1", 1).await,
		mock_page(&server, "K1", "K2", 2).await,
		mock_page(&server, "K2", "", 3).await,
	];

	let config = GatewayConfig::default()
		.with_base_url(format!("http://{}", server.address()))
		.with_pagination(PaginationPolicy::default().with_page_delay(Duration::from_millis(200)));
	let executor =
		ReqwestExecutor::connect(config, AppCredentials::new("demo-app-key", "demo-app-secret"))?;
	let inquiry = RequestDescriptor::post(HISTORY_PATH).with_data(
		&[("QrySrtDt", "20240101"), ("QryEndDt", "20240131")]
			.into_iter()
			.map(|(key, value)| (key.to_owned(), value.to_owned()))
			.collect::<std::collections::BTreeMap<_, _>>(),
	);
	let result = executor.execute(&inquiry, &PaginationOptions::default()).await?;

	for payload in result.pages() {
		println!("{} -> {}", response::response_code(payload).unwrap_or("?"), payload["Out1"]);
	}

	let outcome = executor.close().await?;

	println!("Revoked: {}.", outcome.is_revoked());

	token_mock.assert_async().await;
	revoke_mock.assert_async().await;

	for page in pages {
		page.assert_async().await;
	}

	Ok(())
}
