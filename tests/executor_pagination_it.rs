#![cfg(feature = "reqwest")]

mod common;

// std
use std::{collections::BTreeMap, time::Duration as StdDuration};
// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use trading_gateway::{
	config::PaginationPolicy,
	executor::{CONT_KEY, CONT_YN},
	request::{PaginationOptions, RequestDescriptor},
	response::ApiResponse,
};

const INQUIRY_PATH: &str = "/api/v1/trading/kr-stock/inquiry/transaction-history";

fn page(number: u32) -> String {
	json!({"rsp_cd": "00000", "Out": {"page": number}}).to_string()
}

fn inquiry() -> RequestDescriptor {
	let data = BTreeMap::from([
		("QrySrtDt".to_owned(), "20240101".to_owned()),
		("QryEndDt".to_owned(), "20240131".to_owned()),
	]);

	RequestDescriptor::post(INQUIRY_PATH).with_data(&data)
}

#[tokio::test]
async fn continuation_keys_are_followed_in_order() {
	let server = MockServer::start_async().await;
	let token = common::mock_token(&server, "page-token").await;
	let first = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(INQUIRY_PATH)
				.header("authorization", "Bearer page-token")
				.header(CONT_YN, "N")
				.body_includes(r#""In""#);
			then.status(200)
				.header("content-type", "application/json")
				.header(CONT_YN, "Y")
				.header(CONT_KEY, "K1")
				.body(page(1));
		})
		.await;
	let second = server
		.mock_async(|when, then| {
			when.method(POST).path(INQUIRY_PATH).header(CONT_YN, "Y").header(CONT_KEY, "K1");
			then.status(200)
				.header("content-type", "application/json")
				.header(CONT_YN, "Y")
				.header(CONT_KEY, "K2")
				.body(page(2));
		})
		.await;
	let third = server
		.mock_async(|when, then| {
			when.method(POST).path(INQUIRY_PATH).header(CONT_YN, "Y").header(CONT_KEY, "K2");
			then.status(200)
				.header("content-type", "application/json")
				.header(CONT_YN, "N")
				.body(page(3));
		})
		.await;
	let (executor, _, pause) = common::build(common::config(&server));
	let response = executor
		.execute(&inquiry(), &PaginationOptions::default())
		.await
		.expect("Paginated inquiry should succeed.");

	assert!(response.is_paginated());
	assert!(response.all_succeeded());
	assert_eq!(
		response.into_pages(),
		(1..=3).map(|n| json!({"rsp_cd": "00000", "Out": {"page": n}})).collect::<Vec<_>>()
	);
	assert_eq!(pause.recorded(), vec![StdDuration::from_secs(1); 2]);
	assert_eq!(executor.metrics().continuations(), 2);

	token.assert_calls_async(1).await;
	first.assert_calls_async(1).await;
	second.assert_calls_async(1).await;
	third.assert_calls_async(1).await;
}

#[tokio::test]
async fn single_page_is_returned_unwrapped() {
	let server = MockServer::start_async().await;
	let _token = common::mock_token(&server, "single-token").await;
	let quote = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/v1/quote/kr-stock/inquiry/price")
				.query_param("code", "005930");
			then.status(200)
				.header("content-type", "application/json")
				.header(CONT_YN, "Y")
				.body(page(1));
		})
		.await;
	let (executor, _, pause) = common::build(common::config(&server));
	let response = executor
		.execute(
			&RequestDescriptor::get("/api/v1/quote/kr-stock/inquiry/price")
				.with_query("code", "005930"),
			&PaginationOptions::default(),
		)
		.await
		.expect("Quote should succeed.");

	assert_eq!(response, ApiResponse::Single(json!({"rsp_cd": "00000", "Out": {"page": 1}})));
	assert!(pause.recorded().is_empty());

	quote.assert_calls_async(1).await;
}

#[tokio::test]
async fn non_json_bodies_are_wrapped_as_text() {
	let server = MockServer::start_async().await;
	let _token = common::mock_token(&server, "text-token").await;
	let _plain = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/notice");
			then.status(200).header("content-type", "text/plain").body("market closed");
		})
		.await;
	let (executor, _, _) = common::build(common::config(&server));
	let response = executor
		.execute(&RequestDescriptor::post("/api/v1/notice"), &PaginationOptions::default())
		.await
		.expect("Plain-text reply should succeed.");

	assert_eq!(response, ApiResponse::Single(json!({"text": "market closed"})));
}

#[tokio::test]
async fn continuation_cap_stops_the_loop() {
	let server = MockServer::start_async().await;
	let _token = common::mock_token(&server, "cap-token").await;
	let endless = server
		.mock_async(|when, then| {
			when.method(POST).path(INQUIRY_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.header(CONT_YN, "Y")
				.header(CONT_KEY, "AGAIN")
				.body(page(0));
		})
		.await;
	let config = common::config(&server)
		.with_pagination(PaginationPolicy::default().with_max_continuations(3));
	let (executor, _, pause) = common::build(config);
	let response = executor
		.execute(&inquiry(), &PaginationOptions::default())
		.await
		.expect("Capped inquiry should succeed.");

	assert_eq!(response.pages().len(), 4);
	assert_eq!(pause.recorded().len(), 3);

	endless.assert_calls_async(4).await;

	let response = executor
		.execute(&inquiry(), &PaginationOptions::default().with_max_continuations(1))
		.await
		.expect("Per-call cap should apply.");

	assert_eq!(response.pages().len(), 2);
}

#[tokio::test]
async fn base_path_prefix_reaches_every_endpoint() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/gateway/oauth2/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"prefixed","token_type":"Bearer"}"#);
		})
		.await;
	let prefixed = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(format!("/gateway{INQUIRY_PATH}"))
				.header("authorization", "Bearer prefixed");
			then.status(200).header("content-type", "application/json").body(page(1));
		})
		.await;
	let bare = server
		.mock_async(|when, then| {
			when.method(POST).path(INQUIRY_PATH);
			then.status(200).header("content-type", "application/json").body(page(9));
		})
		.await;
	let config = common::config(&server)
		.with_base_url(format!("{}/gateway", common::base_url(&server)));
	let (executor, _, _) = common::build(config);
	let response = executor
		.execute(&inquiry(), &PaginationOptions::default())
		.await
		.expect("Prefixed inquiry should succeed.");

	assert_eq!(response.into_single(), Some(json!({"rsp_cd": "00000", "Out": {"page": 1}})));

	token.assert_calls_async(1).await;
	prefixed.assert_calls_async(1).await;
	bare.assert_calls_async(0).await;
}

#[tokio::test]
async fn resumed_cursor_sends_key_on_first_call() {
	let server = MockServer::start_async().await;
	let _token = common::mock_token(&server, "resume-token").await;
	let resumed = server
		.mock_async(|when, then| {
			when.method(POST).path(INQUIRY_PATH).header(CONT_YN, "Y").header(CONT_KEY, "K7");
			then.status(200)
				.header("content-type", "application/json")
				.header(CONT_YN, "N")
				.body(page(7));
		})
		.await;
	let (executor, _, _) = common::build(common::config(&server));
	let response = executor
		.execute(&inquiry(), &PaginationOptions::resume("K7"))
		.await
		.expect("Resumed inquiry should succeed.");

	assert_eq!(response.into_single(), Some(json!({"rsp_cd": "00000", "Out": {"page": 7}})));

	resumed.assert_calls_async(1).await;
}
