//! Result shapes returned by the executor and helpers for the service's JSON envelope.

// self
use crate::{_prelude::*, http};

/// Response-code value that signals success inside a business payload.
pub const SUCCESS_CODE: &str = "00000";

const MESSAGE_PREVIEW_LIMIT: usize = 256;
const MESSAGE_FIELDS: [&str; 4] = ["error_description", "error", "rsp_msg", "message"];

/// Outcome of one logical call.
///
/// A call that never followed a continuation key yields [`ApiResponse::Single`]; once at least
/// one continuation happened every page, the final one included, is returned in order inside
/// [`ApiResponse::Pages`].
#[derive(Clone, Debug, PartialEq)]
pub enum ApiResponse {
	/// Payload of a non-paginated call, unwrapped.
	Single(JsonValue),
	/// Ordered payloads of a paginated call.
	Pages(Vec<JsonValue>),
}
impl ApiResponse {
	/// Returns `true` if the call spanned more than one round trip.
	pub fn is_paginated(&self) -> bool {
		matches!(self, Self::Pages(_))
	}

	/// Borrows every payload in order.
	pub fn pages(&self) -> &[JsonValue] {
		match self {
			Self::Single(payload) => std::slice::from_ref(payload),
			Self::Pages(pages) => pages,
		}
	}

	/// Consumes the response and returns every payload in order.
	pub fn into_pages(self) -> Vec<JsonValue> {
		match self {
			Self::Single(payload) => vec![payload],
			Self::Pages(pages) => pages,
		}
	}

	/// Returns the bare payload of a non-paginated call.
	pub fn into_single(self) -> Option<JsonValue> {
		match self {
			Self::Single(payload) => Some(payload),
			Self::Pages(_) => None,
		}
	}

	/// Returns `true` if every payload carries the success response code.
	pub fn all_succeeded(&self) -> bool {
		self.pages().iter().all(is_success_code)
	}
}

/// Reads the `rsp_cd` response-code field of a payload.
pub fn response_code(payload: &JsonValue) -> Option<&str> {
	payload.get("rsp_cd").and_then(JsonValue::as_str)
}

/// Returns `true` if the payload's response code is [`SUCCESS_CODE`].
pub fn is_success_code(payload: &JsonValue) -> bool {
	response_code(payload) == Some(SUCCESS_CODE)
}

/// Decodes a response body: JSON when declared (and well-formed), otherwise `{"text": body}`.
pub(crate) fn decode_payload(response: &http::HttpResponse) -> JsonValue {
	http::is_json(response.headers())
		.then(|| serde_json::from_slice::<JsonValue>(response.body()).ok())
		.flatten()
		.unwrap_or_else(|| serde_json::json!({ "text": http::body_text(response) }))
}

/// Extracts a human-readable message from an error body.
///
/// Structured fields win (`error_description`, `error`, `rsp_msg`, `message`); otherwise the
/// raw body is used, truncated to a short preview. An empty body falls back to `fallback`.
pub(crate) fn extract_message(body: &str, fallback: &str) -> String {
	if let Ok(JsonValue::Object(map)) = serde_json::from_str::<JsonValue>(body) {
		for field in MESSAGE_FIELDS {
			if let Some(text) = map.get(field).and_then(JsonValue::as_str).filter(|s| !s.is_empty())
			{
				return text.to_owned();
			}
		}
	}

	let trimmed = body.trim();

	if trimmed.is_empty() { fallback.to_owned() } else { truncate_preview(trimmed) }
}

fn truncate_preview(body: &str) -> String {
	if body.chars().count() <= MESSAGE_PREVIEW_LIMIT {
		return body.to_owned();
	}

	let mut buf = body.chars().take(MESSAGE_PREVIEW_LIMIT).collect::<String>();

	buf.push('…');

	buf
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::{HeaderValue, header::CONTENT_TYPE};
	use serde_json::json;
	// self
	use super::*;

	fn response(content_type: Option<&'static str>, body: &str) -> http::HttpResponse {
		let mut response = http::HttpResponse::new(body.as_bytes().to_vec());

		if let Some(value) = content_type {
			response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(value));
		}

		response
	}

	#[test]
	fn single_and_paged_shapes_are_distinguishable() {
		let single = ApiResponse::Single(json!({"rsp_cd": "00000"}));
		let pages = ApiResponse::Pages(vec![json!({"page": 1}), json!({"page": 2})]);

		assert!(!single.is_paginated());
		assert!(pages.is_paginated());
		assert_eq!(single.pages().len(), 1);
		assert_eq!(pages.clone().into_pages().len(), 2);
		assert!(pages.into_single().is_none());
		assert_eq!(single.into_single(), Some(json!({"rsp_cd": "00000"})));
	}

	#[test]
	fn success_code_is_read_from_envelope() {
		assert!(is_success_code(&json!({"rsp_cd": "00000", "Out": {}})));
		assert!(!is_success_code(&json!({"rsp_cd": "40100"})));
		assert!(!is_success_code(&json!({"text": "plain"})));
		assert_eq!(response_code(&json!({"rsp_cd": "IGW00121"})), Some("IGW00121"));
		assert!(
			ApiResponse::Pages(vec![json!({"rsp_cd": "00000"}), json!({"rsp_cd": "00000"})])
				.all_succeeded()
		);
	}

	#[test]
	fn payload_decoding_falls_back_to_text() {
		assert_eq!(
			decode_payload(&response(Some("application/json"), r#"{"a":1}"#)),
			json!({"a": 1})
		);
		assert_eq!(
			decode_payload(&response(Some("text/plain"), "hello")),
			json!({"text": "hello"})
		);
		assert_eq!(decode_payload(&response(None, r#"{"a":1}"#)), json!({"text": r#"{"a":1}"#}));
		assert_eq!(
			decode_payload(&response(Some("application/json"), "{broken")),
			json!({"text": "{broken"})
		);
	}

	#[test]
	fn messages_prefer_structured_fields() {
		assert_eq!(
			extract_message(r#"{"error":"invalid_client","error_description":"bad key"}"#, "x"),
			"bad key"
		);
		assert_eq!(extract_message(r#"{"error":"invalid_client"}"#, "x"), "invalid_client");
		assert_eq!(extract_message(r#"{"rsp_cd":"1","rsp_msg":"closed"}"#, "x"), "closed");
		assert_eq!(extract_message("  gateway timeout  ", "x"), "gateway timeout");
		assert_eq!(extract_message("", "fallback"), "fallback");

		let long = "a".repeat(MESSAGE_PREVIEW_LIMIT + 10);
		let preview = extract_message(&long, "x");

		assert_eq!(preview.chars().count(), MESSAGE_PREVIEW_LIMIT + 1);
		assert!(preview.ends_with('…'));
	}
}
