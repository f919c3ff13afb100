//! Immutable per-call descriptions handed to the executor.

// crates.io
use oauth2::http::Method;
// self
use crate::{_prelude::*, error::ConfigError};

/// Key under which business payloads are wrapped by [`RequestDescriptor::with_data`].
pub const INPUT_ENVELOPE_KEY: &str = "In";

/// Business input that can be rendered as a flat JSON mapping.
///
/// The executor treats the mapping opaquely; it is only wrapped as `{"In": mapping}`.
pub trait RequestData {
	/// Renders the input fields.
	fn to_request_data(&self) -> JsonMap<String, JsonValue>;
}
impl RequestData for JsonMap<String, JsonValue> {
	fn to_request_data(&self) -> JsonMap<String, JsonValue> {
		self.clone()
	}
}
impl RequestData for BTreeMap<String, String> {
	fn to_request_data(&self) -> JsonMap<String, JsonValue> {
		self.iter().map(|(key, value)| (key.clone(), JsonValue::String(value.clone()))).collect()
	}
}
impl<T> RequestData for &T
where
	T: ?Sized + RequestData,
{
	fn to_request_data(&self) -> JsonMap<String, JsonValue> {
		(**self).to_request_data()
	}
}

/// Body encoding of a business call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
	/// `application/json`.
	#[default]
	Json,
	/// `application/x-www-form-urlencoded`; top-level body fields become form pairs.
	Form,
}
impl ContentKind {
	/// `Content-Type` header value.
	pub const fn mime(self) -> &'static str {
		match self {
			Self::Json => "application/json",
			Self::Form => "application/x-www-form-urlencoded",
		}
	}
}

/// Method, path, query, body, encoding, and extra headers of one logical call.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestDescriptor {
	/// HTTP method.
	pub method: Method,
	/// Path joined onto the configured base URL.
	pub path: String,
	/// Query parameters, in order.
	pub query: Vec<(String, String)>,
	/// Body, if any.
	pub body: Option<JsonValue>,
	/// Body encoding.
	pub content_kind: ContentKind,
	/// Headers applied after the configured defaults.
	pub headers: BTreeMap<String, String>,
}
impl RequestDescriptor {
	/// Describes a call with `method` against `path`.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: Vec::new(),
			body: None,
			content_kind: ContentKind::default(),
			headers: BTreeMap::new(),
		}
	}

	/// Describes a `GET` call.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// Describes a `POST` call.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// Appends a query parameter.
	pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((name.into(), value.into()));

		self
	}

	/// Sets the body to `{"In": data}`.
	pub fn with_data(mut self, data: &impl RequestData) -> Self {
		let mut envelope = JsonMap::new();

		envelope.insert(INPUT_ENVELOPE_KEY.into(), JsonValue::Object(data.to_request_data()));

		self.body = Some(JsonValue::Object(envelope));

		self
	}

	/// Sets the body from any serializable value, without the input envelope.
	pub fn with_json_body<T>(mut self, body: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		self.body = Some(
			serde_json::to_value(body)
				.map_err(|source| ConfigError::BodySerialization { source })?,
		);

		Ok(self)
	}

	/// Overrides the body encoding.
	pub fn with_content_kind(mut self, content_kind: ContentKind) -> Self {
		self.content_kind = content_kind;

		self
	}

	/// Adds a header for this call only.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Encodes the body according to [`Self::content_kind`].
	pub(crate) fn encode_body(&self) -> Result<Vec<u8>, ConfigError> {
		let Some(body) = &self.body else { return Ok(Vec::new()) };

		match self.content_kind {
			ContentKind::Json => serde_json::to_vec(body)
				.map_err(|source| ConfigError::BodySerialization { source }),
			ContentKind::Form => {
				let mut form = url::form_urlencoded::Serializer::new(String::new());

				match body {
					JsonValue::Object(map) =>
						for (key, value) in map {
							form.append_pair(key, &form_value(value));
						},
					other => {
						form.append_pair("data", &form_value(other));
					},
				}

				Ok(form.finish().into_bytes())
			},
		}
	}
}

/// Continuation cursor sent as the `cont_yn` / `cont_key` request headers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Continuation {
	/// `true` renders `cont_yn: Y`.
	pub more: bool,
	/// Continuation key; omitted from the request when empty.
	pub key: String,
}
impl Continuation {
	/// Cursor that resumes a previous inquiry at `key`.
	pub fn resume(key: impl Into<String>) -> Self {
		Self { more: true, key: key.into() }
	}

	/// `Y` or `N`.
	pub fn flag(&self) -> &'static str {
		if self.more { "Y" } else { "N" }
	}

	/// Returns `true` if another page can be requested with this cursor.
	pub fn has_next(&self) -> bool {
		self.more && !self.key.is_empty()
	}
}

/// Per-call pagination overrides.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PaginationOptions {
	/// Cursor of the first request; defaults to `cont_yn: N` with no key.
	pub start: Option<Continuation>,
	/// Overrides the configured continuation cap for this call.
	pub max_continuations: Option<u32>,
}
impl PaginationOptions {
	/// Resumes a previous inquiry at `key`.
	pub fn resume(key: impl Into<String>) -> Self {
		Self { start: Some(Continuation::resume(key)), ..Default::default() }
	}

	/// Caps the number of follow-up calls for this call.
	pub fn with_max_continuations(mut self, max_continuations: u32) -> Self {
		self.max_continuations = Some(max_continuations);

		self
	}
}

fn form_value(value: &JsonValue) -> String {
	match value {
		JsonValue::String(text) => text.clone(),
		JsonValue::Null => String::new(),
		other => other.to_string(),
	}
}
