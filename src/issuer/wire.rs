//! Wire shapes of the authorization endpoint replies.

// self
use crate::_prelude::*;

/// Lifetime assumed when the token reply omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 86_400;

#[derive(Debug, Deserialize)]
pub(crate) struct TokenReply {
	pub(crate) access_token: String,
	pub(crate) token_type: String,
	#[serde(default = "default_expires_in", deserialize_with = "lenient_seconds")]
	pub(crate) expires_in: i64,
}

/// Outcome of a revoke call as reported by the authorization endpoint.
///
/// `raw` keeps the complete reply so callers can inspect fields the gateway does not model.
#[derive(Clone, Debug, PartialEq)]
pub struct RevokeOutcome {
	/// Service result code; `200` confirms the revocation.
	pub code: Option<i64>,
	/// Human-readable message, when present.
	pub message: Option<String>,
	/// Complete reply body.
	pub raw: JsonValue,
}
impl RevokeOutcome {
	const NO_TOKEN_CODE: i64 = 400;
	const NO_TOKEN_MESSAGE: &'static str = "No token to revoke";
	const REVOKED_CODE: i64 = 200;

	/// Benign result returned when no token is held; no network call is made.
	pub fn no_token() -> Self {
		Self {
			code: Some(Self::NO_TOKEN_CODE),
			message: Some(Self::NO_TOKEN_MESSAGE.into()),
			raw: serde_json::json!({
				"code": Self::NO_TOKEN_CODE,
				"message": Self::NO_TOKEN_MESSAGE,
			}),
		}
	}

	/// Returns `true` if the endpoint confirmed the revocation.
	pub fn is_revoked(&self) -> bool {
		self.code == Some(Self::REVOKED_CODE)
	}
}

#[derive(Debug, Deserialize)]
pub(crate) struct RevokeReply {
	#[serde(default, deserialize_with = "lenient_code")]
	pub(crate) code: Option<i64>,
	#[serde(default)]
	pub(crate) message: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
	Number(i64),
	Text(String),
}
impl NumberOrText {
	fn into_i64<E>(self) -> Result<i64, E>
	where
		E: serde::de::Error,
	{
		match self {
			Self::Number(value) => Ok(value),
			Self::Text(text) => text
				.trim()
				.parse()
				.map_err(|_| E::custom(format!("expected an integer, found {text:?}"))),
		}
	}
}

fn default_expires_in() -> i64 {
	DEFAULT_EXPIRES_IN_SECS
}

fn lenient_seconds<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
	D: serde::Deserializer<'de>,
{
	match Option::<NumberOrText>::deserialize(deserializer)? {
		Some(value) => value.into_i64(),
		None => Ok(DEFAULT_EXPIRES_IN_SECS),
	}
}

fn lenient_code<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
	D: serde::Deserializer<'de>,
{
	Option::<NumberOrText>::deserialize(deserializer)?.map(NumberOrText::into_i64).transpose()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn token_reply_defaults_and_accepts_string_lifetimes() {
		let reply: TokenReply =
			serde_json::from_str(r#"{"access_token":"abc","token_type":"Bearer"}"#)
				.expect("Reply without expires_in should decode.");

		assert_eq!(reply.expires_in, DEFAULT_EXPIRES_IN_SECS);

		let reply: TokenReply = serde_json::from_str(
			r#"{"access_token":"abc","token_type":"Bearer","expires_in":"3600"}"#,
		)
		.expect("String lifetime should decode.");

		assert_eq!(reply.expires_in, 3_600);
		assert!(
			serde_json::from_str::<TokenReply>(
				r#"{"access_token":"abc","token_type":"Bearer","expires_in":"soon"}"#
			)
			.is_err()
		);
	}

	#[test]
	fn revoke_codes_decode_leniently() {
		let reply: RevokeReply = serde_json::from_str(r#"{"code":"200","message":"ok"}"#)
			.expect("String code should decode.");

		assert_eq!(reply.code, Some(200));

		let reply: RevokeReply = serde_json::from_str("{}").expect("Empty reply should decode.");

		assert_eq!(reply.code, None);
	}

	#[test]
	fn no_token_outcome_is_benign() {
		let outcome = RevokeOutcome::no_token();

		assert_eq!(outcome.code, Some(400));
		assert!(!outcome.is_revoked());
		assert_eq!(outcome.raw["message"], "No token to revoke");
	}
}
