//! App key/secret pair presented to the authorization endpoint.

// self
use crate::{_prelude::*, auth::Secret};

/// Immutable app credentials supplied at construction and owned by the token issuer.
#[derive(Clone, PartialEq, Eq)]
pub struct AppCredentials {
	app_key: String,
	app_secret: Secret,
}
impl AppCredentials {
	/// Creates credentials from an app key and app secret.
	pub fn new(app_key: impl Into<String>, app_secret: impl Into<String>) -> Self {
		Self { app_key: app_key.into(), app_secret: Secret::new(app_secret) }
	}

	/// App key sent as `appkey`.
	pub fn app_key(&self) -> &str {
		&self.app_key
	}

	/// App secret sent as `appsecretkey`.
	pub fn app_secret(&self) -> &Secret {
		&self.app_secret
	}
}
impl Debug for AppCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AppCredentials")
			.field("app_key", &self.app_key)
			.field("app_secret", &self.app_secret)
			.finish()
	}
}
