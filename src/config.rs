//! Process configuration read from the environment (optionally seeded from a `.env` file).

// std
use std::env;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::ConfigError,
	http::DEFAULT_USER_AGENT,
};

/// Port the web variant listens on when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 6859;

/// Static client registration, immutable for the process lifetime.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: TokenSecret,
	/// Redirect URI registered with the authorization server.
	pub redirect_uri: Url,
}
impl Credentials {
	/// Bundles the three registration values.
	pub fn new(client_id: &str, client_secret: &str, redirect_uri: Url) -> Self {
		Self {
			client_id: client_id.to_owned(),
			client_secret: TokenSecret::new(client_secret),
			redirect_uri,
		}
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret)
			.field("redirect_uri", &self.redirect_uri.as_str())
			.finish()
	}
}

/// Settings shared by the web and console variants.
#[derive(Clone, Debug)]
pub struct Settings {
	/// Client registration.
	pub credentials: Credentials,
	/// `User-Agent` sent with every request.
	pub user_agent: String,
}
impl Settings {
	/// Reads `CLIENT_ID`, `CLIENT_SECRET`, `REDIRECT_URI`, and `USER_AGENT` from the process
	/// environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	/// Same as [`Self::from_env`] over an arbitrary lookup.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let client_id = required(&lookup, "CLIENT_ID")?;
		let client_secret = required(&lookup, "CLIENT_SECRET")?;
		let redirect_raw = required(&lookup, "REDIRECT_URI")?;
		let redirect_uri = Url::parse(&redirect_raw)
			.map_err(|e| ConfigError::Invalid { name: "REDIRECT_URI", reason: e.to_string() })?;
		let user_agent =
			optional(&lookup, "USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.into());

		Ok(Self {
			credentials: Credentials::new(&client_id, &client_secret, redirect_uri),
			user_agent,
		})
	}
}

/// Settings that only the web variant needs.
#[derive(Clone)]
pub struct WebSettings {
	/// Secret used to derive the cookie signing key.
	pub secret_key: TokenSecret,
	/// TCP port to listen on.
	pub port: u16,
}
impl WebSettings {
	/// Reads `SECRET_KEY` (mandatory) and `PORT` from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	/// Same as [`Self::from_env`] over an arbitrary lookup.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let secret_key = TokenSecret::new(required(&lookup, "SECRET_KEY")?);
		let port = match optional(&lookup, "PORT") {
			Some(raw) => raw
				.parse()
				.map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
					name: "PORT",
					reason: e.to_string(),
				})?,
			None => DEFAULT_PORT,
		};

		Ok(Self { secret_key, port })
	}
}
impl Debug for WebSettings {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("WebSettings")
			.field("secret_key", &self.secret_key)
			.field("port", &self.port)
			.finish()
	}
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, name: &'static str) -> Option<String> {
	lookup(name).map(|value| value.trim().to_owned()).filter(|value| !value.is_empty())
}

fn required(
	lookup: &impl Fn(&str) -> Option<String>,
	name: &'static str,
) -> Result<String, ConfigError> {
	optional(lookup, name).ok_or(ConfigError::Missing { name })
}
