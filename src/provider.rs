//! Endpoint descriptor for the hh.ru OAuth server and REST API.
//!
//! [`HhEndpoints`] carries validated, HTTPS-only URLs for the authorization page, the token
//! endpoint, and the API root, plus the `host` query value the limits endpoint expects. The
//! defaults point at production; tests rebuild the set against a mock server.

// self
use crate::{
	_prelude::*,
	auth::{EmployerId, ManagerId},
};

/// Scope requested during authorization; grants employer-level API access.
pub const EMPLOYER_SCOPE: &str = "employer";
/// Locale passed to the limits endpoint.
pub const LIMITS_LOCALE: &str = "RU";

const AUTHORIZATION_URL: &str = "https://hh.ru/oauth/authorize";
const TOKEN_URL: &str = "https://hh.ru/oauth/token";
const API_BASE_URL: &str = "https://api.hh.ru/";
const PLATFORM_HOST: &str = "hh.ru";

/// Errors raised while constructing or validating endpoint sets.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum EndpointsError {
	/// A required endpoint was not supplied.
	#[error("Missing {endpoint} endpoint.")]
	Missing {
		/// Which endpoint is missing.
		endpoint: &'static str,
	},
	/// Endpoints must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// The API root must be able to take path segments.
	#[error("The API base URL cannot carry a path: {url}.")]
	NotABase {
		/// Offending URL.
		url: String,
	},
	/// The platform host must be a bare host name.
	#[error("Platform host is invalid: {host}.")]
	InvalidHost {
		/// Offending host value.
		host: String,
	},
}

/// Immutable endpoint set consumed by the OAuth and API clients.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HhEndpoints {
	/// Authorization page the user is redirected to.
	pub authorization: Url,
	/// Token endpoint used for code exchanges and refreshes.
	pub token: Url,
	/// Root of the REST API; always ends with `/`.
	pub api_base: Url,
	/// Platform host passed to the limits endpoint.
	pub host: String,
}
impl HhEndpoints {
	/// Creates a new builder with no endpoints set.
	pub fn builder() -> HhEndpointsBuilder {
		HhEndpointsBuilder::default()
	}

	/// Builds the authorization URL the caller is redirected to.
	pub fn authorize_url(&self, client_id: &str, redirect_uri: &Url) -> Url {
		let mut url = self.authorization.clone();

		url.query_pairs_mut()
			.append_pair("response_type", "code")
			.append_pair("client_id", client_id)
			.append_pair("redirect_uri", redirect_uri.as_str())
			.append_pair("scope", EMPLOYER_SCOPE);

		url
	}

	/// `GET /me`.
	pub fn me_url(&self) -> Url {
		self.api_url(&["me"])
	}

	/// `GET /employers/{employer_id}/managers`.
	pub fn managers_url(&self, employer: &EmployerId) -> Url {
		self.api_url(&["employers", employer.as_str(), "managers"])
	}

	/// `GET /employers/{employer_id}/managers/{manager_id}`.
	pub fn manager_url(&self, employer: &EmployerId, manager: &ManagerId) -> Url {
		self.api_url(&["employers", employer.as_str(), "managers", manager.as_str()])
	}

	/// `GET /employers/{employer_id}/managers/{manager_id}/limits/resume?locale=RU&host=…`.
	pub fn resume_limits_url(&self, employer: &EmployerId, manager: &ManagerId) -> Url {
		let mut url = self.api_url(&[
			"employers",
			employer.as_str(),
			"managers",
			manager.as_str(),
			"limits",
			"resume",
		]);

		url.query_pairs_mut().append_pair("locale", LIMITS_LOCALE).append_pair("host", &self.host);

		url
	}

	fn api_url(&self, segments: &[&str]) -> Url {
		let mut url = self.api_base.clone();

		// `validate` rejects cannot-be-a-base URLs, so this always succeeds.
		if let Ok(mut path) = url.path_segments_mut() {
			path.pop_if_empty().extend(segments);
		}

		url
	}

	fn validate(&self) -> Result<(), EndpointsError> {
		validate_endpoint("authorization", &self.authorization)?;
		validate_endpoint("token", &self.token)?;
		validate_endpoint("api", &self.api_base)?;

		if self.api_base.cannot_be_a_base() {
			return Err(EndpointsError::NotABase { url: self.api_base.to_string() });
		}
		if self.host.is_empty() || self.host.contains(['/', ' ', '?', '#']) {
			return Err(EndpointsError::InvalidHost { host: self.host.clone() });
		}

		Ok(())
	}
}
impl Default for HhEndpoints {
	fn default() -> Self {
		// Constant URLs; parsing cannot fail.
		let parse = |raw: &str| Url::parse(raw).unwrap_or_else(|_| unreachable!("{raw}"));

		Self {
			authorization: parse(AUTHORIZATION_URL),
			token: parse(TOKEN_URL),
			api_base: parse(API_BASE_URL),
			host: PLATFORM_HOST.into(),
		}
	}
}

/// Builder for [`HhEndpoints`] values.
#[derive(Debug, Default)]
pub struct HhEndpointsBuilder {
	authorization: Option<Url>,
	token: Option<Url>,
	api_base: Option<Url>,
	host: Option<String>,
}
impl HhEndpointsBuilder {
	/// Sets the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token = Some(url);

		self
	}

	/// Sets the API root.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Overrides the platform host (defaults to `hh.ru`).
	pub fn host(mut self, host: impl Into<String>) -> Self {
		self.host = Some(host.into());

		self
	}

	/// Consumes the builder and validates the resulting endpoint set.
	pub fn build(self) -> Result<HhEndpoints, EndpointsError> {
		let authorization =
			self.authorization.ok_or(EndpointsError::Missing { endpoint: "authorization" })?;
		let token = self.token.ok_or(EndpointsError::Missing { endpoint: "token" })?;
		let mut api_base = self.api_base.ok_or(EndpointsError::Missing { endpoint: "api" })?;

		if !api_base.path().ends_with('/') {
			let path = format!("{}/", api_base.path());

			api_base.set_path(&path);
		}

		let endpoints = HhEndpoints {
			authorization,
			token,
			api_base,
			host: self.host.unwrap_or_else(|| PLATFORM_HOST.into()),
		};

		endpoints.validate()?;

		Ok(endpoints)
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), EndpointsError> {
	if url.scheme() != "https" {
		Err(EndpointsError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}
