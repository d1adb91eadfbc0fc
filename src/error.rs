//! Crate-level error types shared across flows, clients, and stores.

// self
use crate::{_prelude::*, http::Endpoint};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Remote service answered with something other than the expected payload.
	#[error(transparent)]
	Response(#[from] ResponseError),
	/// Transport failure (timeout, DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The authorization server redirected back with an `error` parameter.
	#[error("Authorization was denied: {reason}.")]
	AuthorizationDenied {
		/// Value of the `error` query parameter.
		reason: String,
	},
	/// The callback carried neither `code` nor `error`.
	#[error("Callback is missing the code parameter.")]
	MissingAuthCode,
	/// The callback code failed validation and was never sent upstream.
	#[error("Authorization code has an invalid format.")]
	InvalidAuthCode,
	/// Token store lacks one of the access token, refresh token, or expiry.
	#[error("Tokens are missing; authorize again.")]
	MissingCredentials,
	/// Refreshing an expired access token failed; the caller must re-authorize.
	#[error("Failed to refresh the access token: {source}")]
	RefreshFailed {
		/// Underlying refresh failure.
		#[source]
		source: Box<Error>,
	},
	/// The `/me` payload lacks the identifiers required to continue.
	#[error("Current user payload is missing {field}.")]
	IncompleteIdentity {
		/// Dotted path of the missing field.
		field: &'static str,
	},
	/// The employer has no managers to report on.
	#[error("Employer has no managers.")]
	NoManagers,
}
impl Error {
	/// Returns `true` when the failure means the caller has to authorize again.
	pub fn requires_reauthorization(&self) -> bool {
		matches!(self, Self::MissingCredentials | Self::RefreshFailed { .. })
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A mandatory environment variable is absent or empty.
	#[error("Environment variable {name} must be set.")]
	Missing {
		/// Variable name.
		name: &'static str,
	},
	/// An environment variable holds a value that cannot be parsed.
	#[error("Environment variable {name} is invalid: {reason}.")]
	Invalid {
		/// Variable name.
		name: &'static str,
		/// Parser message.
		reason: String,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// An endpoint URL cannot be used.
	#[error("Endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Endpoint set failed validation.
	#[error(transparent)]
	Endpoints(#[from] crate::provider::EndpointsError),
	/// Identifier returned by the API failed validation.
	#[error(transparent)]
	Identifier(#[from] crate::auth::IdentifierError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Unexpected responses from the remote service. None of them are retried.
#[derive(Debug, ThisError)]
pub enum ResponseError {
	/// Endpoint answered with a non-success HTTP status.
	#[error("The {endpoint} endpoint returned HTTP {status}: {message}")]
	Status {
		/// Endpoint that was called.
		endpoint: Endpoint,
		/// HTTP status code.
		status: u16,
		/// Response body preview or OAuth error description.
		message: String,
	},
	/// Token endpoint returned a body that could not be parsed as a token response.
	#[error("Token endpoint returned malformed JSON.")]
	TokenParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// API endpoint returned a body that is not valid JSON.
	#[error("The {endpoint} endpoint returned malformed JSON.")]
	Json {
		/// Endpoint that was called.
		endpoint: Endpoint,
		/// Parsing failure.
		#[source]
		source: serde_json::Error,
	},
	/// Token endpoint response omitted a refresh token where one is required.
	#[error("Token endpoint response is missing refresh_token.")]
	MissingRefreshToken,
	/// Token endpoint returned an `expires_in` that cannot be represented.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Token endpoint failed in a way the OAuth client could not classify.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	Unexpected {
		/// Client-supplied message.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}
impl ResponseError {
	/// Returns the HTTP status attached to the failure, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			Self::TokenParse { status, .. } | Self::Unexpected { status, .. } => *status,
			_ => None,
		}
	}
}

/// Transport-level failures (timeouts, network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// The request did not complete within the configured timeout.
	#[error("Request to the {endpoint} endpoint timed out.")]
	Timeout {
		/// Endpoint that was called.
		endpoint: Endpoint,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Network {
		/// Endpoint that was called.
		endpoint: Endpoint,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		endpoint: Endpoint,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}

	/// Classifies a reqwest failure into a timeout or a generic network error.
	pub fn from_reqwest(endpoint: Endpoint, err: ReqwestError) -> Self {
		if err.is_timeout() { Self::Timeout { endpoint } } else { Self::network(endpoint, err) }
	}
}
