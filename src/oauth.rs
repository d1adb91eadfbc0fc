//! OAuth client for the hh.ru token endpoint.
//!
//! [`OAuthClient`] wraps the `oauth2` crate's [`BasicClient`] configured for `client_secret_post`
//! (client id and secret travel in the form body). Each exchange runs over an instrumented
//! [`TokenHttpClient`] handle so failures can be classified with the HTTP status that caused
//! them.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RedirectUrl, RefreshToken, RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::{AuthCode, TokenGrant, TokenSecret},
	config::Credentials,
	error::{ConfigError, ResponseError, TransportError},
	http::{
		Endpoint, ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot, TokenHttpClient,
		body_preview,
	},
	provider::HhEndpoints,
};

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// [`OAuthClient`] over the default reqwest transport.
pub type ReqwestOAuthClient = OAuthClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a crate error.
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(*inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => map_generic_transport_error(meta, message),
			_ => map_generic_transport_error(meta, "unknown transport failure"),
		}
	}
}

/// Stateless client for the authorization-code and refresh-token grants.
pub struct OAuthClient<C = ReqwestHttpClient, M = ReqwestTransportErrorMapper>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	client_id: String,
	redirect_uri: Url,
	endpoints: HhEndpoints,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl ReqwestOAuthClient {
	/// Builds a client over the provided reqwest transport with the default error mapper.
	pub fn new(
		credentials: Credentials,
		endpoints: HhEndpoints,
		http_client: ReqwestHttpClient,
	) -> Result<Self> {
		Self::with_http_client(credentials, endpoints, http_client, ReqwestTransportErrorMapper)
	}
}
impl<C, M> OAuthClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Builds a client over a custom transport and error mapper.
	pub fn with_http_client(
		credentials: Credentials,
		endpoints: HhEndpoints,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let auth_url = AuthUrl::new(endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;
		let token_url = TokenUrl::new(endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;
		let redirect_url = RedirectUrl::new(credentials.redirect_uri.to_string())
			.map_err(|source| ConfigError::InvalidRedirect { source })?;
		let oauth_client = BasicClient::new(ClientId::new(credentials.client_id.clone()))
			.set_client_secret(ClientSecret::new(credentials.client_secret.expose().to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url)
			.set_redirect_uri(redirect_url)
			.set_auth_type(AuthType::RequestBody);

		Ok(Self {
			oauth_client,
			client_id: credentials.client_id,
			redirect_uri: credentials.redirect_uri,
			endpoints,
			http_client: http_client.into(),
			error_mapper: error_mapper.into(),
		})
	}

	/// Endpoint set the client talks to.
	pub fn endpoints(&self) -> &HhEndpoints {
		&self.endpoints
	}

	/// Authorization page URL requesting employer scope for the configured redirect URI.
	pub fn authorize_url(&self) -> Url {
		self.endpoints.authorize_url(&self.client_id, &self.redirect_uri)
	}

	/// Exchanges a validated authorization code for tokens.
	pub async fn exchange_code(&self, code: &AuthCode) -> Result<TokenGrant> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let response = self
			.oauth_client
			.exchange_code(AuthorizationCode::new(code.expose().to_owned()))
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err, self.error_mapper.as_ref()))?;

		map_token_response(response)
	}

	/// Exchanges a refresh token for a new access token.
	///
	/// The returned grant carries a refresh token only when the endpoint issued a new one.
	pub async fn refresh(&self, refresh_token: &TokenSecret) -> Result<TokenGrant> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let refresh_secret = RefreshToken::new(refresh_token.expose().to_owned());
		let response = self
			.oauth_client
			.exchange_refresh_token(&refresh_secret)
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err, self.error_mapper.as_ref()))?;

		map_token_response(response)
	}
}
impl<C, M> Debug for OAuthClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuthClient")
			.field("client_id", &self.client_id)
			.field("redirect_uri", &self.redirect_uri.as_str())
			.field("token_endpoint", &self.endpoints.token.as_str())
			.finish_non_exhaustive()
	}
}

fn map_token_response(response: BasicTokenResponse) -> Result<TokenGrant> {
	let access_token = response.access_token().secret();

	if access_token.is_empty() {
		return Err(ResponseError::Unexpected {
			message: "access_token is empty".into(),
			status: Some(StatusCode::OK.as_u16()),
		}
		.into());
	}

	let refresh_token = response
		.refresh_token()
		.map(|token| TokenSecret::new(token.secret().to_owned()))
		.and_then(TokenSecret::non_empty);

	Ok(TokenGrant::issued_at(
		OffsetDateTime::now_utc(),
		TokenSecret::new(access_token.to_owned()),
		refresh_token,
		response.expires_in(),
	)?)
}

fn map_request_error<E, M>(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();
	let status = meta_status(meta_ref);

	match err {
		RequestTokenError::ServerResponse(response) => map_server_response_error(response, status),
		RequestTokenError::Request(error) => mapper.map_transport_error(meta_ref, error),
		RequestTokenError::Parse(source, body) => match status {
			Some(code) if code != StatusCode::OK.as_u16() => ResponseError::Status {
				endpoint: Endpoint::Token,
				status: code,
				message: body_preview(&String::from_utf8_lossy(&body)),
			}
			.into(),
			_ => ResponseError::TokenParse { source, status }.into(),
		},
		RequestTokenError::Other(message) => match status {
			Some(code) if code != StatusCode::OK.as_u16() =>
				ResponseError::Status { endpoint: Endpoint::Token, status: code, message }.into(),
			_ => ResponseError::Unexpected { message, status }.into(),
		},
	}
}

fn map_server_response_error(response: BasicErrorResponse, status: Option<u16>) -> Error {
	let message = match response.error_description() {
		Some(description) => format!("{}: {description}", response.error().as_ref()),
		None => response.error().as_ref().to_owned(),
	};

	ResponseError::Status {
		endpoint: Endpoint::Token,
		status: status.unwrap_or(StatusCode::BAD_REQUEST.as_u16()),
		message,
	}
	.into()
}

fn map_reqwest_error(err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}

	TransportError::from_reqwest(Endpoint::Token, err).into()
}

fn map_generic_transport_error(meta: Option<&ResponseMetadata>, message: impl Display) -> Error {
	ResponseError::Unexpected {
		message: format!("HTTP client error occurred while calling the token endpoint: {message}"),
		status: meta_status(meta),
	}
	.into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}
