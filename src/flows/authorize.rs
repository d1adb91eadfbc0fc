//! Authorization-code callback handling and session state classification.

// self
use crate::{
	_prelude::*,
	auth::{AuthCode, TokenRecord, TokenSecret, code_preview},
	http::TokenHttpClient,
	oauth::{OAuthClient, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::{StoredTokens, TokenStore},
};

/// Query parameters of the OAuth redirect.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CallbackParams {
	/// Authorization code on success.
	pub code: Option<String>,
	/// Error code when the user or the server denied access.
	pub error: Option<String>,
}
impl CallbackParams {
	/// Resolves the callback into a validated code.
	///
	/// An `error` parameter wins over `code`. Malformed codes are rejected here, so they never
	/// reach the token endpoint.
	pub fn into_code(self) -> Result<AuthCode> {
		if let Some(reason) = self.error.filter(|reason| !reason.is_empty()) {
			return Err(Error::AuthorizationDenied { reason });
		}

		let raw = self.code.filter(|code| !code.is_empty()).ok_or(Error::MissingAuthCode)?;

		AuthCode::parse(&raw).inspect_err(|_| {
			tracing::warn!(
				code_prefix = %code_preview(&raw),
				"rejected malformed authorization code"
			);
		})
	}
}

/// What to do when the code exchange returns no refresh token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingRefreshPolicy {
	/// Fail with [`ResponseError::MissingRefreshToken`](crate::error::ResponseError).
	Reject,
	/// Store an empty refresh token; the next expiry forces a new authorization.
	StoreEmpty,
}

/// Coarse authentication state of a store snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthState {
	/// No usable tokens.
	Unauthenticated,
	/// Tokens present and the access token is still valid.
	Authenticated,
	/// Tokens present but the access token must be refreshed first.
	Expired,
}
impl AuthState {
	/// Classifies `stored` at `now`. A missing or unreadable expiry counts as expired.
	pub fn of(stored: &StoredTokens, now: OffsetDateTime) -> Self {
		if stored.access_token.is_none() || stored.refresh_token.is_none() {
			return AuthState::Unauthenticated;
		}

		match stored.expires_at() {
			Some(expires_at) if now < expires_at => AuthState::Authenticated,
			_ => AuthState::Expired,
		}
	}
}

/// Handles the OAuth redirect: validates the callback, exchanges the code, stores the tokens.
///
/// On any failure the store is left untouched.
pub async fn complete_authorization<C, M, S>(
	oauth: &OAuthClient<C, M>,
	store: &mut S,
	params: CallbackParams,
) -> Result<TokenRecord>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
	S: ?Sized + TokenStore,
{
	let code = params.into_code()?;

	authorize_with_code(oauth, store, &code, MissingRefreshPolicy::Reject).await
}

/// Exchanges an already validated code and stores the resulting tokens.
pub async fn authorize_with_code<C, M, S>(
	oauth: &OAuthClient<C, M>,
	store: &mut S,
	code: &AuthCode,
	policy: MissingRefreshPolicy,
) -> Result<TokenRecord>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
	S: ?Sized + TokenStore,
{
	const KIND: FlowKind = FlowKind::AuthorizationCode;

	let span = FlowSpan::new(KIND, "authorize_with_code");

	obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

	let result = span
		.instrument(async move {
			let grant = oauth.exchange_code(code).await?;
			let fallback = match policy {
				MissingRefreshPolicy::Reject => None,
				MissingRefreshPolicy::StoreEmpty => Some(TokenSecret::default()),
			};
			let record = grant.into_record(fallback)?;

			store.save(&record)?;

			Ok::<_, Error>(record)
		})
		.await;

	match &result {
		Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
		Err(e) => {
			obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			tracing::error!(error = %e, "authorization code exchange failed");
		},
	}

	result
}
