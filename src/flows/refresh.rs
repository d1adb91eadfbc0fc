//! Token validity guard: returns a usable access token, refreshing it first when expired.

// self
use crate::{
	_prelude::*,
	auth::{TokenRecord, TokenSecret, parse_expiry},
	http::TokenHttpClient,
	oauth::{OAuthClient, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::TokenStore,
};

/// Returns a currently valid access token from `store`.
///
/// - Any of the three token fields missing yields [`Error::MissingCredentials`].
/// - An expiry that is unparsable or not in the future triggers exactly one refresh call; the
///   store is then overwritten, keeping the previous refresh token when no new one was issued.
/// - A refresh failure yields [`Error::RefreshFailed`].
/// - A valid token is returned unchanged without any network call.
pub async fn valid_access_token<C, M, S>(
	oauth: &OAuthClient<C, M>,
	store: &mut S,
) -> Result<TokenSecret>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
	S: ?Sized + TokenStore,
{
	valid_access_token_at(oauth, store, OffsetDateTime::now_utc()).await
}

/// [`valid_access_token`] evaluated against an explicit clock reading.
pub async fn valid_access_token_at<C, M, S>(
	oauth: &OAuthClient<C, M>,
	store: &mut S,
	now: OffsetDateTime,
) -> Result<TokenSecret>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
	S: ?Sized + TokenStore,
{
	let stored = store.load()?;
	let (Some(access_token), Some(refresh_token), Some(expires_text)) =
		(stored.access_token, stored.refresh_token, stored.expires_at)
	else {
		return Err(Error::MissingCredentials);
	};

	match parse_expiry(&expires_text) {
		Some(expires_at) if now < expires_at => return Ok(access_token),
		Some(_) => tracing::info!("access token expired, refreshing"),
		None => tracing::warn!("stored token expiry is unreadable, refreshing"),
	}

	let record = refresh_record(oauth, refresh_token, "valid_access_token").await?;

	store.save(&record)?;

	Ok(record.access_token)
}

/// Refreshes unconditionally using the refresh token held by `store`, ignoring the access token
/// and expiry fields.
///
/// Lets a store that only kept its refresh token recover without a new authorization. A missing
/// refresh token yields [`Error::MissingCredentials`]; a refresh failure yields
/// [`Error::RefreshFailed`] and leaves the store untouched.
pub async fn refresh_stored_token<C, M, S>(
	oauth: &OAuthClient<C, M>,
	store: &mut S,
) -> Result<TokenSecret>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
	S: ?Sized + TokenStore,
{
	let refresh_token = store.load()?.refresh_token.ok_or(Error::MissingCredentials)?;
	let record = refresh_record(oauth, refresh_token, "refresh_stored_token").await?;

	store.save(&record)?;

	Ok(record.access_token)
}

async fn refresh_record<C, M>(
	oauth: &OAuthClient<C, M>,
	refresh_token: TokenSecret,
	stage: &'static str,
) -> Result<TokenRecord>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	const KIND: FlowKind = FlowKind::Refresh;

	let span = FlowSpan::new(KIND, stage);

	obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

	let result = span
		.instrument(async move {
			let grant = oauth.refresh(&refresh_token).await?;

			if grant.refresh_token.is_none() {
				tracing::debug!(
					"refresh response carried no refresh_token, keeping the stored one"
				);
			}

			Ok::<_, Error>(grant.into_record(Some(refresh_token))?)
		})
		.await;

	match result {
		Ok(record) => {
			obs::record_flow_outcome(KIND, FlowOutcome::Success);

			Ok(record)
		},
		Err(e) => {
			obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			tracing::error!(error = %e, "token refresh failed");

			Err(Error::RefreshFailed { source: Box::new(e) })
		},
	}
}
