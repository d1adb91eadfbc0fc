//! Token records, token grants, and the persisted expiry format.

// crates.io
use time::{
	PrimitiveDateTime, UtcOffset, format_description::BorrowedFormatItem,
	macros::format_description,
};
// self
use crate::{_prelude::*, auth::token::secret::TokenSecret, error::ResponseError};

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_EXPIRES_IN: Duration = Duration::seconds(3600);

/// Text layout of persisted expiry instants, always UTC without an offset suffix.
const EXPIRY_FORMAT: &[BorrowedFormatItem<'static>] =
	format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Token set held by a session or the credential file.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenRecord {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token secret.
	pub refresh_token: TokenSecret,
	/// Expiry instant in UTC.
	pub expires_at: OffsetDateTime,
}
impl TokenRecord {
	/// Returns `true` once `instant` reaches the expiry.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Renders [`Self::expires_at`] in the persisted text format.
	pub fn expires_at_text(&self) -> Result<String, time::error::Format> {
		format_expiry(self.expires_at)
	}
}
impl Debug for TokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecord")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Successful token endpoint response, normalized.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenGrant {
	/// Newly issued access token.
	pub access_token: TokenSecret,
	/// Newly issued refresh token, when the endpoint returned one.
	pub refresh_token: Option<TokenSecret>,
	/// Expiry computed from `expires_in` (or [`DEFAULT_EXPIRES_IN`]).
	pub expires_at: OffsetDateTime,
}
impl TokenGrant {
	/// Builds a grant from the raw `expires_in` value returned by the endpoint.
	pub fn issued_at(
		instant: OffsetDateTime,
		access_token: TokenSecret,
		refresh_token: Option<TokenSecret>,
		expires_in: Option<std::time::Duration>,
	) -> Result<Self, ResponseError> {
		let lifetime = match expires_in {
			Some(raw) => Duration::try_from(raw).map_err(|_| ResponseError::ExpiresInOutOfRange)?,
			None => DEFAULT_EXPIRES_IN,
		};
		let expires_at =
			instant.checked_add(lifetime).ok_or(ResponseError::ExpiresInOutOfRange)?;

		Ok(Self { access_token, refresh_token, expires_at })
	}

	/// Converts the grant into a record, falling back to `previous` when no refresh token was
	/// issued.
	pub fn into_record(self, previous: Option<TokenSecret>) -> Result<TokenRecord, ResponseError> {
		let refresh_token =
			self.refresh_token.or(previous).ok_or(ResponseError::MissingRefreshToken)?;

		Ok(TokenRecord {
			access_token: self.access_token,
			refresh_token,
			expires_at: self.expires_at,
		})
	}
}
impl Debug for TokenGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenGrant")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Formats an instant as `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn format_expiry(instant: OffsetDateTime) -> Result<String, time::error::Format> {
	instant.to_offset(UtcOffset::UTC).format(EXPIRY_FORMAT)
}

/// Parses a persisted expiry; `None` means the value is unusable and must count as expired.
pub fn parse_expiry(text: &str) -> Option<OffsetDateTime> {
	PrimitiveDateTime::parse(text.trim(), EXPIRY_FORMAT).ok().map(PrimitiveDateTime::assume_utc)
}
