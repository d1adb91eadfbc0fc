//! Authorization codes received on the OAuth callback.

// self
use crate::_prelude::*;

const LOG_PREVIEW_CHARS: usize = 10;

/// Authorization code that passed format validation and may be sent to the token endpoint.
///
/// Only ASCII letters, digits, `_`, and `-` are accepted. Anything else is rejected before it
/// can reach the network.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthCode(String);
impl AuthCode {
	/// Validates a raw callback value.
	pub fn parse(raw: &str) -> Result<Self> {
		if is_valid_code(raw) { Ok(Self(raw.to_owned())) } else { Err(Error::InvalidAuthCode) }
	}

	/// Returns the code value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for AuthCode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AuthCode").field(&"<redacted>").finish()
	}
}
impl FromStr for AuthCode {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		Self::parse(s)
	}
}

/// Returns `true` when `raw` matches `^[A-Za-z0-9_-]+$`.
pub fn is_valid_code(raw: &str) -> bool {
	!raw.is_empty() && raw.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Shortens a rejected code so it can be logged without leaking the whole value.
pub fn code_preview(raw: &str) -> String {
	raw.chars().take(LOG_PREVIEW_CHARS).collect()
}
