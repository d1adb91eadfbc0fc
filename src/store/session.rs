//! Per-request session state carried in a signed cookie.

// self
use crate::{
	_prelude::*,
	auth::TokenRecord,
	store::{StoreError, StoredTokens, TokenStore},
};

/// Upper bound for the encoded session, leaving room for the signature within the 4 KiB
/// browsers accept per cookie.
const MAX_ENCODED_LEN: usize = 3_500;

/// Severity of a flashed message; doubles as the CSS class on the entry page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
	/// Operation completed.
	Success,
	/// Degraded result the user should know about.
	Warning,
	/// Operation failed.
	Danger,
}
impl FlashLevel {
	/// Returns the CSS class for the level.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlashLevel::Success => "success",
			FlashLevel::Warning => "warning",
			FlashLevel::Danger => "danger",
		}
	}
}

/// One-shot message shown on the next rendered page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
	/// Message severity.
	pub level: FlashLevel,
	/// User-facing text.
	pub message: String,
}

/// Everything the web variant keeps about a caller between requests.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
	/// Token fields; empty for unauthenticated callers.
	#[serde(default)]
	pub tokens: StoredTokens,
	/// Messages queued for the next page render.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub flashes: Vec<Flash>,
}
impl SessionData {
	/// Decodes a cookie value. Anything unreadable yields an empty session.
	pub fn decode(raw: &str) -> Self {
		match serde_json::from_str(raw) {
			Ok(data) => data,
			Err(e) => {
				tracing::warn!(error = %e, "discarding unreadable session cookie");

				Self::default()
			},
		}
	}

	/// Encodes the session for the cookie value.
	pub fn encode(&self) -> Result<String, StoreError> {
		let encoded = serde_json::to_string(self).map_err(|e| StoreError::Serialization {
			message: format!("Failed to encode session: {e}"),
		})?;

		if encoded.len() > MAX_ENCODED_LEN {
			return Err(StoreError::Backend {
				message: format!("Session is {} bytes, above the cookie limit", encoded.len()),
			});
		}

		Ok(encoded)
	}

	/// Queues a message for the next page render.
	pub fn flash(&mut self, level: FlashLevel, message: impl Into<String>) {
		self.flashes.push(Flash { level, message: message.into() });
	}

	/// Drains the queued messages.
	pub fn take_flashes(&mut self) -> Vec<Flash> {
		std::mem::take(&mut self.flashes)
	}

	/// Returns `true` when the session holds nothing worth persisting.
	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty() && self.flashes.is_empty()
	}
}
impl TokenStore for SessionData {
	fn load(&self) -> Result<StoredTokens, StoreError> {
		Ok(self.tokens.clone())
	}

	fn save(&mut self, record: &TokenRecord) -> Result<(), StoreError> {
		self.tokens = StoredTokens::from_record(record)?;

		Ok(())
	}

	fn clear(&mut self) -> Result<(), StoreError> {
		*self = Self::default();

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::auth::TokenSecret;

	fn record() -> TokenRecord {
		TokenRecord {
			access_token: TokenSecret::new("access"),
			refresh_token: TokenSecret::new("refresh"),
			expires_at: macros::datetime!(2030-01-01 00:00 UTC),
		}
	}

	#[test]
	fn encode_decode_keeps_tokens_and_flashes() {
		let mut session = SessionData::default();

		session.save(&record()).expect("Session save should succeed.");
		session.flash(FlashLevel::Success, "Авторизация прошла успешно!");

		let encoded = session.encode().expect("Session should encode.");
		let decoded = SessionData::decode(&encoded);

		assert_eq!(decoded, session);
		assert_eq!(decoded.tokens.expires_at.as_deref(), Some("2030-01-01 00:00:00"));
	}

	#[test]
	fn garbage_cookie_yields_empty_session() {
		assert!(SessionData::decode("not json").is_empty());
		assert!(SessionData::decode("{}").is_empty());
	}

	#[test]
	fn clear_drops_tokens_and_flashes() {
		let mut session = SessionData::default();

		session.save(&record()).expect("Session save should succeed.");
		session.flash(FlashLevel::Warning, "x");
		session.clear().expect("Session clear should succeed.");

		assert!(session.is_empty());
	}

	#[test]
	fn take_flashes_drains_queue() {
		let mut session = SessionData::default();

		session.flash(FlashLevel::Danger, "boom");

		assert_eq!(session.take_flashes().len(), 1);
		assert!(session.take_flashes().is_empty());
	}

	#[test]
	fn oversized_session_is_rejected() {
		let mut session = SessionData::default();

		session.flash(FlashLevel::Danger, "x".repeat(MAX_ENCODED_LEN));

		assert!(matches!(session.encode(), Err(StoreError::Backend { .. })));
	}
}
