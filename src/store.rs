//! Token storage contract plus the signed-cookie session and the credential file stores.

pub mod env_file;
pub mod session;

pub use env_file::CredentialFile;
pub use session::{Flash, FlashLevel, SessionData};

// self
use crate::{
	_prelude::*,
	auth::{TokenRecord, TokenSecret, parse_expiry},
};

/// Storage contract shared by the web session and the console credential file.
///
/// Stores are owned by a single request or process invocation, so every mutation takes
/// `&mut self` and no locking is involved.
pub trait TokenStore {
	/// Returns the stored token fields, whichever are present.
	fn load(&self) -> Result<StoredTokens, StoreError>;

	/// Replaces all three token fields with `record`.
	fn save(&mut self, record: &TokenRecord) -> Result<(), StoreError>;

	/// Removes everything the store holds.
	fn clear(&mut self) -> Result<(), StoreError>;
}

/// Raw token fields as persisted; any of them may be absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTokens {
	/// Stored access token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub access_token: Option<TokenSecret>,
	/// Stored refresh token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// Stored expiry text (`YYYY-MM-DD HH:MM:SS`, UTC).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_at: Option<String>,
}
impl StoredTokens {
	/// Captures a record in its persisted form.
	pub fn from_record(record: &TokenRecord) -> Result<Self, StoreError> {
		let expires_at = record.expires_at_text().map_err(|e| StoreError::Serialization {
			message: format!("Failed to format token expiry: {e}"),
		})?;

		Ok(Self {
			access_token: Some(record.access_token.clone()),
			refresh_token: Some(record.refresh_token.clone()),
			expires_at: Some(expires_at),
		})
	}

	/// Builds a snapshot from raw values, treating empty strings as absent.
	pub fn from_raw(
		access_token: Option<&str>,
		refresh_token: Option<&str>,
		expires_at: Option<&str>,
	) -> Self {
		let secret = |raw: Option<&str>| raw.map(TokenSecret::new).and_then(TokenSecret::non_empty);

		Self {
			access_token: secret(access_token),
			refresh_token: secret(refresh_token),
			expires_at: expires_at.filter(|text| !text.trim().is_empty()).map(str::to_owned),
		}
	}

	/// Returns `true` when no field is present.
	pub fn is_empty(&self) -> bool {
		self.access_token.is_none() && self.refresh_token.is_none() && self.expires_at.is_none()
	}

	/// Parses the stored expiry; `None` when absent or unparsable.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.expires_at.as_deref().and_then(parse_expiry)
	}
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Encoding or decoding of the persisted form failed.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure (filesystem, cookie size).
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
