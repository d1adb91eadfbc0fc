//! `.env`-style credential file used by the console variant to keep tokens across runs.

// std
use std::{
	fs::{self, File},
	io::Write,
};
// self
use crate::{
	_prelude::*,
	auth::TokenRecord,
	store::{StoreError, StoredTokens, TokenStore},
};

/// Key holding the access token.
pub const ACCESS_TOKEN_KEY: &str = "ACCESS_TOKEN";
/// Key holding the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "REFRESH_TOKEN";
/// Key holding the access-token expiry (`YYYY-MM-DD HH:MM:SS`, UTC).
pub const EXPIRES_AT_KEY: &str = "ACCESS_TOKEN_EXPIRES_AT";

const TOKEN_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, EXPIRES_AT_KEY];

/// Credential file loaded once, merged in memory, and rewritten atomically on each save.
///
/// Entries other than the three token keys are kept in their original order. Comments and
/// blank lines are not preserved.
#[derive(Clone, Debug)]
pub struct CredentialFile {
	path: PathBuf,
	entries: Vec<(String, String)>,
}
impl CredentialFile {
	/// Opens the file at `path`; a missing file yields an empty store.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();
		let entries = Self::load_entries(&path)?;

		Ok(Self { path, entries })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Returns the value stored under `key`.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
	}

	fn load_entries(path: &Path) -> Result<Vec<(String, String)>, StoreError> {
		let iter = match dotenvy::from_path_iter(path) {
			Ok(iter) => iter,
			Err(e) if e.not_found() => return Ok(Vec::new()),
			Err(e) => {
				return Err(StoreError::Backend {
					message: format!("Failed to open {}: {e}", path.display()),
				});
			},
		};
		let mut entries = Vec::<(String, String)>::new();

		for item in iter {
			let (key, value) = item.map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;

			match entries.iter_mut().find(|(k, _)| *k == key) {
				Some(slot) => slot.1 = value,
				None => entries.push((key, value)),
			}
		}

		Ok(entries)
	}

	fn set(&mut self, key: &str, value: String) {
		self.entries.retain(|(k, _)| k != key);
		self.entries.push((key.to_owned(), value));
	}

	fn render(&self) -> String {
		self.entries.iter().fold(String::new(), |mut buf, (key, value)| {
			buf.push_str(key);
			buf.push('=');
			buf.push_str(&quote_value(value));
			buf.push('\n');

			buf
		})
	}

	fn persist(&self) -> Result<(), StoreError> {
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create directory {}: {e}", parent.display()),
			})?;
		}

		let mut tmp_path = self.path.clone().into_os_string();

		tmp_path.push(".tmp");

		let tmp_path = PathBuf::from(tmp_path);

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(self.render().as_bytes()).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl TokenStore for CredentialFile {
	fn load(&self) -> Result<StoredTokens, StoreError> {
		Ok(StoredTokens::from_raw(
			self.get(ACCESS_TOKEN_KEY),
			self.get(REFRESH_TOKEN_KEY),
			self.get(EXPIRES_AT_KEY),
		))
	}

	fn save(&mut self, record: &TokenRecord) -> Result<(), StoreError> {
		let stored = StoredTokens::from_record(record)?;

		self.set(ACCESS_TOKEN_KEY, record.access_token.expose().to_owned());
		self.set(REFRESH_TOKEN_KEY, record.refresh_token.expose().to_owned());
		self.set(EXPIRES_AT_KEY, stored.expires_at.unwrap_or_default());
		self.persist()
	}

	fn clear(&mut self) -> Result<(), StoreError> {
		self.entries.retain(|(k, _)| !TOKEN_KEYS.contains(&k.as_str()));
		self.persist()
	}
}

/// Quotes a value when dotenv parsing would otherwise alter it.
fn quote_value(value: &str) -> String {
	let plain = value.chars().all(|c| c.is_ascii_alphanumeric() || "-_.:/+@,".contains(c))
		&& !value.is_empty();

	if plain {
		return value.to_owned();
	}

	let mut quoted = String::with_capacity(value.len() + 2);

	quoted.push('"');

	for c in value.chars() {
		match c {
			'"' | '\\' | '$' => {
				quoted.push('\\');
				quoted.push(c);
			},
			'\n' => quoted.push_str("\\n"),
			_ => quoted.push(c),
		}
	}

	quoted.push('"');

	quoted
}
