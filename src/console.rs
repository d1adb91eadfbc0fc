//! Console variant: one-shot report of every manager's resume limits.
//!
//! Tokens live in a `.env`-style [`CredentialFile`]. A missing access token (or one that can
//! no longer be refreshed) starts an interactive authorization: the authorization URL is shown
//! and opened in a browser, and the user pastes the `code` parameter back.

// std
use std::{
	fs,
	io::{self, BufRead, Write},
};
// crates.io
use time::{format_description::BorrowedFormatItem, macros::format_description};
// self
use crate::{
	_prelude::*,
	api::{ApiClient, ManagerLimitRecord},
	auth::{AuthCode, TokenSecret},
	flows::{self, MissingRefreshPolicy},
	http::TokenHttpClient,
	oauth::{OAuthClient, TransportErrorMapper},
	store::{CredentialFile, TokenStore},
};

const FILE_STAMP_FORMAT: &[BorrowedFormatItem<'static>] =
	format_description!("[year][month][day]_[hour][minute][second]");

/// Failures specific to the console variant.
#[derive(Debug, ThisError)]
pub enum ConsoleError {
	/// Core flow failure.
	#[error(transparent)]
	Flow(#[from] Error),
	/// Reading the authorization code failed.
	#[error("Failed to read the authorization code.")]
	Prompt(#[source] io::Error),
	/// The report could not be written.
	#[error("Failed to write report {}.", path.display())]
	Report {
		/// Target file.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: io::Error,
	},
}

/// Supplies the authorization code after the user visited `authorize_url`.
pub trait CodeSource {
	/// Returns the raw `code` value the user copied from the redirect.
	fn authorization_code(&mut self, authorize_url: &Url) -> io::Result<String>;
}

/// Prompts on stdin, optionally opening the URL in the default browser first.
#[derive(Clone, Debug)]
pub struct InteractivePrompt {
	/// Launch the system browser with the authorization URL.
	pub open_browser: bool,
}
impl Default for InteractivePrompt {
	fn default() -> Self {
		Self { open_browser: true }
	}
}
impl CodeSource for InteractivePrompt {
	fn authorization_code(&mut self, authorize_url: &Url) -> io::Result<String> {
		println!("Откройте в браузере следующую ссылку и авторизуйтесь: {authorize_url}");

		let opened = if self.open_browser { open::that(authorize_url.as_str()) } else { Ok(()) };

		if let Err(e) = opened {
			tracing::warn!(error = %e, "failed to open the browser");
		}

		print!("После авторизации введите параметр \"code\" из адресной строки: ");
		io::stdout().flush()?;

		let mut code = String::new();

		io::stdin().lock().read_line(&mut code)?;

		Ok(code.trim().to_owned())
	}
}

/// Outcome of a console run.
#[derive(Clone, Debug)]
pub struct ConsoleReport {
	/// File the report was written to.
	pub path: PathBuf,
	/// Report text, as written.
	pub text: String,
	/// One record per manager, in listing order.
	pub records: Vec<ManagerLimitRecord>,
}

/// Runs the console flow against the credential file at `env_file` and writes the report into
/// `output_dir`.
pub async fn run<C, M>(
	oauth: &OAuthClient<C, M>,
	api: &ApiClient,
	env_file: &Path,
	output_dir: &Path,
	codes: &mut impl CodeSource,
) -> Result<ConsoleReport, ConsoleError>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let mut credentials = CredentialFile::open(env_file).map_err(Error::from)?;
	let token = access_token(oauth, &mut credentials, codes).await?;
	let records = flows::employer_limits(api, &token).await?;
	let text = render_report(&records);
	let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
	let path = output_dir.join(report_file_name(now));

	fs::write(&path, &text).map_err(|source| ConsoleError::Report { path: path.clone(), source })?;

	print!("{text}");
	println!("\nДанные сохранены в файл {}", path.display());
	tracing::info!(path = %path.display(), managers = records.len(), "report written");

	Ok(ConsoleReport { path, text, records })
}

/// Renders the report text for `records`.
pub fn render_report(records: &[ManagerLimitRecord]) -> String {
	records
		.iter()
		.map(|record| {
			format!(
				"Менеджер: {} (ID: {})\nЛимиты и использованные просмотры:\n{}\n\n",
				record.manager_name,
				record.manager_id,
				record.limits.to_pretty_string(),
			)
		})
		.collect()
}

/// Report file name for a run started at `now`.
pub fn report_file_name(now: OffsetDateTime) -> String {
	// The format only uses numeric components, so it cannot fail.
	let stamp = now.format(FILE_STAMP_FORMAT).unwrap_or_else(|_| now.unix_timestamp().to_string());

	format!("manager_limits_{stamp}.txt")
}

async fn access_token<C, M>(
	oauth: &OAuthClient<C, M>,
	credentials: &mut CredentialFile,
	codes: &mut impl CodeSource,
) -> Result<TokenSecret, ConsoleError>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let stored = credentials.load().map_err(Error::from)?;
	let attempt = if stored.access_token.is_some() {
		Some(flows::valid_access_token(oauth, credentials).await)
	} else if stored.refresh_token.is_some() {
		tracing::info!("no stored access token, refreshing with the stored refresh token");

		Some(flows::refresh_stored_token(oauth, credentials).await)
	} else {
		None
	};

	match attempt {
		Some(Ok(token)) => {
			if stored.access_token.as_ref() != Some(&token) {
				println!("ACCESS_TOKEN обновлен и сохранен в .env файл");
			}

			return Ok(token);
		},
		Some(Err(e)) if e.requires_reauthorization() => {
			tracing::warn!(error = %e, "stored tokens are unusable, authorizing again");
		},
		Some(Err(e)) => return Err(e.into()),
		None => {},
	}

	let raw = codes.authorization_code(&oauth.authorize_url()).map_err(ConsoleError::Prompt)?;
	let code = AuthCode::parse(&raw)?;
	let record =
		flows::authorize_with_code(oauth, credentials, &code, MissingRefreshPolicy::StoreEmpty)
			.await?;

	println!("ACCESS_TOKEN и REFRESH_TOKEN сохранены в .env файл");

	Ok(record.access_token)
}
