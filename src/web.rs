//! Web variant: axum routes over a signed-cookie session.
//!
//! Routes: `/` (entry page), `/login`, `/callback`, `/limits`, `/logout`, and `/health`. The
//! session travels in a single signed, HTTP-only, `SameSite=Lax` cookie; each request decodes
//! its own copy, so handlers never share token state.

pub mod views;

// std
use std::net::SocketAddr;
// crates.io
use askama::Template;
use axum::{
	Router,
	extract::{FromRef, Query, State},
	response::{Html, IntoResponse, Redirect, Response},
	routing::get,
};
use axum_extra::extract::{
	SignedCookieJar,
	cookie::{Cookie, Key, SameSite},
};
use sha2::{Digest, Sha512};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
// self
use crate::{
	_prelude::*,
	api::{ApiClient, Limits},
	auth::TokenSecret,
	flows::{self, AuthState, CallbackParams},
	oauth::ReqwestOAuthClient,
	store::{FlashLevel, SessionData, StoredTokens, TokenStore},
	web::views::{IndexPage, LimitsPage, ManagerView, missing_limits_message, user_message},
};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "hh_limits_session";

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
	/// OAuth client.
	pub oauth: Arc<ReqwestOAuthClient>,
	/// API client.
	pub api: ApiClient,
	/// Cookie signing key.
	pub key: Key,
	/// Adds the `Secure` attribute to the session cookie.
	pub secure_cookies: bool,
}
impl AppState {
	/// Bundles the clients with a signing key derived from `secret`.
	///
	/// Cookies are marked `Secure` when the redirect URI is served over HTTPS.
	pub fn new(
		oauth: ReqwestOAuthClient,
		api: ApiClient,
		secret: &TokenSecret,
		redirect_uri: &Url,
	) -> Self {
		Self {
			oauth: Arc::new(oauth),
			api,
			key: signing_key(secret),
			secure_cookies: redirect_uri.scheme() == "https",
		}
	}
}
impl FromRef<AppState> for Key {
	fn from_ref(state: &AppState) -> Self {
		state.key.clone()
	}
}
impl Debug for AppState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AppState")
			.field("oauth", &self.oauth)
			.field("api", &self.api)
			.field("secure_cookies", &self.secure_cookies)
			.finish_non_exhaustive()
	}
}

/// Derives the 64-byte cookie signing key as SHA-512 of `secret`.
pub fn signing_key(secret: &TokenSecret) -> Key {
	let digest = Sha512::digest(secret.expose().as_bytes());

	Key::from(digest.as_slice())
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/", get(index))
		.route("/login", get(login))
		.route("/callback", get(callback))
		.route("/limits", get(limits))
		.route("/logout", get(logout))
		.route("/health", get(health))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

/// Serves the router on `addr` until Ctrl-C.
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
	let listener = TcpListener::bind(addr).await?;

	tracing::info!(addr = %listener.local_addr()?, "listening");

	axum::serve(listener, router(state)).with_graceful_shutdown(shutdown_signal()).await
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %e, "failed to listen for shutdown signal");

		std::future::pending::<()>().await;
	}

	tracing::info!("shutting down");
}

async fn index(State(state): State<AppState>, jar: SignedCookieJar) -> Response {
	let mut session = load_session(&jar);
	let auth_state = AuthState::of(&session.tokens, OffsetDateTime::now_utc());
	let page = IndexPage::new(session.take_flashes(), auth_state);

	(store_session(jar, &session, state.secure_cookies), render(&page)).into_response()
}

async fn login(State(state): State<AppState>) -> Redirect {
	Redirect::to(state.oauth.authorize_url().as_str())
}

async fn callback(
	State(state): State<AppState>,
	jar: SignedCookieJar,
	Query(params): Query<CallbackParams>,
) -> Response {
	let mut session = load_session(&jar);
	let target = match flows::complete_authorization(&*state.oauth, &mut session, params).await {
		Ok(_) => {
			session.flash(FlashLevel::Success, "Авторизация прошла успешно!");

			"/limits"
		},
		Err(e) => {
			session.flash(FlashLevel::Danger, user_message(&e));

			"/"
		},
	};

	(store_session(jar, &session, state.secure_cookies), Redirect::to(target)).into_response()
}

async fn limits(State(state): State<AppState>, jar: SignedCookieJar) -> Response {
	let mut session = load_session(&jar);
	let token = match flows::valid_access_token(&*state.oauth, &mut session).await {
		Ok(token) => token,
		Err(e) => return redirect_with_error(jar, session, &e, state.secure_cookies),
	};
	let record = match flows::caller_limits(&state.api, &token).await {
		Ok(record) => record,
		Err(e) => return redirect_with_error(jar, session, &e, state.secure_cookies),
	};

	if matches!(record.limits, Limits::NoData) {
		session.flash(FlashLevel::Warning, missing_limits_message(&record));
	}

	let page =
		LimitsPage { flashes: session.take_flashes(), managers: vec![ManagerView::from(&record)] };

	(store_session(jar, &session, state.secure_cookies), render(&page)).into_response()
}

async fn logout(State(state): State<AppState>, jar: SignedCookieJar) -> Response {
	let mut session = load_session(&jar);

	if let Err(e) = session.clear() {
		tracing::error!(error = %e, "failed to clear session");
	}

	session.flash(FlashLevel::Success, "Вы успешно вышли из системы.");

	(store_session(jar, &session, state.secure_cookies), Redirect::to("/")).into_response()
}

async fn health() -> &'static str {
	"ok"
}

fn redirect_with_error(
	jar: SignedCookieJar,
	mut session: SessionData,
	error: &Error,
	secure: bool,
) -> Response {
	let reauthorize = error.requires_reauthorization();

	tracing::warn!(error = %error, reauthorize, "request aborted");

	// Stale tokens would keep the entry page in the signed-in state.
	if reauthorize {
		session.tokens = StoredTokens::default();
	}

	session.flash(FlashLevel::Danger, user_message(error));

	(store_session(jar, &session, secure), Redirect::to("/")).into_response()
}

fn load_session(jar: &SignedCookieJar) -> SessionData {
	jar.get(SESSION_COOKIE).map(|cookie| SessionData::decode(cookie.value())).unwrap_or_default()
}

fn store_session(jar: SignedCookieJar, session: &SessionData, secure: bool) -> SignedCookieJar {
	if session.is_empty() {
		return jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
	}

	match session.encode() {
		Ok(value) => jar.add(
			Cookie::build((SESSION_COOKIE, value))
				.path("/")
				.http_only(true)
				.same_site(SameSite::Lax)
				.secure(secure),
		),
		Err(e) => {
			tracing::error!(error = %e, "failed to persist session, dropping it");

			jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
		},
	}
}

fn render(page: &impl Template) -> Response {
	match page.render() {
		Ok(body) => Html(body).into_response(),
		Err(e) => {
			tracing::error!(error = %e, "failed to render template");

			(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
		},
	}
}
