// crates.io
use httpmock::prelude::*;
// self
use hh_limits::{
	_preludet::*,
	auth::{TokenSecret, format_expiry},
	flows::{self, AuthState},
	store::{SessionData, StoredTokens},
};

fn session_with(access: &str, refresh: &str, expires_at: &str) -> SessionData {
	SessionData {
		tokens: StoredTokens::from_raw(Some(access), Some(refresh), Some(expires_at)),
		..Default::default()
	}
}

fn expiry_from_now(offset: Duration) -> String {
	format_expiry(OffsetDateTime::now_utc() + offset).expect("Expiry fixture should format.")
}

#[tokio::test]
async fn valid_token_is_returned_without_network_calls() {
	let server = MockServer::start_async().await;
	let (oauth, _) = build_test_clients(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(500);
		})
		.await;
	let mut session =
		session_with("access-live", "refresh-live", &expiry_from_now(Duration::hours(1)));
	let before = session.clone();
	let token = flows::valid_access_token(&oauth, &mut session)
		.await
		.expect("Valid token should be returned as is.");

	assert_eq!(token.expose(), "access-live");
	assert_eq!(session, before);

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn expired_token_triggers_exactly_one_refresh() {
	let server = MockServer::start_async().await;
	let (oauth, _) = build_test_clients(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth/token")
				.body_includes("grant_type=refresh_token")
				.body_includes("refresh_token=refresh-old");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-new\",\"refresh_token\":\"refresh-new\",\"token_type\":\"bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let mut session = session_with("access-old", "refresh-old", "2020-01-01 00:00:00");
	let token = flows::valid_access_token(&oauth, &mut session)
		.await
		.expect("Expired token should be refreshed.");

	mock.assert_calls_async(1).await;

	assert_eq!(token.expose(), "access-new");
	assert_eq!(session.tokens.access_token.as_ref().map(TokenSecret::expose), Some("access-new"));
	assert_eq!(session.tokens.refresh_token.as_ref().map(TokenSecret::expose), Some("refresh-new"));
	assert_eq!(AuthState::of(&session.tokens, OffsetDateTime::now_utc()), AuthState::Authenticated);
}

#[tokio::test]
async fn expiry_equal_to_now_counts_as_expired() {
	let server = MockServer::start_async().await;
	let (oauth, _) = build_test_clients(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-new\",\"refresh_token\":\"refresh-new\",\"token_type\":\"bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let now = OffsetDateTime::now_utc().replace_nanosecond(0).expect("Zero nanoseconds are valid.");
	let expires = format_expiry(now).expect("Expiry fixture should format.");
	let mut session = session_with("access-old", "refresh-old", &expires);
	let token = flows::valid_access_token_at(&oauth, &mut session, now)
		.await
		.expect("Token expiring now should be refreshed.");

	mock.assert_calls_async(1).await;

	assert_eq!(token.expose(), "access-new");
}

#[tokio::test]
async fn refresh_without_new_refresh_token_keeps_the_previous_one() {
	let server = MockServer::start_async().await;
	let (oauth, _) = build_test_clients(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-new\",\"token_type\":\"bearer\",\"expires_in\":3600}");
		})
		.await;
	let mut session = session_with("access-old", "refresh-keep", "2020-01-01 00:00:00");

	flows::valid_access_token(&oauth, &mut session).await.expect("Refresh should succeed.");

	mock.assert_calls_async(1).await;

	assert_eq!(session.tokens.access_token.as_ref().map(TokenSecret::expose), Some("access-new"));
	assert_eq!(
		session.tokens.refresh_token.as_ref().map(TokenSecret::expose),
		Some("refresh-keep")
	);
}

#[tokio::test]
async fn unreadable_expiry_triggers_refresh() {
	let server = MockServer::start_async().await;
	let (oauth, _) = build_test_clients(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-new\",\"refresh_token\":\"refresh-new\",\"token_type\":\"bearer\"}",
			);
		})
		.await;
	let mut session = session_with("access-old", "refresh-old", "tomorrow-ish");
	let token = flows::valid_access_token(&oauth, &mut session)
		.await
		.expect("Unreadable expiry should be refreshed.");

	mock.assert_calls_async(1).await;

	assert_eq!(token.expose(), "access-new");
}

#[tokio::test]
async fn missing_fields_require_authorization_without_network_calls() {
	let server = MockServer::start_async().await;
	let (oauth, _) = build_test_clients(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(500);
		})
		.await;
	let mut session = SessionData {
		tokens: StoredTokens::from_raw(Some("access-only"), None, Some("2020-01-01 00:00:00")),
		..Default::default()
	};
	let err = flows::valid_access_token(&oauth, &mut session)
		.await
		.expect_err("Incomplete tokens should be rejected.");

	mock.assert_calls_async(0).await;

	assert!(matches!(err, Error::MissingCredentials));
	assert!(err.requires_reauthorization());
}

#[tokio::test]
async fn refresh_failure_leaves_the_store_untouched() {
	let server = MockServer::start_async().await;
	let (oauth, _) = build_test_clients(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\"}");
		})
		.await;
	let mut session = session_with("access-old", "refresh-revoked", "2020-01-01 00:00:00");
	let before = session.clone();
	let err = flows::valid_access_token(&oauth, &mut session)
		.await
		.expect_err("Revoked refresh token should fail.");

	mock.assert_calls_async(1).await;

	assert!(matches!(err, Error::RefreshFailed { .. }));
	assert!(err.requires_reauthorization());
	assert_eq!(session, before);
}

#[tokio::test]
async fn stored_refresh_token_alone_is_enough_to_refresh() {
	let server = MockServer::start_async().await;
	let (oauth, _) = build_test_clients(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth/token")
				.body_includes("grant_type=refresh_token")
				.body_includes("refresh_token=refresh-only");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-new\",\"token_type\":\"bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let mut session = SessionData {
		tokens: StoredTokens::from_raw(None, Some("refresh-only"), None),
		..Default::default()
	};
	let token = flows::refresh_stored_token(&oauth, &mut session)
		.await
		.expect("Refresh token alone should be enough.");

	mock.assert_async().await;

	assert_eq!(token.expose(), "access-new");
	assert_eq!(
		session.tokens.refresh_token.as_ref().map(TokenSecret::expose),
		Some("refresh-only")
	);
	assert!(session.tokens.expires_at().is_some());

	let mut empty = SessionData::default();
	let err = flows::refresh_stored_token(&oauth, &mut empty)
		.await
		.expect_err("No refresh token should require authorization.");

	assert!(matches!(err, Error::MissingCredentials));
	mock.assert_calls_async(1).await;
}
