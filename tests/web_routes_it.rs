// crates.io
use axum::{
	Router,
	body::{self, Body},
	http::{Request, Response, header},
};
use httpmock::prelude::*;
use serde_json::json;
use tower::ServiceExt;
// self
use hh_limits::{
	_preludet::*,
	auth::TokenSecret,
	web::{self, AppState, SESSION_COOKIE},
};

const TOKEN_BODY: &str = "{\"access_token\":\"access-web\",\"refresh_token\":\"refresh-web\",\"token_type\":\"bearer\",\"expires_in\":3600}";

fn app(server: &MockServer) -> Router {
	let (oauth, api) = build_test_clients(&server.base_url());
	let redirect = test_credentials().redirect_uri;

	web::router(AppState::new(oauth, api, &TokenSecret::new("web-test-secret"), &redirect))
}

async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
	let mut request = Request::builder().uri(uri);

	if let Some(cookie) = cookie {
		request = request.header(header::COOKIE, cookie);
	}

	app.clone()
		.oneshot(request.body(Body::empty()).expect("Request should build."))
		.await
		.expect("Router should respond.")
}

fn location(response: &Response<Body>) -> &str {
	response
		.headers()
		.get(header::LOCATION)
		.and_then(|value| value.to_str().ok())
		.expect("Redirect should carry a location.")
}

fn session_cookie(response: &Response<Body>) -> String {
	response
		.headers()
		.get_all(header::SET_COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.filter_map(|value| value.split(';').next())
		.find(|pair| pair.starts_with(&format!("{SESSION_COOKIE}=")))
		.map(str::to_owned)
		.expect("Response should set the session cookie.")
}

async fn body_text(response: Response<Body>) -> String {
	let bytes =
		body::to_bytes(response.into_body(), usize::MAX).await.expect("Body should be readable.");

	String::from_utf8(bytes.to_vec()).expect("Body should be UTF-8.")
}

#[tokio::test]
async fn health_and_entry_page_render() {
	let server = MockServer::start_async().await;
	let app = app(&server);
	let health = get(&app, "/health", None).await;

	assert_eq!(health.status(), StatusCode::OK);
	assert_eq!(body_text(health).await, "ok");

	let index = get(&app, "/", None).await;

	assert_eq!(index.status(), StatusCode::OK);
	assert!(body_text(index).await.contains("/login"));
}

#[tokio::test]
async fn login_redirects_to_the_authorization_page() {
	let server = MockServer::start_async().await;
	let app = app(&server);
	let response = get(&app, "/login", None).await;

	assert!(response.status().is_redirection());

	let target = Url::parse(location(&response)).expect("Location should be a URL.");
	let pairs: HashMap<_, _> = target.query_pairs().into_owned().collect();

	assert_eq!(target.path(), "/oauth/authorize");
	assert_eq!(pairs.get("client_id").map(String::as_str), Some("client-it"));
	assert_eq!(pairs.get("scope").map(String::as_str), Some("employer"));
}

#[tokio::test]
async fn malformed_code_is_rejected_without_calling_the_token_endpoint() {
	let server = MockServer::start_async().await;
	let app = app(&server);
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let response = get(&app, "/callback?code=bad%20code%3B", None).await;

	token.assert_calls_async(0).await;

	assert!(response.status().is_redirection());
	assert_eq!(location(&response), "/");

	let cookie = session_cookie(&response);
	let index = get(&app, "/", Some(&cookie)).await;
	let page = body_text(index).await;

	assert!(page.contains("Некорректный формат кода авторизации"));
	assert!(page.contains("/login"));
}

#[tokio::test]
async fn callback_error_parameter_is_flashed() {
	let server = MockServer::start_async().await;
	let app = app(&server);
	let response = get(&app, "/callback?error=access_denied", None).await;

	assert_eq!(location(&response), "/");

	let page = body_text(get(&app, "/", Some(&session_cookie(&response))).await).await;

	assert!(page.contains("Ошибка авторизации: access_denied"));
}

#[tokio::test]
async fn full_authorization_then_limits_page() {
	let server = MockServer::start_async().await;
	let app = app(&server);
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token").body_includes("code=good-code");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/me").header("authorization", "Bearer access-web");
			then.status(200).json_body(json!({
				"employer": { "id": "E1" },
				"manager": { "id": "M1" },
			}));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/employers/E1/managers/M1");
			then.status(200).json_body(json!({ "full_name": "Мария Иванова" }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/employers/E1/managers/M1/limits/resume");
			then.status(200).json_body(json!({ "spend": { "resume_view": 3 }, "limit": 10 }));
		})
		.await;

	let callback = get(&app, "/callback?code=good-code", None).await;

	token.assert_calls_async(1).await;

	assert_eq!(location(&callback), "/limits");

	let cookie = session_cookie(&callback);
	let limits = get(&app, "/limits", Some(&cookie)).await;

	assert_eq!(limits.status(), StatusCode::OK);

	let page = body_text(limits).await;

	assert!(page.contains("Авторизация прошла успешно!"));
	assert!(page.contains("Мария Иванова"));
	assert!(page.contains("spend.resume_view"));
	assert!(page.contains("10"));
}

#[tokio::test]
async fn limits_without_session_redirects_to_entry() {
	let server = MockServer::start_async().await;
	let app = app(&server);
	let me = server
		.mock_async(|when, then| {
			when.method(GET).path("/me");
			then.status(200).json_body(json!({}));
		})
		.await;
	let response = get(&app, "/limits", None).await;

	me.assert_calls_async(0).await;

	assert!(response.status().is_redirection());
	assert_eq!(location(&response), "/");

	let page = body_text(get(&app, "/", Some(&session_cookie(&response))).await).await;

	assert!(page.contains("Токены отсутствуют"));
}

#[tokio::test]
async fn incomplete_identity_keeps_the_session() {
	let server = MockServer::start_async().await;
	let app = app(&server);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/me");
			then.status(200).json_body(json!({ "manager": { "id": "M1" } }));
		})
		.await;

	let callback = get(&app, "/callback?code=good-code", None).await;
	let limits = get(&app, "/limits", Some(&session_cookie(&callback))).await;

	assert_eq!(location(&limits), "/");

	let page = body_text(get(&app, "/", Some(&session_cookie(&limits))).await).await;

	assert!(page.contains("Не удалось получить employer_id из данных пользователя."));
	assert!(page.contains("/logout"));
}

#[tokio::test]
async fn failed_refresh_signs_the_caller_out() {
	let server = MockServer::start_async().await;
	let app = app(&server);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token").body_includes("grant_type=authorization_code");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-stale\",\"refresh_token\":\"refresh-stale\",\"token_type\":\"bearer\",\"expires_in\":0}",
			);
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token").body_includes("grant_type=refresh_token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\"}");
		})
		.await;
	let me = server
		.mock_async(|when, then| {
			when.method(GET).path("/me");
			then.status(200).json_body(json!({}));
		})
		.await;
	let callback = get(&app, "/callback?code=good-code", None).await;
	let limits = get(&app, "/limits", Some(&session_cookie(&callback))).await;

	refresh.assert_calls_async(1).await;
	me.assert_calls_async(0).await;

	assert_eq!(location(&limits), "/");

	let page = body_text(get(&app, "/", Some(&session_cookie(&limits))).await).await;

	assert!(page.contains("Не удалось обновить токен доступа"));
	assert!(page.contains("href=\"/login\""));
	assert!(!page.contains("href=\"/logout\""));
}

#[tokio::test]
async fn logout_clears_tokens_and_flashes() {
	let server = MockServer::start_async().await;
	let app = app(&server);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;

	let callback = get(&app, "/callback?code=good-code", None).await;
	let logout = get(&app, "/logout", Some(&session_cookie(&callback))).await;

	assert_eq!(location(&logout), "/");

	let page = body_text(get(&app, "/", Some(&session_cookie(&logout))).await).await;

	assert!(page.contains("Вы успешно вышли из системы."));
	assert!(page.contains("/login"));
	assert!(!page.contains("/logout"));
}

#[tokio::test]
async fn tampered_cookie_is_ignored() {
	let server = MockServer::start_async().await;
	let app = app(&server);
	let forged = format!("{SESSION_COOKIE}=forged-signature%7B%7D");
	let response = get(&app, "/", Some(&forged)).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert!(body_text(response).await.contains("/login"));
}
