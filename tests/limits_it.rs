// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use hh_limits::{
	_preludet::*,
	api::{Limits, NO_NAME},
	auth::TokenSecret,
	error::TransportError,
	flows,
	http::Endpoint,
};

const TOKEN: &str = "access-it";

fn token() -> TokenSecret {
	TokenSecret::new(TOKEN)
}

#[tokio::test]
async fn caller_limits_fall_back_to_placeholder_name() {
	let server = MockServer::start_async().await;
	let (_, api) = build_test_clients(&server.base_url());
	let me = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/me")
				.header("authorization", format!("Bearer {TOKEN}"))
				.header("accept", "application/json");
			then.status(200).json_body(json!({
				"employer": { "id": "E1" },
				"manager": { "id": "M1" },
			}));
		})
		.await;
	let manager = server
		.mock_async(|when, then| {
			when.method(GET).path("/employers/E1/managers/M1");
			then.status(500).body("internal error");
		})
		.await;
	let limits = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/employers/E1/managers/M1/limits/resume")
				.query_param("locale", "RU")
				.query_param("host", "hh.ru");
			then.status(200).json_body(json!({ "used": 3, "total": 10 }));
		})
		.await;
	let record = flows::caller_limits(&api, &token()).await.expect("Caller limits should load.");

	me.assert_async().await;
	manager.assert_async().await;
	limits.assert_async().await;

	assert_eq!(record.manager_id.as_str(), "M1");
	assert_eq!(record.manager_name, NO_NAME);
	assert_eq!(
		serde_json::to_value(&record).expect("Record should serialize."),
		json!({
			"manager_id": "M1",
			"manager_name": "Без имени",
			"limits": { "used": 3, "total": 10 },
		})
	);
}

#[tokio::test]
async fn denied_limits_become_the_placeholder() {
	for status in [403, 404] {
		let server = MockServer::start_async().await;
		let (_, api) = build_test_clients(&server.base_url());

		server
			.mock_async(|when, then| {
				when.method(GET).path("/me");
				then.status(200).json_body(json!({
					"employer": { "id": 42 },
					"manager": { "id": 7 },
				}));
			})
			.await;
		server
			.mock_async(|when, then| {
				when.method(GET).path("/employers/42/managers/7");
				then.status(200).json_body(json!({ "full_name": "Иван Петров" }));
			})
			.await;
		server
			.mock_async(|when, then| {
				when.method(GET).path("/employers/42/managers/7/limits/resume");
				then.status(status).json_body(json!({ "errors": [{ "type": "forbidden" }] }));
			})
			.await;

		let record =
			flows::caller_limits(&api, &token()).await.expect("Denied limits are not fatal.");

		assert_eq!(record.manager_id.as_str(), "7");
		assert_eq!(record.manager_name, "Иван Петров");
		assert_eq!(record.limits, Limits::NoData);
	}
}

#[tokio::test]
async fn failing_limits_endpoint_becomes_the_placeholder() {
	let server = MockServer::start_async().await;
	let (_, api) = build_test_clients(&server.base_url());

	server
		.mock_async(|when, then| {
			when.method(GET).path("/me");
			then.status(200).json_body(json!({
				"employer": { "id": "E1" },
				"manager": { "id": "M1" },
			}));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/employers/E1/managers/M1");
			then.status(200).json_body(json!({ "full_name": "Анна" }));
		})
		.await;

	let limits = server
		.mock_async(|when, then| {
			when.method(GET).path("/employers/E1/managers/M1/limits/resume");
			then.status(500).body("<html>upstream failure</html>");
		})
		.await;
	let record =
		flows::caller_limits(&api, &token()).await.expect("Failing limits are not fatal.");

	limits.assert_async().await;

	assert_eq!(record.manager_name, "Анна");
	assert_eq!(record.limits, Limits::NoData);
}

#[tokio::test]
async fn empty_limits_object_becomes_the_placeholder() {
	let server = MockServer::start_async().await;
	let (_, api) = build_test_clients(&server.base_url());

	server
		.mock_async(|when, then| {
			when.method(GET).path("/me");
			then.status(200).json_body(json!({
				"employer": { "id": "E1" },
				"manager": { "id": "M1" },
			}));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/employers/E1/managers/M1");
			then.status(200).json_body(json!({ "full_name": "Анна" }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/employers/E1/managers/M1/limits/resume");
			then.status(200).json_body(json!({}));
		})
		.await;

	let record = flows::caller_limits(&api, &token()).await.expect("Empty limits are not fatal.");

	assert_eq!(record.limits, Limits::NoData);
}

#[tokio::test]
async fn slow_identity_lookup_is_a_timeout() {
	let server = MockServer::start_async().await;
	let http = test_reqwest_http_client_with_timeout(std::time::Duration::from_millis(200));
	let (_, api) = build_test_clients_over(&server.base_url(), http);

	server
		.mock_async(|when, then| {
			when.method(GET).path("/me");
			then.status(200)
				.json_body(json!({ "employer": { "id": "E1" }, "manager": { "id": "M1" } }))
				.delay(std::time::Duration::from_secs(2));
		})
		.await;

	let err = flows::caller_limits(&api, &token()).await.expect_err("Slow /me should time out.");

	assert!(
		matches!(err, Error::Transport(TransportError::Timeout { endpoint: Endpoint::Me })),
		"unexpected error: {err:?}"
	);
}

#[tokio::test]
async fn missing_employer_is_an_incomplete_identity() {
	let server = MockServer::start_async().await;
	let (_, api) = build_test_clients(&server.base_url());

	server
		.mock_async(|when, then| {
			when.method(GET).path("/me");
			then.status(200).json_body(json!({ "manager": { "id": "M1" } }));
		})
		.await;

	let manager = server
		.mock_async(|when, then| {
			when.method(GET).path("/employers/E1/managers/M1");
			then.status(200).json_body(json!({}));
		})
		.await;
	let err =
		flows::caller_limits(&api, &token()).await.expect_err("Identity should be incomplete.");

	manager.assert_calls_async(0).await;

	assert!(matches!(err, Error::IncompleteIdentity { field: "employer.id" }));
}

#[tokio::test]
async fn identity_status_failure_aborts_the_lookup() {
	let server = MockServer::start_async().await;
	let (_, api) = build_test_clients(&server.base_url());

	server
		.mock_async(|when, then| {
			when.method(GET).path("/me");
			then.status(401).json_body(json!({ "errors": [{ "type": "oauth" }] }));
		})
		.await;

	let err = flows::caller_limits(&api, &token()).await.expect_err("Unauthorized should fail.");

	assert!(matches!(
		err,
		Error::Response(hh_limits::error::ResponseError::Status { status: 401, .. })
	));
}

#[tokio::test]
async fn employer_limits_cover_every_manager_in_order() {
	let server = MockServer::start_async().await;
	let (_, api) = build_test_clients(&server.base_url());

	server
		.mock_async(|when, then| {
			when.method(GET).path("/me");
			then.status(200).json_body(json!({ "employer": { "id": "E1" } }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/employers/E1/managers");
			then.status(200).json_body(json!({
				"items": [
					{ "id": "M1", "full_name": "Listing Name" },
					{ "full_name": "No Id" },
					{ "id": "M2", "full_name": "Бета" },
				],
			}));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/employers/E1/managers/M1");
			then.status(200).json_body(json!({ "full_name": "Альфа" }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/employers/E1/managers/M2");
			then.status(404);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/employers/E1/managers/M1/limits/resume");
			then.status(200).json_body(json!({ "left": 5 }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/employers/E1/managers/M2/limits/resume");
			then.status(403);
		})
		.await;

	let records =
		flows::employer_limits(&api, &token()).await.expect("Employer limits should load.");
	let summary: Vec<_> =
		records.iter().map(|r| (r.manager_id.as_str(), r.manager_name.as_str())).collect();

	assert_eq!(summary, [("M1", "Альфа"), ("M2", "Бета")]);
	assert_eq!(records[0].limits.payload().and_then(|map| map.get("left")), Some(&json!(5)));
	assert_eq!(records[1].limits, Limits::NoData);
}

#[tokio::test]
async fn employer_without_managers_is_reported() {
	let server = MockServer::start_async().await;
	let (_, api) = build_test_clients(&server.base_url());

	server
		.mock_async(|when, then| {
			when.method(GET).path("/me");
			then.status(200).json_body(json!({ "employer": { "id": "E1" } }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/employers/E1/managers");
			then.status(200).json_body(json!({ "items": [] }));
		})
		.await;

	let err = flows::employer_limits(&api, &token()).await.expect_err("No managers should fail.");

	assert!(matches!(err, Error::NoManagers));
}
