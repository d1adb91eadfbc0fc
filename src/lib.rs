//! Resume-view quota viewer for hh.ru employer accounts: OAuth 2.0 code exchange with
//! refresh-before-expiry, served through a small web front end or a console report.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]
// Unit tests also see the crate itself, pulled in with the `test` feature.
#![cfg_attr(test, allow(unused_crate_dependencies))]

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod store;
pub mod web;
#[cfg(any(test, feature = "test"))]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		api::ApiClient,
		config::Credentials,
		http::ReqwestHttpClient,
		oauth::{OAuthClient, ReqwestOAuthClient},
		provider::HhEndpoints,
	};

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		ReqwestHttpClient::with_client(
			insecure_client_builder()
				.build()
				.expect("Failed to build insecure Reqwest client for tests."),
		)
	}

	/// Same as [`test_reqwest_http_client`], but gives up on any request slower than `timeout`.
	pub fn test_reqwest_http_client_with_timeout(
		timeout: std::time::Duration,
	) -> ReqwestHttpClient {
		ReqwestHttpClient::with_client(
			insecure_client_builder()
				.timeout(timeout)
				.build()
				.expect("Failed to build insecure Reqwest client with a timeout for tests."),
		)
	}

	/// Builds an endpoint set whose every URL points at the provided mock server base URL.
	pub fn test_endpoints(base: &str) -> HhEndpoints {
		let base = Url::parse(base).expect("Failed to parse mock server base URL.");

		HhEndpoints::builder()
			.authorization_endpoint(
				base.join("/oauth/authorize").expect("Failed to build mock authorize URL."),
			)
			.token_endpoint(base.join("/oauth/token").expect("Failed to build mock token URL."))
			.api_base(base.join("/").expect("Failed to build mock API base URL."))
			.build()
			.expect("Mock endpoints should pass validation.")
	}

	/// Credential bundle shared by integration tests.
	pub fn test_credentials() -> Credentials {
		Credentials::new(
			"client-it",
			"secret-it",
			Url::parse("https://app.example.com/callback")
				.expect("Failed to parse test redirect URI."),
		)
	}

	/// Constructs the OAuth and API clients used across integration tests, both pointed at the
	/// mock server and sharing the insecure test transport.
	pub fn build_test_clients(base: &str) -> (ReqwestOAuthClient, ApiClient) {
		build_test_clients_over(base, test_reqwest_http_client())
	}

	/// Like [`build_test_clients`], over a caller-supplied transport.
	pub fn build_test_clients_over(
		base: &str,
		http_client: ReqwestHttpClient,
	) -> (ReqwestOAuthClient, ApiClient) {
		let endpoints = test_endpoints(base);
		let oauth = OAuthClient::with_http_client(
			test_credentials(),
			endpoints.clone(),
			http_client.clone(),
			Arc::new(crate::oauth::ReqwestTransportErrorMapper),
		)
		.expect("Test OAuth client should build.");
		let api = ApiClient::new(http_client, endpoints);

		(oauth, api)
	}

	fn insecure_client_builder() -> reqwest::ClientBuilder {
		ReqwestClient::builder()
			.user_agent("hh-limits-tests/1.0")
			.redirect(reqwest::redirect::Policy::none())
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		path::{Path, PathBuf},
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError, StatusCode};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map as JsonMap, Value as JsonValue};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
