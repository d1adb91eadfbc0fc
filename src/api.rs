//! REST API client for identity, manager, and resume-limit lookups.

pub mod models;

pub use models::*;

// crates.io
use reqwest::header::{ACCEPT, HeaderValue};
// self
use crate::{
	_prelude::*,
	auth::{EmployerId, ManagerId, TokenSecret},
	error::{ResponseError, TransportError},
	http::{Endpoint, ReqwestHttpClient, body_preview},
	provider::HhEndpoints,
};

/// Result of a limits lookup. Only a JSON object counts as a payload.
#[derive(Clone, Debug, PartialEq)]
pub enum LimitsFetch {
	/// HTTP 200 with a non-empty JSON object body.
	Payload(JsonMap<String, JsonValue>),
	/// HTTP 403 or 404; the manager has no limits or the caller may not see them.
	AccessDenied {
		/// Status that was returned.
		status: u16,
	},
	/// Any other status, an empty or malformed body, or a transport failure.
	Failed,
}
impl LimitsFetch {
	/// Folds the outcome into the value rendered for the caller.
	pub fn into_limits(self) -> Limits {
		match self {
			LimitsFetch::Payload(map) => Limits::Payload(map),
			LimitsFetch::AccessDenied { .. } | LimitsFetch::Failed => Limits::NoData,
		}
	}
}

/// Bearer-authenticated client for the API root in [`HhEndpoints`].
///
/// Every call is a single attempt bounded by the transport timeout; nothing is retried.
#[derive(Clone, Debug)]
pub struct ApiClient {
	http: ReqwestHttpClient,
	endpoints: HhEndpoints,
}
impl ApiClient {
	/// Creates a client over the shared transport.
	pub fn new(http: ReqwestHttpClient, endpoints: HhEndpoints) -> Self {
		Self { http, endpoints }
	}

	/// Endpoint set the client talks to.
	pub fn endpoints(&self) -> &HhEndpoints {
		&self.endpoints
	}

	/// `GET /me`, requiring both `employer.id` and `manager.id`.
	pub async fn identity(&self, token: &TokenSecret) -> Result<Identity> {
		let payload = self.get_json(Endpoint::Me, self.endpoints.me_url(), token).await?;

		Identity::from_me(&payload)
	}

	/// `GET /me`, requiring only `employer.id`.
	pub async fn employer(&self, token: &TokenSecret) -> Result<EmployerId> {
		let payload = self.get_json(Endpoint::Me, self.endpoints.me_url(), token).await?;

		employer_from_me(&payload)
	}

	/// `GET /employers/{id}/managers`; entries without an id are dropped.
	pub async fn managers(
		&self,
		token: &TokenSecret,
		employer: &EmployerId,
	) -> Result<Vec<ManagerSummary>> {
		let payload =
			self.get_json(Endpoint::Managers, self.endpoints.managers_url(employer), token).await?;

		Ok(managers_from_listing(&payload))
	}

	/// `GET /employers/{id}/managers/{id}`, reduced to `full_name`.
	///
	/// Failures are logged and yield `None`; the caller falls back to [`NO_NAME`].
	pub async fn manager_name(
		&self,
		token: &TokenSecret,
		employer: &EmployerId,
		manager: &ManagerId,
	) -> Option<String> {
		let url = self.endpoints.manager_url(employer, manager);

		match self.get_json(Endpoint::Manager, url, token).await {
			Ok(payload) => full_name(&payload),
			Err(Error::Response(ResponseError::Status { status, .. })) => {
				tracing::warn!(manager_id = %manager, status, "manager lookup failed");

				None
			},
			Err(e) => {
				tracing::error!(manager_id = %manager, error = %e, "manager lookup failed");

				None
			},
		}
	}

	/// `GET /employers/{id}/managers/{id}/limits/resume`.
	///
	/// 403 and 404 are logged as warnings; every other failure is logged as an error.
	pub async fn resume_limits(
		&self,
		token: &TokenSecret,
		employer: &EmployerId,
		manager: &ManagerId,
	) -> LimitsFetch {
		let url = self.endpoints.resume_limits_url(employer, manager);

		match self.get_json(Endpoint::ResumeLimits, url, token).await {
			Ok(JsonValue::Object(map)) if map.is_empty() => {
				tracing::warn!(manager_id = %manager, "limits payload is empty");

				LimitsFetch::Failed
			},
			Ok(JsonValue::Object(map)) => LimitsFetch::Payload(map),
			Ok(other) => {
				tracing::error!(
					manager_id = %manager,
					kind = json_kind(&other),
					"limits payload is not an object"
				);

				LimitsFetch::Failed
			},
			Err(Error::Response(ResponseError::Status { status: status @ (403 | 404), .. })) => {
				if status == StatusCode::FORBIDDEN.as_u16() {
					tracing::warn!(manager_id = %manager, status, "access to limits denied");
				} else {
					tracing::warn!(manager_id = %manager, status, "no limits for manager");
				}

				LimitsFetch::AccessDenied { status }
			},
			Err(e) => {
				tracing::error!(manager_id = %manager, error = %e, "limits lookup failed");

				LimitsFetch::Failed
			},
		}
	}

	async fn get_json(
		&self,
		endpoint: Endpoint,
		url: Url,
		token: &TokenSecret,
	) -> Result<JsonValue> {
		tracing::debug!(%endpoint, path = url.path(), "calling API");

		let response = self
			.http
			.get(url)
			.bearer_auth(token.expose())
			.header(ACCEPT, HeaderValue::from_static("application/json"))
			.send()
			.await
			.map_err(|e| TransportError::from_reqwest(endpoint, e))?;
		let status = response.status();
		let body = response.text().await.map_err(|e| TransportError::from_reqwest(endpoint, e))?;

		if status != StatusCode::OK {
			return Err(ResponseError::Status {
				endpoint,
				status: status.as_u16(),
				message: body_preview(&body),
			}
			.into());
		}

		serde_json::from_str(&body)
			.map_err(|source| ResponseError::Json { endpoint, source }.into())
	}
}

fn json_kind(value: &JsonValue) -> &'static str {
	match value {
		JsonValue::Null => "null",
		JsonValue::Bool(_) => "bool",
		JsonValue::Number(_) => "number",
		JsonValue::String(_) => "string",
		JsonValue::Array(_) => "array",
		JsonValue::Object(_) => "object",
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn non_payload_outcomes_fold_to_placeholder() {
		assert_eq!(LimitsFetch::AccessDenied { status: 403 }.into_limits(), Limits::NoData);
		assert_eq!(LimitsFetch::Failed.into_limits(), Limits::NoData);
		assert!(LimitsFetch::Payload(JsonMap::new()).into_limits().payload().is_some());
	}

	#[test]
	fn json_kind_labels_values() {
		assert_eq!(json_kind(&serde_json::json!([1])), "array");
		assert_eq!(json_kind(&JsonValue::Null), "null");
	}
}
