//! Typed views over the JSON payloads returned by the API.

// self
use crate::{
	_prelude::*,
	auth::{EmployerId, ManagerId},
};

/// Display name used when the manager name cannot be determined.
pub const NO_NAME: &str = "Без имени";
/// Placeholder rendered instead of limits when none could be fetched.
pub const NO_DATA: &str = "Нет данных или доступ запрещен.";

/// Employer and manager identifiers of the caller, taken from `GET /me`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
	/// Employer the caller belongs to.
	pub employer_id: EmployerId,
	/// Caller's own manager identifier.
	pub manager_id: ManagerId,
}
impl Identity {
	/// Extracts `employer.id` and `manager.id` from a `/me` payload.
	pub fn from_me(payload: &JsonValue) -> Result<Self> {
		let employer_id = employer_from_me(payload)?;
		let manager_id = nested_id(payload, "manager")
			.and_then(|raw| ManagerId::from_json(raw).ok().flatten())
			.ok_or(Error::IncompleteIdentity { field: "manager.id" })?;

		Ok(Self { employer_id, manager_id })
	}
}

/// Extracts `employer.id` from a `/me` payload.
pub fn employer_from_me(payload: &JsonValue) -> Result<EmployerId> {
	nested_id(payload, "employer")
		.and_then(|raw| EmployerId::from_json(raw).ok().flatten())
		.ok_or(Error::IncompleteIdentity { field: "employer.id" })
}

/// One entry of the employer's manager listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManagerSummary {
	/// Manager identifier.
	pub id: ManagerId,
	/// Name shown in the listing, if any.
	pub full_name: Option<String>,
}

/// Reads `items[]` of a manager listing, skipping entries without a usable `id`.
pub fn managers_from_listing(payload: &JsonValue) -> Vec<ManagerSummary> {
	let Some(items) = payload.get("items").and_then(JsonValue::as_array) else {
		return Vec::new();
	};

	items
		.iter()
		.filter_map(|item| {
			let id = item.get("id").and_then(|raw| ManagerId::from_json(raw).ok().flatten())?;

			Some(ManagerSummary { id, full_name: full_name(item) })
		})
		.collect()
}

/// Reads a non-empty `full_name` from a manager payload.
pub fn full_name(payload: &JsonValue) -> Option<String> {
	payload
		.get("full_name")
		.and_then(JsonValue::as_str)
		.map(str::trim)
		.filter(|name| !name.is_empty())
		.map(str::to_owned)
}

/// Resume-view limits of one manager.
#[derive(Clone, Debug, PartialEq)]
pub enum Limits {
	/// Object returned verbatim by the limits endpoint.
	Payload(JsonMap<String, JsonValue>),
	/// Limits are unavailable; renders as [`NO_DATA`].
	NoData,
}
impl Limits {
	/// Returns the payload, if one was fetched.
	pub fn payload(&self) -> Option<&JsonMap<String, JsonValue>> {
		match self {
			Limits::Payload(map) => Some(map),
			Limits::NoData => None,
		}
	}

	/// Renders the limits as 4-space indented JSON, or the placeholder.
	pub fn to_pretty_string(&self) -> String {
		match self {
			Limits::Payload(map) => pretty_json(map).unwrap_or_else(|_| NO_DATA.to_owned()),
			Limits::NoData => NO_DATA.to_owned(),
		}
	}
}
impl Serialize for Limits {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		match self {
			Limits::Payload(map) => map.serialize(serializer),
			Limits::NoData => serializer.serialize_str(NO_DATA),
		}
	}
}

/// One row of the report: a manager and their limits.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ManagerLimitRecord {
	/// Manager identifier.
	pub manager_id: ManagerId,
	/// Manager display name or [`NO_NAME`].
	pub manager_name: String,
	/// Limits payload or the placeholder.
	pub limits: Limits,
}

fn nested_id<'a>(payload: &'a JsonValue, field: &str) -> Option<&'a JsonValue> {
	payload.get(field)?.get("id")
}

fn pretty_json(map: &JsonMap<String, JsonValue>) -> Result<String, serde_json::Error> {
	let mut buf = Vec::new();
	let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
	let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);

	map.serialize(&mut serializer)?;

	// serde_json only emits valid UTF-8.
	Ok(String::from_utf8_lossy(&buf).into_owned())
}
