//! Template contexts and the user-facing (Russian) wording of errors.

// crates.io
use askama::Template;
// self
use crate::{
	_prelude::*,
	api::{Limits, ManagerLimitRecord, NO_DATA},
	error::{ResponseError, TransportError},
	flows::AuthState,
	http::Endpoint,
	store::Flash,
};

/// Entry page.
#[derive(Debug, Template)]
#[template(path = "index.html")]
pub struct IndexPage {
	/// Messages flashed by the previous request.
	pub flashes: Vec<Flash>,
	/// Whether the caller has a session worth continuing.
	pub signed_in: bool,
}
impl IndexPage {
	/// Builds the page for the given session state.
	pub fn new(flashes: Vec<Flash>, state: AuthState) -> Self {
		Self { flashes, signed_in: !matches!(state, AuthState::Unauthenticated) }
	}
}

/// Limits page.
#[derive(Debug, Template)]
#[template(path = "limits.html")]
pub struct LimitsPage {
	/// Messages flashed during this or the previous request.
	pub flashes: Vec<Flash>,
	/// One entry per manager.
	pub managers: Vec<ManagerView>,
}

/// Flattened manager record for rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManagerView {
	/// Manager identifier.
	pub manager_id: String,
	/// Display name.
	pub manager_name: String,
	/// `dotted.key = value` rows of the limits payload; empty when `placeholder` is set.
	pub rows: Vec<LimitRow>,
	/// Placeholder text shown instead of the table.
	pub placeholder: Option<&'static str>,
}
impl From<&ManagerLimitRecord> for ManagerView {
	fn from(record: &ManagerLimitRecord) -> Self {
		let (rows, placeholder) = match &record.limits {
			Limits::Payload(map) => {
				let mut rows = Vec::new();

				flatten_into(&mut rows, None, map);

				(rows, None)
			},
			Limits::NoData => (Vec::new(), Some(NO_DATA)),
		};

		Self {
			manager_id: record.manager_id.to_string(),
			manager_name: record.manager_name.clone(),
			rows,
			placeholder,
		}
	}
}

/// Single row of the limits table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LimitRow {
	/// Dotted path into the payload.
	pub key: String,
	/// Scalar value rendered as text.
	pub value: String,
}

/// Wording shown to the caller when a flow fails.
pub fn user_message(error: &Error) -> String {
	match error {
		Error::AuthorizationDenied { reason } => format!("Ошибка авторизации: {reason}"),
		Error::MissingAuthCode => "Отсутствует параметр 'code' в запросе".into(),
		Error::InvalidAuthCode => "Некорректный формат кода авторизации".into(),
		Error::MissingCredentials =>
			"Ошибка: Токены отсутствуют. Пожалуйста, авторизуйтесь снова.".into(),
		Error::RefreshFailed { source } =>
			format!("Ошибка: Не удалось обновить токен доступа: {}", user_message(source)),
		Error::IncompleteIdentity { field } => match *field {
			"employer.id" => "Не удалось получить employer_id из данных пользователя.".into(),
			_ => "Не удалось получить manager_id из данных пользователя.".into(),
		},
		Error::Transport(TransportError::Timeout { .. }) =>
			"Превышено время ожидания ответа от HH.ru. Попробуйте снова.".into(),
		Error::Transport(_) => "Ошибка соединения с HH.ru. Попробуйте позже.".into(),
		Error::Response(ResponseError::Status { endpoint, status, message }) => {
			let action = match endpoint {
				Endpoint::Token => "получении токена доступа",
				Endpoint::Me => "получении информации о пользователе",
				Endpoint::Managers => "получении списка менеджеров",
				Endpoint::Manager => "получении информации о менеджере",
				Endpoint::ResumeLimits => "получении лимитов",
			};

			format!("Ошибка при {action}: {status}\n{message}")
		},
		Error::Response(ResponseError::MissingRefreshToken) =>
			"Не удалось получить access_token или refresh_token".into(),
		other => format!("Ошибка: {other}"),
	}
}

/// Warning flashed when a manager's limits could not be fetched.
pub fn missing_limits_message(record: &ManagerLimitRecord) -> String {
	format!(
		"Не удалось получить лимиты для менеджера: {} (ID: {}). Возможные причины: отсутствуют \
		 назначенные лимиты или недостаточные права доступа.",
		record.manager_name, record.manager_id
	)
}

fn flatten_into(rows: &mut Vec<LimitRow>, prefix: Option<&str>, map: &JsonMap<String, JsonValue>) {
	for (key, value) in map {
		let path = match prefix {
			Some(prefix) => format!("{prefix}.{key}"),
			None => key.clone(),
		};

		match value {
			JsonValue::Object(inner) => flatten_into(rows, Some(&path), inner),
			JsonValue::String(s) => rows.push(LimitRow { key: path, value: s.clone() }),
			JsonValue::Null => rows.push(LimitRow { key: path, value: "—".into() }),
			other => rows.push(LimitRow { key: path, value: other.to_string() }),
		}
	}
}
