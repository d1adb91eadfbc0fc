//! Resume-limit lookups for the caller (web) and for every manager of the employer (console).

// self
use crate::{
	_prelude::*,
	api::{ApiClient, Identity, ManagerLimitRecord, NO_NAME},
	auth::{EmployerId, ManagerId, TokenSecret},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Fetches the caller's own limits: `/me`, then manager info, then limits.
///
/// Only the identity lookup is fatal. A failed manager lookup falls back to the "no name"
/// placeholder and a failed limits lookup to the "no data" placeholder.
pub async fn caller_limits(api: &ApiClient, token: &TokenSecret) -> Result<ManagerLimitRecord> {
	observe("caller_limits", async {
		let Identity { employer_id, manager_id } = api.identity(token).await?;
		let manager_name = api.manager_name(token, &employer_id, &manager_id).await;

		Ok::<_, Error>(manager_record(api, token, &employer_id, manager_id, manager_name).await)
	})
	.await
}

/// Fetches limits for every manager of the caller's employer, one manager at a time.
///
/// The name comes from the manager lookup, then from the listing, then the placeholder.
pub async fn employer_limits(
	api: &ApiClient,
	token: &TokenSecret,
) -> Result<Vec<ManagerLimitRecord>> {
	observe("employer_limits", async {
		let employer_id = api.employer(token).await?;
		let managers = api.managers(token, &employer_id).await?;

		if managers.is_empty() {
			return Err(Error::NoManagers);
		}

		tracing::info!(
			employer_id = %employer_id,
			count = managers.len(),
			"fetching manager limits"
		);

		let mut records = Vec::with_capacity(managers.len());

		for summary in managers {
			let manager_name = api
				.manager_name(token, &employer_id, &summary.id)
				.await
				.or(summary.full_name);

			records.push(manager_record(api, token, &employer_id, summary.id, manager_name).await);
		}

		Ok::<_, Error>(records)
	})
	.await
}

async fn manager_record(
	api: &ApiClient,
	token: &TokenSecret,
	employer_id: &EmployerId,
	manager_id: ManagerId,
	manager_name: Option<String>,
) -> ManagerLimitRecord {
	let limits = api.resume_limits(token, employer_id, &manager_id).await.into_limits();

	ManagerLimitRecord {
		manager_id,
		manager_name: manager_name.unwrap_or_else(|| NO_NAME.to_owned()),
		limits,
	}
}

async fn observe<T, Fut>(stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	const KIND: FlowKind = FlowKind::ResumeLimits;

	let span = FlowSpan::new(KIND, stage);

	obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
		Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
	}

	result
}
