// self
use crate::obs::{FlowKind, FlowOutcome};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"lyft_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Counts a credential tried by the dispatcher; `accepted` is `false` for 401 responses.
pub fn record_credential_trial_metric(accepted: bool) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"lyft_credential_trial_total",
			"outcome" => if accepted { "accepted" } else { "rejected" }
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = accepted;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_noop_without_metrics() {
		record_flow_outcome(FlowKind::AuthorizationCode, FlowOutcome::Failure);
		record_credential_trial_metric(false);
	}
}
