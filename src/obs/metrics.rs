// self
use crate::obs::{Operation, Outcome};

/// Bumps `dirsync_client_op_total` for `op` and `outcome`; a no-op without `metrics`.
pub fn record_op_outcome(op: Operation, outcome: Outcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"dirsync_client_op_total",
			"op" => op.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (op, outcome);
	}
}
