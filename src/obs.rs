//! Spans, debug events, and counters for dispatches and token refreshes.
//!
//! Everything here compiles to a no-op unless the matching feature is on:
//!
//! - `tracing`: every dispatch and refresh runs inside a `dirsync_client.op` span carrying `op`
//!   and `stage`; dispatches also log the method, URL and response status at debug level. Tokens
//!   never reach a field.
//! - `metrics`: `dirsync_client_op_total{op, outcome}` counts attempts, successes and failures.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// What the client was doing when an event was recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// [`Dispatcher::request`](crate::dispatch::Dispatcher::request).
	Dispatch,
	/// A token source call behind the refresh gate, or a coalesced wait on one.
	Refresh,
}
impl Operation {
	/// Label used for the `op` span field and metric label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::Dispatch => "dispatch",
			Operation::Refresh => "refresh",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// How far an operation got.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Recorded on entry.
	Attempt,
	/// The caller got a value back.
	Success,
	/// The error was returned to the caller.
	Failure,
}
impl Outcome {
	/// Value of the `outcome` metric label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Failure => "failure",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
