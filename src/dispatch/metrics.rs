// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for dispatched requests.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
	sent: AtomicU64,
	auth_failures: AtomicU64,
	transport_failures: AtomicU64,
}
impl DispatchMetrics {
	/// Returns the number of requests handed to the transport.
	pub fn sent(&self) -> u64 {
		self.sent.load(Ordering::Relaxed)
	}

	/// Returns the number of calls rejected before sending because no token was available.
	pub fn auth_failures(&self) -> u64 {
		self.auth_failures.load(Ordering::Relaxed)
	}

	/// Returns the number of requests that failed in the transport.
	pub fn transport_failures(&self) -> u64 {
		self.transport_failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_sent(&self) {
		self.sent.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_auth_failure(&self) {
		self.auth_failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_transport_failure(&self) {
		self.transport_failures.fetch_add(1, Ordering::Relaxed);
	}
}
