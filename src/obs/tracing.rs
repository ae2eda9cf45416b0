// self
use crate::{_prelude::*, error::AuthError, http::Method, obs::Operation};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by client operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(op: Operation, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("dirsync_client.op", op = op.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (op, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a debug event for an outbound request. The URL never carries credentials.
pub fn trace_request(method: &Method, url: &Url) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(method = %method, url = %url, "sending request");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (method, url);
	}
}

/// Emits a debug event for a received response.
pub fn trace_response(status: u16) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(status, "received response");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = status;
	}
}

/// Warns that an early refresh failed and the still-valid token is used instead.
pub fn trace_refresh_fallback(error: &AuthError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(error = %error, "early refresh failed; reusing the current token");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = error;
	}
}
