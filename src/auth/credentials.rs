//! Credentials provider contract plus the cached, single-flight [`Credentials`] implementation.
//!
//! The dispatcher only depends on [`CredentialsProvider`]. [`Credentials`] caches the current
//! [`TokenInfo`] and funnels every renewal through one async gate: while a refresh is in flight,
//! other refresh callers queue on the gate and receive the freshly minted token instead of
//! calling the [`TokenSource`] again, and [`CredentialsProvider::get_token`] keeps serving the
//! previous token without waiting.

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	auth::{StaticTokenSource, TokenInfo, TokenSource},
	error::AuthError,
	obs::{self, OpSpan, Operation, Outcome},
};

/// Boxed future returned by [`CredentialsProvider`] operations.
pub type CredentialsFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TokenInfo, AuthError>> + 'a + Send>>;

/// Supplies and refreshes the access token used to authenticate outbound requests.
pub trait CredentialsProvider
where
	Self: Send + Sync,
{
	/// Returns the current token without side effects when one is cached.
	fn get_token(&self) -> CredentialsFuture<'_>;

	/// Obtains a new token and replaces the cached one.
	fn refresh(&self) -> CredentialsFuture<'_>;

	/// Refreshes unless the cached token already differs from `stale`.
	///
	/// Providers that cannot tell tokens apart fall back to [`CredentialsProvider::refresh`].
	fn refresh_stale<'a>(&'a self, stale: &'a TokenInfo) -> CredentialsFuture<'a> {
		let _ = stale;

		self.refresh()
	}
}

/// What the caller last saw before asking for a refresh.
#[derive(Clone, Copy)]
enum Observed<'a> {
	Generation(u64),
	Token(&'a TokenInfo),
}

/// Token cache guarded by a single-refresh gate.
pub struct Credentials<S>
where
	S: ?Sized + TokenSource,
{
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	source: Arc<S>,
	cached: RwLock<Option<TokenInfo>>,
	generation: AtomicU64,
	refresh_gate: AsyncMutex<()>,
}
impl<S> Credentials<S>
where
	S: ?Sized + TokenSource,
{
	/// Creates an empty cache backed by `source`; the first token is fetched on demand.
	pub fn new(source: S) -> Self
	where
		S: Sized,
	{
		Self::from_arc(Arc::new(source))
	}

	/// Like [`Credentials::new`], for a source that is already shared.
	pub fn from_arc(source: Arc<S>) -> Self {
		Self {
			refresh_metrics: Default::default(),
			source,
			cached: RwLock::new(None),
			generation: AtomicU64::new(0),
			refresh_gate: AsyncMutex::new(()),
		}
	}

	/// Seeds the cache with an already issued token.
	pub fn with_token(mut self, token: TokenInfo) -> Self {
		*self.cached.get_mut() = Some(token);

		self
	}

	/// Returns a snapshot of the cached token, if any.
	pub fn cached(&self) -> Option<TokenInfo> {
		self.cached.read().clone()
	}

	async fn refresh_after(&self, observed: Observed<'_>) -> Result<TokenInfo, AuthError> {
		const OP: Operation = Operation::Refresh;

		let span = OpSpan::new(OP, "refresh");

		obs::record_op_outcome(OP, Outcome::Attempt);

		let result = span
			.instrument(async {
				let _singleflight = self.refresh_gate.lock().await;

				if let Some(current) = self.superseding(observed) {
					self.refresh_metrics.record_coalesced();

					return Ok(current);
				}

				self.refresh_metrics.record_attempt();

				match self.source.request_token().await {
					Ok(token) => {
						*self.cached.write() = Some(token.clone());
						self.generation.fetch_add(1, Ordering::AcqRel);
						self.refresh_metrics.record_success();

						Ok(token)
					},
					Err(err) => {
						self.refresh_metrics.record_failure();

						Err(err)
					},
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(OP, Outcome::Success),
			Err(_) => obs::record_op_outcome(OP, Outcome::Failure),
		}

		result
	}

	/// Returns the cached token when another refresh replaced what the caller observed.
	fn superseding(&self, observed: Observed<'_>) -> Option<TokenInfo> {
		let current = self.cached.read().clone()?;
		let superseded = match observed {
			Observed::Generation(seen) => self.generation.load(Ordering::Acquire) != seen,
			Observed::Token(seen) => current.access_token != seen.access_token,
		};

		superseded.then_some(current)
	}
}
impl Credentials<StaticTokenSource> {
	/// Wraps a fixed, externally issued token.
	pub fn from_token(token: TokenInfo) -> Self {
		Self::new(StaticTokenSource::new(token.clone())).with_token(token)
	}
}
impl<S> CredentialsProvider for Credentials<S>
where
	S: ?Sized + TokenSource,
{
	fn get_token(&self) -> CredentialsFuture<'_> {
		Box::pin(async move {
			if let Some(token) = self.cached() {
				return Ok(token);
			}

			let seen = self.generation.load(Ordering::Acquire);

			self.refresh_after(Observed::Generation(seen)).await
		})
	}

	fn refresh(&self) -> CredentialsFuture<'_> {
		Box::pin(async move {
			let seen = self.generation.load(Ordering::Acquire);

			self.refresh_after(Observed::Generation(seen)).await
		})
	}

	fn refresh_stale<'a>(&'a self, stale: &'a TokenInfo) -> CredentialsFuture<'a> {
		Box::pin(self.refresh_after(Observed::Token(stale)))
	}
}
impl<S> Debug for Credentials<S>
where
	S: ?Sized + TokenSource,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("cached", &self.cached.read().as_ref())
			.field("generation", &self.generation.load(Ordering::Relaxed))
			.finish()
	}
}
