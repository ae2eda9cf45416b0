//! Authenticated request dispatch.
//!
//! [`Dispatcher::request`] merges a caller-supplied [`RequestSpec`] with the configured base URL,
//! default headers, and timeout, attaches `Authorization: Bearer <token>` from the credentials
//! provider, and hands the request to the transport. The response comes back untouched: non-2xx
//! statuses are data, not errors. Credentials failures abort before anything is sent, and
//! transport failures propagate without retries.

mod metrics;
mod request;

pub use metrics::DispatchMetrics;
pub use request::*;

// self
use crate::{
	_prelude::*,
	auth::{CredentialsProvider, TokenInfo},
	config::{self, ClientConfig},
	error::{AuthError, ConfigError},
	http::{HeaderMap, HeaderValue, HttpTransport, RequestTimeout, ResponseEnvelope, header},
	obs::{self, OpSpan, Operation, Outcome},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Dispatcher specialized for the crate's default reqwest transport.
pub type ReqwestDispatcher = Dispatcher<ReqwestTransport>;

/// Issues authenticated requests against a directory-sync deployment.
pub struct Dispatcher<T>
where
	T: ?Sized + HttpTransport,
{
	/// Base URL, default headers, and timing configuration.
	pub config: Arc<ClientConfig>,
	/// Token supplier consulted before every request.
	pub credentials: Arc<dyn CredentialsProvider>,
	/// HTTP transport used for every outbound request.
	pub transport: Arc<T>,
	/// Shared counters for dispatch outcomes.
	pub metrics: Arc<DispatchMetrics>,
}
impl<T> Dispatcher<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a dispatcher that reuses the caller-provided transport.
	pub fn with_transport(
		config: ClientConfig,
		credentials: Arc<dyn CredentialsProvider>,
		transport: impl Into<Arc<T>>,
	) -> Result<Self, ConfigError> {
		config.validate()?;

		Ok(Self {
			config: Arc::new(config),
			credentials,
			transport: transport.into(),
			metrics: Default::default(),
		})
	}

	/// Sends `spec` with a current bearer token and returns the raw response.
	pub async fn request(&self, spec: RequestSpec) -> Result<ResponseEnvelope> {
		const OP: Operation = Operation::Dispatch;

		let span = OpSpan::new(OP, "request");

		obs::record_op_outcome(OP, Outcome::Attempt);

		let result: Result<ResponseEnvelope> = span
			.instrument(async move {
				let url =
					self.config.resolve_url(spec.base_url.as_ref(), &spec.path, &spec.query)?;
				let token = self.current_token().await.inspect_err(|_| {
					self.metrics.record_auth_failure();
				})?;
				let method = spec.method.clone();
				let request = self.build_request(spec, &url, &token)?;

				obs::trace_request(&method, &url);
				self.metrics.record_sent();

				let response = self.transport.send(request).await.inspect_err(|_| {
					self.metrics.record_transport_failure();
				})?;
				let envelope = ResponseEnvelope::from(response);

				obs::trace_response(envelope.status);

				Ok(envelope)
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(OP, Outcome::Success),
			Err(_) => obs::record_op_outcome(OP, Outcome::Failure),
		}

		result
	}

	/// Returns a token that is usable right now, refreshing it first when it is due.
	///
	/// A failed early refresh falls back to the current token while it has not expired yet.
	async fn current_token(&self) -> Result<TokenInfo, AuthError> {
		let token = self.credentials.get_token().await?;
		let token = if token.refresh_due(OffsetDateTime::now_utc(), self.config.refresh_window) {
			match self.credentials.refresh_stale(&token).await {
				Ok(fresh) => fresh,
				Err(e) if token.is_expired_at(OffsetDateTime::now_utc()) => return Err(e),
				Err(e) => {
					obs::trace_refresh_fallback(&e);

					token
				},
			}
		} else {
			token
		};

		if token.access_token.is_empty() {
			return Err(AuthError::EmptyToken);
		}
		if let Some(expired_at) =
			token.expires_at.filter(|_| token.is_expired_at(OffsetDateTime::now_utc()))
		{
			return Err(AuthError::Expired { expired_at });
		}

		Ok(token)
	}

	fn build_request(
		&self,
		spec: RequestSpec,
		url: &Url,
		token: &TokenInfo,
	) -> Result<oauth2::HttpRequest, ConfigError> {
		let mut headers = HeaderMap::new();

		config::extend_headers(&mut headers, &self.config.default_headers)?;
		config::extend_headers(&mut headers, &spec.headers)?;

		let body = match spec.body {
			RequestBody::Empty => Vec::new(),
			RequestBody::Json(value) => {
				if !headers.contains_key(header::CONTENT_TYPE) {
					headers.insert(
						header::CONTENT_TYPE,
						HeaderValue::from_static("application/json"),
					);
				}

				serde_json::to_vec(&value)?
			},
			RequestBody::Bytes { content_type, data } => {
				if let Some(content_type) =
					content_type.filter(|_| !headers.contains_key(header::CONTENT_TYPE))
				{
					let value = HeaderValue::from_str(&content_type).map_err(|_| {
						ConfigError::InvalidHeaderValue { name: header::CONTENT_TYPE.as_str().into() }
					})?;

					headers.insert(header::CONTENT_TYPE, value);
				}

				data
			},
		};
		let mut authorization = HeaderValue::from_str(&token.bearer()).map_err(|_| {
			ConfigError::InvalidHeaderValue { name: header::AUTHORIZATION.as_str().into() }
		})?;

		authorization.set_sensitive(true);
		headers.insert(header::AUTHORIZATION, authorization);

		let mut request = oauth2::http::Request::builder()
			.method(spec.method)
			.uri(url.as_str())
			.body(body)?;

		*request.headers_mut() = headers;

		if let Some(timeout) = spec.timeout.or(self.config.timeout) {
			request.extensions_mut().insert(RequestTimeout(timeout));
		}

		Ok(request)
	}
}
#[cfg(feature = "reqwest")]
impl Dispatcher<ReqwestTransport> {
	/// Creates a dispatcher with its own reqwest transport honoring the configured timeout.
	pub fn new(
		config: ClientConfig,
		credentials: Arc<dyn CredentialsProvider>,
	) -> Result<Self, ConfigError> {
		let transport = ReqwestTransport::from_config(&config)?;

		Self::with_transport(config, credentials, transport)
	}
}
impl<T> Clone for Dispatcher<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			credentials: self.credentials.clone(),
			transport: self.transport.clone(),
			metrics: self.metrics.clone(),
		}
	}
}
impl<T> Debug for Dispatcher<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Dispatcher").field("config", &self.config).finish()
	}
}
