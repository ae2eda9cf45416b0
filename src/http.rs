//! Transport primitives and the response envelope handed back to callers.
//!
//! [`HttpTransport`] is the crate's only dependency on an HTTP stack. The dispatcher and the
//! OAuth refresh source both send through it, so a custom transport (or a test double) swaps
//! the network layer for every outbound call at once.

pub use oauth2::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header};

// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, error::TransportError};
#[cfg(feature = "reqwest")] use crate::{config::ClientConfig, error::ConfigError};

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// JSON decoding failure that records the path of the offending field.
pub type JsonError = serde_path_to_error::Error<serde_json::Error>;

/// Abstraction over HTTP stacks capable of executing a single request.
///
/// Implementations must not retry, follow up, or reinterpret the response: whatever status,
/// headers, and body the server produced are returned as-is. Transport-level failures
/// (connection, TLS, timeout) are reported as [`TransportError`].
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with the raw response.
	///
	/// A [`RequestTimeout`] stored in the request extensions bounds the whole exchange.
	fn send(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// Per-request timeout carried in [`HttpRequest`] extensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestTimeout(pub std::time::Duration);

/// Raw response surfaced to callers without interpretation.
#[derive(Clone, Debug)]
pub struct ResponseEnvelope {
	/// HTTP status code returned by the server.
	pub status: u16,
	/// Response headers, as received.
	pub headers: HeaderMap,
	/// Response body bytes, as received.
	pub body: Vec<u8>,
}
impl ResponseEnvelope {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns a header value when present and valid UTF-8.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|value| value.to_str().ok())
	}

	/// Decodes the body as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Decodes the body as JSON.
	pub fn json<T>(&self) -> Result<T, JsonError>
	where
		T: DeserializeOwned,
	{
		let de = &mut serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(de)
	}
}
impl From<HttpResponse> for ResponseEnvelope {
	fn from(response: HttpResponse) -> Self {
		let (parts, body) = response.into_parts();

		Self { status: parts.status.as_u16(), headers: parts.headers, body }
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client honoring the configured default timeout.
	pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
		let mut builder = ReqwestClient::builder().user_agent(USER_AGENT);

		if let Some(timeout) = config.timeout {
			builder = builder.timeout(timeout);
		}

		Ok(Self(builder.build()?))
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let timeout = request.extensions().get::<RequestTimeout>().map(|timeout| timeout.0);
			let mut request = reqwest::Request::try_from(request)?;

			if let Some(timeout) = timeout {
				*request.timeout_mut() = Some(timeout);
			}

			let response = client.execute(request).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new = HttpResponse::new(response.bytes().await?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

#[cfg(feature = "reqwest")]
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Adapter that lets the `oauth2` crate send token requests through an [`HttpTransport`].
pub(crate) struct TransportHandle<T>(Arc<T>)
where
	T: ?Sized + HttpTransport;
impl<T> TransportHandle<T>
where
	T: ?Sized + HttpTransport,
{
	pub(crate) fn new(transport: Arc<T>) -> Self {
		Self(transport)
	}
}
impl<'c, T> AsyncHttpClient<'c> for TransportHandle<T>
where
	T: ?Sized + HttpTransport,
{
	type Error = HttpClientError<TransportError>;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			self.0.send(request).await.map_err(|err| HttpClientError::Reqwest(Box::new(err)))
		})
	}
}
