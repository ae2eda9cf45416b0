//! Client-level error types shared across credentials, dispatch, and façades.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
///
/// Non-2xx HTTP statuses are never represented here; they travel back to the caller inside
/// [`ResponseEnvelope`](crate::http::ResponseEnvelope).
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credentials could not supply or refresh a token; no request was sent.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Local configuration or request-construction problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Failures raised while acquiring or refreshing an access token.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// Identity endpoint rejected the refresh credential.
	#[error("Identity endpoint rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or the client credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// The only token available is already expired and cannot be renewed.
	#[error("Access token expired at {expired_at}.")]
	Expired {
		/// Expiry instant of the rejected token.
		expired_at: OffsetDateTime,
	},
	/// Credentials produced a token with no characters.
	#[error("Credentials returned an empty access token.")]
	EmptyToken,
	/// Identity endpoint answered with an unexpected OAuth error.
	#[error("Identity endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Provider- or client-supplied message summarizing the failure.
		message: String,
	},
	/// Identity endpoint responded with malformed JSON that could not be parsed.
	#[error("Identity endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
	},
	/// Identity endpoint could not be reached.
	#[error("Identity endpoint is unreachable.")]
	Unreachable {
		/// Underlying transport failure.
		#[source]
		source: TransportError,
	},
	/// Token source is misconfigured.
	#[error("Token source is misconfigured.")]
	Config(#[source] ConfigError),
}

/// Configuration and request-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Base URL uses an unsupported scheme or cannot carry a path.
	#[error("Base URL `{url}` must be an absolute http(s) URL.")]
	InvalidBaseUrl {
		/// Rejected URL.
		url: String,
	},
	/// Port override cannot be applied to the base URL.
	#[error("Port {port} cannot be applied to the base URL.")]
	InvalidPort {
		/// Rejected port.
		port: u16,
	},
	/// Token endpoint URL cannot be parsed.
	#[error("Token endpoint URL is invalid.")]
	InvalidTokenUrl {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Early-refresh window is negative.
	#[error("Refresh window {window} must not be negative.")]
	InvalidRefreshWindow {
		/// Rejected window.
		window: Duration,
	},
	/// Header name is not a valid HTTP token.
	#[error("Header name `{name}` is invalid.")]
	InvalidHeaderName {
		/// Rejected header name.
		name: String,
	},
	/// Header value contains characters HTTP does not allow.
	#[error("Header `{name}` carries an invalid value.")]
	InvalidHeaderValue {
		/// Header whose value was rejected.
		name: String,
	},
	/// Directory object class cannot be used as a path segment.
	#[error("Object class `{object_class}` is not a valid path segment.")]
	InvalidObjectClass {
		/// Rejected object class.
		object_class: String,
	},
	/// JSON body could not be serialized.
	#[error("Request body could not be serialized.")]
	BodySerialize(#[from] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, timeout).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Request did not complete within the configured timeout.
	#[error("Request timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while sending the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while sending the request.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}
