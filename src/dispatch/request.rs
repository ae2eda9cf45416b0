//! Per-call request description consumed by the dispatcher.

// self
use crate::{_prelude::*, config::RedactedHeaders, http::Method};

/// Payload attached to an outbound request.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestBody {
	/// No body.
	#[default]
	Empty,
	/// Structured payload serialized as JSON.
	Json(serde_json::Value),
	/// Opaque bytes sent verbatim.
	Bytes {
		/// `Content-Type` applied when the caller did not set one.
		content_type: Option<String>,
		/// Raw payload.
		data: Vec<u8>,
	},
}

/// HTTP method, path, and per-call overrides for one dispatch.
#[derive(Clone, PartialEq)]
pub struct RequestSpec {
	/// HTTP method.
	pub method: Method,
	/// Base URL override; falls back to the configured base URL.
	pub base_url: Option<Url>,
	/// Path appended to the base URL.
	pub path: String,
	/// Query pairs appended in order.
	pub query: Vec<(String, String)>,
	/// Request payload.
	pub body: RequestBody,
	/// Header overrides that win over configured defaults.
	pub headers: BTreeMap<String, String>,
	/// Timeout override for this call.
	pub timeout: Option<std::time::Duration>,
}
impl RequestSpec {
	/// Creates a bodiless request for `method` + `path`.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			base_url: None,
			path: path.into(),
			query: Vec::new(),
			body: RequestBody::Empty,
			headers: BTreeMap::new(),
			timeout: None,
		}
	}

	/// Shorthand for a `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// Shorthand for a `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// Shorthand for a `PUT` request.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::PUT, path)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Sends this request to `base_url` instead of the configured one.
	pub fn base_url(mut self, base_url: Url) -> Self {
		self.base_url = Some(base_url);

		self
	}

	/// Appends a query pair.
	pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((name.into(), value.into()));

		self
	}

	/// Appends multiple query pairs.
	pub fn query_pairs<I, K, V>(mut self, pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.query.extend(pairs.into_iter().map(|(name, value)| (name.into(), value.into())));

		self
	}

	/// Attaches a JSON payload.
	pub fn json(mut self, body: serde_json::Value) -> Self {
		self.body = RequestBody::Json(body);

		self
	}

	/// Attaches an opaque payload.
	pub fn bytes(mut self, content_type: Option<String>, data: impl Into<Vec<u8>>) -> Self {
		self.body = RequestBody::Bytes { content_type, data: data.into() };

		self
	}

	/// Adds (or replaces) a header override.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Overrides the transport timeout for this call.
	pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}
}
impl Debug for RequestSpec {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestSpec")
			.field("method", &self.method)
			.field("base_url", &self.base_url.as_ref().map(Url::as_str))
			.field("path", &self.path)
			.field("query", &self.query)
			.field("body", &self.body)
			.field("headers", &RedactedHeaders(&self.headers))
			.field("timeout", &self.timeout)
			.finish()
	}
}
