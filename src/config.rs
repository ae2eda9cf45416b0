//! Client configuration: base URL, port override, default headers, and timing knobs.

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::{HeaderMap, HeaderName, HeaderValue, header},
};

/// Transport and authentication settings shared by every dispatched request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// URL that request paths are appended to.
	pub base_url: Url,
	/// Port override applied to every resolved URL.
	#[serde(default)]
	pub port: Option<u16>,
	/// Headers sent with every request; per-call headers take precedence.
	#[serde(default)]
	pub default_headers: BTreeMap<String, String>,
	/// Default request timeout enforced by the transport.
	#[serde(default)]
	pub timeout: Option<std::time::Duration>,
	/// Tokens expiring within this window are refreshed before use.
	#[serde(
		default = "ClientConfig::default_refresh_window",
		deserialize_with = "deserialize_refresh_window"
	)]
	pub refresh_window: Duration,
}
impl ClientConfig {
	const DEFAULT_REFRESH_WINDOW: Duration = Duration::seconds(60);

	/// Creates a builder seeded with the provided base URL.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Validates the base URL and default headers.
	pub fn validate(&self) -> Result<(), ConfigError> {
		validate_base_url(&self.base_url)?;

		if self.refresh_window.is_negative() {
			return Err(ConfigError::InvalidRefreshWindow { window: self.refresh_window });
		}

		let mut headers = HeaderMap::new();

		extend_headers(&mut headers, &self.default_headers)
	}

	/// Joins `path` onto `base` (or the configured base URL) and appends `query`.
	pub fn resolve_url(
		&self,
		base: Option<&Url>,
		path: &str,
		query: &[(String, String)],
	) -> Result<Url, ConfigError> {
		let mut url = base.unwrap_or(&self.base_url).clone();

		validate_base_url(&url)?;

		if let Some(port) = self.port {
			url.set_port(Some(port)).map_err(|_| ConfigError::InvalidPort { port })?;
		}

		let joined =
			format!("{}/{}", url.path().trim_end_matches('/'), path.trim_start_matches('/'));

		url.set_path(&joined);
		url.set_fragment(None);

		if !query.is_empty() {
			url.query_pairs_mut().extend_pairs(query);
		}

		Ok(url)
	}

	fn default_refresh_window() -> Duration {
		Self::DEFAULT_REFRESH_WINDOW
	}
}
impl Debug for ClientConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientConfig")
			.field("base_url", &self.base_url.as_str())
			.field("port", &self.port)
			.field("default_headers", &RedactedHeaders(&self.default_headers))
			.field("timeout", &self.timeout)
			.field("refresh_window", &self.refresh_window)
			.finish()
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder(ClientConfig);
impl ClientConfigBuilder {
	/// Creates a new builder seeded with the provided base URL.
	pub fn new(base_url: Url) -> Self {
		Self(ClientConfig {
			base_url,
			port: None,
			default_headers: BTreeMap::new(),
			timeout: None,
			refresh_window: ClientConfig::DEFAULT_REFRESH_WINDOW,
		})
	}

	/// Overrides the port of every resolved URL.
	pub fn port(mut self, port: u16) -> Self {
		self.0.port = Some(port);

		self
	}

	/// Adds (or replaces) a default header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.0.default_headers.insert(name.into(), value.into());

		self
	}

	/// Adds multiple default headers.
	pub fn headers<I, K, V>(mut self, headers: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		for (name, value) in headers {
			self.0.default_headers.insert(name.into(), value.into());
		}

		self
	}

	/// Sets the default request timeout.
	pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
		self.0.timeout = Some(timeout);

		self
	}

	/// Overrides the early-refresh window (defaults to 60 seconds).
	pub fn refresh_window(mut self, window: Duration) -> Self {
		self.0.refresh_window = clamp_refresh_window(window);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		self.0.validate()?;

		Ok(self.0)
	}
}

/// Inserts `headers` into `target`, replacing existing values case-insensitively.
pub(crate) fn extend_headers(
	target: &mut HeaderMap,
	headers: &BTreeMap<String, String>,
) -> Result<(), ConfigError> {
	for (name, value) in headers {
		let header_name = HeaderName::from_bytes(name.as_bytes())
			.map_err(|_| ConfigError::InvalidHeaderName { name: name.clone() })?;
		let header_value = HeaderValue::from_str(value)
			.map_err(|_| ConfigError::InvalidHeaderValue { name: name.clone() })?;

		target.insert(header_name, header_value);
	}

	Ok(())
}

fn clamp_refresh_window(window: Duration) -> Duration {
	window.max(Duration::ZERO)
}

fn deserialize_refresh_window<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
	D: serde::Deserializer<'de>,
{
	Duration::deserialize(deserializer).map(clamp_refresh_window)
}

fn validate_base_url(url: &Url) -> Result<(), ConfigError> {
	if matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base() {
		Ok(())
	} else {
		Err(ConfigError::InvalidBaseUrl { url: url.to_string() })
	}
}

/// Debug adapter that masks `Authorization` values.
pub(crate) struct RedactedHeaders<'a>(pub(crate) &'a BTreeMap<String, String>);
impl Debug for RedactedHeaders<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let mut map = f.debug_map();

		for (name, value) in self.0 {
			if name.eq_ignore_ascii_case(header::AUTHORIZATION.as_str()) {
				map.entry(name, &"******");
			} else {
				map.entry(name, value);
			}
		}

		map.finish()
	}
}
