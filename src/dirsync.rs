//! Directory-Sync Service endpoints.
//!
//! Cloud applications cannot reach on-premise directories directly, so an agent inside the
//! customer network pushes directory data to a cloud-hosted Directory-Sync Service instance.
//! These helpers format the service's resource paths into [`RequestSpec`]s and forward them
//! through a [`Dispatcher`]; responses come back exactly as the service produced them.

// self
use crate::{
	_prelude::*,
	dispatch::{Dispatcher, RequestSpec},
	error::ConfigError,
	http::{HttpTransport, ResponseEnvelope},
};
#[cfg(feature = "reqwest")]
use crate::{auth::CredentialsProvider, config::ClientConfig, http::ReqwestTransport};

/// Path prefix shared by every Directory-Sync Service resource.
pub const API_ROOT: &str = "/directory-sync-service/v1";

/// Builds the request that retrieves the attribute configuration object.
pub fn attributes_request() -> RequestSpec {
	RequestSpec::get(format!("{API_ROOT}/attributes"))
}

/// Builds the request that counts entries of `object_class` within a single domain.
pub fn count_request<I, K, V>(object_class: &str, params: I) -> Result<RequestSpec, ConfigError>
where
	I: IntoIterator<Item = (K, V)>,
	K: Into<String>,
	V: Into<String>,
{
	let object_class = object_class_segment(object_class)?;

	Ok(RequestSpec::get(format!("{API_ROOT}/{object_class}/count")).query_pairs(params))
}

/// Builds the request that lists every domain the instance reads entries from.
pub fn domains_request() -> RequestSpec {
	RequestSpec::get(format!("{API_ROOT}/domains"))
}

/// Builds the request that queries directory entries of `object_class`.
pub fn query_request(
	object_class: &str,
	body: serde_json::Value,
) -> Result<RequestSpec, ConfigError> {
	let object_class = object_class_segment(object_class)?;

	Ok(RequestSpec::post(format!("{API_ROOT}/{object_class}")).json(body))
}

fn object_class_segment(object_class: &str) -> Result<&str, ConfigError> {
	let invalid = object_class.is_empty()
		|| matches!(object_class, "." | "..")
		|| object_class.contains(['/', '?', '#']);

	if invalid {
		Err(ConfigError::InvalidObjectClass { object_class: object_class.into() })
	} else {
		Ok(object_class)
	}
}

/// Client for one Directory-Sync Service instance.
pub struct DirectorySyncService<T>
where
	T: ?Sized + HttpTransport,
{
	dispatcher: Dispatcher<T>,
}
impl<T> DirectorySyncService<T>
where
	T: ?Sized + HttpTransport,
{
	/// Wraps an existing dispatcher, sharing its credentials and transport.
	pub fn new(dispatcher: Dispatcher<T>) -> Self {
		Self { dispatcher }
	}

	/// Returns the underlying dispatcher.
	pub fn dispatcher(&self) -> &Dispatcher<T> {
		&self.dispatcher
	}

	/// Retrieves the custom attribute mapping configured for the instance.
	pub async fn attributes(&self) -> Result<ResponseEnvelope> {
		self.send(attributes_request()).await
	}

	/// Counts the entries of `object_class`, narrowed by `params` (e.g. the domain).
	pub async fn count<I, K, V>(&self, object_class: &str, params: I) -> Result<ResponseEnvelope>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.send(count_request(object_class, params)?).await
	}

	/// Lists the domains the instance reads entries from, in DNS and DN form.
	pub async fn domains(&self) -> Result<ResponseEnvelope> {
		self.send(domains_request()).await
	}

	/// Queries directory entries of `object_class` with a structured request body.
	pub async fn query(
		&self,
		object_class: &str,
		body: serde_json::Value,
	) -> Result<ResponseEnvelope> {
		self.send(query_request(object_class, body)?).await
	}

	/// Forwards a caller-built request, e.g. one of the builders above with extra headers.
	pub async fn send(&self, spec: RequestSpec) -> Result<ResponseEnvelope> {
		self.dispatcher.request(spec).await
	}
}
#[cfg(feature = "reqwest")]
impl DirectorySyncService<ReqwestTransport> {
	/// Creates a service backed by a fresh reqwest dispatcher.
	pub fn connect(
		config: ClientConfig,
		credentials: Arc<dyn CredentialsProvider>,
	) -> Result<Self, ConfigError> {
		Ok(Self::new(Dispatcher::new(config, credentials)?))
	}
}
impl<T> Clone for DirectorySyncService<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { dispatcher: self.dispatcher.clone() }
	}
}
impl<T> Debug for DirectorySyncService<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DirectorySyncService").field("config", &self.dispatcher.config).finish()
	}
}
