//! OAuth 2.0 `refresh_token` grant as a [`TokenSource`].
//!
//! The wire format is handled by the `oauth2` crate; requests travel through the crate's
//! [`HttpTransport`], so the identity endpoint shares the dispatcher's HTTP stack (and its test
//! doubles). Rotated refresh tokens replace the stored one after every successful exchange.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError, RefreshToken,
	RequestTokenError, Scope, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicErrorResponseType, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::{TokenInfo, TokenSecret, TokenSource, TokenSourceFuture},
	error::{AuthError, ConfigError, TransportError},
	http::{HttpTransport, TransportHandle},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// How client credentials are presented to the token endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Exchanges a long-lived refresh token for short-lived access tokens.
pub struct RefreshTokenSource<T>
where
	T: ?Sized + HttpTransport,
{
	oauth_client: ConfiguredBasicClient,
	transport: Arc<T>,
	refresh_token: Mutex<TokenSecret>,
	client_id: String,
	token_url: Url,
	scopes: Vec<String>,
}
impl<T> RefreshTokenSource<T>
where
	T: ?Sized + HttpTransport,
{
	/// Returns the refresh token that the next exchange will present.
	pub fn current_refresh_token(&self) -> TokenSecret {
		self.refresh_token.lock().clone()
	}

	async fn exchange(&self) -> Result<TokenInfo, AuthError> {
		let refresh_secret = RefreshToken::new(self.refresh_token.lock().expose().to_owned());
		let handle = TransportHandle::new(self.transport.clone());
		let mut request = self.oauth_client.exchange_refresh_token(&refresh_secret);

		for scope in &self.scopes {
			request = request.add_scope(Scope::new(scope.clone()));
		}

		let response = request.request_async(&handle).await.map_err(map_request_error)?;
		let issued_at = OffsetDateTime::now_utc();
		let expires_at = match response.expires_in() {
			Some(lifetime) => {
				let secs = i64::try_from(lifetime.as_secs()).map_err(|_| {
					AuthError::TokenEndpoint {
						message: "the expires_in value exceeds the supported range".into(),
					}
				})?;

				Some(issued_at + Duration::seconds(secs))
			},
			None => None,
		};

		if let Some(rotated) = response.refresh_token() {
			*self.refresh_token.lock() = TokenSecret::new(rotated.secret().to_owned());
		}

		Ok(TokenInfo {
			access_token: TokenSecret::new(response.access_token().secret().to_owned()),
			expires_at,
			issued_at: Some(issued_at),
		})
	}
}
impl<T> TokenSource for RefreshTokenSource<T>
where
	T: ?Sized + HttpTransport,
{
	fn request_token(&self) -> TokenSourceFuture<'_> {
		Box::pin(self.exchange())
	}
}
impl<T> Debug for RefreshTokenSource<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshTokenSource")
			.field("client_id", &self.client_id)
			.field("token_url", &self.token_url.as_str())
			.field("scopes", &self.scopes)
			.finish()
	}
}

/// Builder for [`RefreshTokenSource`] values.
#[derive(Debug)]
pub struct RefreshTokenSourceBuilder {
	token_url: Url,
	client_id: String,
	client_secret: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	auth_method: ClientAuthMethod,
	scopes: Vec<String>,
}
impl RefreshTokenSourceBuilder {
	/// Creates a new builder for the given token endpoint and client identifier.
	pub fn new(token_url: Url, client_id: impl Into<String>) -> Self {
		Self {
			token_url,
			client_id: client_id.into(),
			client_secret: None,
			refresh_token: None,
			auth_method: ClientAuthMethod::default(),
			scopes: Vec::new(),
		}
	}

	/// Sets the client secret used for confidential clients.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(TokenSecret::new(secret));

		self
	}

	/// Sets the refresh token presented on the first exchange.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Overrides how client credentials are sent (defaults to HTTP Basic).
	pub fn auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.auth_method = method;

		self
	}

	/// Requests an additional scope on every exchange.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scopes.push(scope.into());

		self
	}

	/// Consumes the builder, pairing the source with `transport`.
	pub fn build<T>(
		self,
		transport: impl Into<Arc<T>>,
	) -> Result<RefreshTokenSource<T>, AuthError>
	where
		T: ?Sized + HttpTransport,
	{
		let refresh_token =
			self.refresh_token.filter(|token| !token.is_empty()).ok_or_else(|| {
				AuthError::InvalidGrant { reason: "no refresh token was configured".into() }
			})?;
		let token_url = TokenUrl::new(self.token_url.to_string())
			.map_err(|source| AuthError::Config(ConfigError::InvalidTokenUrl { source }))?;
		let mut oauth_client =
			BasicClient::new(ClientId::new(self.client_id.clone())).set_token_uri(token_url);

		if let Some(secret) = self.client_secret {
			oauth_client =
				oauth_client.set_client_secret(ClientSecret::new(secret.expose().to_owned()));
		}
		if matches!(self.auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(RefreshTokenSource {
			oauth_client,
			transport: transport.into(),
			refresh_token: Mutex::new(refresh_token),
			client_id: self.client_id,
			token_url: self.token_url,
			scopes: self.scopes,
		})
	}

	/// Consumes the builder, pairing the source with a default reqwest transport.
	#[cfg(feature = "reqwest")]
	pub fn build_reqwest(self) -> Result<RefreshTokenSource<ReqwestTransport>, AuthError> {
		self.build(ReqwestTransport::default())
	}
}

fn map_request_error(err: BasicRequestTokenError<HttpClientError<TransportError>>) -> AuthError {
	match err {
		RequestTokenError::ServerResponse(response) => map_server_response_error(response),
		RequestTokenError::Request(error) => map_transport_error(error),
		RequestTokenError::Parse(source, _body) => AuthError::TokenResponseParse { source },
		RequestTokenError::Other(message) => AuthError::TokenEndpoint { message },
	}
}

fn map_server_response_error(response: BasicErrorResponse) -> AuthError {
	let reason = match response.error_description() {
		Some(description) => description.clone(),
		None => response.error().as_ref().to_string(),
	};

	match response.error() {
		BasicErrorResponseType::InvalidGrant => AuthError::InvalidGrant { reason },
		BasicErrorResponseType::InvalidClient | BasicErrorResponseType::UnauthorizedClient =>
			AuthError::InvalidClient { reason },
		_ => AuthError::TokenEndpoint { message: reason },
	}
}

fn map_transport_error(err: HttpClientError<TransportError>) -> AuthError {
	match err {
		HttpClientError::Reqwest(inner) => AuthError::Unreachable { source: *inner },
		HttpClientError::Http(inner) => AuthError::Config(ConfigError::from(inner)),
		HttpClientError::Io(inner) =>
			AuthError::Unreachable { source: TransportError::Io(inner) },
		HttpClientError::Other(message) => AuthError::TokenEndpoint { message },
		other => AuthError::TokenEndpoint {
			message: format!(
				"unhandled HTTP client error while calling the token endpoint: {other:?}"
			),
		},
	}
}
