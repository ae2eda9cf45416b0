//! Token sources mint the access tokens that [`Credentials`](crate::auth::Credentials) caches.

// self
use crate::{_prelude::*, auth::TokenInfo, error::AuthError};

/// Boxed future returned by [`TokenSource::request_token`].
pub type TokenSourceFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TokenInfo, AuthError>> + 'a + Send>>;

/// Backend capable of producing a fresh [`TokenInfo`].
///
/// Implementations are called at most once at a time by [`Credentials`](crate::auth::Credentials),
/// so they do not need their own single-flight protection.
pub trait TokenSource
where
	Self: Send + Sync,
{
	/// Requests a new access token from the backing issuer.
	fn request_token(&self) -> TokenSourceFuture<'_>;
}

/// Token source that hands out a fixed, externally issued access token.
///
/// Refreshing cannot renew the token, so once it expires every dispatch fails with
/// [`AuthError::Expired`].
#[derive(Clone, Debug)]
pub struct StaticTokenSource(TokenInfo);
impl StaticTokenSource {
	/// Wraps the provided token.
	pub fn new(token: TokenInfo) -> Self {
		Self(token)
	}
}
impl TokenSource for StaticTokenSource {
	fn request_token(&self) -> TokenSourceFuture<'_> {
		let token = self.0.clone();

		Box::pin(async move { Ok(token) })
	}
}
