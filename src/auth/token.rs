//! Access token model: the redacted secret and its expiry metadata.

// self
use crate::_prelude::*;

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when the secret holds no characters.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Access token plus expiry metadata.
///
/// Values are immutable once issued; a refresh replaces the whole record.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
	/// Bearer token attached to outbound requests.
	pub access_token: TokenSecret,
	/// Expiry instant, when the issuer supplied one.
	pub expires_at: Option<OffsetDateTime>,
	/// Issue instant, known for tokens minted with a relative lifetime.
	#[serde(default)]
	pub issued_at: Option<OffsetDateTime>,
}
impl TokenInfo {
	/// Creates a token that never expires.
	pub fn new(access_token: impl Into<String>) -> Self {
		Self { access_token: TokenSecret::new(access_token), expires_at: None, issued_at: None }
	}

	/// Creates a token with an absolute expiry instant.
	pub fn expiring_at(access_token: impl Into<String>, expires_at: OffsetDateTime) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			expires_at: Some(expires_at),
			issued_at: None,
		}
	}

	/// Creates a token that expires `lifetime` after `issued_at`.
	pub fn expiring_in(
		access_token: impl Into<String>,
		issued_at: OffsetDateTime,
		lifetime: Duration,
	) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			expires_at: Some(issued_at + lifetime),
			issued_at: Some(issued_at),
		}
	}

	/// Returns `true` if the token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| instant >= expires_at)
	}

	/// Returns `true` if the token is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` if the token expires within `window` of `instant` (or already has).
	pub fn expires_within(&self, instant: OffsetDateTime, window: Duration) -> bool {
		match self.expires_at {
			Some(expires_at) => expires_at - instant <= window,
			None => false,
		}
	}

	/// Returns `true` when the token should be renewed before use at `instant`.
	///
	/// Expired tokens are always due. Otherwise the token is due once it expires within
	/// `window`; when the issue instant is known the window never exceeds half the token's
	/// lifetime, so a freshly minted short-lived token is not renewed right away.
	pub fn refresh_due(&self, instant: OffsetDateTime, window: Duration) -> bool {
		let Some(expires_at) = self.expires_at else {
			return false;
		};

		if instant >= expires_at {
			return true;
		}

		let window = match self.issued_at {
			Some(issued_at) => window.min((expires_at - issued_at) / 2),
			None => window,
		};

		expires_at - instant <= window
	}

	/// Renders the `Authorization` header value for this token.
	pub fn bearer(&self) -> String {
		format!("Bearer {}", self.access_token.expose())
	}
}
impl Debug for TokenInfo {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenInfo")
			.field("access_token", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.field("issued_at", &self.issued_at)
			.finish()
	}
}
