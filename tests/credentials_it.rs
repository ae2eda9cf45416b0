// std
use std::sync::atomic::{AtomicUsize, Ordering};
// crates.io
use time::{Duration, OffsetDateTime};
// self
use dirsync_client::{
	auth::{
		Credentials, CredentialsProvider, StaticTokenSource, TokenInfo, TokenSource,
		TokenSourceFuture,
	},
	error::AuthError,
};

struct SlowSource {
	calls: AtomicUsize,
	fail_first: bool,
}
impl SlowSource {
	fn new(fail_first: bool) -> Self {
		Self { calls: AtomicUsize::new(0), fail_first }
	}
}
impl TokenSource for SlowSource {
	fn request_token(&self) -> TokenSourceFuture<'_> {
		Box::pin(async move {
			let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

			tokio::time::sleep(std::time::Duration::from_millis(50)).await;

			if self.fail_first && call == 1 {
				return Err(AuthError::TokenEndpoint { message: "temporarily unavailable".into() });
			}

			Ok(TokenInfo::expiring_in(
				format!("token-{call}"),
				OffsetDateTime::now_utc(),
				Duration::minutes(30),
			))
		})
	}
}

#[tokio::test]
async fn concurrent_first_acquisitions_fetch_once() {
	let credentials = Credentials::new(SlowSource::new(false));
	let (a, b, c) =
		tokio::join!(credentials.get_token(), credentials.get_token(), credentials.get_token());

	for token in [a, b, c] {
		assert_eq!(token.expect("Token should be issued.").access_token.expose(), "token-1");
	}

	assert_eq!(credentials.refresh_metrics.attempts(), 1);
	assert_eq!(credentials.refresh_metrics.coalesced(), 2);
}

#[tokio::test]
async fn concurrent_stale_refreshes_share_the_replacement() {
	let credentials = Credentials::new(SlowSource::new(false));
	let stale = credentials.get_token().await.expect("Initial token should be issued.");
	let (a, b) = tokio::join!(credentials.refresh_stale(&stale), credentials.refresh_stale(&stale));

	assert_eq!(a.expect("Refresh should succeed.").access_token.expose(), "token-2");
	assert_eq!(b.expect("Coalesced refresh should succeed.").access_token.expose(), "token-2");
	assert_eq!(credentials.refresh_metrics.attempts(), 2);
	assert_eq!(credentials.refresh_metrics.coalesced(), 1);
}

#[tokio::test]
async fn explicit_refresh_always_fetches() {
	let credentials = Credentials::new(SlowSource::new(false));

	credentials.get_token().await.expect("Initial token should be issued.");

	let refreshed = credentials.refresh().await.expect("Refresh should succeed.");

	assert_eq!(refreshed.access_token.expose(), "token-2");
	assert_eq!(
		credentials.cached().expect("Refreshed token should be cached.").access_token.expose(),
		"token-2"
	);
}

#[tokio::test]
async fn failures_propagate_and_keep_the_previous_token() {
	let credentials =
		Credentials::new(SlowSource::new(true)).with_token(TokenInfo::new("seeded-token"));
	let err = credentials.refresh().await.expect_err("First refresh should fail.");

	assert!(matches!(err, AuthError::TokenEndpoint { .. }));
	assert_eq!(credentials.refresh_metrics.failures(), 1);
	assert_eq!(
		credentials.cached().expect("Seeded token should survive.").access_token.expose(),
		"seeded-token"
	);

	let recovered = credentials.refresh().await.expect("Second refresh should succeed.");

	assert_eq!(recovered.access_token.expose(), "token-2");
	assert_eq!(credentials.refresh_metrics.successes(), 1);
}

#[tokio::test]
async fn static_tokens_cannot_be_renewed() {
	let token = TokenInfo::expiring_at("static", OffsetDateTime::now_utc() + Duration::minutes(5));
	let credentials = Credentials::<StaticTokenSource>::from_token(token.clone());

	assert_eq!(credentials.get_token().await.expect("Static token should be served."), token);
	assert_eq!(credentials.refresh().await.expect("Static refresh returns the token."), token);
}
