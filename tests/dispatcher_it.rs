#![cfg(feature = "reqwest")]

// std
use std::sync::atomic::{AtomicUsize, Ordering};
// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use dirsync_client::{
	_preludet::*,
	auth::{Credentials, TokenInfo, TokenSource, TokenSourceFuture},
	config::ClientConfig,
	dispatch::RequestSpec,
	error::{AuthError, TransportError},
};

const ATTRIBUTES_PATH: &str = "/directory-sync-service/v1/attributes";

struct ScriptedSource {
	calls: AtomicUsize,
	delay: std::time::Duration,
	lifetime: Duration,
	fail: bool,
}
impl ScriptedSource {
	fn issuing(delay: std::time::Duration) -> Self {
		Self { calls: AtomicUsize::new(0), delay, lifetime: Duration::hours(1), fail: false }
	}

	fn short_lived(lifetime: Duration) -> Self {
		Self { lifetime, ..Self::issuing(std::time::Duration::ZERO) }
	}

	fn failing() -> Self {
		Self { fail: true, ..Self::issuing(std::time::Duration::ZERO) }
	}
}
impl TokenSource for ScriptedSource {
	fn request_token(&self) -> TokenSourceFuture<'_> {
		Box::pin(async move {
			let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

			tokio::time::sleep(self.delay).await;

			if self.fail {
				return Err(AuthError::InvalidGrant { reason: "refresh token revoked".into() });
			}

			let issued_at = OffsetDateTime::now_utc();

			Ok(TokenInfo::expiring_in(format!("fresh-{call}"), issued_at, self.lifetime))
		})
	}
}

fn stale_token() -> TokenInfo {
	TokenInfo::expiring_at("stale", OffsetDateTime::now_utc() - Duration::minutes(1))
}

#[tokio::test]
async fn response_status_headers_and_body_pass_through() {
	let server = MockServer::start_async().await;
	let credentials = Arc::new(Credentials::from_token(TokenInfo::new("static-token")));
	let dispatcher = build_reqwest_test_dispatcher(test_config(&server.base_url()), credentials);
	let body = "{\"result\":{\"attributes\":[\"mail\",\"department\"]}}";
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path(ATTRIBUTES_PATH).header("authorization", "Bearer static-token");
			then.status(200)
				.header("content-type", "application/json")
				.header("x-request-id", "req-42")
				.body(body);
		})
		.await;
	let response =
		dispatcher.request(RequestSpec::get(ATTRIBUTES_PATH)).await.expect("Dispatch should succeed.");

	mock.assert_async().await;

	assert_eq!(response.status, 200);
	assert_eq!(response.body, body.as_bytes());
	assert_eq!(response.header("x-request-id"), Some("req-42"));
	assert_eq!(dispatcher.metrics.sent(), 1);
}

#[tokio::test]
async fn non_success_statuses_are_returned_not_raised() {
	let server = MockServer::start_async().await;
	let credentials = Arc::new(Credentials::from_token(TokenInfo::new("static-token")));
	let dispatcher = build_reqwest_test_dispatcher(test_config(&server.base_url()), credentials);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/directory-sync-service/v1/unknown/count");
			then.status(404).body("{\"errorCode\":\"NotFound\"}");
		})
		.await;
	let response = dispatcher
		.request(RequestSpec::get("/directory-sync-service/v1/unknown/count"))
		.await
		.expect("A 404 should still be delivered as a response.");

	mock.assert_async().await;

	assert_eq!(response.status, 404);
	assert!(!response.is_success());
	assert_eq!(response.text(), "{\"errorCode\":\"NotFound\"}");
}

#[tokio::test]
async fn per_call_headers_override_defaults_but_not_authorization() {
	let server = MockServer::start_async().await;
	let credentials = Arc::new(Credentials::from_token(TokenInfo::new("static-token")));
	let config = ClientConfig::builder(
		Url::parse(&server.base_url()).expect("Mock server URL should parse."),
	)
	.header("x-tenant", "acme")
	.header("x-source", "default")
	.build()
	.expect("Config should build.");
	let dispatcher = build_reqwest_test_dispatcher(config, credentials);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(ATTRIBUTES_PATH)
				.header("x-tenant", "acme")
				.header("x-source", "call")
				.header("authorization", "Bearer static-token");
			then.status(204);
		})
		.await;
	let response = dispatcher
		.request(
			RequestSpec::get(ATTRIBUTES_PATH)
				.header("X-Source", "call")
				.header("Authorization", "Bearer forged"),
		)
		.await
		.expect("Dispatch should succeed.");

	mock.assert_async().await;

	assert_eq!(response.status, 204);
}

#[tokio::test]
async fn port_override_redirects_every_request() {
	let server = MockServer::start_async().await;
	let credentials = Arc::new(Credentials::from_token(TokenInfo::new("static-token")));
	let config =
		ClientConfig::builder(Url::parse("http://127.0.0.1:1").expect("URL should parse."))
			.port(server.port())
			.build()
			.expect("Config should build.");
	let dispatcher = build_reqwest_test_dispatcher(config, credentials);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path(ATTRIBUTES_PATH);
			then.status(200).body("{}");
		})
		.await;

	dispatcher.request(RequestSpec::get(ATTRIBUTES_PATH)).await.expect("Dispatch should succeed.");

	mock.assert_async().await;
}

#[tokio::test]
async fn expired_token_is_refreshed_exactly_once() {
	let server = MockServer::start_async().await;
	let credentials = Arc::new(
		Credentials::new(ScriptedSource::issuing(std::time::Duration::ZERO))
			.with_token(stale_token()),
	);
	let dispatcher =
		build_reqwest_test_dispatcher(test_config(&server.base_url()), credentials.clone());
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path(ATTRIBUTES_PATH).header("authorization", "Bearer fresh-1");
			then.status(200).body("{}");
		})
		.await;

	dispatcher.request(RequestSpec::get(ATTRIBUTES_PATH)).await.expect("Dispatch should succeed.");

	mock.assert_async().await;

	assert_eq!(credentials.refresh_metrics.attempts(), 1);
	assert_eq!(credentials.refresh_metrics.successes(), 1);
}

#[tokio::test]
async fn concurrent_dispatches_share_one_refresh() {
	let server = MockServer::start_async().await;
	let credentials = Arc::new(
		Credentials::new(ScriptedSource::issuing(std::time::Duration::from_millis(100)))
			.with_token(stale_token()),
	);
	let dispatcher =
		build_reqwest_test_dispatcher(test_config(&server.base_url()), credentials.clone());
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path(ATTRIBUTES_PATH).header("authorization", "Bearer fresh-1");
			then.status(200).body("{}");
		})
		.await;
	let (first, second, third) = tokio::join!(
		dispatcher.request(RequestSpec::get(ATTRIBUTES_PATH)),
		dispatcher.request(RequestSpec::get(ATTRIBUTES_PATH)),
		dispatcher.request(RequestSpec::get(ATTRIBUTES_PATH)),
	);

	for result in [first, second, third] {
		assert_eq!(result.expect("Concurrent dispatch should succeed.").status, 200);
	}

	mock.assert_calls_async(3).await;

	assert_eq!(credentials.refresh_metrics.attempts(), 1);
	assert_eq!(credentials.refresh_metrics.coalesced(), 2);
}

#[tokio::test]
async fn expired_token_is_refreshed_despite_negative_loaded_window() {
	let server = MockServer::start_async().await;
	let config: ClientConfig = serde_json::from_value(json!({
		"base_url": server.base_url(),
		"refresh_window": [-300, 0]
	}))
	.expect("Config JSON should deserialize.");
	let credentials = Arc::new(
		Credentials::new(ScriptedSource::issuing(std::time::Duration::ZERO)).with_token(
			TokenInfo::expiring_at("stale", OffsetDateTime::now_utc() - Duration::seconds(10)),
		),
	);
	let dispatcher = build_reqwest_test_dispatcher(config, credentials.clone());
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path(ATTRIBUTES_PATH).header("authorization", "Bearer fresh-1");
			then.status(200).body("{}");
		})
		.await;

	dispatcher.request(RequestSpec::get(ATTRIBUTES_PATH)).await.expect("Dispatch should succeed.");

	mock.assert_async().await;

	assert_eq!(credentials.refresh_metrics.attempts(), 1);
}

#[tokio::test]
async fn short_lived_tokens_are_fetched_once_per_lifetime() {
	let server = MockServer::start_async().await;
	let credentials =
		Arc::new(Credentials::new(ScriptedSource::short_lived(Duration::seconds(30))));
	let dispatcher =
		build_reqwest_test_dispatcher(test_config(&server.base_url()), credentials.clone());
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path(ATTRIBUTES_PATH).header("authorization", "Bearer fresh-1");
			then.status(200).body("{}");
		})
		.await;

	for _ in 0..3 {
		dispatcher
			.request(RequestSpec::get(ATTRIBUTES_PATH))
			.await
			.expect("Dispatch should succeed.");
	}

	mock.assert_calls_async(3).await;

	assert_eq!(credentials.refresh_metrics.attempts(), 1);
}

#[tokio::test]
async fn failed_early_refresh_reuses_the_valid_token() {
	let server = MockServer::start_async().await;
	let credentials = Arc::new(Credentials::new(ScriptedSource::failing()).with_token(
		TokenInfo::expiring_at("seeded", OffsetDateTime::now_utc() + Duration::seconds(30)),
	));
	let dispatcher =
		build_reqwest_test_dispatcher(test_config(&server.base_url()), credentials.clone());
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path(ATTRIBUTES_PATH).header("authorization", "Bearer seeded");
			then.status(200).body("{}");
		})
		.await;
	let response = dispatcher
		.request(RequestSpec::get(ATTRIBUTES_PATH))
		.await
		.expect("A still-valid token should be used when the early refresh fails.");

	mock.assert_async().await;

	assert_eq!(response.status, 200);
	assert_eq!(credentials.refresh_metrics.failures(), 1);
}

#[tokio::test]
async fn credentials_failure_never_reaches_the_network() {
	let server = MockServer::start_async().await;
	let credentials = Arc::new(Credentials::new(ScriptedSource::failing()));
	let dispatcher = build_reqwest_test_dispatcher(test_config(&server.base_url()), credentials);
	let mock = server
		.mock_async(|when, then| {
			when.any_request();
			then.status(200);
		})
		.await;
	let err = dispatcher
		.request(RequestSpec::get(ATTRIBUTES_PATH))
		.await
		.expect_err("Credentials failures should surface to the caller.");

	assert!(matches!(err, Error::Auth(AuthError::InvalidGrant { .. })));

	mock.assert_calls_async(0).await;

	assert_eq!(dispatcher.metrics.sent(), 0);
	assert_eq!(dispatcher.metrics.auth_failures(), 1);
}

#[tokio::test]
async fn expired_static_token_fails_fast() {
	let server = MockServer::start_async().await;
	let credentials = Arc::new(Credentials::from_token(stale_token()));
	let dispatcher = build_reqwest_test_dispatcher(test_config(&server.base_url()), credentials);
	let mock = server
		.mock_async(|when, then| {
			when.any_request();
			then.status(200);
		})
		.await;
	let err = dispatcher
		.request(RequestSpec::get(ATTRIBUTES_PATH))
		.await
		.expect_err("Expired static tokens cannot be used.");

	assert!(matches!(err, Error::Auth(AuthError::Expired { .. })));

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn connection_failures_propagate_as_transport_errors() {
	let credentials = Arc::new(Credentials::from_token(TokenInfo::new("static-token")));
	let dispatcher = build_reqwest_test_dispatcher(test_config("http://127.0.0.1:1"), credentials);
	let err = dispatcher
		.request(RequestSpec::get(ATTRIBUTES_PATH))
		.await
		.expect_err("Closed ports should fail in the transport.");

	assert!(matches!(err, Error::Transport(TransportError::Network { .. })));
	assert_eq!(dispatcher.metrics.transport_failures(), 1);
}

#[tokio::test]
async fn per_call_timeout_is_enforced() {
	let server = MockServer::start_async().await;
	let credentials = Arc::new(Credentials::from_token(TokenInfo::new("static-token")));
	let dispatcher = build_reqwest_test_dispatcher(test_config(&server.base_url()), credentials);

	server
		.mock_async(|when, then| {
			when.method(GET).path(ATTRIBUTES_PATH);
			then.status(200).delay(std::time::Duration::from_secs(2));
		})
		.await;

	let err = dispatcher
		.request(RequestSpec::get(ATTRIBUTES_PATH).timeout(std::time::Duration::from_millis(100)))
		.await
		.expect_err("Slow responses should time out.");

	assert!(matches!(err, Error::Transport(TransportError::Timeout { .. })));
}
