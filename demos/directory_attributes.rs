//! Demonstrates refreshing an agent token and reading a Directory-Sync Service instance's
//! attribute configuration, with both endpoints served by a local mock.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use dirsync_client::{
	auth::{Credentials, RefreshTokenSourceBuilder},
	config::ClientConfig,
	dirsync::DirectorySyncService,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let attributes_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/directory-sync-service/v1/attributes")
				.header("authorization", "Bearer demo-access");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"attributes\":[\"mail\",\"department\"]}");
		})
		.await;
	let token_url = Url::parse(&server.url("/token"))?;
	let source = RefreshTokenSourceBuilder::new(token_url, "demo-agent")
		.client_secret("super-secret")
		.refresh_token("demo-refresh")
		.build_reqwest()?;
	let credentials = Arc::new(Credentials::new(source));
	let config = ClientConfig::builder(Url::parse(&server.base_url())?)
		.header("x-agent", "directory-sync-demo")
		.timeout(std::time::Duration::from_secs(10))
		.build()?;
	let service = DirectorySyncService::connect(config, credentials)?;
	let response = service.attributes().await?;

	println!("Status {}: {}", response.status, response.text());

	token_mock.assert_async().await;
	attributes_mock.assert_async().await;

	Ok(())
}
