//! Resolves an authorization code into a normalized identity against a mocked WeCom-style
//! upstream, using the default reqwest transport and the in-memory credential cache.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use wecom_federation::{
	auth::{CredentialKey, ProviderId},
	cache::{CredentialCache, MemoryCache},
	flows::Broker,
	http::ReqwestHttpClient,
	provider::{DefaultProviderStrategy, ProviderDescriptor, ProviderStrategy},
	reqwest::Client,
	upstream::ReqwestTransportErrorMapper,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let cache: Arc<dyn CredentialCache> = Arc::new(MemoryCache::default());
	let strategy: Arc<dyn ProviderStrategy> = Arc::new(DefaultProviderStrategy);
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/gettoken");
			then.status(200).header("content-type", "application/json").body(
				"{\"errcode\":0,\"errmsg\":\"ok\",\"access_token\":\"demo-token\",\"expires_in\":7200}",
			);
		})
		.await;
	let _basic_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/user/getuserinfo").query_param("code", "demo-code");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"errcode\":0,\"errmsg\":\"ok\",\"userid\":\"ZhangSan\"}");
		})
		.await;
	let _detailed_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/user/get").query_param("userid", "ZhangSan");
			then.status(200).header("content-type", "application/json").body(
				"{\"errcode\":0,\"errmsg\":\"ok\",\"userid\":\"ZhangSan\",\"name\":\"Zhang San\",\
				 \"email\":\"zhangsan@example.com\"}",
			);
		})
		.await;
	let descriptor = ProviderDescriptor::builder(ProviderId::new("demo-wecom")?)
		.authorization_endpoint(Url::parse(&server.url("/connect/oauth2/authorize"))?)
		.token_endpoint(Url::parse(&server.url("/cgi-bin/gettoken"))?)
		.basic_profile_endpoint(Url::parse(&server.url("/cgi-bin/user/getuserinfo"))?)
		.detailed_profile_endpoint(Url::parse(&server.url("/cgi-bin/user/get"))?)
		.build()?;
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let broker = <Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>>::with_http_client(
		cache,
		descriptor,
		strategy,
		CredentialKey::parse("ww-demo-corp", Some("1000002"))?,
		"demo-secret",
		http_client,
		ReqwestTransportErrorMapper,
	);
	let identity = broker.fetch_identity("demo-code").await?;

	println!(
		"Resolved `{}` ({}) with email {:?}.",
		identity.username, identity.display_name, identity.email
	);

	// A second login reuses the cached application token.
	broker.fetch_identity("demo-code").await?;
	token_mock.assert_calls_async(1).await;

	Ok(())
}
