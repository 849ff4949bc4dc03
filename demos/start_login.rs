//! Builds login redirects for the WeCom preset: the in-app OAuth URL for the corporate
//! client's embedded browser and the QR-connect page for everything else.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use url::Url;
// self
use wecom_federation::{
	auth::CredentialKey,
	cache::{CredentialCache, MemoryCache},
	flows::Broker,
	provider::ProviderDescriptor,
};

fn main() -> Result<()> {
	color_eyre::install()?;

	let cache: Arc<dyn CredentialCache> = Arc::new(MemoryCache::default());
	let key = CredentialKey::parse("ww-demo-corp", Some("1000002"))?;
	let broker = Broker::new(cache, ProviderDescriptor::wecom()?, key, "demo-secret");
	let redirect_uri = Url::parse("https://sso.example.com/realms/corp/broker/wecom/endpoint")?;

	for user_agent in [
		"Mozilla/5.0 (iPhone) AppleWebKit/605.1.15 wxwork/4.1.20 MicroMessenger/7.0.1",
		"Mozilla/5.0 (X11; Linux x86_64; rv:130.0) Gecko/20100101 Firefox/130.0",
	] {
		let login = broker.start_login(redirect_uri.clone(), Some(user_agent));

		println!("{:?} login for `{user_agent}`:\n  {}", login.mode, login.authorize_url);

		login.validate_state(&login.state)?;
	}

	Ok(())
}
