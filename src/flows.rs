//! Federation flows and the [`Broker`] facade consumed by host authentication systems.

pub mod authorize;
pub mod callback;
pub mod resolve;
pub mod token;

mod common;

pub use authorize::*;
pub use callback::*;
pub use resolve::*;
pub use token::*;

// self
use crate::{
	_prelude::*,
	auth::{CredentialKey, Identity},
	cache::CredentialCache,
	error::ConfigError,
	http::UpstreamHttpClient,
	provider::{ProviderDescriptor, ProviderStrategy},
	upstream::{TransportErrorMapper, UpstreamClient},
};
#[cfg(feature = "reqwest")]
use crate::{
	config::FederationConfig,
	http::ReqwestHttpClient,
	provider::DefaultProviderStrategy,
	upstream::ReqwestTransportErrorMapper,
};

#[cfg(feature = "reqwest")]
/// Broker specialized for the crate's default reqwest transport stack.
pub type ReqwestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Binds one credential pair to an identity resolver.
///
/// The broker is what a host plugs into its login pipeline: it builds authorization URLs,
/// dispatches redirect callbacks, and resolves authorization codes into identities. Several
/// brokers can share one resolver (and therefore one token cache) through
/// [`Broker::from_resolver`].
pub struct Broker<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	resolver: Arc<IdentityResolver<C, M>>,
	key: CredentialKey,
}
impl<C, M> Broker<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a broker that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		cache: Arc<dyn CredentialCache>,
		descriptor: ProviderDescriptor,
		strategy: Arc<dyn ProviderStrategy>,
		key: CredentialKey,
		client_secret: impl Into<String>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let upstream = UpstreamClient::new(http_client, mapper);
		let tokens = TokenManager::new(cache, &descriptor, strategy.clone(), upstream)
			.with_credential(key.clone(), client_secret);
		let resolver = IdentityResolver::new(Arc::new(tokens), descriptor, strategy);

		Self { resolver: Arc::new(resolver), key }
	}

	/// Binds `key` to an existing resolver; the key must be registered with its token manager.
	pub fn from_resolver(
		resolver: Arc<IdentityResolver<C, M>>,
		key: CredentialKey,
	) -> Result<Self> {
		if !resolver.token_manager().is_registered(&key) {
			return Err(ConfigError::UnknownCredential { key }.into());
		}

		Ok(Self { resolver, key })
	}

	/// Credential pair the broker resolves identities with.
	pub fn key(&self) -> &CredentialKey {
		&self.key
	}

	/// Descriptor of the upstream provider.
	pub fn descriptor(&self) -> &ProviderDescriptor {
		self.resolver.descriptor()
	}

	/// Shared identity resolver.
	pub fn resolver(&self) -> &Arc<IdentityResolver<C, M>> {
		&self.resolver
	}

	/// Token manager behind the resolver.
	pub fn token_manager(&self) -> &Arc<TokenManager<C, M>> {
		self.resolver.token_manager()
	}

	/// Resolves an authorization code into an [`Identity`].
	pub async fn fetch_identity(&self, code: &str) -> Result<Identity> {
		self.resolver.resolve(code, &self.key).await
	}

	/// Starts a login: generates the opaque state and the authorization URL for the browser
	/// identified by `user_agent`.
	pub fn start_login(&self, redirect_uri: Url, user_agent: Option<&str>) -> LoginRequest {
		authorize::build_login_request(self.descriptor(), &self.key, redirect_uri, user_agent)
	}

	/// Dispatches a redirect callback to `host`, resolving the identity when a code arrived.
	pub async fn handle_callback<H>(&self, host: &H, params: CallbackParams) -> H::Response
	where
		H: ?Sized + AuthenticationCallback,
	{
		callback::dispatch(host, params, |code| async move { self.fetch_identity(&code).await })
			.await
	}
}
#[cfg(feature = "reqwest")]
impl Broker<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a broker with the default strategy and its own reqwest transport.
	pub fn new(
		cache: Arc<dyn CredentialCache>,
		descriptor: ProviderDescriptor,
		key: CredentialKey,
		client_secret: impl Into<String>,
	) -> Self {
		Self::with_http_client(
			cache,
			descriptor,
			Arc::new(DefaultProviderStrategy),
			key,
			client_secret,
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}

	/// Validates `config` and builds a reqwest-backed broker from it.
	pub fn from_config(cache: Arc<dyn CredentialCache>, config: FederationConfig) -> Result<Self> {
		config.validate()?;

		let key = config.credential_key();

		Ok(Self::new(cache, config.provider, key, config.client_secret.expose()))
	}
}
impl<C, M> Clone for Broker<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self { resolver: self.resolver.clone(), key: self.key.clone() }
	}
}
impl<C, M> Debug for Broker<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("descriptor", &self.descriptor().id)
			.field("key", &self.key)
			.finish()
	}
}
