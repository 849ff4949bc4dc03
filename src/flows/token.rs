//! Application token lifecycle: cached lookup, issuance on miss, forced renewal.
//!
//! [`TokenManager::get_token`] serves tokens from the shared [`CredentialCache`] and only
//! contacts the issuance endpoint on a miss. A per-[`CredentialKey`] singleflight guard makes
//! concurrent cold callers share one issuance; the cache is re-checked once the guard is held.
//! Callers queued behind an issuance that failed receive its error instead of issuing again.
//! Issuance is attempted at most twice per call, and a failed attempt never touches the cache.

mod metrics;

pub use metrics::IssuanceMetrics;

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, CredentialKey, TokenSecret},
	cache::CredentialCache,
	error::ConfigError,
	flows::common::{self, FlowGuards},
	http::UpstreamHttpClient,
	obs::{self, FlowKind},
	provider::{ProviderDescriptor, ProviderStrategy},
	upstream::{IssuedToken, TransportErrorMapper, UpstreamClient},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, upstream::ReqwestTransportErrorMapper};

/// Issues and caches application access tokens for registered credential pairs.
pub struct TokenManager<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	upstream: UpstreamClient<C, M>,
	cache: Arc<dyn CredentialCache>,
	token_endpoint: Url,
	strategy: Arc<dyn ProviderStrategy>,
	credentials: HashMap<CredentialKey, TokenSecret>,
	metrics: Arc<IssuanceMetrics>,
	flow_guards: FlowGuards,
}
impl<C, M> TokenManager<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a manager that issues tokens from `descriptor`'s token endpoint.
	///
	/// No credential is registered yet; add them with [`with_credential`](Self::with_credential).
	pub fn new(
		cache: Arc<dyn CredentialCache>,
		descriptor: &ProviderDescriptor,
		strategy: Arc<dyn ProviderStrategy>,
		upstream: UpstreamClient<C, M>,
	) -> Self {
		Self {
			upstream,
			cache,
			token_endpoint: descriptor.endpoints.token.clone(),
			strategy,
			credentials: HashMap::new(),
			metrics: Default::default(),
			flow_guards: Default::default(),
		}
	}

	/// Registers (or replaces) the secret for a credential pair.
	pub fn with_credential(mut self, key: CredentialKey, secret: impl Into<String>) -> Self {
		self.credentials.insert(key, TokenSecret::new(secret));

		self
	}

	/// Shared issuance counters.
	pub fn metrics(&self) -> &Arc<IssuanceMetrics> {
		&self.metrics
	}

	/// Cache the manager reads from and writes to.
	pub fn cache(&self) -> &Arc<dyn CredentialCache> {
		&self.cache
	}

	/// Upstream client used for issuance.
	pub fn upstream(&self) -> &UpstreamClient<C, M> {
		&self.upstream
	}

	/// Returns `true` when a secret is registered for `key`.
	pub fn is_registered(&self, key: &CredentialKey) -> bool {
		self.credentials.contains_key(key)
	}

	/// Returns a live token for `key`, issuing one on a cache miss.
	///
	/// Fails with [`Error::CredentialUnavailable`] after two consecutive failed issuance
	/// attempts, and with [`ConfigError::UnknownCredential`] for unregistered keys.
	pub async fn get_token(&self, key: &CredentialKey) -> Result<AccessToken> {
		obs::observe(FlowKind::GetToken, "get_token", async move {
			let secret = self.secret(key)?;

			if let Some(token) = self.cache.get(key).await? {
				return Ok(token);
			}

			let guard = common::flow_guard(&self.flow_guards, key);
			let seen = guard.generation();
			let _singleflight = guard.lock().await;

			if let Some(token) = self.cache.get(key).await? {
				return Ok(token);
			}
			if let Some(source) = guard.failure_since(seen) {
				return Err(Error::CredentialUnavailable { key: key.clone(), source });
			}

			let result = self.issue_and_store(key, secret).await;

			guard.finish(match &result {
				Err(Error::CredentialUnavailable { source, .. }) => Some(source.clone()),
				_ => None,
			});

			result
		})
		.await
	}

	/// Drops the cached token for `key` and issues a new one unconditionally.
	///
	/// Renewals are not coalesced; every call reaches the issuance endpoint.
	pub async fn force_renew(&self, key: &CredentialKey) -> Result<AccessToken> {
		obs::observe(FlowKind::ForceRenew, "force_renew", async move {
			let secret = self.secret(key)?;

			self.metrics.record_renewal();
			self.cache.invalidate(key).await?;
			self.issue_and_store(key, secret).await
		})
		.await
	}

	fn secret(&self, key: &CredentialKey) -> Result<&TokenSecret> {
		self.credentials
			.get(key)
			.ok_or_else(|| ConfigError::UnknownCredential { key: key.clone() }.into())
	}

	async fn issue_and_store(
		&self,
		key: &CredentialKey,
		secret: &TokenSecret,
	) -> Result<AccessToken> {
		let issued = match self.issue_once(key, secret).await {
			Ok(issued) => issued,
			Err(first) => {
				obs::log_issuance_retry(key, &first);

				self.issue_once(key, secret).await.map_err(|source| {
					Error::CredentialUnavailable { key: key.clone(), source: Arc::new(source) }
				})?
			},
		};
		let issued_at = OffsetDateTime::now_utc();
		let token = AccessToken {
			value: issued.access_token,
			issued_at,
			expires_at: issued_at + issued.expires_in,
		};

		self.cache.put(key, token.clone(), issued.expires_in).await?;

		Ok(token)
	}

	async fn issue_once(&self, key: &CredentialKey, secret: &TokenSecret) -> Result<IssuedToken> {
		self.metrics.record_attempt();

		let result = self
			.upstream
			.issue_token(self.strategy.as_ref(), &self.token_endpoint, key, secret)
			.await;

		match &result {
			Ok(_) => self.metrics.record_success(),
			Err(_) => self.metrics.record_failure(),
		}

		result
	}
}
#[cfg(feature = "reqwest")]
impl TokenManager<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a manager backed by the default reqwest transport.
	pub fn with_reqwest(
		cache: Arc<dyn CredentialCache>,
		descriptor: &ProviderDescriptor,
		strategy: Arc<dyn ProviderStrategy>,
	) -> Self {
		Self::new(cache, descriptor, strategy, UpstreamClient::default())
	}
}
impl<C, M> Debug for TokenManager<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("token_endpoint", &self.token_endpoint.as_str())
			.field("credentials", &self.credentials.keys().collect::<Vec<_>>())
			.field("metrics", &self.metrics)
			.finish()
	}
}
