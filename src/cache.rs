//! Credential cache contract and the built-in in-process implementation.

pub mod memory;

pub use memory::MemoryCache;

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, CredentialKey},
};

/// Future returned by [`CredentialCache`] operations.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Keyed, TTL-expiring store of application access tokens.
///
/// Implementations enforce the TTL themselves: `get` must report `None` once the TTL passed
/// even if the entry has not been swept yet. Only one live token may exist per key and `put`
/// supersedes the previous one atomically. Operations are local lookups; they must not call
/// the upstream identity service.
pub trait CredentialCache
where
	Self: Send + Sync,
{
	/// Returns the live token for `key`, if any.
	fn get<'a>(&'a self, key: &'a CredentialKey) -> CacheFuture<'a, Option<AccessToken>>;

	/// Stores `token` for `key`, replacing any existing entry; the TTL starts now.
	fn put<'a>(
		&'a self,
		key: &'a CredentialKey,
		token: AccessToken,
		ttl: Duration,
	) -> CacheFuture<'a, ()>;

	/// Removes the entry for `key`; succeeds when nothing is cached.
	fn invalidate<'a>(&'a self, key: &'a CredentialKey) -> CacheFuture<'a, ()>;
}

/// Error type produced by [`CredentialCache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheError {
	/// Serialization failures surfaced by a remote backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the cache substrate.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
