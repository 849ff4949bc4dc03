//! Thread-safe in-memory [`CredentialCache`] with one lazily created namespace per key.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, CredentialKey},
	cache::{CacheError, CacheFuture, CredentialCache},
};

type Namespaces = Arc<RwLock<HashMap<CredentialKey, Arc<Namespace>>>>;

#[derive(Debug, Default)]
struct Namespace(RwLock<Option<CacheEntry>>);

#[derive(Clone, Debug)]
struct CacheEntry {
	token: AccessToken,
	evict_at: OffsetDateTime,
}

/// Process-wide token cache.
///
/// Each credential pair gets its own namespace the first time a token is stored for it, and the
/// namespace lives as long as the cache. The key space is bounded by the configured credential
/// pairs, so namespaces are never dropped; expired tokens inside them are ignored by reads and
/// released by [`purge_expired`](Self::purge_expired).
///
/// Clones share the same storage.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache(Namespaces);
impl MemoryCache {
	/// Number of namespaces created so far.
	pub fn namespace_count(&self) -> usize {
		self.0.read().len()
	}

	/// Number of entries that are still live.
	pub fn len(&self) -> usize {
		let now = OffsetDateTime::now_utc();

		self.0
			.read()
			.values()
			.filter(|namespace| Self::read_at(namespace, now).is_some())
			.count()
	}

	/// Returns `true` when no live entry exists.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Drops expired entries, returning how many were released.
	pub fn purge_expired(&self) -> usize {
		let now = OffsetDateTime::now_utc();
		let namespaces = self.0.read();
		let mut purged = 0;

		for namespace in namespaces.values() {
			let mut slot = namespace.0.write();

			if slot.as_ref().is_some_and(|entry| now >= entry.evict_at) {
				*slot = None;
				purged += 1;
			}
		}

		purged
	}

	fn namespace(&self, key: &CredentialKey) -> Arc<Namespace> {
		if let Some(namespace) = self.0.read().get(key) {
			return namespace.clone();
		}

		self.0.write().entry(key.clone()).or_default().clone()
	}

	fn get_at(&self, key: &CredentialKey, now: OffsetDateTime) -> Option<AccessToken> {
		let namespace = self.0.read().get(key).cloned()?;

		Self::read_at(&namespace, now)
	}

	fn read_at(namespace: &Namespace, now: OffsetDateTime) -> Option<AccessToken> {
		namespace
			.0
			.read()
			.as_ref()
			.filter(|entry| now < entry.evict_at)
			.map(|entry| entry.token.clone())
	}

	fn put_at(&self, key: &CredentialKey, token: AccessToken, ttl: Duration, now: OffsetDateTime) {
		let evict_at = now + if ttl.is_negative() { Duration::ZERO } else { ttl };

		*self.namespace(key).0.write() = Some(CacheEntry { token, evict_at });
	}

	fn invalidate_now(&self, key: &CredentialKey) {
		if let Some(namespace) = self.0.read().get(key) {
			namespace.0.write().take();
		}
	}
}
impl CredentialCache for MemoryCache {
	fn get<'a>(&'a self, key: &'a CredentialKey) -> CacheFuture<'a, Option<AccessToken>> {
		let token = self.get_at(key, OffsetDateTime::now_utc());

		Box::pin(async move { Ok::<_, CacheError>(token) })
	}

	fn put<'a>(
		&'a self,
		key: &'a CredentialKey,
		token: AccessToken,
		ttl: Duration,
	) -> CacheFuture<'a, ()> {
		self.put_at(key, token, ttl, OffsetDateTime::now_utc());

		Box::pin(async move { Ok(()) })
	}

	fn invalidate<'a>(&'a self, key: &'a CredentialKey) -> CacheFuture<'a, ()> {
		self.invalidate_now(key);

		Box::pin(async move { Ok(()) })
	}
}
