//! Shared helpers for flow implementations (singleflight guards, query parameters).

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{_prelude::*, auth::CredentialKey};

/// Per-key singleflight guards.
pub(crate) type FlowGuards = Arc<Mutex<HashMap<CredentialKey, Arc<FlowGuard>>>>;

/// Serializes issuance for one credential key and remembers how the last issuance ended.
///
/// Callers snapshot [`generation`](Self::generation) before queueing on [`lock`](Self::lock).
/// A failure recorded after that snapshot belongs to an issuance they were waiting on, so they
/// share its outcome instead of issuing again.
#[derive(Debug, Default)]
pub(crate) struct FlowGuard {
	lock: AsyncMutex<()>,
	generation: AtomicU64,
	failure: Mutex<Option<(u64, Arc<Error>)>>,
}
impl FlowGuard {
	pub(crate) fn generation(&self) -> u64 {
		self.generation.load(Ordering::Acquire)
	}

	pub(crate) async fn lock(&self) -> async_lock::MutexGuard<'_, ()> {
		self.lock.lock().await
	}

	/// Returns the failure of an issuance that finished after `seen`.
	pub(crate) fn failure_since(&self, seen: u64) -> Option<Arc<Error>> {
		match &*self.failure.lock() {
			Some((generation, failure)) if *generation > seen => Some(failure.clone()),
			_ => None,
		}
	}

	/// Closes the current issuance; must be called while holding [`lock`](Self::lock).
	pub(crate) fn finish(&self, failure: Option<Arc<Error>>) {
		let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

		*self.failure.lock() = failure.map(|failure| (generation, failure));
	}
}

/// Returns (and creates on demand) the singleflight guard for a credential key.
pub(crate) fn flow_guard(guards: &FlowGuards, key: &CredentialKey) -> Arc<FlowGuard> {
	let mut guards = guards.lock();

	guards.entry(key.clone()).or_default().clone()
}

/// Builds an ordered query parameter map from borrowed pairs.
pub(crate) fn query_params<const N: usize>(pairs: [(&str, &str); N]) -> BTreeMap<String, String> {
	pairs.into_iter().map(|(k, v)| (k.to_owned(), v.to_owned())).collect()
}
