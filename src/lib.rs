//! Corporate identity federation for WeCom-style OAuth 2.0 providers.
//!
//! Application tokens are cached per credential pair and renewed when upstream rejects them.
//! Authorization codes resolve through a two-phase profile lookup into normalized identities
//! that host authentication systems can consume.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod obs;
pub mod provider;
pub mod upstream;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{ClientId, CredentialKey, SubAppId},
		cache::{CredentialCache, MemoryCache},
		flows::Broker,
		http::ReqwestHttpClient,
		provider::{DefaultProviderStrategy, ProviderDescriptor, ProviderStrategy},
		upstream::ReqwestTransportErrorMapper,
	};

	/// Broker type alias used by reqwest-backed integration tests.
	pub type ReqwestTestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds a credential key from raw fixture strings.
	pub fn test_credential_key(client_id: &str, sub_app_id: Option<&str>) -> CredentialKey {
		let client_id = ClientId::new(client_id).expect("Client identifier fixture should be valid.");
		let sub_app_id = sub_app_id
			.map(|value| SubAppId::new(value).expect("Sub-app identifier fixture should be valid."));

		CredentialKey::new(client_id, sub_app_id)
	}

	/// Constructs a [`Broker`] backed by a fresh in-memory cache, the default provider strategy,
	/// and the reqwest transport used across integration tests.
	pub fn build_reqwest_test_broker(
		descriptor: ProviderDescriptor,
		key: CredentialKey,
		client_secret: &str,
	) -> (ReqwestTestBroker, Arc<MemoryCache>) {
		let cache_backend = Arc::new(MemoryCache::default());
		let cache: Arc<dyn CredentialCache> = cache_backend.clone();
		let strategy: Arc<dyn ProviderStrategy> = Arc::new(DefaultProviderStrategy);
		let http_client = test_reqwest_http_client();
		let mapper = Arc::new(ReqwestTransportErrorMapper);
		let broker = Broker::with_http_client(
			cache,
			descriptor,
			strategy,
			key,
			client_secret,
			http_client,
			mapper,
		);

		(broker, cache_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::Hash,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
