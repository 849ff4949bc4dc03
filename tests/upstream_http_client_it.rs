// std
use std::sync::atomic::{AtomicUsize, Ordering};
// self
use wecom_federation::{
	_preludet::*,
	auth::ProviderId,
	cache::{CredentialCache, MemoryCache},
	error::{ConfigError, Error, Result, TransientError, TransportError},
	flows::Broker,
	http::{ResponseMetadata, ResponseMetadataSlot, UpstreamHttpClient},
	provider::{DefaultProviderStrategy, ProviderDescriptor, ProviderStrategy},
	upstream::{
		TransportErrorMapper, UpstreamApi,
		oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse, http},
	},
};

#[derive(Debug)]
enum FakeTransportError {
	Unavailable,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Unavailable => write!(f, "Transport unavailable."),
		}
	}
}
impl StdError for FakeTransportError {}

const TOKEN_BODY: &str =
	"{\"errcode\":0,\"errmsg\":\"ok\",\"access_token\":\"recovered-token\",\"expires_in\":7200}";

/// Transport whose first `failing_calls` requests fail; later requests return a token.
#[derive(Clone)]
struct FakeHttpClient {
	status: u16,
	failing_calls: usize,
	calls: Arc<AtomicUsize>,
}
impl FakeHttpClient {
	fn unavailable(status: u16) -> Self {
		Self::flaky(status, usize::MAX)
	}

	fn flaky(status: u16, failing_calls: usize) -> Self {
		Self { status, failing_calls, calls: Default::default() }
	}
}
impl UpstreamHttpClient for FakeHttpClient {
	type Handle = FakeHttpHandle;
	type TransportError = FakeTransportError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		FakeHttpHandle { slot, client: self.clone() }
	}
}

struct FakeHttpHandle {
	slot: ResponseMetadataSlot,
	client: FakeHttpClient,
}
impl<'a> AsyncHttpClient<'a> for FakeHttpHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, _request: HttpRequest) -> Self::Future {
		let slot = self.slot.clone();
		let status = self.client.status;
		let failing = self.client.calls.fetch_add(1, Ordering::SeqCst) < self.client.failing_calls;

		Box::pin(async move {
			assert!(
				slot.take().is_none(),
				"ResponseMetadataSlot must be clear before dispatching a request."
			);

			if !failing {
				slot.store(ResponseMetadata { status: Some(200) });

				return Ok(http::Response::builder()
					.status(200)
					.body(TOKEN_BODY.as_bytes().to_vec())
					.expect("Fake token response should build."));
			}

			slot.store(ResponseMetadata { status: Some(status) });

			Err(HttpClientError::Reqwest(Box::new(FakeTransportError::Unavailable)))
		})
	}
}

#[derive(Clone, Default)]
struct RecordingTransportErrorMapper {
	calls: Arc<Mutex<Vec<(UpstreamApi, Option<ResponseMetadata>)>>>,
}
impl RecordingTransportErrorMapper {
	fn recorded(&self) -> Vec<(UpstreamApi, Option<u16>)> {
		self.calls
			.lock()
			.iter()
			.map(|(api, meta)| (*api, meta.as_ref().and_then(|value| value.status)))
			.collect()
	}
}
impl TransportErrorMapper<FakeTransportError> for RecordingTransportErrorMapper {
	fn map_transport_error(
		&self,
		api: UpstreamApi,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<FakeTransportError>,
	) -> Error {
		let status = meta.and_then(|value| value.status);

		self.calls.lock().push((api, meta.cloned()));

		match err {
			HttpClientError::Reqwest(inner) => TransientError::Upstream {
				api,
				message: format!("Fake transport error: {inner}"),
				status,
			}
			.into(),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			other => TransientError::Upstream {
				api,
				message: format!("Unhandled HTTP client error variant: {other:?}"),
				status,
			}
			.into(),
		}
	}
}

fn build_descriptor() -> ProviderDescriptor {
	let provider_id =
		ProviderId::new("mock-upstream-http").expect("Failed to build mock provider identifier.");

	ProviderDescriptor::builder(provider_id)
		.authorization_endpoint(
			Url::parse("https://mock.example.com/connect/oauth2/authorize")
				.expect("Failed to parse mock authorization endpoint URL."),
		)
		.token_endpoint(
			Url::parse("https://mock.example.com/cgi-bin/gettoken")
				.expect("Failed to parse mock token endpoint URL."),
		)
		.basic_profile_endpoint(
			Url::parse("https://mock.example.com/cgi-bin/user/getuserinfo")
				.expect("Failed to parse mock basic profile endpoint URL."),
		)
		.build()
		.expect("Failed to build mock provider descriptor.")
}

fn build_broker(
	client: FakeHttpClient,
	mapper: Arc<RecordingTransportErrorMapper>,
) -> (Broker<FakeHttpClient, RecordingTransportErrorMapper>, Arc<MemoryCache>) {
	let memory = Arc::new(MemoryCache::default());
	let cache: Arc<dyn CredentialCache> = memory.clone();
	let strategy: Arc<dyn ProviderStrategy> = Arc::new(DefaultProviderStrategy);
	let broker = Broker::with_http_client(
		cache,
		build_descriptor(),
		strategy,
		test_credential_key("fake-corp", Some("1000002")),
		"fake-secret",
		Arc::new(client),
		mapper,
	);

	(broker, memory)
}

#[tokio::test]
async fn fake_transport_failures_exhaust_issuance_retries() {
	let mapper = Arc::new(RecordingTransportErrorMapper::default());
	let (broker, _) = build_broker(FakeHttpClient::unavailable(502), mapper.clone());
	let err = broker
		.token_manager()
		.get_token(broker.key())
		.await
		.expect_err("Unavailable transport should fail issuance.");

	match err {
		Error::CredentialUnavailable { source, .. } => match &*source {
			&Error::Transient(TransientError::Upstream { api, status, .. }) => {
				assert_eq!(api, UpstreamApi::Token);
				assert_eq!(status, Some(502));
			},
			other => panic!("Unexpected final attempt error: {other:?}."),
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}
}

#[tokio::test]
async fn fake_mapper_captures_response_metadata_per_attempt() {
	let mapper = Arc::new(RecordingTransportErrorMapper::default());
	let (broker, _) = build_broker(FakeHttpClient::unavailable(504), mapper.clone());
	let err = broker
		.fetch_identity("code")
		.await
		.expect_err("Resolution should fail when no token can be issued.");

	assert!(matches!(err, Error::NoCredential { .. }));
	assert_eq!(
		mapper.recorded(),
		vec![(UpstreamApi::Token, Some(504)), (UpstreamApi::Token, Some(504))],
		"Mapper must see one call per issuance attempt and no profile call."
	);
}

#[tokio::test]
async fn second_issuance_attempt_recovers_after_a_transport_failure() {
	let mapper = Arc::new(RecordingTransportErrorMapper::default());
	let client = FakeHttpClient::flaky(502, 1);
	let calls = client.calls.clone();
	let (broker, cache) = build_broker(client, mapper.clone());
	let tokens = broker.token_manager();
	let token = tokens
		.get_token(broker.key())
		.await
		.expect("Second issuance attempt should recover the token.");

	assert_eq!(token.expose(), "recovered-token");
	assert_eq!(cache.len(), 1);
	assert_eq!(tokens.metrics().attempts(), 2);
	assert_eq!(tokens.metrics().failures(), 1);
	assert_eq!(tokens.metrics().successes(), 1);
	assert_eq!(mapper.recorded(), vec![(UpstreamApi::Token, Some(502))]);

	let cached = tokens.get_token(broker.key()).await.expect("Recovered token should be cached.");

	assert_eq!(cached.expose(), "recovered-token");
	assert_eq!(calls.load(Ordering::SeqCst), 2);
}
