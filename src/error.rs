//! Federation-level error types shared across flows, providers, and caches.

// self
use crate::{_prelude::*, auth::CredentialKey, upstream::UpstreamApi};

/// Federation-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical federation error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credential cache failure.
	#[error("{0}")]
	Cache(
		#[from]
		#[source]
		crate::cache::CacheError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Token issuance failed on two consecutive attempts.
	#[error("Access token for `{key}` is unavailable after two issuance attempts.")]
	CredentialUnavailable {
		/// Credential pair whose token could not be issued.
		key: CredentialKey,
		/// Failure reported by the final attempt, shared with every caller that waited on it.
		#[source]
		source: Arc<Error>,
	},
	/// The identity resolver could not obtain an access token.
	#[error("No access token is available to resolve the identity.")]
	NoCredential {
		/// Failure reported by the token manager.
		#[source]
		source: Box<Error>,
	},
	/// Upstream returned an error code that no renewal can recover from.
	#[error("Upstream {api} call was rejected with errcode {errcode}: {errmsg}.")]
	UpstreamRejected {
		/// Upstream API that produced the error code.
		api: UpstreamApi,
		/// Upstream-defined error code.
		errcode: i64,
		/// Upstream-supplied error message.
		errmsg: String,
	},
	/// Profile payload is missing required fields or is not a JSON document.
	#[error("Upstream {api} payload is malformed: {reason}.")]
	MalformedProfile {
		/// Upstream API that produced the payload.
		api: UpstreamApi,
		/// Human-readable reason.
		reason: String,
	},
}
impl Error {
	/// Wraps a token-manager failure reported while resolving an identity.
	pub fn no_credential(source: Error) -> Self {
		Self::NoCredential { source: Box::new(source) }
	}
}
impl From<crate::auth::IdentifierError> for Error {
	fn from(e: crate::auth::IdentifierError) -> Self {
		ConfigError::from(e).into()
	}
}
impl From<crate::provider::ProviderDescriptorError> for Error {
	fn from(e: crate::provider::ProviderDescriptorError) -> Self {
		ConfigError::from(e).into()
	}
}

/// Configuration and validation failures raised by the federation layer.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Descriptor validation failed.
	#[error(transparent)]
	InvalidDescriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Identifier validation failed.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// No secret has been registered for the credential pair.
	#[error("No client secret is registered for `{key}`.")]
	UnknownCredential {
		/// Credential pair that was requested.
		key: CredentialKey,
	},
	/// A configured client secret is empty.
	#[error("Client secret for `{key}` is empty.")]
	EmptyClientSecret {
		/// Credential pair with the empty secret.
		key: CredentialKey,
	},
	/// Token endpoint response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint response omitted `access_token`.
	#[error("Token endpoint response is missing access_token.")]
	MissingAccessToken,
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Token endpoint returned a non-positive duration.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants.
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Upstream answered with a non-success HTTP status.
	#[error("Upstream {api} endpoint returned HTTP {status}.")]
	HttpStatus {
		/// Upstream API that was called.
		api: UpstreamApi,
		/// HTTP status code.
		status: u16,
	},
	/// Upstream returned an unexpected but non-fatal response.
	#[error("Upstream {api} endpoint returned an unexpected response: {message}.")]
	Upstream {
		/// Upstream API that was called.
		api: UpstreamApi,
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Upstream responded with malformed JSON that could not be parsed.
	#[error("Upstream {api} endpoint returned malformed JSON.")]
	ResponseParse {
		/// Upstream API that was called.
		api: UpstreamApi,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the upstream identity service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the upstream identity service.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
