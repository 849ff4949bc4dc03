//! Typed client for the upstream identity service's JSON API.
//!
//! Every upstream call is a `GET` with query parameters that answers with a JSON object
//! carrying an `errcode`/`errmsg` envelope. [`UpstreamClient`] builds those requests, runs
//! them through an [`UpstreamHttpClient`] handle, and decodes the envelope; recovery
//! decisions stay with the flows.

pub use oauth2;

// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError,
	http::{Method, Request, header::ACCEPT},
};
use serde::{Deserializer, de::Error as _};
// self
use crate::{
	_prelude::*,
	auth::{CredentialKey, TokenSecret},
	error::{ConfigError, TransientError, TransportError},
	http::{ResponseMetadata, ResponseMetadataSlot, UpstreamHttpClient},
	obs,
	provider::{ErrcodeClass, ProfileObject, ProviderStrategy, UpstreamErrorContext},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Longest token lifetime accepted from the issuance endpoint (one year).
pub const MAX_EXPIRES_IN_SECS: i64 = 366 * 24 * 60 * 60;

/// Upstream endpoints called by the federation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpstreamApi {
	/// Application token issuance.
	Token,
	/// Authorization code → basic profile.
	BasicProfile,
	/// User id → detailed profile.
	DetailedProfile,
}
impl UpstreamApi {
	/// Returns a stable label suitable for logs and error messages.
	pub const fn as_str(self) -> &'static str {
		match self {
			UpstreamApi::Token => "token",
			UpstreamApi::BasicProfile => "basic_profile",
			UpstreamApi::DetailedProfile => "detailed_profile",
		}
	}
}
impl Display for UpstreamApi {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Maps HTTP transport failures into federation [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a federation error.
	fn map_transport_error(
		&self,
		api: UpstreamApi,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		api: UpstreamApi,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(api, meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => map_generic_transport_error(api, meta, message),
			_ => map_generic_transport_error(api, meta, "unknown transport failure"),
		}
	}
}

/// Token issued by the upstream service.
#[derive(Clone, Debug)]
pub struct IssuedToken {
	/// Token value.
	pub access_token: TokenSecret,
	/// Advertised lifetime.
	pub expires_in: Duration,
}

/// Decoded profile response.
#[derive(Clone, Debug, PartialEq)]
pub struct ProfileDocument {
	/// Upstream error code (`0` when absent).
	pub errcode: i64,
	/// Upstream error message (empty when absent).
	pub errmsg: String,
	/// Whole JSON object, envelope fields included.
	pub body: ProfileObject,
}

#[derive(Debug, Deserialize)]
struct TokenEnvelope {
	#[serde(default, deserialize_with = "deserialize_errcode")]
	errcode: i64,
	#[serde(default)]
	errmsg: Option<String>,
	#[serde(default)]
	access_token: Option<String>,
	#[serde(default)]
	expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ProfileEnvelope {
	#[serde(default, deserialize_with = "deserialize_errcode")]
	errcode: i64,
	#[serde(default)]
	errmsg: Option<String>,
}

/// HTTP client plus transport error mapper shared by every flow.
pub struct UpstreamClient<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> UpstreamClient<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client over the provided transport and mapper.
	pub fn new(http_client: impl Into<Arc<C>>, error_mapper: impl Into<Arc<M>>) -> Self {
		Self { http_client: http_client.into(), error_mapper: error_mapper.into() }
	}

	/// Requests an application token with `corpid` + `corpsecret`.
	///
	/// A non-zero `errcode` becomes [`Error::UpstreamRejected`]; responses without a usable
	/// token or lifetime become [`ConfigError`] values. The caller owns the retry policy.
	pub async fn issue_token(
		&self,
		strategy: &dyn ProviderStrategy,
		endpoint: &Url,
		key: &CredentialKey,
		secret: &TokenSecret,
	) -> Result<IssuedToken> {
		const API: UpstreamApi = UpstreamApi::Token;

		let mut params = BTreeMap::new();

		params.insert("corpid".into(), key.client_id().to_string());
		params.insert("corpsecret".into(), secret.expose().to_owned());
		strategy.augment_request(API, &mut params);

		let (body, status) = self.get(API, endpoint, &params).await?;
		let mut de = serde_json::Deserializer::from_slice(&body);
		let envelope: TokenEnvelope = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| TransientError::ResponseParse { api: API, source, status })?;
		let errmsg = envelope.errmsg.unwrap_or_default();
		let mut ctx = UpstreamErrorContext::new(API, envelope.errcode).with_errmsg(errmsg.clone());

		if let Some(status) = status {
			ctx = ctx.with_http_status(status);
		}
		if strategy.classify_errcode(&ctx) != ErrcodeClass::Success {
			return Err(Error::UpstreamRejected { api: API, errcode: envelope.errcode, errmsg });
		}

		let access_token = envelope
			.access_token
			.filter(|token| !token.is_empty())
			.ok_or(ConfigError::MissingAccessToken)?;
		let expires_in = envelope.expires_in.ok_or(ConfigError::MissingExpiresIn)?;

		if expires_in <= 0 {
			return Err(ConfigError::NonPositiveExpiresIn.into());
		}
		if expires_in > MAX_EXPIRES_IN_SECS {
			return Err(ConfigError::ExpiresInOutOfRange.into());
		}

		Ok(IssuedToken {
			access_token: TokenSecret::new(access_token),
			expires_in: Duration::seconds(expires_in),
		})
	}

	/// Fetches a profile document from `endpoint` with the provided query parameters.
	///
	/// The envelope is decoded but not classified; a body that is not a JSON object becomes
	/// [`Error::MalformedProfile`].
	pub async fn fetch_profile(
		&self,
		strategy: &dyn ProviderStrategy,
		api: UpstreamApi,
		endpoint: &Url,
		mut params: BTreeMap<String, String>,
	) -> Result<ProfileDocument> {
		strategy.augment_request(api, &mut params);

		let (body, _) = self.get(api, endpoint, &params).await?;

		decode_profile(api, &body)
	}

	async fn get(
		&self,
		api: UpstreamApi,
		endpoint: &Url,
		params: &BTreeMap<String, String>,
	) -> Result<(Vec<u8>, Option<u16>)> {
		let mut url = endpoint.clone();

		url.query_pairs_mut().extend_pairs(params.iter());

		let request = Request::builder()
			.method(Method::GET)
			.uri(url.as_str())
			.header(ACCEPT, "application/json")
			.body(Vec::new())
			.map_err(ConfigError::from)?;
		let slot = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(slot.clone());
		let response = handle
			.call(request)
			.await
			.map_err(|e| self.error_mapper.map_transport_error(api, slot.take().as_ref(), e))?;
		let status = response.status();

		if !status.is_success() {
			return Err(TransientError::HttpStatus { api, status: status.as_u16() }.into());
		}

		Ok((response.into_body(), Some(status.as_u16())))
	}
}
impl<C, M> Clone for UpstreamClient<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self { http_client: self.http_client.clone(), error_mapper: self.error_mapper.clone() }
	}
}
#[cfg(feature = "reqwest")]
impl Default for UpstreamClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	fn default() -> Self {
		Self::new(ReqwestHttpClient::default(), ReqwestTransportErrorMapper)
	}
}
impl<C, M> Debug for UpstreamClient<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("UpstreamClient(..)")
	}
}

fn decode_profile(api: UpstreamApi, body: &[u8]) -> Result<ProfileDocument> {
	let malformed = |reason: String| {
		obs::log_malformed_profile(api, &reason, &String::from_utf8_lossy(body));

		Error::MalformedProfile { api, reason }
	};
	let mut de = serde_json::Deserializer::from_slice(body);
	let value: serde_json::Value =
		serde_path_to_error::deserialize(&mut de).map_err(|e| malformed(e.to_string()))?;
	let envelope = ProfileEnvelope::deserialize(&value).map_err(|e| malformed(e.to_string()))?;
	let serde_json::Value::Object(body) = value else {
		return Err(malformed("response body is not a JSON object".into()));
	};

	Ok(ProfileDocument {
		errcode: envelope.errcode,
		errmsg: envelope.errmsg.unwrap_or_default(),
		body,
	})
}

fn deserialize_errcode<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum RawErrcode {
		Number(i64),
		Text(String),
	}

	match Option::<RawErrcode>::deserialize(deserializer)? {
		None => Ok(0),
		Some(RawErrcode::Number(code)) => Ok(code),
		Some(RawErrcode::Text(text)) => text
			.trim()
			.parse()
			.map_err(|_| D::Error::custom(format!("errcode `{text}` is not numeric"))),
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(
	api: UpstreamApi,
	meta: Option<&ResponseMetadata>,
	err: ReqwestError,
) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::Upstream {
			api,
			message: "request timed out".into(),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
		}
		.into();
	}

	TransportError::from(err).into()
}

#[cfg(feature = "reqwest")]
fn map_generic_transport_error(
	api: UpstreamApi,
	meta: Option<&ResponseMetadata>,
	message: impl Display,
) -> Error {
	TransientError::Upstream {
		api,
		message: format!("HTTP client error: {message}"),
		status: meta_status(meta),
	}
	.into()
}

#[cfg(feature = "reqwest")]
fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn profile_errcode_accepts_numbers_and_numeric_strings() {
		let numeric =
			decode_profile(UpstreamApi::BasicProfile, br#"{"errcode":42001,"errmsg":"expired"}"#)
				.expect("Numeric errcode should decode.");
		let text = decode_profile(UpstreamApi::BasicProfile, br#"{"errcode":"40014"}"#)
			.expect("String errcode should decode.");
		let absent = decode_profile(UpstreamApi::BasicProfile, br#"{"UserId":"Alice"}"#)
			.expect("Missing errcode should default to zero.");

		assert_eq!((numeric.errcode, numeric.errmsg.as_str()), (42001, "expired"));
		assert_eq!(text.errcode, 40014);
		assert_eq!(absent.errcode, 0);
		assert_eq!(absent.body.get("UserId").and_then(|v| v.as_str()), Some("Alice"));
	}

	#[test]
	fn undecodable_profiles_are_malformed() {
		let bodies: [&[u8]; 3] =
			[b"<html>gateway</html>", br#"["not","an","object"]"#, br#"{"errcode":"x"}"#];

		for body in bodies {
			let err = decode_profile(UpstreamApi::DetailedProfile, body)
				.expect_err("Undecodable body should be rejected.");

			assert!(
				matches!(err, Error::MalformedProfile { api: UpstreamApi::DetailedProfile, .. }),
				"Unexpected error: {err:?}."
			);
		}
	}

	#[test]
	fn api_labels_are_stable() {
		assert_eq!(UpstreamApi::Token.to_string(), "token");
		assert_eq!(UpstreamApi::BasicProfile.as_str(), "basic_profile");
		assert_eq!(UpstreamApi::DetailedProfile.as_str(), "detailed_profile");
	}
}
