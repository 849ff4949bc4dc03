// self
use crate::{
	_prelude::*,
	auth::{CredentialKey, TokenSecret},
	flows::CallbackFailure,
	obs::FlowKind,
	upstream::UpstreamApi,
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by federation flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("wecom_federation.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a failed issuance attempt that is about to be retried.
pub fn log_issuance_retry(key: &CredentialKey, error: &Error) {
	#[cfg(feature = "tracing")]
	tracing::warn!(credential = %key, error = %error, "token issuance failed, retrying once");
	#[cfg(not(feature = "tracing"))]
	let _ = (key, error);
}

/// Logs an access token rejected by the upstream service; only the fingerprint is recorded.
pub fn log_token_rejected(
	key: &CredentialKey,
	api: UpstreamApi,
	errcode: i64,
	token: &TokenSecret,
) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		credential = %key,
		api = api.as_str(),
		errcode,
		token_fingerprint = %token.fingerprint(),
		"access token rejected, renewing"
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (key, api, errcode, token);
}

/// Logs a profile payload that could not be mapped.
pub fn log_malformed_profile(api: UpstreamApi, reason: &str, payload: &str) {
	#[cfg(feature = "tracing")]
	tracing::error!(api = api.as_str(), reason, payload, "malformed upstream profile");
	#[cfg(not(feature = "tracing"))]
	let _ = (api, reason, payload);
}

/// Logs a redirect callback that did not complete a login.
pub fn log_callback_failure(failure: &CallbackFailure) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		failure = %failure,
		message_key = failure.message_key(),
		"login callback failed"
	);
	#[cfg(not(feature = "tracing"))]
	let _ = failure;
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn event_helpers_accept_all_inputs() {
		let key = CredentialKey::parse("ww-corp", Some("1000002"))
			.expect("Credential key fixture should be valid.");

		log_issuance_retry(&key, &Error::from(crate::error::ConfigError::MissingExpiresIn));
		log_token_rejected(&key, UpstreamApi::BasicProfile, 42001, &TokenSecret::new("t"));
		log_malformed_profile(UpstreamApi::DetailedProfile, "missing userid", "{}");
		log_callback_failure(&CallbackFailure::MissingState);
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = FlowSpan::new(FlowKind::GetToken, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
