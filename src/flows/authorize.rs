//! Login start: opaque state generation plus the provider's authorization URL.
//!
//! Inside the provider's own client (detected by user agent) the OAuth authorize endpoint is
//! used; other browsers get the QR-code login page when the descriptor declares one.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	auth::CredentialKey,
	flows::CallbackFailure,
	provider::ProviderDescriptor,
};

const STATE_LEN: usize = 32;

/// Authorization endpoint flavor chosen for a login.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginMode {
	/// OAuth authorize endpoint opened inside the provider's client.
	InApp,
	/// QR-code login page for external browsers.
	QrCode,
}

/// Login handshake metadata returned by
/// [`Broker::start_login`](crate::flows::Broker::start_login).
#[derive(Clone, Debug)]
pub struct LoginRequest {
	/// Opaque state value that must round-trip via the redirect handler.
	pub state: String,
	/// Redirect URI embedded in the authorization URL.
	pub redirect_uri: Url,
	/// Fully-formed authorization URL to send the end-user to.
	pub authorize_url: Url,
	/// Endpoint flavor used for `authorize_url`.
	pub mode: LoginMode,
}
impl LoginRequest {
	/// Validates the `state` returned by the authorization redirect.
	pub fn validate_state(&self, returned_state: &str) -> Result<(), CallbackFailure> {
		if returned_state == self.state { Ok(()) } else { Err(CallbackFailure::InvalidState) }
	}
}

pub(super) fn build_login_request(
	descriptor: &ProviderDescriptor,
	key: &CredentialKey,
	redirect_uri: Url,
	user_agent: Option<&str>,
) -> LoginRequest {
	let state = random_string(STATE_LEN);
	let (authorize_url, mode) = match descriptor.endpoints.qr_authorization.as_ref() {
		Some(qr) if !descriptor.quirks.is_in_app_browser(user_agent) =>
			(build_qr_url(qr, key, &redirect_uri, &state), LoginMode::QrCode),
		_ => (build_authorize_url(descriptor, key, &redirect_uri, &state), LoginMode::InApp),
	};

	LoginRequest { state, redirect_uri, authorize_url, mode }
}

fn build_authorize_url(
	descriptor: &ProviderDescriptor,
	key: &CredentialKey,
	redirect_uri: &Url,
	state: &str,
) -> Url {
	let mut url = descriptor.endpoints.authorization.clone();

	url.query_pairs_mut()
		.append_pair("appid", key.client_id())
		.append_pair("redirect_uri", redirect_uri.as_str())
		.append_pair("response_type", "code")
		.append_pair("scope", &descriptor.quirks.scope)
		.append_pair("state", state);
	url.set_fragment(descriptor.quirks.redirect_fragment.as_deref());

	url
}

fn build_qr_url(qr: &Url, key: &CredentialKey, redirect_uri: &Url, state: &str) -> Url {
	let mut url = qr.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("appid", key.client_id());

	if let Some(agent) = key.sub_app_id() {
		pairs.append_pair("agentid", agent);
	}

	pairs.append_pair("redirect_uri", redirect_uri.as_str());
	pairs.append_pair("state", state);

	drop(pairs);

	url
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}
