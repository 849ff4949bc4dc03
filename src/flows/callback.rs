//! Redirect-endpoint dispatch between the provider and the host's authentication system.

// self
use crate::{_prelude::*, auth::Identity, obs};

/// OAuth error reported when the user declined the login.
pub const ERROR_ACCESS_DENIED: &str = "access_denied";
/// OAuth error reported when the provider needs a fresh login.
pub const ERROR_LOGIN_REQUIRED: &str = "login_required";
/// OAuth error reported when the provider needs user interaction.
pub const ERROR_INTERACTION_REQUIRED: &str = "interaction_required";

/// Query parameters delivered to the redirect endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackParams {
	/// Opaque state issued by [`Broker::start_login`](crate::flows::Broker::start_login).
	#[serde(default)]
	pub state: Option<String>,
	/// Authorization code.
	#[serde(default)]
	pub code: Option<String>,
	/// OAuth error code.
	#[serde(default)]
	pub error: Option<String>,
}

/// Capability the host authentication system hands to the redirect handler.
pub trait AuthenticationCallback {
	/// Host-side pending login.
	type Session;
	/// Value the host returns to its HTTP layer.
	type Response;

	/// Looks up the pending login that issued `state`.
	fn verify_session(&self, state: &str) -> Option<Self::Session>;

	/// Completes the login with a resolved identity.
	fn authenticated(&self, session: Self::Session, identity: Identity) -> Self::Response;

	/// Reports that the user cancelled the login.
	fn cancelled(&self, session: Self::Session) -> Self::Response;

	/// Reports a failed login; `session` is `None` when no pending login could be found.
	fn failed(&self, session: Option<Self::Session>, failure: CallbackFailure) -> Self::Response;
}

/// Reasons a callback could not complete a login.
#[derive(Debug, ThisError)]
pub enum CallbackFailure {
	/// The redirect carried no `state`.
	#[error("Callback is missing the state parameter.")]
	MissingState,
	/// `state` does not belong to a pending login.
	#[error("Callback state does not match a pending login.")]
	InvalidState,
	/// The provider asked for a fresh login.
	#[error("Provider requires the user to log in again.")]
	LoginRequired,
	/// The provider asked for user interaction.
	#[error("Provider requires user interaction.")]
	InteractionRequired,
	/// Any other OAuth error returned by the provider.
	#[error("Provider returned error `{0}`.")]
	ProviderError(String),
	/// The redirect carried neither a code nor an error.
	#[error("Callback carries neither an authorization code nor an error.")]
	MissingCode,
	/// Identity resolution failed.
	#[error(transparent)]
	Federation(#[from] Error),
}
impl CallbackFailure {
	/// Message key used by hosts that surface one generic login error page.
	pub fn message_key(&self) -> &'static str {
		match self {
			Self::MissingState => "identityProviderMissingStateMessage",
			Self::LoginRequired => ERROR_LOGIN_REQUIRED,
			Self::InteractionRequired => ERROR_INTERACTION_REQUIRED,
			_ => "identityProviderUnexpectedErrorMessage",
		}
	}
}

pub(super) async fn dispatch<H, F, Fut>(
	host: &H,
	params: CallbackParams,
	resolve: F,
) -> H::Response
where
	H: ?Sized + AuthenticationCallback,
	F: FnOnce(String) -> Fut,
	Fut: Future<Output = Result<Identity>>,
{
	let Some(state) = params.state else {
		return fail(host, None, CallbackFailure::MissingState);
	};
	let Some(session) = host.verify_session(&state) else {
		return fail(host, None, CallbackFailure::InvalidState);
	};

	if let Some(error) = params.error {
		let failure = match error.as_str() {
			ERROR_ACCESS_DENIED => return host.cancelled(session),
			ERROR_LOGIN_REQUIRED => CallbackFailure::LoginRequired,
			ERROR_INTERACTION_REQUIRED => CallbackFailure::InteractionRequired,
			_ => CallbackFailure::ProviderError(error),
		};

		return fail(host, Some(session), failure);
	}

	let Some(code) = params.code else {
		return fail(host, Some(session), CallbackFailure::MissingCode);
	};

	match resolve(code).await {
		Ok(identity) => host.authenticated(session, identity),
		Err(e) => fail(host, Some(session), CallbackFailure::Federation(e)),
	}
}

fn fail<H>(host: &H, session: Option<H::Session>, failure: CallbackFailure) -> H::Response
where
	H: ?Sized + AuthenticationCallback,
{
	obs::log_callback_failure(&failure);

	host.failed(session, failure)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::upstream::UpstreamApi;

	#[derive(Debug, PartialEq)]
	enum Outcome {
		Authenticated(String, String),
		Cancelled(String),
		Failed(Option<String>, &'static str),
	}

	struct Host;
	impl AuthenticationCallback for Host {
		type Response = Outcome;
		type Session = String;

		fn verify_session(&self, state: &str) -> Option<Self::Session> {
			(state == "known").then(|| "session-1".to_owned())
		}

		fn authenticated(&self, session: Self::Session, identity: Identity) -> Self::Response {
			Outcome::Authenticated(session, identity.username)
		}

		fn cancelled(&self, session: Self::Session) -> Self::Response {
			Outcome::Cancelled(session)
		}

		fn failed(
			&self,
			session: Option<Self::Session>,
			failure: CallbackFailure,
		) -> Self::Response {
			Outcome::Failed(session, failure.message_key())
		}
	}

	fn identity(username: &str) -> Identity {
		Identity {
			external_id: username.into(),
			username: username.into(),
			display_name: username.into(),
			email: None,
			first_name: None,
			last_name: None,
			attributes: BTreeMap::new(),
			raw_profile: Default::default(),
		}
	}

	fn params(state: Option<&str>, code: Option<&str>, error: Option<&str>) -> CallbackParams {
		CallbackParams {
			state: state.map(Into::into),
			code: code.map(Into::into),
			error: error.map(Into::into),
		}
	}

	async fn run(params: CallbackParams) -> Outcome {
		dispatch(&Host, params, |code| async move {
			if code == "good" {
				Ok(identity("alice"))
			} else {
				Err(Error::UpstreamRejected {
					api: UpstreamApi::BasicProfile,
					errcode: 40029,
					errmsg: "invalid code".into(),
				})
			}
		})
		.await
	}

	#[tokio::test]
	async fn dispatch_covers_every_branch() {
		let session = Some("session-1".to_owned());

		assert_eq!(
			run(params(None, Some("good"), None)).await,
			Outcome::Failed(None, "identityProviderMissingStateMessage")
		);
		assert_eq!(
			run(params(Some("stale"), Some("good"), None)).await,
			Outcome::Failed(None, "identityProviderUnexpectedErrorMessage")
		);
		assert_eq!(
			run(params(Some("known"), None, Some("access_denied"))).await,
			Outcome::Cancelled("session-1".into())
		);
		assert_eq!(
			run(params(Some("known"), None, Some("login_required"))).await,
			Outcome::Failed(session.clone(), "login_required")
		);
		assert_eq!(
			run(params(Some("known"), None, Some("interaction_required"))).await,
			Outcome::Failed(session.clone(), "interaction_required")
		);
		assert_eq!(
			run(params(Some("known"), Some("good"), Some("server_error"))).await,
			Outcome::Failed(session.clone(), "identityProviderUnexpectedErrorMessage")
		);
		assert_eq!(
			run(params(Some("known"), Some("good"), None)).await,
			Outcome::Authenticated("session-1".into(), "alice".into())
		);
		assert_eq!(
			run(params(Some("known"), Some("bad"), None)).await,
			Outcome::Failed(session.clone(), "identityProviderUnexpectedErrorMessage")
		);
		assert_eq!(
			run(params(Some("known"), None, None)).await,
			Outcome::Failed(session, "identityProviderUnexpectedErrorMessage")
		);
	}

	#[test]
	fn callback_params_deserialize_from_query_maps() {
		let parsed: CallbackParams = serde_json::from_str(r#"{"state":"s","code":"c"}"#)
			.expect("Callback params should deserialize.");

		assert_eq!(parsed, params(Some("s"), Some("c"), None));
	}
}
