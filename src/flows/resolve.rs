//! Authorization code → [`Identity`] resolution.
//!
//! Resolution is two-phase. The basic profile exchanges the code for a user id; when the
//! upstream rejects the access token there, the token is renewed once and the call retried
//! with the new token. The detailed profile is then fetched by user id (no renewal loop) and
//! mapped through the descriptor's [`ProfileFieldMap`]. Descriptors without a detailed
//! profile endpoint map the basic profile directly.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, CredentialKey, Identity},
	flows::{TokenManager, common},
	http::UpstreamHttpClient,
	obs::{self, FlowKind},
	provider::{
		ErrcodeClass, ProfileFieldMap, ProfileObject, ProviderDescriptor, ProviderStrategy,
		UpstreamErrorContext,
	},
	upstream::{ProfileDocument, TransportErrorMapper, UpstreamApi, UpstreamClient},
};

/// Resolves authorization codes into normalized identities.
pub struct IdentityResolver<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	tokens: Arc<TokenManager<C, M>>,
	upstream: UpstreamClient<C, M>,
	descriptor: ProviderDescriptor,
	strategy: Arc<dyn ProviderStrategy>,
}
impl<C, M> IdentityResolver<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a resolver that shares `tokens`' transport.
	pub fn new(
		tokens: Arc<TokenManager<C, M>>,
		descriptor: ProviderDescriptor,
		strategy: Arc<dyn ProviderStrategy>,
	) -> Self {
		let upstream = tokens.upstream().clone();

		Self { tokens, upstream, descriptor, strategy }
	}

	/// Token manager used for the access token.
	pub fn token_manager(&self) -> &Arc<TokenManager<C, M>> {
		&self.tokens
	}

	/// Descriptor the resolver reads endpoints and field names from.
	pub fn descriptor(&self) -> &ProviderDescriptor {
		&self.descriptor
	}

	/// Exchanges `code` for an [`Identity`] using the token registered for `key`.
	///
	/// A token that cannot be obtained yields [`Error::NoCredential`]. A non-zero `errcode`
	/// that is not recoverable (or persists after one renewal) yields
	/// [`Error::UpstreamRejected`].
	pub async fn resolve(&self, code: &str, key: &CredentialKey) -> Result<Identity> {
		obs::observe(FlowKind::ResolveIdentity, "resolve", async move {
			let token = self.tokens.get_token(key).await.map_err(Error::no_credential)?;
			let (basic, token) = self.fetch_basic_profile(code, key, token).await?;
			let fields = &self.descriptor.fields;
			let Some(endpoint) = self.descriptor.endpoints.detailed_profile.as_ref() else {
				return map_identity(fields, UpstreamApi::BasicProfile, basic.body);
			};
			let Some(user_id) = fields.basic_user_id_in(&basic.body) else {
				return Err(malformed(
					UpstreamApi::BasicProfile,
					"basic profile does not carry a user id",
					&basic.body,
				));
			};
			let detailed = self
				.upstream
				.fetch_profile(
					self.strategy.as_ref(),
					UpstreamApi::DetailedProfile,
					endpoint,
					common::query_params([
						("access_token", token.expose()),
						("userid", user_id.as_str()),
					]),
				)
				.await?;

			match self.classify(UpstreamApi::DetailedProfile, &detailed) {
				ErrcodeClass::Success =>
					map_identity(fields, UpstreamApi::DetailedProfile, detailed.body),
				_ => Err(rejected(UpstreamApi::DetailedProfile, detailed)),
			}
		})
		.await
	}

	async fn fetch_basic_profile(
		&self,
		code: &str,
		key: &CredentialKey,
		token: AccessToken,
	) -> Result<(ProfileDocument, AccessToken)> {
		const API: UpstreamApi = UpstreamApi::BasicProfile;

		let first = self.basic_profile(code, &token).await?;

		match self.classify(API, &first) {
			ErrcodeClass::Success => Ok((first, token)),
			ErrcodeClass::TokenRejected => {
				obs::log_token_rejected(key, API, first.errcode, &token.value);

				let renewed = self.tokens.force_renew(key).await.map_err(Error::no_credential)?;
				let retried = self.basic_profile(code, &renewed).await?;

				match self.classify(API, &retried) {
					ErrcodeClass::Success => Ok((retried, renewed)),
					_ => Err(rejected(API, retried)),
				}
			},
			ErrcodeClass::Terminal => Err(rejected(API, first)),
		}
	}

	async fn basic_profile(&self, code: &str, token: &AccessToken) -> Result<ProfileDocument> {
		self.upstream
			.fetch_profile(
				self.strategy.as_ref(),
				UpstreamApi::BasicProfile,
				&self.descriptor.endpoints.basic_profile,
				common::query_params([("access_token", token.expose()), ("code", code)]),
			)
			.await
	}

	fn classify(&self, api: UpstreamApi, document: &ProfileDocument) -> ErrcodeClass {
		let ctx = UpstreamErrorContext::new(api, document.errcode).with_errmsg(&document.errmsg);

		self.strategy.classify_errcode(&ctx)
	}
}
impl<C, M> Debug for IdentityResolver<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IdentityResolver")
			.field("descriptor", &self.descriptor.id)
			.field("tokens", &self.tokens)
			.finish()
	}
}

/// Maps a profile document into an [`Identity`].
///
/// The user id becomes both external id and username. The first name is the lower-cased
/// local part of the email address, the last name is the profile's name, and the display
/// name falls back from name to first name to username.
pub fn map_identity(
	fields: &ProfileFieldMap,
	api: UpstreamApi,
	profile: ProfileObject,
) -> Result<Identity> {
	let Some(user_id) = fields.user_id_in(&profile) else {
		return Err(malformed(api, "profile does not carry a user id", &profile));
	};
	let email = fields.email_in(&profile);
	let first_name = email
		.as_deref()
		.and_then(|email| email.split('@').next())
		.filter(|local| !local.is_empty())
		.map(str::to_lowercase);
	let last_name = fields.name_in(&profile);
	let display_name =
		last_name.clone().or_else(|| first_name.clone()).unwrap_or_else(|| user_id.clone());
	let attributes = fields.attributes_in(&profile);

	Ok(Identity {
		external_id: user_id.clone(),
		username: user_id,
		display_name,
		email,
		first_name,
		last_name,
		attributes,
		raw_profile: profile,
	})
}

fn rejected(api: UpstreamApi, document: ProfileDocument) -> Error {
	Error::UpstreamRejected { api, errcode: document.errcode, errmsg: document.errmsg }
}

fn malformed(api: UpstreamApi, reason: &str, profile: &ProfileObject) -> Error {
	let payload = serde_json::to_string(profile).unwrap_or_default();

	obs::log_malformed_profile(api, reason, &payload);

	Error::MalformedProfile { api, reason: reason.into() }
}
