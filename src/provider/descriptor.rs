//! Provider descriptor data structures shared by all flows.
//!
//! A descriptor captures everything that differs between upstream variants (endpoint URLs,
//! profile field names, authorize-URL quirks) so a single token manager and identity resolver
//! serve every variant.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Profile-field mapping tables.
pub mod fields;
/// Authorize-URL quirks.
pub mod quirks;

pub use builder::*;
pub use fields::*;
pub use quirks::*;

// self
use crate::{_prelude::*, auth::ProviderId};

/// Corporate OAuth authorize endpoint used inside the corporate client.
pub const WECOM_AUTHORIZE_URL: &str = "https://open.weixin.qq.com/connect/oauth2/authorize";
/// QR-code login endpoint used from external browsers.
pub const WECOM_QR_AUTHORIZE_URL: &str = "https://open.work.weixin.qq.com/wwopen/sso/qrConnect";
/// Application token issuance endpoint.
pub const WECOM_TOKEN_URL: &str = "https://qyapi.weixin.qq.com/cgi-bin/gettoken";
/// Basic profile endpoint (authorization code → user id).
pub const WECOM_BASIC_PROFILE_URL: &str = "https://qyapi.weixin.qq.com/cgi-bin/user/getuserinfo";
/// Detailed profile endpoint (user id → member record).
pub const WECOM_DETAILED_PROFILE_URL: &str = "https://qyapi.weixin.qq.com/cgi-bin/user/get";

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// OAuth authorize endpoint used by in-app browsers.
	pub authorization: Url,
	/// Optional QR-code login endpoint used by external browsers.
	pub qr_authorization: Option<Url>,
	/// Application token issuance endpoint.
	pub token: Url,
	/// Basic profile endpoint.
	pub basic_profile: Url,
	/// Optional detailed profile endpoint; without it the basic profile is mapped directly.
	pub detailed_profile: Option<Url>,
}

/// Immutable provider descriptor consumed by flows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier.
	pub id: ProviderId,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Profile field names used when mapping identities.
	#[serde(default)]
	pub fields: ProfileFieldMap,
	/// Authorize-URL quirks.
	#[serde(default)]
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id)
	}

	/// Corporate variant: QR login, two-phase profile resolution, lower-cased user ids.
	pub fn wecom() -> Result<Self, ProviderDescriptorError> {
		Self::builder(preset_id("wecom")?)
			.authorization_endpoint(preset_url(WECOM_AUTHORIZE_URL)?)
			.qr_authorization_endpoint(preset_url(WECOM_QR_AUTHORIZE_URL)?)
			.token_endpoint(preset_url(WECOM_TOKEN_URL)?)
			.basic_profile_endpoint(preset_url(WECOM_BASIC_PROFILE_URL)?)
			.detailed_profile_endpoint(preset_url(WECOM_DETAILED_PROFILE_URL)?)
			.fields(ProfileFieldMap::wecom())
			.build()
	}

	/// Consumer variant: in-app login only, identity mapped from the basic profile.
	pub fn wecom_basic() -> Result<Self, ProviderDescriptorError> {
		Self::builder(preset_id("wecom-basic")?)
			.authorization_endpoint(preset_url(WECOM_AUTHORIZE_URL)?)
			.token_endpoint(preset_url(WECOM_TOKEN_URL)?)
			.basic_profile_endpoint(preset_url(WECOM_BASIC_PROFILE_URL)?)
			.fields(ProfileFieldMap::wecom_basic())
			.build()
	}

	/// Returns `true` when identities need the second (detailed) profile lookup.
	pub fn resolves_detailed_profile(&self) -> bool {
		self.endpoints.detailed_profile.is_some()
	}
}

fn preset_id(value: &str) -> Result<ProviderId, ProviderDescriptorError> {
	ProviderId::new(value)
		.map_err(|e| ProviderDescriptorError::InvalidPreset { reason: e.to_string() })
}

fn preset_url(value: &str) -> Result<Url, ProviderDescriptorError> {
	Url::parse(value).map_err(|e| ProviderDescriptorError::InvalidPreset { reason: e.to_string() })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn presets_build_and_differ_in_profile_depth() {
		let corporate = ProviderDescriptor::wecom().expect("Corporate preset should build.");
		let consumer = ProviderDescriptor::wecom_basic().expect("Consumer preset should build.");

		assert!(corporate.resolves_detailed_profile());
		assert!(corporate.endpoints.qr_authorization.is_some());
		assert!(corporate.fields.lowercase_user_id);
		assert!(!consumer.resolves_detailed_profile());
		assert!(consumer.endpoints.qr_authorization.is_none());
		assert!(!consumer.fields.lowercase_user_id);
		assert_eq!(corporate.endpoints.token.as_str(), WECOM_TOKEN_URL);
	}

	#[test]
	fn descriptor_deserializes_with_default_tables() {
		let descriptor: ProviderDescriptor = serde_json::from_str(
			r#"{
				"id": "corp-sso",
				"endpoints": {
					"authorization": "https://sso.example.com/authorize",
					"qr_authorization": null,
					"token": "https://api.example.com/gettoken",
					"basic_profile": "https://api.example.com/user/getuserinfo",
					"detailed_profile": "https://api.example.com/user/get"
				}
			}"#,
		)
		.expect("Descriptor JSON should deserialize.");

		assert_eq!(descriptor.fields, ProfileFieldMap::default());
		assert_eq!(descriptor.quirks, ProviderQuirks::default());
		assert!(descriptor.validate().is_ok());
	}
}
