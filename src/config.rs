//! Host-facing configuration for one federated provider instance.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, CredentialKey, SubAppId, TokenSecret},
	error::ConfigError,
	provider::ProviderDescriptor,
};

/// Configuration for one provider instance, loadable from any serde format.
///
/// Identifiers are validated while deserializing; call [`validate`](Self::validate) to check
/// the descriptor as well.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FederationConfig {
	/// Provider descriptor (endpoints, field map, quirks).
	pub provider: ProviderDescriptor,
	/// Corporate client identifier (`corpid`).
	pub client_id: ClientId,
	/// Secret paired with the client (and sub-application, when set).
	pub client_secret: TokenSecret,
	/// Sub-application (agent) identifier.
	#[serde(default)]
	pub sub_app_id: Option<SubAppId>,
}
impl FederationConfig {
	/// Validates the embedded descriptor.
	pub fn validate(&self) -> Result<(), ConfigError> {
		self.provider.validate()?;

		if self.client_secret.expose().is_empty() {
			return Err(ConfigError::EmptyClientSecret { key: self.credential_key() });
		}

		Ok(())
	}

	/// Credential key the configured secret belongs to.
	pub fn credential_key(&self) -> CredentialKey {
		CredentialKey::new(self.client_id.clone(), self.sub_app_id.clone())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const CONFIG: &str = r#"{
		"provider": {
			"id": "wecom",
			"endpoints": {
				"authorization": "https://open.weixin.qq.com/connect/oauth2/authorize",
				"qr_authorization": "https://open.work.weixin.qq.com/wwopen/sso/qrConnect",
				"token": "https://qyapi.weixin.qq.com/cgi-bin/gettoken",
				"basic_profile": "https://qyapi.weixin.qq.com/cgi-bin/user/getuserinfo",
				"detailed_profile": "https://qyapi.weixin.qq.com/cgi-bin/user/get"
			}
		},
		"client_id": "ww-corp",
		"client_secret": "s3cr3t",
		"sub_app_id": "1000002"
	}"#;

	#[test]
	fn config_loads_and_redacts_secret() {
		let config: FederationConfig =
			serde_json::from_str(CONFIG).expect("Configuration fixture should deserialize.");

		config.validate().expect("Configuration fixture should validate.");

		assert_eq!(config.credential_key().to_string(), "ww-corp:1000002");
		assert!(!format!("{config:?}").contains("s3cr3t"));
	}

	#[test]
	fn invalid_identifiers_fail_to_load() {
		let broken = CONFIG.replace("\"ww-corp\"", "\"ww corp\"");

		assert!(serde_json::from_str::<FederationConfig>(&broken).is_err());
	}

	#[test]
	fn insecure_endpoints_fail_validation() {
		let insecure = CONFIG.replace(
			"https://qyapi.weixin.qq.com/cgi-bin/gettoken",
			"http://qyapi.weixin.qq.com/cgi-bin/gettoken",
		);
		let config: FederationConfig =
			serde_json::from_str(&insecure).expect("Configuration fixture should deserialize.");

		assert!(matches!(config.validate(), Err(ConfigError::InvalidDescriptor(_))));
	}

	#[test]
	fn empty_secret_fails_validation() {
		let config: FederationConfig = serde_json::from_str(&CONFIG.replace("s3cr3t", ""))
			.expect("Configuration fixture should deserialize.");

		assert!(matches!(config.validate(), Err(ConfigError::EmptyClientSecret { .. })));
	}
}
