// self
use crate::_prelude::*;

/// Provider-specific quirks that influence how authorization URLs are built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// Scope requested on the in-app authorize URL.
	pub scope: String,
	/// Fragment appended to the in-app authorize URL, if the provider requires one.
	pub redirect_fragment: Option<String>,
	/// User-agent substring identifying the provider's in-app browser.
	///
	/// When `None` every login uses the in-app authorize URL.
	pub in_app_user_agent_marker: Option<String>,
}
impl ProviderQuirks {
	/// Returns `true` when `user_agent` belongs to the provider's in-app browser.
	///
	/// The marker is matched case-insensitively on both sides.
	pub fn is_in_app_browser(&self, user_agent: Option<&str>) -> bool {
		match (self.in_app_user_agent_marker.as_deref(), user_agent) {
			(None, _) => true,
			(Some(marker), Some(agent)) =>
				agent.to_ascii_lowercase().contains(&marker.to_ascii_lowercase()),
			(Some(_), None) => false,
		}
	}
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self {
			scope: "snsapi_base".into(),
			redirect_fragment: Some("wechat_redirect".into()),
			in_app_user_agent_marker: Some("wxwork".into()),
		}
	}
}
