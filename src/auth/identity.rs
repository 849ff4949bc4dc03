//! Normalized identity handed to the host authentication system.

// self
use crate::_prelude::*;

/// Identity resolved from an upstream profile.
///
/// Ownership transfers to the host as soon as resolution returns; the federation layer keeps
/// no copy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Identity {
	/// Stable identifier of the user at the upstream service.
	pub external_id: String,
	/// Username proposed to the host.
	pub username: String,
	/// Human-readable display name.
	pub display_name: String,
	/// Preferred email address, if the profile carried one.
	pub email: Option<String>,
	/// First name derived from the email local part.
	pub first_name: Option<String>,
	/// Last name taken from the profile's name field.
	pub last_name: Option<String>,
	/// Opaque pass-through attributes for the host's mapper layer.
	pub attributes: BTreeMap<String, String>,
	/// Raw profile document the identity was mapped from.
	pub raw_profile: serde_json::Map<String, serde_json::Value>,
}
impl Identity {
	/// Looks up a pass-through attribute.
	pub fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes.get(name).map(String::as_str)
	}
}
