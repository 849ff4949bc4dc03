// self
use crate::_prelude::*;

/// JSON object type used for raw profile documents.
pub type ProfileObject = serde_json::Map<String, serde_json::Value>;

/// Field names used to read identities out of upstream profile documents.
///
/// Lookup lists are tried in order; the first field holding a non-empty value wins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileFieldMap {
	/// User id fields in the basic profile.
	pub basic_user_id: Vec<String>,
	/// User id fields in the profile that is mapped into the identity.
	pub user_id: Vec<String>,
	/// Lower-case the user id before using it as external id and username.
	pub lowercase_user_id: bool,
	/// Email fields, most preferred first.
	pub email: Vec<String>,
	/// Display name field.
	pub name: Option<String>,
	/// Fields copied verbatim into [`Identity::attributes`](crate::auth::Identity::attributes).
	pub attributes: Vec<String>,
}
impl ProfileFieldMap {
	/// Corporate member record layout.
	pub fn wecom() -> Self {
		Self {
			basic_user_id: strings(&["UserId", "userid"]),
			user_id: strings(&["userid"]),
			lowercase_user_id: true,
			email: strings(&["biz_mail", "email"]),
			name: Some("name".into()),
			attributes: strings(&["mobile", "gender", "status", "enable", "userid"]),
		}
	}

	/// Consumer layout where the basic profile is the only document.
	pub fn wecom_basic() -> Self {
		Self {
			basic_user_id: strings(&["UserId"]),
			user_id: strings(&["UserId"]),
			lowercase_user_id: false,
			email: Vec::new(),
			name: Some("DeviceId".into()),
			attributes: Vec::new(),
		}
	}

	/// Reads the user id from a basic profile.
	pub fn basic_user_id_in(&self, profile: &ProfileObject) -> Option<String> {
		first_text(profile, &self.basic_user_id)
	}

	/// Reads the user id from the mapped profile, applying lower-casing when configured.
	pub fn user_id_in(&self, profile: &ProfileObject) -> Option<String> {
		first_text(profile, &self.user_id)
			.map(|id| if self.lowercase_user_id { id.to_lowercase() } else { id })
	}

	/// Reads the preferred email address.
	pub fn email_in(&self, profile: &ProfileObject) -> Option<String> {
		first_text(profile, &self.email)
	}

	/// Reads the display name.
	pub fn name_in(&self, profile: &ProfileObject) -> Option<String> {
		self.name.as_deref().and_then(|field| profile_text(profile, field))
	}

	/// Collects the pass-through attributes present in the profile.
	pub fn attributes_in(&self, profile: &ProfileObject) -> BTreeMap<String, String> {
		self.attributes
			.iter()
			.filter_map(|field| profile_text(profile, field).map(|value| (field.clone(), value)))
			.collect()
	}
}
impl Default for ProfileFieldMap {
	fn default() -> Self {
		Self::wecom()
	}
}

/// Renders a scalar profile field as text.
///
/// Strings are returned as-is, numbers and booleans are rendered; empty strings, `null`,
/// arrays and objects count as absent.
pub fn profile_text(profile: &ProfileObject, field: &str) -> Option<String> {
	match profile.get(field)? {
		serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
		serde_json::Value::Number(n) => Some(n.to_string()),
		serde_json::Value::Bool(b) => Some(b.to_string()),
		_ => None,
	}
}

fn first_text(profile: &ProfileObject, fields: &[String]) -> Option<String> {
	fields.iter().find_map(|field| profile_text(profile, field))
}

fn strings(values: &[&str]) -> Vec<String> {
	values.iter().map(|v| (*v).to_owned()).collect()
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn object(value: serde_json::Value) -> ProfileObject {
		match value {
			serde_json::Value::Object(map) => map,
			_ => panic!("Fixture must be a JSON object."),
		}
	}

	#[test]
	fn profile_text_renders_scalars_and_skips_empties() {
		let profile =
			object(json!({ "s": "x", "n": 1, "b": true, "e": "", "z": null, "a": [1], "o": {} }));

		assert_eq!(profile_text(&profile, "s").as_deref(), Some("x"));
		assert_eq!(profile_text(&profile, "n").as_deref(), Some("1"));
		assert_eq!(profile_text(&profile, "b").as_deref(), Some("true"));

		for absent in ["e", "z", "a", "o", "missing"] {
			assert!(profile_text(&profile, absent).is_none(), "{absent} should count as absent.");
		}
	}

	#[test]
	fn email_falls_back_when_preferred_field_is_empty() {
		let fields = ProfileFieldMap::wecom();

		assert_eq!(
			fields.email_in(&object(json!({ "biz_mail": "", "email": "a@x.com" }))).as_deref(),
			Some("a@x.com")
		);
		assert_eq!(
			fields
				.email_in(&object(json!({ "biz_mail": "b@corp.com", "email": "a@x.com" })))
				.as_deref(),
			Some("b@corp.com")
		);
		assert!(fields.email_in(&object(json!({}))).is_none());
	}

	#[test]
	fn basic_user_id_accepts_either_casing() {
		let fields = ProfileFieldMap::wecom();

		assert_eq!(
			fields.basic_user_id_in(&object(json!({ "UserId": "Alice" }))).as_deref(),
			Some("Alice")
		);
		assert_eq!(
			fields.basic_user_id_in(&object(json!({ "userid": "bob" }))).as_deref(),
			Some("bob")
		);
		assert_eq!(
			fields.user_id_in(&object(json!({ "userid": "Alice" }))).as_deref(),
			Some("alice")
		);
	}
}
