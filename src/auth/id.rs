//! Strongly typed identifiers and the credential key used to partition cached tokens.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (client, sub-app, provider).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (client, sub-app, provider).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed byte count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (client, sub-app, provider).
		kind: &'static str,
		/// Maximum permitted length.
		max: usize,
	},
}

def_id! { ClientId, "Corporate client identifier (`corpid`) registered with the upstream service.", "Client" }
def_id! { SubAppId, "Sub-application (agent) identifier with its own token namespace.", "SubApp" }
def_id! { ProviderId, "Identifier for an upstream provider descriptor.", "Provider" }

/// Identifies one upstream credential pair and therefore one token namespace.
///
/// A corporate account can host several sub-applications, each holding its own secret and
/// its own access token, so the optional [`SubAppId`] is part of the key.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CredentialKey {
	client_id: ClientId,
	sub_app_id: Option<SubAppId>,
}
impl CredentialKey {
	/// Creates a key for the provided client and optional sub-application.
	pub fn new(client_id: ClientId, sub_app_id: Option<SubAppId>) -> Self {
		Self { client_id, sub_app_id }
	}

	/// Parses raw identifiers into a key.
	pub fn parse(
		client_id: impl AsRef<str>,
		sub_app_id: Option<&str>,
	) -> Result<Self, IdentifierError> {
		let client_id = ClientId::new(client_id)?;
		let sub_app_id = sub_app_id.map(SubAppId::new).transpose()?;

		Ok(Self { client_id, sub_app_id })
	}

	/// Client identifier sent as `corpid`.
	pub fn client_id(&self) -> &ClientId {
		&self.client_id
	}

	/// Sub-application identifier, when the key is scoped to one.
	pub fn sub_app_id(&self) -> Option<&SubAppId> {
		self.sub_app_id.as_ref()
	}
}
impl Debug for CredentialKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "CredentialKey({self})")
	}
}
impl Display for CredentialKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match &self.sub_app_id {
			Some(sub_app) => write!(f, "{}:{sub_app}", self.client_id),
			None => f.write_str(&self.client_id),
		}
	}
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_reject_whitespace_and_empty_values() {
		assert!(ClientId::new(" corp").is_err(), "Leading whitespace must be rejected.");
		assert!(ClientId::new("corp ").is_err(), "Trailing whitespace must be rejected.");
		assert!(SubAppId::new("").is_err());
		assert!(ProviderId::new("with space").is_err());

		let client = ClientId::new("ww1234").expect("Client fixture should be considered valid.");

		assert_eq!(client.as_ref(), "ww1234");
	}

	#[test]
	fn length_limit_is_enforced() {
		let exact = "a".repeat(IDENTIFIER_MAX_LEN);

		ClientId::new(&exact).expect("Exact length should succeed.");

		let too_long = "a".repeat(IDENTIFIER_MAX_LEN + 1);

		assert_eq!(
			ClientId::new(&too_long),
			Err(IdentifierError::TooLong { kind: "Client", max: IDENTIFIER_MAX_LEN })
		);
	}

	#[test]
	fn credential_keys_distinguish_sub_apps() {
		let plain = CredentialKey::parse("ww1234", None).expect("Plain key should parse.");
		let agent_a =
			CredentialKey::parse("ww1234", Some("1000002")).expect("Agent key should parse.");
		let agent_b =
			CredentialKey::parse("ww1234", Some("1000003")).expect("Agent key should parse.");
		let map =
			HashMap::from([(plain.clone(), 1_u8), (agent_a.clone(), 2), (agent_b.clone(), 3)]);

		assert_eq!(map.len(), 3);
		assert_eq!(plain.to_string(), "ww1234");
		assert_eq!(agent_a.to_string(), "ww1234:1000002");
		assert_eq!(format!("{agent_b:?}"), "CredentialKey(ww1234:1000003)");
		assert!(CredentialKey::parse("ww1234", Some("bad agent")).is_err());
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let key: CredentialKey =
			serde_json::from_str(r#"{"client_id":"ww1234","sub_app_id":"1000002"}"#)
				.expect("Credential key should deserialize successfully.");

		assert_eq!(key.sub_app_id().map(|id| id.as_ref()), Some("1000002"));
		assert!(
			serde_json::from_str::<CredentialKey>(r#"{"client_id":"ww 1234","sub_app_id":null}"#)
				.is_err()
		);
	}
}
