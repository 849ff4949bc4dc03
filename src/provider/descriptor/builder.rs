// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	provider::{ProfileFieldMap, ProviderDescriptor, ProviderEndpoints, ProviderQuirks},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ProviderDescriptorError {
	/// Authorize endpoint is required to start logins.
	#[error("Missing authorization endpoint.")]
	MissingAuthorizationEndpoint,
	/// Token endpoint is mandatory for all flows.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Basic profile endpoint is mandatory for identity resolution.
	#[error("Missing basic profile endpoint.")]
	MissingBasicProfileEndpoint,
	/// Endpoints must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: String,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// A user-id lookup list is empty.
	#[error("The {table} user id field list cannot be empty.")]
	MissingUserIdField {
		/// Which lookup list is empty (`basic` or `detailed`).
		table: String,
	},
	/// A built-in preset failed to assemble.
	#[error("Built-in descriptor preset is invalid: {reason}.")]
	InvalidPreset {
		/// Underlying failure.
		reason: String,
	},
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: ProviderId,
	/// OAuth authorize endpoint.
	pub authorization_endpoint: Option<Url>,
	/// Optional QR-code login endpoint.
	pub qr_authorization_endpoint: Option<Url>,
	/// Token issuance endpoint.
	pub token_endpoint: Option<Url>,
	/// Basic profile endpoint.
	pub basic_profile_endpoint: Option<Url>,
	/// Optional detailed profile endpoint.
	pub detailed_profile_endpoint: Option<Url>,
	/// Profile field names.
	pub fields: ProfileFieldMap,
	/// Authorize-URL quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: ProviderId) -> Self {
		Self {
			id,
			authorization_endpoint: None,
			qr_authorization_endpoint: None,
			token_endpoint: None,
			basic_profile_endpoint: None,
			detailed_profile_endpoint: None,
			fields: ProfileFieldMap::default(),
			quirks: ProviderQuirks::default(),
		}
	}

	/// Sets the authorize endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Sets the QR-code login endpoint.
	pub fn qr_authorization_endpoint(mut self, url: Url) -> Self {
		self.qr_authorization_endpoint = Some(url);

		self
	}

	/// Sets the token issuance endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the basic profile endpoint.
	pub fn basic_profile_endpoint(mut self, url: Url) -> Self {
		self.basic_profile_endpoint = Some(url);

		self
	}

	/// Sets the detailed profile endpoint.
	pub fn detailed_profile_endpoint(mut self, url: Url) -> Self {
		self.detailed_profile_endpoint = Some(url);

		self
	}

	/// Overrides the profile field map.
	pub fn fields(mut self, fields: ProfileFieldMap) -> Self {
		self.fields = fields;

		self
	}

	/// Overrides the authorize-URL quirks.
	pub fn quirks(mut self, quirks: ProviderQuirks) -> Self {
		self.quirks = quirks;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let authorization = self
			.authorization_endpoint
			.ok_or(ProviderDescriptorError::MissingAuthorizationEndpoint)?;
		let token = self.token_endpoint.ok_or(ProviderDescriptorError::MissingTokenEndpoint)?;
		let basic_profile = self
			.basic_profile_endpoint
			.ok_or(ProviderDescriptorError::MissingBasicProfileEndpoint)?;
		let endpoints = ProviderEndpoints {
			authorization,
			qr_authorization: self.qr_authorization_endpoint,
			token,
			basic_profile,
			detailed_profile: self.detailed_profile_endpoint,
		};
		let descriptor =
			ProviderDescriptor { id: self.id, endpoints, fields: self.fields, quirks: self.quirks };

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	///
	/// Builders call this automatically; call it after deserializing a descriptor from
	/// configuration.
	pub fn validate(&self) -> Result<(), ProviderDescriptorError> {
		validate_endpoint("authorization", &self.endpoints.authorization)?;

		if let Some(qr) = self.endpoints.qr_authorization.as_ref() {
			validate_endpoint("qr_authorization", qr)?;
		}

		validate_endpoint("token", &self.endpoints.token)?;
		validate_endpoint("basic_profile", &self.endpoints.basic_profile)?;

		if let Some(detailed) = self.endpoints.detailed_profile.as_ref() {
			validate_endpoint("detailed_profile", detailed)?;
		}
		if self.fields.basic_user_id.is_empty() {
			return Err(ProviderDescriptorError::MissingUserIdField { table: "basic".into() });
		}
		if self.fields.user_id.is_empty() {
			return Err(ProviderDescriptorError::MissingUserIdField { table: "detailed".into() });
		}

		Ok(())
	}
}

fn validate_endpoint(name: &str, url: &Url) -> Result<(), ProviderDescriptorError> {
	if url.scheme() != "https" {
		Err(ProviderDescriptorError::InsecureEndpoint {
			endpoint: name.into(),
			url: url.to_string(),
		})
	} else {
		Ok(())
	}
}
