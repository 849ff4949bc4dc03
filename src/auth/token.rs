//! Application access tokens issued by the upstream identity service.

// self
use crate::{_prelude::*, auth::secret::TokenSecret};

/// Short-lived application access token.
///
/// The advertised expiry is advisory: upstream may reject a token before `expires_at`, which
/// is why the identity resolver renews on rejection instead of trusting the clock alone.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
	/// Token value; callers must avoid logging it.
	pub value: TokenSecret,
	/// Instant the token was received from the issuance endpoint.
	pub issued_at: OffsetDateTime,
	/// Advertised expiry instant (`issued_at + expires_in`).
	pub expires_at: OffsetDateTime,
}
impl AccessToken {
	/// Creates a token from an absolute validity window.
	pub fn new(
		value: impl Into<String>,
		issued_at: OffsetDateTime,
		expires_at: OffsetDateTime,
	) -> Self {
		Self { value: TokenSecret::new(value), issued_at, expires_at }
	}

	/// Creates a token issued now that expires after `expires_in`.
	pub fn issued_now(value: impl Into<String>, expires_in: Duration) -> Self {
		let issued_at = OffsetDateTime::now_utc();

		Self::new(value, issued_at, issued_at + expires_in)
	}

	/// Returns the raw token value for request parameters.
	pub fn expose(&self) -> &str {
		self.value.expose()
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("value", &"<redacted>")
			.field("fingerprint", &self.value.fingerprint())
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
