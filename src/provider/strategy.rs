//! Provider strategy hooks that customize upstream calls.
//!
//! Implementations decorate outgoing query parameters and classify upstream error codes
//! without tying flows to any particular HTTP client.

// self
use crate::{_prelude::*, upstream::UpstreamApi};

/// Upstream error code reporting an expired access token.
pub const ERRCODE_TOKEN_EXPIRED: i64 = 42001;
/// Upstream error code reporting an invalid access token.
pub const ERRCODE_TOKEN_INVALID: i64 = 40014;

/// Strategy hook that allows providers to decorate requests and classify error codes.
///
/// Implementors are required to be `Send + Sync`, and the hooks use crate-owned data types
/// so downstream crates never depend on reqwest-specific structures. Override only what you
/// need; `augment_request` defaults to a no-op.
pub trait ProviderStrategy: Send + Sync {
	/// Maps an upstream `errcode` into the federation's recovery categories.
	fn classify_errcode(&self, ctx: &UpstreamErrorContext) -> ErrcodeClass;

	/// Gives providers a chance to add query parameters before dispatching.
	///
	/// The map already holds the parameters the flow requires; implementations may add
	/// provider-specific fields (debug flags, language hints, etc.).
	fn augment_request(&self, _api: UpstreamApi, _params: &mut BTreeMap<String, String>) {}
}

/// Recovery categories for upstream error codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrcodeClass {
	/// The call succeeded (`errcode == 0`).
	Success,
	/// The access token was rejected; a forced renewal may recover.
	TokenRejected,
	/// No renewal can recover from the code.
	Terminal,
}

/// Context passed to provider strategies when classifying error codes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpstreamErrorContext {
	/// Upstream API that returned the code.
	pub api: UpstreamApi,
	/// Upstream error code (`0` on success).
	pub errcode: i64,
	/// Upstream error message, when supplied.
	pub errmsg: Option<String>,
	/// HTTP status code of the response, when available.
	pub http_status: Option<u16>,
}
impl UpstreamErrorContext {
	/// Creates a new context for the provided API and error code.
	pub fn new(api: UpstreamApi, errcode: i64) -> Self {
		Self { api, errcode, errmsg: None, http_status: None }
	}

	/// Adds the upstream error message.
	pub fn with_errmsg(mut self, errmsg: impl Into<String>) -> Self {
		self.errmsg = Some(errmsg.into());

		self
	}

	/// Adds an HTTP status code.
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}
}

/// Default strategy for WeCom-style providers.
///
/// `0` is success, [`ERRCODE_TOKEN_EXPIRED`] and [`ERRCODE_TOKEN_INVALID`] are recoverable by
/// renewing the token, everything else is terminal.
#[derive(Debug, Default)]
pub struct DefaultProviderStrategy;
impl Display for DefaultProviderStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("default-provider-strategy")
	}
}
impl ProviderStrategy for DefaultProviderStrategy {
	fn classify_errcode(&self, ctx: &UpstreamErrorContext) -> ErrcodeClass {
		match ctx.errcode {
			0 => ErrcodeClass::Success,
			ERRCODE_TOKEN_EXPIRED | ERRCODE_TOKEN_INVALID => ErrcodeClass::TokenRejected,
			_ => ErrcodeClass::Terminal,
		}
	}
}
