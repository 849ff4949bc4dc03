//! Provider-facing descriptors (data) and strategies (behavior).
//!
//! `descriptor` exposes validated metadata (`ProviderDescriptor`) covering HTTPS-only
//! endpoints, the profile-field mapping table, and authorize-URL quirks, with presets for the
//! corporate and consumer upstream variants. `strategy` defines [`ProviderStrategy`], an
//! HTTP-client-agnostic hook used by flows to augment outgoing calls and classify upstream
//! error codes.

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;
