//! Auth-domain identifiers, credential keys, token models, and normalized identities.

pub mod id;
pub mod identity;
pub mod secret;
pub mod token;

pub use id::*;
pub use identity::*;
pub use secret::*;
pub use token::*;
