//! The policy that decides whether a session may be issued.
//!
//! A key pair's PolicyScript binding names a [`PolicyDescriptor`] by its
//! content address ([`PolicyId`]). Every signing-network node decodes the
//! descriptor it is handed, checks that its id is the one bound on the
//! ledger, and runs the [`PolicyEngine`] over the caller's
//! [`PolicyParams`]. Only an [`PolicyDecision::Accept`] releases a
//! signature share.

mod descriptor;
mod engine;
mod error;
mod params;
mod response;

pub use descriptor::*;
pub use engine::*;
pub use error::*;
pub use params::*;
pub use response::*;
