#![warn(missing_docs)]

//! Identity-gated signing with programmable key pairs.
//!
//! A protocol run goes through five components, each holding explicit
//! [`Connection`]s to the ledger and the signing network:
//!
//! 1. [`KeyRegistrar`] mints a key pair bound to a policy and an external
//!    identity
//! 2. [`CapacityIssuer`] resolves a capacity grant and delegates uses of it
//!    to the key pair
//! 3. [`SessionBroker`] asks the network for a [`SessionCredential`]; the
//!    network runs the policy engine first
//! 4. [`SigningExecutor`] signs a message digest under that session
//! 5. [`SignatureResult::verify_for`] checks the result offline
//!
//! The same session also unlocks wrapped keys: Ed25519 keys the network
//! generates and keeps encrypted for the key pair, used through
//! [`WrappedKeyManager`].
//!
//! [`MemoryNetwork`] plays the signing network in-process over a
//! [`warden_ledger::MemoryLedger`].

mod capacity;
mod config;
mod connection;
mod envelope;
mod error;
mod executor;
mod memory;
mod network;
mod registrar;
mod session;
mod vault;
mod wrapped;

pub use capacity::*;
pub use config::*;
pub use connection::*;
pub use envelope::*;
pub use error::*;
pub use executor::*;
pub use memory::*;
pub use network::*;
pub use registrar::*;
pub use session::*;
pub use wrapped::*;
