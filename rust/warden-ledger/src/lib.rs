#![warn(missing_docs)]

//! The ledger side of programmable key pairs.
//!
//! The ledger is the sole source of truth for which key pairs exist, which
//! auth methods may authorize them and which capacity grants are live. This
//! crate models that state ([`KeyPairRecord`], [`BindingSet`],
//! [`GrantRecord`]), the opaque operations the protocol needs from it
//! ([`Ledger`]), the versioned decoding of the minted-key event
//! ([`MintedKeyEvent`]), and an in-process [`MemoryLedger`].

mod auth;
mod capacity;
mod error;
mod event;
mod ledger;
mod memory;
mod token;

pub use auth::*;
pub use capacity::*;
pub use error::*;
pub use event::*;
pub use ledger::*;
pub use memory::*;
pub use token::*;
