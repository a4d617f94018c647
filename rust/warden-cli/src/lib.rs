#![warn(missing_docs)]

//! # Warden CLI
//!
//! Operator tools for identity-gated key pairs:
//!
//! - `warden login --code <CODE>` exchanges a GitHub authorization code
//!   through the relay and prints the resulting identity
//! - `warden method-id --subject-id <ID>` prints the auth method a GitHub
//!   user is bound with
//! - `warden policy` prints the policy descriptor and its content id
//! - `warden verify --address <ADDR> --result <JSON>` checks a signature
//!   offline
//! - `warden simulate` runs mint, capacity, session and signing against an
//!   in-process network
//!
//! Logging goes to stderr and honours `RUST_LOG`; results go to stdout as
//! JSON.

mod cli;
pub use cli::*;

mod commands;
pub use commands::*;
