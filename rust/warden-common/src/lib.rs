#![warn(missing_docs)]

//! This crate constitutes a library of light weight primitives that are shared
//! across the warden crates: a Keccak-256 digest, `0x`-hex helpers and a
//! unix-second clock that tests can drive by hand.

mod bytes;
pub use bytes::*;

mod hash;
pub use hash::*;

mod time;
pub use time::*;
