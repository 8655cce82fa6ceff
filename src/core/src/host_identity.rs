//! Persistent SSH host key.
//!
//! The fake server must present the same host key on every run, otherwise returning scanners
//! see a changed fingerprint. [`acquire`] is called once at startup and its result shared,
//! read-only, with every connection.

pub mod key_store;

pub use key_store::{acquire, HostIdentity, IdentityOrigin};
