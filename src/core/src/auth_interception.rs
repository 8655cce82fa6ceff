//! Authentication interception.
//!
//! The transport adapter calls a [`CredentialPolicy`] for every login attempt. The only
//! policy, [`AuthInterceptor`], logs the offered credentials, hands a capture event to the
//! telemetry dispatcher and refuses the attempt.
//!
//! Re-exports:
//! - [`CredentialPolicy`], [`AuthResult`], [`AuthMechanism`]: the capability interface.
//! - [`AuthInterceptor`]: the per-connection implementation.

pub mod interceptor;
pub mod policy;

pub use interceptor::AuthInterceptor;
pub use policy::{method_set, AuthMechanism, AuthResult, CredentialPolicy};
