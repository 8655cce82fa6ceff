//! Startup wiring: turns one [`Config`](crate::configuration::Config) into a running honeypot.

pub mod agent_handler;

pub use agent_handler::{Agent, BoundAgent};
