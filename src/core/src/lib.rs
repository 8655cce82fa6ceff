pub mod agent;
pub use agent::Agent;

pub mod auth_interception;

pub mod configuration;
pub use configuration::Config;

pub mod data_capture;
pub use data_capture::CaptureEvent;

pub mod error_handling;

pub mod host_identity;

pub mod network;

pub mod storage;

pub mod telemetry;

pub mod web_interface;
