//! Remote telemetry towards the controller.
//!
//! - `delivery`: the [`Delivery`] seam and its HTTP implementation.
//! - `dispatcher`: bounded queue and worker pool feeding a [`Delivery`].

pub mod delivery;
pub mod dispatcher;

pub use delivery::{Delivery, HttpDelivery};
pub use dispatcher::{DispatcherSettings, TelemetryDispatcher, TelemetrySender};
