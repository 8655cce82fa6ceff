pub mod types;

pub use types::{CaptureEvent, EventKind};
