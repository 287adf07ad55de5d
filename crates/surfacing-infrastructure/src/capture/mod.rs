//! Screen capture providers.

mod command_capture;

pub use command_capture::{CommandCaptureProvider, DEFAULT_CAPTURE_COMMAND};
