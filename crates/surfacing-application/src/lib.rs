//! Application layer for Cinoa Surfacing.
//!
//! Coordinates the domain store with the capture, generation and settings
//! collaborators:
//!
//! - [`SessionController`]: sequences panel visibility, screen capture and
//!   requests against the single live session
//! - [`SettingsUseCase`]: settings edits that need an OS side effect
//!   (launch at login)

pub mod controller;
pub mod settings_usecase;

pub use controller::{ControllerConfig, SessionController};
pub use settings_usecase::SettingsUseCase;
