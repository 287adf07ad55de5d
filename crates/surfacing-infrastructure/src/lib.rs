//! Infrastructure layer: filesystem-backed settings, launch-at-login
//! registration and the command-backed screen capture provider.

pub mod autostart;
pub mod capture;
pub mod paths;
pub mod settings_service;
pub mod storage;

pub use autostart::XdgAutostart;
pub use capture::CommandCaptureProvider;
pub use paths::SurfacingPaths;
pub use settings_service::TomlSettingsService;
