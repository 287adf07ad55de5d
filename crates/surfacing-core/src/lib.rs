//! Domain layer for Cinoa Surfacing.
//!
//! Holds the single live session state, the
//! store that serializes every mutation to it, and the narrow interfaces the
//! orchestration controller depends on (capture, remote generation, presentation,
//! settings). Nothing in this crate performs I/O.

pub mod capture;
pub mod error;
pub mod request;
pub mod session;
pub mod settings;
pub mod shell;

pub use capture::{CaptureError, CaptureOutcome, CaptureProvider, CapturedImage, DisplayId};
pub use error::{Result, SurfacingError};
pub use request::{ApiClient, MISSING_CREDENTIAL_MESSAGE, RequestError, RequestOutcome};
pub use session::{PendingPrompt, SessionPhase, SessionSnapshot, SessionStore, Visibility};
pub use settings::{
    DEFAULT_MODEL_NAME, LoginItemRegistrar, SettingKey, Settings, SettingsService,
};
pub use shell::{MouseButton, PresentationShell, ShellEvent, StatusAction, StatusClick};
