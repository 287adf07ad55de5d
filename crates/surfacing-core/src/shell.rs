//! Presentation shell interface and the events it routes to the controller.

use crate::session::{SessionSnapshot, Visibility};

/// Renders the session and owns the actual windows.
///
/// All methods are called from the controller's event loop and must return
/// promptly.
pub trait PresentationShell: Send + Sync {
    fn set_visibility(&self, visibility: Visibility);

    fn focus_input(&self);

    /// Called whenever the session snapshot changed. Never called twice in a
    /// row with an identical snapshot.
    fn on_state_changed(&self, snapshot: &SessionSnapshot);

    /// Shows the status-item menu (Settings, Quit).
    fn show_menu(&self) {}

    fn open_settings(&self) {}

    fn close_settings(&self) {}
}

/// Inputs the shell forwards to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    /// Global hotkey pressed.
    ToggleRequested,
    CaptureRequested,
    SubmitRequested,
    /// The application lost focus.
    Deactivated,
    DraftChanged(String),
    StatusItemClicked(StatusClick),
    SettingsRequested,
    QuitRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
}

/// A click on the status-bar item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusClick {
    pub button: MouseButton,
    pub control: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    Toggle,
    ShowMenu,
}

impl StatusClick {
    pub fn left() -> Self {
        Self {
            button: MouseButton::Left,
            control: false,
        }
    }

    pub fn right() -> Self {
        Self {
            button: MouseButton::Right,
            control: false,
        }
    }

    pub fn control_left() -> Self {
        Self {
            button: MouseButton::Left,
            control: true,
        }
    }

    /// Right click, or any click with control held, opens the menu. Only a
    /// plain left click toggles the panel.
    pub fn action(&self) -> StatusAction {
        if self.button == MouseButton::Right || self.control {
            StatusAction::ShowMenu
        } else {
            StatusAction::Toggle
        }
    }
}
