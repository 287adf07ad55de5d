//! Terminal rendition of the floating panel.
//!
//! Typed lines become [`ShellEvent`]s; session changes are printed as they
//! arrive from the controller.

use std::sync::{Mutex, PoisonError};

use surfacing_core::{
    PresentationShell, SessionPhase, SessionSnapshot, ShellEvent, StatusClick, Visibility,
};

pub const HELP: &str = "\
Commands:
  :toggle               show or hide the panel (global hotkey)
  :capture              attach a screenshot of the primary display
  :blur                 simulate the app losing focus
  :click [left|right|ctrl]  click the status item
  :settings             open settings
  :quit                 exit
Any other line is sent as a prompt.";

#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Events(Vec<ShellEvent>),
    Help,
    Unknown(String),
}

/// Maps one typed line to the events it stands for.
pub fn parse_line(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Input::Events(Vec::new());
    }

    let Some(command) = trimmed.strip_prefix(':') else {
        return Input::Events(vec![
            ShellEvent::DraftChanged(line.to_string()),
            ShellEvent::SubmitRequested,
        ]);
    };

    let mut words = command.split_whitespace();
    let event = match (words.next().unwrap_or_default(), words.next()) {
        ("toggle", None) => ShellEvent::ToggleRequested,
        ("capture", None) => ShellEvent::CaptureRequested,
        ("blur", None) => ShellEvent::Deactivated,
        ("settings", None) => ShellEvent::SettingsRequested,
        ("quit", None) => ShellEvent::QuitRequested,
        ("click", None | Some("left")) => ShellEvent::StatusItemClicked(StatusClick::left()),
        ("click", Some("right")) => ShellEvent::StatusItemClicked(StatusClick::right()),
        ("click", Some("ctrl")) => ShellEvent::StatusItemClicked(StatusClick::control_left()),
        ("help", None) => return Input::Help,
        _ => return Input::Unknown(trimmed.to_string()),
    };
    Input::Events(vec![event])
}

/// Lines to print when the session moves from `prev` to `next`.
fn describe_change(prev: &SessionSnapshot, next: &SessionSnapshot) -> Vec<String> {
    let mut lines = Vec::new();

    if next.attached_image != prev.attached_image {
        if let Some((width, height)) = next.attached_image {
            lines.push(format!("[screenshot attached {width}x{height}]"));
        }
    }

    if next.phase() != prev.phase() {
        match next.phase() {
            SessionPhase::Capturing => lines.push("[capturing...]".to_string()),
            SessionPhase::Thinking => lines.push("[thinking...]".to_string()),
            _ => {}
        }
    }

    if next.response_text != prev.response_text {
        if let Some(response) = &next.response_text {
            lines.push(response.clone());
        }
    }

    lines
}

#[derive(Default)]
pub struct TerminalShell {
    last: Mutex<SessionSnapshot>,
}

impl TerminalShell {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PresentationShell for TerminalShell {
    fn set_visibility(&self, visibility: Visibility) {
        match visibility {
            Visibility::Visible => println!("[panel shown]"),
            Visibility::Hidden => println!("[panel hidden]"),
        }
    }

    fn focus_input(&self) {
        println!("> type a prompt, or :help");
    }

    fn on_state_changed(&self, snapshot: &SessionSnapshot) {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        for line in describe_change(&last, snapshot) {
            println!("{line}");
        }
        *last = snapshot.clone();
    }

    fn show_menu(&self) {
        println!("[menu] :settings | :quit");
    }

    fn open_settings(&self) {
        println!("[settings] use `surfacing config show` and `surfacing config set <key> <value>`");
    }
}
