use crate::capture::CapturedImage;
use serde::Serialize;

/// Whether the floating panel is on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Visibility {
    #[default]
    Hidden,
    Visible,
}

impl Visibility {
    pub fn is_visible(self) -> bool {
        matches!(self, Self::Visible)
    }
}

/// Interaction phase, derived from the session fields rather than tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    Idle,
    Active,
    Capturing,
    Thinking,
    Responded,
}

/// The single live interaction unit. Lives for the whole process; its fields
/// are reset, never dropped.
#[derive(Debug, Default)]
pub(crate) struct Session {
    pub(crate) visibility: Visibility,
    pub(crate) draft_text: String,
    pub(crate) attached_image: Option<CapturedImage>,
    pub(crate) is_thinking: bool,
    pub(crate) is_capturing: bool,
    pub(crate) response_text: Option<String>,
    pub(crate) generation: u64,
}

impl Session {
    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            visibility: self.visibility,
            draft_text: self.draft_text.clone(),
            attached_image: self.attached_image.as_ref().map(CapturedImage::dimensions),
            is_thinking: self.is_thinking,
            is_capturing: self.is_capturing,
            response_text: self.response_text.clone(),
            generation: self.generation,
        }
    }
}

/// Read-only copy of the session handed to readers.
///
/// The attached image itself never leaves the session; readers only learn
/// whether one is attached and its size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub visibility: Visibility,
    pub draft_text: String,
    /// `(width, height)` of the attached image, if any.
    pub attached_image: Option<(u32, u32)>,
    pub is_thinking: bool,
    pub is_capturing: bool,
    pub response_text: Option<String>,
    pub generation: u64,
}

impl SessionSnapshot {
    pub fn has_image(&self) -> bool {
        self.attached_image.is_some()
    }

    pub fn phase(&self) -> SessionPhase {
        if !self.visibility.is_visible() {
            SessionPhase::Idle
        } else if self.is_capturing {
            SessionPhase::Capturing
        } else if self.is_thinking {
            SessionPhase::Thinking
        } else if self.response_text.is_some() {
            SessionPhase::Responded
        } else {
            SessionPhase::Active
        }
    }
}

/// What `begin_thinking` hands to the request sub-protocol.
#[derive(Debug)]
pub struct PendingPrompt {
    pub text: String,
    pub image: Option<CapturedImage>,
    /// Generation the request was issued under.
    pub generation: u64,
}
