//! Screen capture contract.
//!
//! The capture provider is a leaf collaborator: given a display it produces a
//! still image or fails. It must not touch window visibility; hiding and
//! restoring the host window around a capture is the controller's job.

use async_trait::async_trait;
use image::DynamicImage;
use std::fmt;
use thiserror::Error;

/// Identifier of a physical display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayId(pub u32);

impl DisplayId {
    /// The primary display. The only capture target the application uses.
    pub const PRIMARY: DisplayId = DisplayId(0);

    pub fn is_primary(&self) -> bool {
        *self == Self::PRIMARY
    }
}

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_primary() {
            write!(f, "primary")
        } else {
            write!(f, "display-{}", self.0)
        }
    }
}

/// An opaque captured still image.
///
/// Deliberately not `Clone`: once attached, the session is the only owner and
/// hands the image over by value when a prompt is submitted.
pub struct CapturedImage {
    image: DynamicImage,
}

impl CapturedImage {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn as_image(&self) -> &DynamicImage {
        &self.image
    }
}

impl fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Why a capture produced no image. Never fatal; the session simply keeps
/// no attachment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("screen capture unavailable: {0}")]
    Unavailable(String),

    #[error("screen capture permission denied")]
    PermissionDenied,

    #[error("screen capture failed: {0}")]
    Unknown(String),
}

/// Result of one capture attempt, consumed once by the controller.
#[derive(Debug)]
pub enum CaptureOutcome {
    Image(CapturedImage),
    /// The capture task ended before the provider answered.
    Cancelled,
    Failed(CaptureError),
}

impl CaptureOutcome {
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image(_))
    }
}

impl From<Result<CapturedImage, CaptureError>> for CaptureOutcome {
    fn from(result: Result<CapturedImage, CaptureError>) -> Self {
        match result {
            Ok(image) => Self::Image(image),
            Err(err) => Self::Failed(err),
        }
    }
}

/// Produces a still image of a display.
#[async_trait]
pub trait CaptureProvider: Send + Sync {
    /// Captures the given display.
    ///
    /// Must be safe to call while the host window is hidden and must not
    /// alter window visibility itself.
    async fn capture(&self, display: DisplayId) -> Result<CapturedImage, CaptureError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn outcome_from_result() {
        let ok: CaptureOutcome = Ok(CapturedImage::new(DynamicImage::ImageRgba8(
            RgbaImage::new(4, 3),
        )))
        .into();
        assert!(ok.is_image());

        let failed: CaptureOutcome = Err(CaptureError::PermissionDenied).into();
        assert!(matches!(
            failed,
            CaptureOutcome::Failed(CaptureError::PermissionDenied)
        ));
    }

    #[test]
    fn debug_shows_dimensions_only() {
        let image = CapturedImage::new(DynamicImage::ImageRgba8(RgbaImage::new(4, 3)));
        assert_eq!(image.dimensions(), (4, 3));
        assert_eq!(
            format!("{image:?}"),
            "CapturedImage { width: 4, height: 3 }"
        );
    }

    #[test]
    fn primary_display_formats() {
        assert!(DisplayId::PRIMARY.is_primary());
        assert_eq!(DisplayId::PRIMARY.to_string(), "primary");
        assert_eq!(DisplayId(2).to_string(), "display-2");
    }
}
