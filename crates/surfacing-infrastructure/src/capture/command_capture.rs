//! Capture provider that shells out to a screenshot tool.
//!
//! The tool must write one encoded image (PNG, JPEG) to stdout, e.g.
//! `grim -` on wlroots compositors or `gnome-screenshot -f /dev/stdout`.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use surfacing_core::{CaptureError, CaptureProvider, CapturedImage, DisplayId};
use tokio::process::Command;

pub const DEFAULT_CAPTURE_COMMAND: &[&str] = &["grim", "-"];

#[derive(Debug, Clone)]
pub struct CommandCaptureProvider {
    program: String,
    args: Vec<String>,
}

impl CommandCaptureProvider {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Parses a whitespace-separated command line. `None` when empty.
    pub fn from_command_line(command_line: &str) -> Option<Self> {
        let mut words = command_line.split_whitespace().map(str::to_string);
        let program = words.next()?;
        Some(Self::new(program, words.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for CommandCaptureProvider {
    fn default() -> Self {
        Self::new(
            DEFAULT_CAPTURE_COMMAND[0],
            DEFAULT_CAPTURE_COMMAND[1..].iter().map(|s| s.to_string()).collect(),
        )
    }
}

#[async_trait]
impl CaptureProvider for CommandCaptureProvider {
    async fn capture(&self, target: DisplayId) -> Result<CapturedImage, CaptureError> {
        if !target.is_primary() {
            tracing::debug!(display = %target, "Only the primary display is captured");
        }

        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => {
                    CaptureError::Unavailable(format!("'{}' is not installed", self.program))
                }
                ErrorKind::PermissionDenied => CaptureError::PermissionDenied,
                _ => CaptureError::Unknown(err.to_string()),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(&stderr, output.status.code()));
        }

        if output.stdout.is_empty() {
            return Err(CaptureError::Unavailable(format!(
                "'{}' produced no image",
                self.program
            )));
        }

        let image = image::load_from_memory(&output.stdout)
            .map_err(|err| CaptureError::Unknown(format!("could not decode capture: {err}")))?;
        tracing::debug!(
            width = image.width(),
            height = image.height(),
            "Captured screen"
        );
        Ok(CapturedImage::new(image))
    }
}

fn classify_failure(stderr: &str, code: Option<i32>) -> CaptureError {
    let lower = stderr.to_lowercase();
    if lower.contains("permission") || lower.contains("not authorized") || lower.contains("denied") {
        CaptureError::PermissionDenied
    } else {
        let reason = stderr.trim();
        match code {
            Some(code) if reason.is_empty() => {
                CaptureError::Unknown(format!("capture command exited with status {code}"))
            }
            None if reason.is_empty() => {
                CaptureError::Unknown("capture command was terminated".to_string())
            }
            _ => CaptureError::Unknown(reason.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_permission_failures() {
        assert_eq!(
            classify_failure("Error: Permission denied by portal", Some(1)),
            CaptureError::PermissionDenied
        );
        assert_eq!(
            classify_failure("compositor doesn't support wlr-screencopy", Some(1)),
            CaptureError::Unknown("compositor doesn't support wlr-screencopy".into())
        );
        assert_eq!(
            classify_failure("", Some(3)),
            CaptureError::Unknown("capture command exited with status 3".into())
        );
    }

    #[test]
    fn parses_command_line() {
        let provider = CommandCaptureProvider::from_command_line("gnome-screenshot -f /dev/stdout").unwrap();
        assert_eq!(provider.program(), "gnome-screenshot");
        assert_eq!(provider.args, vec!["-f", "/dev/stdout"]);
        assert!(CommandCaptureProvider::from_command_line("   ").is_none());
        assert_eq!(CommandCaptureProvider::default().program(), "grim");
    }

    #[tokio::test]
    async fn missing_program_is_unavailable() {
        let provider = CommandCaptureProvider::new("surfacing-no-such-screenshot-tool", vec![]);
        assert!(matches!(
            provider.capture(DisplayId::PRIMARY).await,
            Err(CaptureError::Unavailable(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn empty_output_is_unavailable() {
        let provider = CommandCaptureProvider::new("true", vec![]);
        assert!(matches!(
            provider.capture(DisplayId::PRIMARY).await,
            Err(CaptureError::Unavailable(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_command_is_unknown() {
        let provider = CommandCaptureProvider::new("false", vec![]);
        assert!(matches!(
            provider.capture(DisplayId::PRIMARY).await,
            Err(CaptureError::Unknown(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn undecodable_output_is_unknown() {
        let provider = CommandCaptureProvider::new("echo", vec!["not an image".into()]);
        assert!(matches!(
            provider.capture(DisplayId::PRIMARY).await,
            Err(CaptureError::Unknown(_))
        ));
    }

    #[tokio::test]
    async fn secondary_display_falls_back_to_the_capture_command() {
        let provider = CommandCaptureProvider::new("surfacing-no-such-screenshot-tool", vec![]);
        assert!(matches!(
            provider.capture(DisplayId(1)).await,
            Err(CaptureError::Unavailable(_))
        ));
    }
}
