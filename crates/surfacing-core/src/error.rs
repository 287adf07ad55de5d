//! Error types for Cinoa Surfacing.

use thiserror::Error;

/// A shared error type for the non-session parts of the application
/// (settings, storage, registration).
///
/// Capture and request failures have their own taxonomies
/// ([`CaptureError`](crate::CaptureError), [`RequestError`](crate::RequestError))
/// because they never propagate past the controller.
#[derive(Error, Debug, Clone)]
pub enum SurfacingError {
    /// Configuration error (unknown key, invalid value)
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML"
        message: String,
    },

    /// Launch-at-login registration error
    #[error("Registration error: {0}")]
    Registration(String),
}

impl SurfacingError {
    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Registration error
    pub fn registration(message: impl Into<String>) -> Self {
        Self::Registration(message.into())
    }
}

impl From<std::io::Error> for SurfacingError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<toml::de::Error> for SurfacingError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for SurfacingError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, SurfacingError>`.
pub type Result<T> = std::result::Result<T, SurfacingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_keeps_kind() {
        let err: SurfacingError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "settings.toml").into();
        let message = err.to_string();
        assert!(message.contains("settings.toml"));
        assert!(message.contains("NotFound"));
    }

    #[test]
    fn toml_error_is_serialization() {
        let parse = toml::from_str::<toml::Value>("not = [valid").unwrap_err();
        let err: SurfacingError = parse.into();
        assert!(matches!(err, SurfacingError::Serialization { ref format, .. } if format == "TOML"));
    }
}
