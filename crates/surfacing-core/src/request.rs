//! Remote generation contract and its error taxonomy.

use crate::capture::CapturedImage;
use async_trait::async_trait;
use thiserror::Error;

/// User-visible text for a missing API key.
pub const MISSING_CREDENTIAL_MESSAGE: &str = "Please set your API Key in Settings.";

/// Why a generation request produced no text.
///
/// Every variant is rendered into the session's response area via
/// [`RequestError::user_message`]; none of them propagate further.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("API key is not configured")]
    MissingCredential,

    /// The settings file exists but could not be read.
    #[error("settings unavailable: {0}")]
    SettingsUnavailable(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed response")]
    MalformedResponse,

    #[error("server error {code}")]
    ServerError { code: u16, message: Option<String> },

    /// The request task ended without delivering an outcome.
    #[error("request interrupted")]
    Interrupted,
}

impl RequestError {
    pub fn server(code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::ServerError {
            code,
            message: (!message.trim().is_empty()).then_some(message),
        }
    }

    /// Text shown in the response area in place of an answer.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCredential => MISSING_CREDENTIAL_MESSAGE.to_string(),
            Self::SettingsUnavailable(reason) => {
                format!("Error: Could not read settings.toml ({reason}).")
            }
            Self::Network(reason) => format!("Error: {reason}"),
            Self::MalformedResponse => "Error: Could not parse response.".to_string(),
            Self::ServerError {
                code,
                message: Some(message),
            } => format!("Error: server returned {code}: {message}"),
            Self::ServerError {
                code,
                message: None,
            } => format!("Error: server returned {code}"),
            Self::Interrupted => "Error: The request was interrupted.".to_string(),
        }
    }
}

/// Result of one generation request, consumed once by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    Text(String),
    Failed(RequestError),
}

impl From<Result<String, RequestError>> for RequestOutcome {
    fn from(result: Result<String, RequestError>) -> Self {
        match result {
            Ok(text) => Self::Text(text),
            Err(err) => Self::Failed(err),
        }
    }
}

/// One request/response exchange with the remote generative service.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Generates a text answer for `prompt`, optionally grounded on `image`.
    ///
    /// The image is taken by value: the session gives up its attachment when a
    /// prompt is submitted.
    async fn generate(
        &self,
        prompt: &str,
        image: Option<CapturedImage>,
    ) -> Result<String, RequestError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_points_at_settings() {
        let message = RequestError::MissingCredential.user_message();
        assert!(message.contains("API Key"));
        assert!(message.contains("Settings"));
    }

    #[test]
    fn unreadable_settings_do_not_ask_for_a_key() {
        let message = RequestError::SettingsUnavailable("TOML parse error".into()).user_message();
        assert!(message.starts_with("Error:"));
        assert!(message.contains("settings.toml"));
        assert!(message.contains("TOML parse error"));
        assert_ne!(message, MISSING_CREDENTIAL_MESSAGE);
    }

    #[test]
    fn server_error_message() {
        assert_eq!(
            RequestError::server(503, "UNAVAILABLE: overloaded").user_message(),
            "Error: server returned 503: UNAVAILABLE: overloaded"
        );
        assert_eq!(
            RequestError::server(500, "  ").user_message(),
            "Error: server returned 500"
        );
    }

    #[test]
    fn outcome_from_result() {
        assert_eq!(
            RequestOutcome::from(Ok("hi".to_string())),
            RequestOutcome::Text("hi".to_string())
        );
        assert_eq!(
            RequestOutcome::from(Err(RequestError::MalformedResponse)),
            RequestOutcome::Failed(RequestError::MalformedResponse)
        );
    }
}
