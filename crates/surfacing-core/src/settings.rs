//! User settings model and the services that persist and apply it.

use crate::error::{Result, SurfacingError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Model used when none is configured.
pub const DEFAULT_MODEL_NAME: &str = "gemini-2.5-flash";

/// Persisted user settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default)]
    pub launch_at_login: bool,
}

fn default_model_name() -> String {
    DEFAULT_MODEL_NAME.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model_name: default_model_name(),
            launch_at_login: false,
        }
    }
}

impl Settings {
    /// The configured API key, if it is non-blank.
    pub fn api_key(&self) -> Option<&str> {
        let key = self.api_key.trim();
        (!key.is_empty()).then_some(key)
    }

    /// The configured model, falling back to [`DEFAULT_MODEL_NAME`] when blank.
    pub fn model_name(&self) -> &str {
        let model = self.model_name.trim();
        if model.is_empty() {
            DEFAULT_MODEL_NAME
        } else {
            model
        }
    }

    /// Reads a setting as a string.
    pub fn get(&self, key: SettingKey) -> String {
        match key {
            SettingKey::ApiKey => self.api_key.clone(),
            SettingKey::ModelName => self.model_name().to_string(),
            SettingKey::LaunchAtLogin => self.launch_at_login.to_string(),
        }
    }

    /// Writes a setting from its string form.
    pub fn set(&mut self, key: SettingKey, value: &str) -> Result<()> {
        match key {
            SettingKey::ApiKey => self.api_key = value.trim().to_string(),
            SettingKey::ModelName => self.model_name = value.trim().to_string(),
            SettingKey::LaunchAtLogin => self.launch_at_login = parse_bool(value)?,
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        other => Err(SurfacingError::config(format!(
            "expected a boolean, got '{other}'"
        ))),
    }
}

/// Named settings, keyed by the same strings the settings file uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    ApiKey,
    ModelName,
    LaunchAtLogin,
}

impl SettingKey {
    pub const ALL: [SettingKey; 3] = [Self::ApiKey, Self::ModelName, Self::LaunchAtLogin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiKey => "apiKey",
            Self::ModelName => "modelName",
            Self::LaunchAtLogin => "launchAtLogin",
        }
    }

    /// Whether the value should be masked when displayed.
    pub fn is_secret(&self) -> bool {
        matches!(self, Self::ApiKey)
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = SurfacingError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| SurfacingError::config(format!("unknown setting '{s}'")))
    }
}

/// Get/set access to persisted settings.
///
/// Implementations persist across process restarts.
#[async_trait]
pub trait SettingsService: Send + Sync {
    /// Loads the current settings, defaults when nothing is stored yet.
    async fn load(&self) -> Result<Settings>;

    /// Replaces the stored settings.
    async fn save(&self, settings: &Settings) -> Result<()>;

    async fn get(&self, key: SettingKey) -> Result<String> {
        Ok(self.load().await?.get(key))
    }

    async fn set(&self, key: SettingKey, value: &str) -> Result<()> {
        let mut settings = self.load().await?;
        settings.set(key, value)?;
        self.save(&settings).await
    }
}

/// OS registration that starts the application at login.
pub trait LoginItemRegistrar: Send + Sync {
    fn is_enabled(&self) -> bool;
    fn register(&self) -> Result<()>;
    fn unregister(&self) -> Result<()>;
}
