//! Settings service backed by `settings.toml`.

use crate::paths::SurfacingPaths;
use crate::storage::{ConfigStorage, ConfigStorageError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use surfacing_core::{Result, SettingKey, Settings, SettingsService};

/// [`SettingsService`] that persists to a TOML file.
///
/// Every `load` reads the file, so edits made by another process (for example
/// `surfacing config set` while the panel is running) apply to the next call.
#[derive(Clone)]
pub struct TomlSettingsService {
    storage: Arc<ConfigStorage>,
}

impl TomlSettingsService {
    /// Uses the settings file resolved by `paths`.
    pub fn new(paths: &SurfacingPaths) -> Result<Self> {
        Ok(Self::with_path(paths.settings_file()?))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            storage: Arc::new(ConfigStorage::new(path)),
        }
    }
}

#[async_trait]
impl SettingsService for TomlSettingsService {
    async fn load(&self) -> Result<Settings> {
        let settings = self.storage.load::<Settings>()?.unwrap_or_default();
        tracing::trace!(path = %self.storage.path().display(), "Loaded settings");
        Ok(settings)
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        let written = self.storage.update(Settings::default(), |stored| {
            *stored = settings.clone();
            Ok(())
        })?;
        tracing::info!(
            model = written.model_name(),
            launch_at_login = written.launch_at_login,
            "Saved settings"
        );
        Ok(())
    }

    /// Changes one key on the stored document under the file lock, leaving
    /// every other key as it is on disk.
    async fn set(&self, key: SettingKey, value: &str) -> Result<()> {
        Settings::default().set(key, value)?;
        self.storage.update(Settings::default(), |stored| {
            stored
                .set(key, value)
                .map_err(|err| ConfigStorageError::InvalidValue(err.to_string()))
        })?;
        tracing::info!(%key, "Updated setting");
        Ok(())
    }
}
