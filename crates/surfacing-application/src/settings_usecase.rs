//! Settings edits that reach outside the settings file.
//!
//! Most keys are plain values and go straight to the [`SettingsService`].
//! `launchAtLogin` also has to be applied to the OS through a
//! [`LoginItemRegistrar`]; the stored flag always records what the OS
//! actually ended up with.

use std::sync::Arc;

use anyhow::{Context, Result};
use surfacing_core::{LoginItemRegistrar, SettingKey, Settings, SettingsService};

pub struct SettingsUseCase {
    settings: Arc<dyn SettingsService>,
    registrar: Arc<dyn LoginItemRegistrar>,
}

impl SettingsUseCase {
    pub fn new(settings: Arc<dyn SettingsService>, registrar: Arc<dyn LoginItemRegistrar>) -> Self {
        Self {
            settings,
            registrar,
        }
    }

    pub async fn load(&self) -> Result<Settings> {
        self.settings.load().await.context("Failed to load settings")
    }

    pub async fn get(&self, key: SettingKey) -> Result<String> {
        Ok(self.load().await?.get(key))
    }

    /// Updates one key. Returns the value that is stored afterwards.
    pub async fn set(&self, key: SettingKey, value: &str) -> Result<String> {
        if key == SettingKey::LaunchAtLogin {
            // Validate with the same parser the settings file uses.
            let mut probe = Settings::default();
            probe.set(key, value)?;
            let effective = self.set_launch_at_login(probe.launch_at_login).await?;
            return Ok(effective.to_string());
        }

        self.settings
            .set(key, value)
            .await
            .with_context(|| format!("Failed to update {key}"))?;
        self.get(key).await
    }

    /// Registers or unregisters the login item and stores the resulting state.
    ///
    /// A registrar failure is logged, not returned: the stored flag falls back
    /// to whatever the OS reports.
    pub async fn set_launch_at_login(&self, enabled: bool) -> Result<bool> {
        let applied = if enabled {
            self.registrar.register()
        } else {
            self.registrar.unregister()
        };

        let effective = match applied {
            Ok(()) => enabled,
            Err(err) => {
                tracing::warn!(error = %err, enabled, "Failed to update login item");
                self.registrar.is_enabled()
            }
        };

        self.store_launch_at_login(effective).await?;
        Ok(effective)
    }

    /// Brings the stored flag in line with the OS state, e.g. after the user
    /// removed the login item by hand.
    pub async fn sync_launch_at_login(&self) -> Result<bool> {
        let actual = self.registrar.is_enabled();
        let settings = self.load().await?;
        if settings.launch_at_login != actual {
            tracing::info!(actual, "Login item state changed outside the app");
            self.store_launch_at_login(actual).await?;
        }
        Ok(actual)
    }

    async fn store_launch_at_login(&self, value: bool) -> Result<()> {
        if self.load().await?.launch_at_login == value {
            return Ok(());
        }
        self.settings
            .set(SettingKey::LaunchAtLogin, &value.to_string())
            .await
            .context("Failed to save settings")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use surfacing_core::SurfacingError;

    #[derive(Default)]
    struct InMemorySettings {
        settings: Mutex<Settings>,
        saves: AtomicUsize,
    }

    #[async_trait]
    impl SettingsService for InMemorySettings {
        async fn load(&self) -> surfacing_core::Result<Settings> {
            Ok(self.settings.lock().unwrap().clone())
        }

        async fn save(&self, settings: &Settings) -> surfacing_core::Result<()> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            *self.settings.lock().unwrap() = settings.clone();
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeRegistrar {
        enabled: AtomicBool,
        broken: bool,
    }

    impl LoginItemRegistrar for FakeRegistrar {
        fn is_enabled(&self) -> bool {
            self.enabled.load(Ordering::SeqCst)
        }

        fn register(&self) -> surfacing_core::Result<()> {
            if self.broken {
                return Err(SurfacingError::registration("autostart dir is read-only"));
            }
            self.enabled.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn unregister(&self) -> surfacing_core::Result<()> {
            if self.broken {
                return Err(SurfacingError::registration("autostart dir is read-only"));
            }
            self.enabled.store(false, Ordering::SeqCst);
            Ok(())
        }
    }

    fn usecase(registrar: FakeRegistrar) -> (SettingsUseCase, Arc<InMemorySettings>, Arc<FakeRegistrar>) {
        let settings = Arc::new(InMemorySettings::default());
        let registrar = Arc::new(registrar);
        let usecase = SettingsUseCase::new(settings.clone(), registrar.clone());
        (usecase, settings, registrar)
    }

    #[tokio::test]
    async fn enabling_registers_and_stores() {
        let (usecase, settings, registrar) = usecase(FakeRegistrar::default());

        assert!(usecase.set_launch_at_login(true).await.unwrap());
        assert!(registrar.is_enabled());
        assert!(settings.load().await.unwrap().launch_at_login);

        assert!(!usecase.set_launch_at_login(false).await.unwrap());
        assert!(!registrar.is_enabled());
        assert!(!settings.load().await.unwrap().launch_at_login);
    }

    #[tokio::test]
    async fn registrar_failure_stores_actual_state() {
        let (usecase, settings, _) = usecase(FakeRegistrar {
            broken: true,
            ..Default::default()
        });

        assert!(!usecase.set_launch_at_login(true).await.unwrap());
        assert!(!settings.load().await.unwrap().launch_at_login);
        assert_eq!(settings.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn sync_follows_os_state() {
        let (usecase, settings, registrar) = usecase(FakeRegistrar::default());
        usecase.set_launch_at_login(true).await.unwrap();

        // Removed behind our back.
        registrar.enabled.store(false, Ordering::SeqCst);
        assert!(!usecase.sync_launch_at_login().await.unwrap());
        assert!(!settings.load().await.unwrap().launch_at_login);

        let saves = settings.saves.load(Ordering::SeqCst);
        usecase.sync_launch_at_login().await.unwrap();
        assert_eq!(settings.saves.load(Ordering::SeqCst), saves);
    }

    #[tokio::test]
    async fn set_routes_launch_at_login_through_registrar() {
        let (usecase, _, registrar) = usecase(FakeRegistrar::default());

        assert_eq!(usecase.set(SettingKey::LaunchAtLogin, "on").await.unwrap(), "true");
        assert!(registrar.is_enabled());

        assert!(usecase.set(SettingKey::LaunchAtLogin, "maybe").await.is_err());
        assert!(registrar.is_enabled());
    }

    #[tokio::test]
    async fn set_plain_keys() {
        let (usecase, settings, _) = usecase(FakeRegistrar::default());

        let stored = usecase
            .set(SettingKey::ModelName, "gemini-2.5-pro")
            .await
            .unwrap();
        assert_eq!(stored, "gemini-2.5-pro");
        usecase.set(SettingKey::ApiKey, "secret").await.unwrap();

        let loaded = settings.load().await.unwrap();
        assert_eq!(loaded.api_key(), Some("secret"));
        assert_eq!(loaded.model_name(), "gemini-2.5-pro");
    }
}
