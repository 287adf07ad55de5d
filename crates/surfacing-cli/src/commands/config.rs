use std::sync::Arc;

use anyhow::Result;
use surfacing_application::SettingsUseCase;
use surfacing_core::SettingKey;
use surfacing_infrastructure::{SurfacingPaths, TomlSettingsService, XdgAutostart};

fn usecase(paths: &SurfacingPaths) -> Result<SettingsUseCase> {
    Ok(SettingsUseCase::new(
        Arc::new(TomlSettingsService::new(paths)?),
        Arc::new(XdgAutostart::new(paths)?),
    ))
}

/// Hides all but the last four characters of a secret.
fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    match chars.len() {
        0 => "(not set)".to_string(),
        len if len <= 4 => "*".repeat(len),
        len => format!("{}{}", "*".repeat(len - 4), chars[len - 4..].iter().collect::<String>()),
    }
}

fn display_value(key: SettingKey, value: &str) -> String {
    if key.is_secret() {
        mask(value)
    } else {
        value.to_string()
    }
}

pub async fn show(paths: &SurfacingPaths) -> Result<()> {
    let settings = usecase(paths)?.load().await?;
    println!("# {}", paths.settings_file()?.display());
    for key in SettingKey::ALL {
        println!("{key} = {}", display_value(key, &settings.get(key)));
    }
    Ok(())
}

pub async fn get(paths: &SurfacingPaths, key: &str) -> Result<()> {
    let key: SettingKey = key.parse()?;
    println!("{}", usecase(paths)?.get(key).await?);
    Ok(())
}

pub async fn set(paths: &SurfacingPaths, key: &str, value: &str) -> Result<()> {
    let key: SettingKey = key.parse()?;
    let stored = usecase(paths)?.set(key, value).await?;
    println!("{key} = {}", display_value(key, &stored));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn masks_all_but_last_four() {
        assert_eq!(mask(""), "(not set)");
        assert_eq!(mask("abc"), "***");
        assert_eq!(mask("AIzaSyExample1234"), "*************1234");
    }

    #[test]
    fn only_secrets_are_masked() {
        assert_eq!(display_value(SettingKey::ModelName, "gemini-2.5-flash"), "gemini-2.5-flash");
        assert_eq!(display_value(SettingKey::ApiKey, "secret-key"), "******-key");
    }

    #[tokio::test]
    async fn set_then_get_roundtrips_through_the_file() {
        let dir = TempDir::new().unwrap();
        let paths = SurfacingPaths::new(Some(dir.path()));

        set(&paths, "modelName", "gemini-2.5-pro").await.unwrap();
        let stored = usecase(&paths)
            .unwrap()
            .get(SettingKey::ModelName)
            .await
            .unwrap();
        assert_eq!(stored, "gemini-2.5-pro");
        assert!(paths.settings_file().unwrap().exists());
    }

    #[tokio::test]
    async fn unknown_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let paths = SurfacingPaths::new(Some(dir.path()));
        assert!(set(&paths, "colour", "blue").await.is_err());
    }
}
