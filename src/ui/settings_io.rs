use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::warn;

use crate::ui::settings::ClientSettings;

fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("battle_client");
    path.push("settings.json");
    path
}

pub fn load_settings() -> ClientSettings {
    load_from(&settings_path())
}

/// Saves to the user config dir and returns where the file went.
pub fn save_settings(settings: &ClientSettings) -> anyhow::Result<PathBuf> {
    let path = settings_path();
    save_to(&path, settings)?;
    Ok(path)
}

fn load_from(path: &Path) -> ClientSettings {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(_) => return ClientSettings::default(),
    };
    let mut settings: ClientSettings = serde_json::from_str(&text).unwrap_or_else(|e| {
        warn!("ignoring unreadable settings at {}: {e}", path.display());
        ClientSettings::default()
    });
    let scale = settings.scale();
    if scale != settings.ui_scale {
        warn!("ui_scale {} out of range, using {scale}", settings.ui_scale);
        settings.ui_scale = scale;
    }
    settings
}

fn save_to(path: &Path, settings: &ClientSettings) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(settings).context("serializing settings")?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("battle_client_test_{}_{name}", std::process::id()))
            .join("settings.json")
    }

    #[test]
    fn saved_settings_load_back() {
        let path = scratch("roundtrip");
        let mut settings = ClientSettings::default();
        settings.api.api_base = "http://10.0.0.2:8000".into();
        settings.default_classes = vec!["paladin".into()];

        save_to(&path, &settings).unwrap();
        assert_eq!(load_from(&path), settings);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn missing_or_corrupt_files_give_defaults() {
        let path = scratch("corrupt");
        assert_eq!(load_from(&path), ClientSettings::default());

        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_from(&path), ClientSettings::default());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn out_of_range_scale_is_pulled_back() {
        let path = scratch("scale");
        fs::create_dir_all(path.parent().unwrap()).unwrap();

        fs::write(&path, r#"{"ui_scale": 0}"#).unwrap();
        assert_eq!(load_from(&path).ui_scale, 0.75);

        fs::write(&path, r#"{"ui_scale": 40.0}"#).unwrap();
        assert_eq!(load_from(&path).ui_scale, 2.0);

        fs::write(&path, r#"{"ui_scale": 1.25}"#).unwrap();
        assert_eq!(load_from(&path).ui_scale, 1.25);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
