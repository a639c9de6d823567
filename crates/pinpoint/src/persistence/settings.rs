/*! Settings and theme persistence. */

use super::Storage;
use crate::fallible::{succeeded, swallow};
use crate::types::{PinpointResult, Settings, SettingsPatch, Theme};

/// Storage key of the JSON settings object.
pub const SETTINGS_KEY: &str = "annotation-settings";
/// Theme is also stored on its own so the toolbar can paint before settings load.
pub const THEME_KEY: &str = "annotation-theme";

fn stored_patch(storage: &dyn Storage) -> Option<SettingsPatch> {
  let raw = swallow("load settings", storage.get(SETTINGS_KEY)).flatten()?;
  swallow("load settings", serde_json::from_str(&raw).map_err(Into::into))
}

/// Defaults, then stored settings, then the stored theme, then `overrides`.
///
/// Unknown or malformed stored fields are ignored.
pub fn load_settings(storage: &dyn Storage, overrides: &SettingsPatch) -> Settings {
  let mut settings = Settings::default();
  if let Some(stored) = stored_patch(storage) {
    settings.apply(&stored);
  }
  if let Some(theme) = load_theme(storage) {
    settings.theme = theme;
  }
  settings.apply(overrides);
  settings
}

/// Store the settings and, separately, the theme. False (logged) on failure.
pub fn save_settings(storage: &dyn Storage, settings: &Settings) -> bool {
  let write = || -> PinpointResult<()> {
    storage.set(SETTINGS_KEY, &serde_json::to_string(settings)?)?;
    storage.set(THEME_KEY, &serde_json::to_string(&settings.theme)?)
  };
  succeeded("save settings", write())
}

/// Stored theme, accepting both JSON strings and bare words.
pub fn load_theme(storage: &dyn Storage) -> Option<Theme> {
  let raw = swallow("load theme", storage.get(THEME_KEY)).flatten()?;
  // Older writers stored the bare word rather than a JSON string.
  serde_json::from_str(&raw)
    .or_else(|_| serde_json::from_value(serde_json::Value::String(raw.trim().to_string())))
    .map_err(|e| log::warn!("[load theme] ignoring stored theme {raw:?}: {e}"))
    .ok()
}

/// Store only the theme. False (logged) on failure.
pub fn save_theme(storage: &dyn Storage, theme: Theme) -> bool {
  let write = || -> PinpointResult<()> { storage.set(THEME_KEY, &serde_json::to_string(&theme)?) };
  succeeded("save theme", write())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::persistence::MemoryStorage;
  use crate::types::{OutputLevel, ToolbarPosition};

  #[test]
  fn empty_storage_gives_defaults_plus_overrides() {
    let storage = MemoryStorage::new();
    let overrides = SettingsPatch {
      output_level: Some(OutputLevel::Detailed),
      ..SettingsPatch::default()
    };
    let settings = load_settings(&storage, &overrides);
    assert_eq!(settings, Settings {
      output_level: OutputLevel::Detailed,
      ..Settings::default()
    });
  }

  #[test]
  fn stored_values_merge_under_overrides() {
    let storage = MemoryStorage::new();
    storage
      .set(SETTINGS_KEY, r#"{"toolbarPosition":"top-left","outputLevel":"compact","bogus":1}"#)
      .unwrap();
    let overrides = SettingsPatch {
      output_level: Some(OutputLevel::Forensic),
      ..SettingsPatch::default()
    };
    let settings = load_settings(&storage, &overrides);
    assert_eq!(settings.toolbar_position, ToolbarPosition::TopLeft);
    assert_eq!(settings.output_level, OutputLevel::Forensic);
  }

  #[test]
  fn malformed_settings_fall_back_to_defaults() {
    let storage = MemoryStorage::new();
    storage.set(SETTINGS_KEY, "][").unwrap();
    assert_eq!(load_settings(&storage, &SettingsPatch::default()), Settings::default());
  }

  #[test]
  fn save_then_load() {
    let storage = MemoryStorage::new();
    let settings = Settings {
      theme: Theme::Light,
      show_tooltips: false,
      ..Settings::default()
    };
    assert!(save_settings(&storage, &settings));
    assert_eq!(load_settings(&storage, &SettingsPatch::default()), settings);
    assert_eq!(load_theme(&storage), Some(Theme::Light));
  }

  #[test]
  fn theme_key_accepts_bare_word() {
    let storage = MemoryStorage::new();
    storage.set(THEME_KEY, "light").unwrap();
    assert_eq!(load_theme(&storage), Some(Theme::Light));
    assert!(save_theme(&storage, Theme::Dark));
    assert_eq!(storage.get(THEME_KEY).unwrap().as_deref(), Some("\"dark\""));
  }
}
