/*!
User settings.

Stored values are merged over defaults on load, then explicit overrides are
applied on top (see `persistence::settings`).
*/

use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Theme {
  Light,
  #[default]
  Dark,
}

/// How much detail exports and element collection include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum OutputLevel {
  Compact,
  #[default]
  Standard,
  Detailed,
  Forensic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum ToolbarPosition {
  #[default]
  BottomRight,
  BottomLeft,
  TopRight,
  TopLeft,
}

pub const DEFAULT_ANNOTATION_COLOR: &str = "#3c82f7";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
#[allow(clippy::struct_excessive_bools)]
pub struct Settings {
  pub theme: Theme,
  pub output_level: OutputLevel,
  pub toolbar_position: ToolbarPosition,
  pub annotation_color: String,
  pub block_interactions: bool,
  pub auto_clear_after_copy: bool,
  pub show_tooltips: bool,
  pub show_marker_numbers: bool,
  pub persist_annotations: bool,
  pub freeze_on_annotation: bool,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      theme: Theme::default(),
      output_level: OutputLevel::default(),
      toolbar_position: ToolbarPosition::default(),
      annotation_color: DEFAULT_ANNOTATION_COLOR.to_string(),
      block_interactions: false,
      auto_clear_after_copy: false,
      show_tooltips: true,
      show_marker_numbers: true,
      persist_annotations: true,
      freeze_on_annotation: false,
    }
  }
}

/// Partial settings: every field optional. Used both for tolerant parsing of
/// stored blobs and for explicit overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct SettingsPatch {
  pub theme: Option<Theme>,
  pub output_level: Option<OutputLevel>,
  pub toolbar_position: Option<ToolbarPosition>,
  pub annotation_color: Option<String>,
  pub block_interactions: Option<bool>,
  pub auto_clear_after_copy: Option<bool>,
  pub show_tooltips: Option<bool>,
  pub show_marker_numbers: Option<bool>,
  pub persist_annotations: Option<bool>,
  pub freeze_on_annotation: Option<bool>,
}

impl Settings {
  /// Overwrite every field the patch sets.
  pub fn apply(&mut self, patch: &SettingsPatch) {
    if let Some(v) = patch.theme {
      self.theme = v;
    }
    if let Some(v) = patch.output_level {
      self.output_level = v;
    }
    if let Some(v) = patch.toolbar_position {
      self.toolbar_position = v;
    }
    if let Some(ref v) = patch.annotation_color {
      self.annotation_color.clone_from(v);
    }
    if let Some(v) = patch.block_interactions {
      self.block_interactions = v;
    }
    if let Some(v) = patch.auto_clear_after_copy {
      self.auto_clear_after_copy = v;
    }
    if let Some(v) = patch.show_tooltips {
      self.show_tooltips = v;
    }
    if let Some(v) = patch.show_marker_numbers {
      self.show_marker_numbers = v;
    }
    if let Some(v) = patch.persist_annotations {
      self.persist_annotations = v;
    }
    if let Some(v) = patch.freeze_on_annotation {
      self.freeze_on_annotation = v;
    }
  }

  /// `self` with `patch` applied.
  #[must_use]
  pub fn merged(mut self, patch: &SettingsPatch) -> Self {
    self.apply(patch);
    self
  }
}
