// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Saved passthrough style preferences.

use serde::{Deserialize, Serialize};

/// Config key the preferences are stored under.
pub const PREFS_KEY: &str = "passthrough_prefs";

/// Initial passthrough style applied when a session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassthroughPrefs {
    /// Passthrough texture opacity, 0..=1.
    pub texture_opacity_factor: f32,
    /// Edge color RGBA; alpha 0 disables edges.
    pub edge_color: [f32; 4],
    /// Optional color adjustment preset.
    pub brightness_contrast_saturation: Option<BcsPreset>,
}

impl Default for PassthroughPrefs {
    fn default() -> Self {
        Self {
            texture_opacity_factor: 1.0,
            edge_color: [0.0; 4],
            brightness_contrast_saturation: None,
        }
    }
}

/// Brightness, contrast and saturation values for the color adjustment
/// filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BcsPreset {
    /// Brightness, -100..=100.
    pub brightness: f32,
    /// Contrast, >= 0.
    pub contrast: f32,
    /// Saturation, >= 0.
    pub saturation: f32,
}

impl Default for BcsPreset {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            contrast: 1.0,
            saturation: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let prefs: PassthroughPrefs =
            serde_json::from_str(r#"{ "texture_opacity_factor": 0.5 }"#).unwrap();
        assert_eq!(prefs.texture_opacity_factor, 0.5);
        assert_eq!(prefs.edge_color, [0.0; 4]);
        assert!(prefs.brightness_contrast_saturation.is_none());
    }

    #[test]
    fn preset_serializes_by_field_name() {
        let prefs = PassthroughPrefs {
            brightness_contrast_saturation: Some(BcsPreset {
                brightness: 10.0,
                ..BcsPreset::default()
            }),
            ..PassthroughPrefs::default()
        };
        let json = serde_json::to_value(&prefs).unwrap();
        assert_eq!(
            json["brightness_contrast_saturation"]["brightness"],
            serde_json::json!(10.0)
        );
    }
}
