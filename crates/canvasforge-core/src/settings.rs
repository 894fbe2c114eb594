//! Engine tunables.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Settings load errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tunables for geometry, interaction and object placement.
///
/// Every field has a default, so a settings file only needs to list the
/// values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Smallest allowed zoom level.
    pub min_zoom: f64,
    /// Largest allowed zoom level.
    pub max_zoom: f64,
    /// Additive step used by the zoom in/out controls.
    pub zoom_step: f64,
    /// Zoom change per wheel delta unit.
    pub wheel_zoom_sensitivity: f64,
    /// Minimum frame width while resizing.
    pub min_frame_width: f64,
    /// Minimum image width and height while resizing.
    pub min_image_size: f64,
    /// Width of newly created prompt nodes.
    pub prompt_node_width: f64,
    /// Longest side of a newly added frame, in canvas units.
    pub default_frame_extent: f64,
    /// Longest side of an imported image, in canvas units.
    pub import_max_extent: f64,
    /// Offset between consecutive images of one import batch.
    pub import_cascade_offset: f64,
    /// Display width of provider results.
    pub result_width: f64,
    /// Gap between a source object and the results placed below it.
    pub result_margin: f64,
    /// Handle hit radius in screen pixels.
    pub handle_tolerance: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            min_zoom: 0.1,
            max_zoom: 5.0,
            zoom_step: 0.1,
            wheel_zoom_sensitivity: 0.001,
            min_frame_width: 50.0,
            min_image_size: 20.0,
            prompt_node_width: 250.0,
            default_frame_extent: 512.0,
            import_max_extent: 400.0,
            import_cascade_offset: 20.0,
            result_width: 300.0,
            result_margin: 50.0,
            handle_tolerance: 12.0,
        }
    }
}

impl EngineSettings {
    /// Parse settings from JSON. Missing fields fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::debug!("Loaded engine settings from {}", path.display());
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = EngineSettings::from_json(r#"{ "max_zoom": 8.0 }"#).unwrap();
        assert!((settings.max_zoom - 8.0).abs() < f64::EPSILON);
        assert!((settings.min_zoom - 0.1).abs() < f64::EPSILON);
        assert!((settings.result_width - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            EngineSettings::from_json("{ nope"),
            Err(SettingsError::Parse(_))
        ));
    }
}
