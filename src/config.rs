use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geom::{GeomError, Tolerance, ZoneClassifier, ZoneLayout};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] GeomError),
}

/// Engine settings that are not part of a preset.
///
/// Every field has a default, so a JSON document only needs the keys it
/// overrides:
///
/// ```json
/// { "zones": { "axis": "X", "blend_margin": 0.0 } }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaperConfig {
    pub zones: ZoneLayout,
    /// Extents at or below this length count as degenerate.
    pub tolerance: f64,
}

impl ShaperConfig {
    #[must_use]
    pub const fn zones(mut self, zones: ZoneLayout) -> Self {
        self.zones = zones;
        self
    }

    #[must_use]
    pub const fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// # Errors
    /// `InvalidParameter` for a bad zone layout or a negative or non-finite
    /// tolerance.
    pub fn validate(&self) -> Result<(), GeomError> {
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(GeomError::InvalidParameter {
                name: "tolerance",
                reason: format!("must be finite and >= 0, got {}", self.tolerance),
            });
        }
        self.zones.validate()
    }

    /// Classifier for this configuration.
    ///
    /// # Errors
    /// Same as [`ShaperConfig::validate`].
    pub fn classifier(&self) -> Result<ZoneClassifier, GeomError> {
        self.validate()?;
        ZoneClassifier::new(self.zones, Tolerance::new(self.tolerance))
    }

    /// Parse and validate a JSON document.
    ///
    /// # Errors
    /// `Json` when the text does not parse, `Invalid` when a value is out of
    /// range.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// As [`ShaperConfig::from_json_str`], plus `Io` when the file cannot be
    /// read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

impl Default for ShaperConfig {
    fn default() -> Self {
        Self {
            zones: ZoneLayout::default(),
            tolerance: Tolerance::DEFAULT.eps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::SoleAxis;

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config =
            ShaperConfig::from_json_str(r#"{ "zones": { "axis": "X", "blend_margin": 0.0 } }"#)
                .unwrap();
        assert_eq!(config.zones.axis, SoleAxis::X);
        assert_eq!(config.zones.blend_margin, 0.0);
        assert_eq!(config.zones.heel_end, ZoneLayout::DEFAULT_HEEL_END);
        assert_eq!(config.tolerance, ShaperConfig::default().tolerance);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(ShaperConfig::from_json_str("{}").unwrap(), ShaperConfig::default());
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let result = ShaperConfig::from_json_str(r#"{ "zones": { "heel_end": 0.8 } }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = ShaperConfig::from_json_str(r#"{ "tolerance": -1.0 }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        assert!(matches!(
            ShaperConfig::from_json_str(r#"{ "zones": { "axis": "W" } }"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_builder_and_classifier() {
        let config = ShaperConfig::default()
            .zones(ZoneLayout::default().thresholds(0.25, 0.75))
            .tolerance(1e-6);
        let classifier = config.classifier().unwrap();
        assert_eq!(classifier.layout().band(crate::geom::Zone::Toe), (0.75, 1.0));
    }
}
