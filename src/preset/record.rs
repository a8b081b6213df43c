use serde::{Deserialize, Serialize};

use super::store::{PresetError, PresetResult};
use crate::geom::{NoiseParameters, ScaleParameters, ZoneSelector};

/// Everything needed to replay a shaping pass from the pristine mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetRecord {
    pub name: String,
    pub noise: NoiseParameters,
    pub scale: ScaleParameters,
    pub selector: ZoneSelector,
}

impl PresetRecord {
    /// # Errors
    /// [`PresetError::InvalidName`] when `name` is blank.
    pub fn new(
        name: &str,
        noise: NoiseParameters,
        scale: ScaleParameters,
        selector: ZoneSelector,
    ) -> PresetResult<Self> {
        Ok(Self {
            name: normalize_name(name)?,
            noise,
            scale,
            selector,
        })
    }

    /// # Errors
    /// [`PresetError::InvalidRecord`] when the noise or scale parameters are
    /// out of range.
    pub fn validate(&self) -> PresetResult<()> {
        self.noise.validate()?;
        self.scale.validate()?;
        Ok(())
    }
}

/// Trim a preset name, rejecting names that are empty afterwards.
pub(crate) fn normalize_name(name: &str) -> PresetResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(PresetError::InvalidName(name.to_string()));
    }
    Ok(trimmed.to_string())
}
