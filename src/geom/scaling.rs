//! Anisotropic scaling of a weighted vertex set.
//!
//! Vertices are scaled about the bounding-box center of the baseline. A vertex
//! with zone weight `w` gets the per-axis factor `1 + w * (s - 1)`, so weight 1
//! is the closed form `origin + (p - origin) * s` and weight 0 leaves the
//! vertex where it was. Vertices outside the selection, and any axis whose
//! factor is exactly 1, keep their baseline coordinates bit for bit.

use serde::{Deserialize, Serialize};

use super::error::{GeomResult, require_positive};
use super::snapshot::MeshSnapshot;
use super::zones::ZoneSelection;
use super::{Point3, Vec3};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleParameters {
    pub scale_x: f64,
    pub scale_y: f64,
    pub scale_z: f64,
}

impl ScaleParameters {
    pub const IDENTITY: Self = Self::new(1.0, 1.0, 1.0);

    #[must_use]
    pub const fn new(scale_x: f64, scale_y: f64, scale_z: f64) -> Self {
        Self {
            scale_x,
            scale_y,
            scale_z,
        }
    }

    #[must_use]
    pub const fn uniform(s: f64) -> Self {
        Self::new(s, s, s)
    }

    /// # Errors
    /// `InvalidParameter` when any factor is not a finite positive number.
    pub fn validate(&self) -> GeomResult<()> {
        require_positive("scale_x", self.scale_x)?;
        require_positive("scale_y", self.scale_y)?;
        require_positive("scale_z", self.scale_z)
    }

    /// Factors for a vertex of zone weight `weight`.
    #[must_use]
    pub fn blended(&self, weight: f64) -> Vec3 {
        let blend = |s: f64| 1.0 + weight * (s - 1.0);
        Vec3::new(blend(self.scale_x), blend(self.scale_y), blend(self.scale_z))
    }
}

impl Default for ScaleParameters {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalingDiagnostics {
    /// Vertices in the working set.
    pub scaled_count: usize,
    /// Of those, vertices scaled with a partial blend weight.
    pub blended_count: usize,
    pub origin: Point3,
}

/// Scale the selected baseline vertices about the baseline's bbox center.
///
/// # Errors
/// `InvalidParameter` when `params` fails validation.
pub fn scale(
    baseline: &MeshSnapshot,
    selection: &ZoneSelection,
    params: &ScaleParameters,
) -> GeomResult<(Vec<[f64; 3]>, ScalingDiagnostics)> {
    params.validate()?;

    let origin = baseline.bbox().center();
    let positions = scale_positions(baseline.positions(), selection, params, origin);

    let diagnostics = ScalingDiagnostics {
        scaled_count: selection.len(),
        blended_count: selection.blended_count(),
        origin,
    };

    log::debug!(
        "scaled {} / {} vertices by ({}, {}, {}) about {:?}, {} blended",
        diagnostics.scaled_count,
        baseline.vertex_count(),
        params.scale_x,
        params.scale_y,
        params.scale_z,
        origin,
        diagnostics.blended_count,
    );

    Ok((positions, diagnostics))
}

fn scale_vertex(
    index: usize,
    position: &[f64; 3],
    selection: &ZoneSelection,
    params: &ScaleParameters,
    origin: Point3,
) -> [f64; 3] {
    if !selection.contains(index) {
        return *position;
    }
    let factors = params.blended(selection.weight(index)).to_array();
    let origin = origin.to_array();
    let mut scaled = *position;
    for axis in 0..3 {
        // A unit factor keeps the coordinate bit-exact.
        if factors[axis] != 1.0 {
            scaled[axis] = origin[axis] + (position[axis] - origin[axis]) * factors[axis];
        }
    }
    scaled
}

cfg_if::cfg_if! {
    if #[cfg(feature = "parallel")] {
        fn scale_positions(
            positions: &[[f64; 3]],
            selection: &ZoneSelection,
            params: &ScaleParameters,
            origin: Point3,
        ) -> Vec<[f64; 3]> {
            positions
                .par_iter()
                .enumerate()
                .map(|(i, p)| scale_vertex(i, p, selection, params, origin))
                .collect()
        }
    } else {
        fn scale_positions(
            positions: &[[f64; 3]],
            selection: &ZoneSelection,
            params: &ScaleParameters,
            origin: Point3,
        ) -> Vec<[f64; 3]> {
            positions
                .iter()
                .enumerate()
                .map(|(i, p)| scale_vertex(i, p, selection, params, origin))
                .collect()
        }
    }
}
