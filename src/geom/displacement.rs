//! Noise displacement along baseline normals.
//!
//! Every vertex of the baseline moves along its captured normal:
//!
//! ```text
//! new[i] = p[i] + n[i] * amplitude * noise(p[i] * frequency)
//! ```
//!
//! Normals are read from the snapshot and never recomputed mid-pass, so a
//! vertex's result depends only on its own baseline data and the parameters.
//! Zone and target selection do not apply here; displacement is whole-mesh.
//!
//! # Example
//!
//! ```ignore
//! use sole_engine::geom::{displace, MeshSnapshot, NoiseKind, NoiseParameters};
//!
//! let baseline = MeshSnapshot::capture(&mesh)?;
//! let params = NoiseParameters::new(NoiseKind::Simplex, 3.0, 0.01, 42);
//! let (positions, diag) = displace(&baseline, &params)?;
//! ```

use super::error::GeomResult;
use super::noise_field::{NoiseField, NoiseParameters};
use super::snapshot::MeshSnapshot;
use super::{Point3, Vec3};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Summary of one displacement pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplacementDiagnostics {
    /// Number of vertices displaced (always the full baseline).
    pub vertex_count: usize,
    /// Smallest signed offset applied along a normal.
    pub min_offset: f64,
    /// Largest signed offset applied along a normal.
    pub max_offset: f64,
    /// Mean absolute offset.
    pub mean_abs_offset: f64,
}

/// Displace every baseline vertex along its normal by the noise field.
///
/// Returns the new positions in baseline order; the caller decides whether to
/// commit them.
///
/// # Errors
/// `InvalidParameter` when `params` fails validation. Nothing is computed in
/// that case.
pub fn displace(
    baseline: &MeshSnapshot,
    params: &NoiseParameters,
) -> GeomResult<(Vec<[f64; 3]>, DisplacementDiagnostics)> {
    params.validate()?;

    let field = NoiseField::from_params(params);
    let offsets = compute_offsets(baseline.positions(), &field, params);
    let positions = apply_offsets(baseline.positions(), baseline.normals(), &offsets);
    let diagnostics = summarize(&offsets);

    log::debug!(
        "displaced {} vertices ({} f={} a={} seed={}): offset range [{:.6}, {:.6}]",
        diagnostics.vertex_count,
        params.kind,
        params.frequency,
        params.amplitude,
        params.seed,
        diagnostics.min_offset,
        diagnostics.max_offset,
    );

    Ok((positions, diagnostics))
}

fn offset_at(position: &[f64; 3], field: &NoiseField, params: &NoiseParameters) -> f64 {
    params.amplitude * field.sample_scaled(Point3::from_array(*position), params.frequency)
}

cfg_if::cfg_if! {
    if #[cfg(feature = "parallel")] {
        fn compute_offsets(positions: &[[f64; 3]], field: &NoiseField, params: &NoiseParameters) -> Vec<f64> {
            positions
                .par_iter()
                .map(|p| offset_at(p, field, params))
                .collect()
        }
    } else {
        fn compute_offsets(positions: &[[f64; 3]], field: &NoiseField, params: &NoiseParameters) -> Vec<f64> {
            positions.iter().map(|p| offset_at(p, field, params)).collect()
        }
    }
}

fn apply_offsets(positions: &[[f64; 3]], normals: &[[f64; 3]], offsets: &[f64]) -> Vec<[f64; 3]> {
    positions
        .iter()
        .zip(normals)
        .zip(offsets)
        .map(|((p, n), &offset)| {
            let moved = Point3::from_array(*p) + Vec3::from_array(*n) * offset;
            moved.to_array()
        })
        .collect()
}

fn summarize(offsets: &[f64]) -> DisplacementDiagnostics {
    if offsets.is_empty() {
        return DisplacementDiagnostics::default();
    }

    let mut min_offset = f64::MAX;
    let mut max_offset = f64::MIN;
    let mut abs_sum = 0.0;
    for &v in offsets {
        min_offset = min_offset.min(v);
        max_offset = max_offset.max(v);
        abs_sum += v.abs();
    }

    DisplacementDiagnostics {
        vertex_count: offsets.len(),
        min_offset,
        max_offset,
        mean_abs_offset: abs_sum / offsets.len() as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{GeomError, Mesh, NoiseKind};

    fn make_quad_snapshot() -> MeshSnapshot {
        let mesh = Mesh::new(
            vec![
                [0.1, 0.2, 0.0],
                [1.3, 0.2, 0.0],
                [1.3, 1.7, 0.0],
                [0.1, 1.7, 0.0],
            ],
            vec![vec![0, 1, 2, 3]],
        );
        MeshSnapshot::capture(&mesh).unwrap()
    }

    #[test]
    fn test_zero_amplitude_is_identity() {
        let baseline = make_quad_snapshot();
        let params = NoiseParameters::new(NoiseKind::Perlin, 2.0, 0.0, 5);
        let (positions, diag) = displace(&baseline, &params).unwrap();
        assert_eq!(positions, baseline.positions());
        assert_eq!(diag.max_offset, 0.0);
    }

    #[test]
    fn test_moves_only_along_normal() {
        let baseline = make_quad_snapshot();
        let params = NoiseParameters::new(NoiseKind::Simplex, 1.7, 0.5, 3);
        let (positions, _) = displace(&baseline, &params).unwrap();
        for (new, old) in positions.iter().zip(baseline.positions()) {
            assert_eq!(new[0], old[0]);
            assert_eq!(new[1], old[1]);
            assert!(new[2].abs() <= 0.5);
        }
    }

    #[test]
    fn test_negative_amplitude_mirrors_offset() {
        let baseline = make_quad_snapshot();
        let up = NoiseParameters::new(NoiseKind::Perlin, 1.9, 0.25, 11);
        let down = NoiseParameters { amplitude: -0.25, ..up };
        let (a, _) = displace(&baseline, &up).unwrap();
        let (b, _) = displace(&baseline, &down).unwrap();
        for (pa, pb) in a.iter().zip(&b) {
            assert_eq!(pa[2], -pb[2]);
        }
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let baseline = make_quad_snapshot();
        let params = NoiseParameters::new(NoiseKind::Perlin, 0.0, 0.1, 0);
        assert!(matches!(
            displace(&baseline, &params),
            Err(GeomError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_summarize_stats() {
        let diag = summarize(&[-0.5, 0.25, 0.25]);
        assert_eq!(diag.vertex_count, 3);
        assert_eq!(diag.min_offset, -0.5);
        assert_eq!(diag.max_offset, 0.25);
        assert!((diag.mean_abs_offset - 1.0 / 3.0).abs() < 1e-12);
    }
}
