//! Procedural base mesh for a shoe sole.
//!
//! The sole runs along +X with the heel at `x = 0`. Its outline widens from
//! the heel to the ball of the foot and rounds off at both ends. The slab is
//! closed: a top grid at `z = thickness`, a bottom grid at `z = 0`, and a ring
//! of side quads joining their boundaries. All faces wind outward.

use super::Mesh;
use super::error::{GeomError, GeomResult, require_positive};

/// Outline and resolution of the generated sole.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoleProfile {
    /// Heel-to-toe length.
    pub length: f64,
    /// Width at the heel.
    pub heel_width: f64,
    /// Width at the ball of the foot.
    pub ball_width: f64,
    pub thickness: f64,
    /// Grid cells along the length.
    pub length_segments: usize,
    /// Grid cells across the width.
    pub width_segments: usize,
}

impl SoleProfile {
    /// Create a profile with the default resolution.
    #[must_use]
    pub const fn new(length: f64, heel_width: f64, ball_width: f64, thickness: f64) -> Self {
        Self {
            length,
            heel_width,
            ball_width,
            thickness,
            length_segments: 24,
            width_segments: 8,
        }
    }

    /// Set the grid resolution.
    #[must_use]
    pub const fn resolution(mut self, length_segments: usize, width_segments: usize) -> Self {
        self.length_segments = length_segments;
        self.width_segments = width_segments;
        self
    }

    /// # Errors
    /// `InvalidParameter` for non-positive dimensions or a zero resolution.
    pub fn validate(&self) -> GeomResult<()> {
        require_positive("length", self.length)?;
        require_positive("heel_width", self.heel_width)?;
        require_positive("ball_width", self.ball_width)?;
        require_positive("thickness", self.thickness)?;
        if self.length_segments == 0 || self.width_segments == 0 {
            return Err(GeomError::invalid(
                "resolution",
                format!(
                    "need at least one segment each way, got {}x{}",
                    self.length_segments, self.width_segments
                ),
            ));
        }
        Ok(())
    }

    /// Number of vertices the generated mesh will have.
    #[must_use]
    pub const fn vertex_count(&self) -> usize {
        2 * (self.length_segments + 1) * (self.width_segments + 1)
    }

    /// Half the outline width at normalized length `u` in `[0, 1]`.
    fn half_width(&self, u: f64) -> f64 {
        let widening = smoothstep(0.2, 0.65, u);
        let width = self.heel_width + (self.ball_width - self.heel_width) * widening;
        let heel_round = 1.0 - 0.3 * (1.0 - smoothstep(0.0, 0.1, u));
        let toe_taper = 1.0 - 0.45 * smoothstep(0.8, 1.0, u);
        0.5 * width * heel_round * toe_taper
    }
}

impl Default for SoleProfile {
    fn default() -> Self {
        Self::new(0.28, 0.065, 0.10, 0.02)
    }
}

fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Build the sole slab described by `profile`.
///
/// # Errors
/// `InvalidParameter` when the profile fails validation.
pub fn sole_mesh(profile: &SoleProfile) -> GeomResult<Mesh> {
    profile.validate()?;
    Ok(build(profile))
}

/// The built-in base sole at the default profile.
#[must_use]
pub fn default_sole_mesh() -> Mesh {
    build(&SoleProfile::default())
}

fn build(profile: &SoleProfile) -> Mesh {
    let rows = profile.length_segments;
    let cols = profile.width_segments;
    let layer = (rows + 1) * (cols + 1);

    let mut positions = Vec::with_capacity(2 * layer);
    for z in [profile.thickness, 0.0] {
        for i in 0..=rows {
            let u = i as f64 / rows as f64;
            let half = profile.half_width(u);
            for j in 0..=cols {
                let v = j as f64 / cols as f64;
                positions.push([u * profile.length, (2.0 * v - 1.0) * half, z]);
            }
        }
    }

    let top = |i: usize, j: usize| (i * (cols + 1) + j) as u32;
    let bottom = |i: usize, j: usize| (layer + i * (cols + 1) + j) as u32;

    let mut faces = Vec::with_capacity(2 * rows * cols + 2 * (rows + cols));
    for i in 0..rows {
        for j in 0..cols {
            faces.push(vec![top(i, j), top(i + 1, j), top(i + 1, j + 1), top(i, j + 1)]);
            faces.push(vec![
                bottom(i, j),
                bottom(i, j + 1),
                bottom(i + 1, j + 1),
                bottom(i + 1, j),
            ]);
        }
    }

    // Grid boundary, counter-clockwise seen from +Z.
    let mut ring = Vec::with_capacity(2 * (rows + cols));
    ring.extend((0..rows).map(|i| (i, 0)));
    ring.extend((0..cols).map(|j| (rows, j)));
    ring.extend((1..=rows).rev().map(|i| (i, cols)));
    ring.extend((1..=cols).rev().map(|j| (0, j)));

    for (k, &(ia, ja)) in ring.iter().enumerate() {
        let (ib, jb) = ring[(k + 1) % ring.len()];
        faces.push(vec![bottom(ia, ja), bottom(ib, jb), top(ib, jb), top(ia, ja)]);
    }

    Mesh::new(positions, faces)
}
