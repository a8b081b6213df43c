//! Seeded scalar noise fields.
//!
//! Both families come from the `noise` crate, pinned to an exact release in
//! `Cargo.toml`: presets store seeds, and a seed must keep producing the same
//! field for as long as presets exist.
//!
//! - [`NoiseKind::Perlin`]: improved Perlin gradient noise (`noise::Perlin`).
//! - [`NoiseKind::Simplex`]: 3D simplex gradient noise (`noise::Simplex`).
//!
//! The 64-bit user seed is folded into the crate's 32-bit seed by
//! [`seed_hash`], a SplitMix64 finalizer using only integer ops.

use std::fmt;
use std::str::FromStr;

use noise::{NoiseFn, Perlin, Simplex};
use serde::{Deserialize, Serialize};

use super::Point3;
use super::error::{GeomError, GeomResult, require_finite, require_positive};

/// Noise family used for displacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NoiseKind {
    Perlin,
    Simplex,
}

impl NoiseKind {
    pub const ALL: [Self; 2] = [Self::Perlin, Self::Simplex];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Perlin => "PERLIN",
            Self::Simplex => "SIMPLEX",
        }
    }
}

impl fmt::Display for NoiseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NoiseKind {
    type Err = GeomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                GeomError::invalid("noise_type", format!("unknown noise type `{s}`"))
            })
    }
}

/// Parameters of one noise displacement pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseParameters {
    #[serde(rename = "noise_type")]
    pub kind: NoiseKind,
    /// Spatial frequency; positions are multiplied by it before sampling.
    pub frequency: f64,
    /// Displacement scale along the normal. Negative values push inward.
    pub amplitude: f64,
    pub seed: i64,
}

impl NoiseParameters {
    #[must_use]
    pub const fn new(kind: NoiseKind, frequency: f64, amplitude: f64, seed: i64) -> Self {
        Self {
            kind,
            frequency,
            amplitude,
            seed,
        }
    }

    /// # Errors
    /// `InvalidParameter` when `frequency` is not a finite positive number or
    /// `amplitude` is not finite.
    pub fn validate(&self) -> GeomResult<()> {
        require_positive("frequency", self.frequency)?;
        require_finite("amplitude", self.amplitude)
    }
}

impl Default for NoiseParameters {
    fn default() -> Self {
        Self::new(NoiseKind::Perlin, 1.0, 0.0, 0)
    }
}

/// Fold a signed 64-bit seed into the 32-bit seed the generators take.
#[must_use]
pub const fn seed_hash(seed: i64) -> u32 {
    let mut z = (seed as u64).wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    ((z >> 32) as u32) ^ (z as u32)
}

#[derive(Clone)]
enum Generator {
    Perlin(Perlin),
    Simplex(Simplex),
}

/// A seeded generator for one noise family, sampled at unit frequency.
///
/// Build it once per operation and share it across vertices; sampling takes
/// `&self` and has no interior state.
#[derive(Clone)]
pub struct NoiseField {
    kind: NoiseKind,
    generator: Generator,
}

impl NoiseField {
    #[must_use]
    pub fn new(kind: NoiseKind, seed: i64) -> Self {
        let seed = seed_hash(seed);
        let generator = match kind {
            NoiseKind::Perlin => Generator::Perlin(Perlin::new(seed)),
            NoiseKind::Simplex => Generator::Simplex(Simplex::new(seed)),
        };
        Self { kind, generator }
    }

    #[must_use]
    pub fn from_params(params: &NoiseParameters) -> Self {
        Self::new(params.kind, params.seed)
    }

    #[must_use]
    pub const fn kind(&self) -> NoiseKind {
        self.kind
    }

    /// Raw sample at `p`, clamped to `[-1, 1]`.
    #[must_use]
    pub fn sample(&self, p: Point3) -> f64 {
        let point = p.to_array();
        let value = match &self.generator {
            Generator::Perlin(g) => g.get(point),
            Generator::Simplex(g) => g.get(point),
        };
        if value.is_finite() {
            value.clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }

    /// Sample at `p * frequency`.
    #[must_use]
    pub fn sample_scaled(&self, p: Point3, frequency: f64) -> f64 {
        self.sample(Point3::new(p.x * frequency, p.y * frequency, p.z * frequency))
    }
}

impl fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoiseField").field("kind", &self.kind).finish()
    }
}

/// Evaluate the field described by `params` at `point`.
///
/// Returns a value in `[-1, 1]`. Identical inputs always give identical
/// outputs.
///
/// # Errors
/// `InvalidParameter` when `params` fails validation.
pub fn evaluate(point: Point3, params: &NoiseParameters) -> GeomResult<f64> {
    params.validate()?;
    Ok(NoiseField::from_params(params).sample_scaled(point, params.frequency))
}
