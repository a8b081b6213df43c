//! Longitudinal zone classification along the sole axis.
//!
//! Each vertex gets a normalized coordinate `t = (c - min) / (max - min)` along
//! the sole axis, computed from the baseline's bounding box at classification
//! time. Fixed thresholds on `t` split the sole into three bands:
//!
//! ```text
//! 0 ────── heel_end ────────── toe_start ────── 1
//! │  HEEL   │        MIDFOOT        │    TOE     │
//! ```
//!
//! Bands are half-open (`[lo, hi)`) except the last, which is closed so the
//! vertex at the maximum belongs to TOE. Every vertex belongs to exactly one
//! band.
//!
//! Scaling a sub-zone uses weights rather than hard membership: inside a band
//! the weight is 1, and across each internal boundary it ramps linearly over
//! `blend_margin` (centred on the boundary). The ramps of two adjacent zones
//! sum to 1, so the three weight functions form a partition of unity. A
//! margin of zero gives hard cutoffs.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{GeomError, GeomResult};
use super::{Axis, BBox, Point3, Tolerance};

/// Named region of the sole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Zone {
    /// The whole mesh; the union of all sub-zones.
    Full,
    Heel,
    Midfoot,
    Toe,
}

impl Zone {
    pub const ALL: [Self; 4] = [Self::Full, Self::Heel, Self::Midfoot, Self::Toe];
    /// The sub-zones in order along the sole axis.
    pub const SUB_ZONES: [Self; 3] = [Self::Heel, Self::Midfoot, Self::Toe];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Full => "FULL",
            Self::Heel => "HEEL",
            Self::Midfoot => "MIDFOOT",
            Self::Toe => "TOE",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Zone {
    type Err = GeomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|zone| zone.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GeomError::invalid("zone", format!("unknown zone `{s}`")))
    }
}

/// Which vertices of a zone an operation may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Target {
    #[default]
    All,
    /// Only vertices the host reports as selected.
    Selected,
}

impl Target {
    pub const ALL: [Self; 2] = [Self::All, Self::Selected];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Selected => "SELECTED",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Target {
    type Err = GeomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|target| target.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GeomError::invalid("target", format!("unknown target `{s}`")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneSelector {
    pub zone: Zone,
    pub target: Target,
}

impl ZoneSelector {
    #[must_use]
    pub const fn new(zone: Zone, target: Target) -> Self {
        Self { zone, target }
    }

    /// The whole mesh, ignoring selection.
    pub const FULL_ALL: Self = Self::new(Zone::Full, Target::All);
}

impl Default for ZoneSelector {
    fn default() -> Self {
        Self::FULL_ALL
    }
}

/// Axis the sole runs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SoleAxis {
    X,
    Y,
    Z,
    /// The axis with the largest bounding-box extent (ties: X, then Y, then Z).
    #[default]
    Auto,
}

impl SoleAxis {
    #[must_use]
    pub fn resolve(self, bbox: BBox) -> Axis {
        match self {
            Self::X => Axis::X,
            Self::Y => Axis::Y,
            Self::Z => Axis::Z,
            Self::Auto => bbox.longest_axis(),
        }
    }
}

/// Band thresholds and blending for zone classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneLayout {
    pub axis: SoleAxis,
    /// End of HEEL / start of MIDFOOT, in normalized coordinates.
    pub heel_end: f64,
    /// End of MIDFOOT / start of TOE, in normalized coordinates.
    pub toe_start: f64,
    /// Width of the linear blend across each internal boundary. Zero means
    /// hard cutoffs.
    pub blend_margin: f64,
    /// Put the heel at the maximum end of the axis instead of the minimum.
    pub reversed: bool,
}

impl ZoneLayout {
    pub const DEFAULT_HEEL_END: f64 = 0.30;
    pub const DEFAULT_TOE_START: f64 = 0.70;
    pub const DEFAULT_BLEND_MARGIN: f64 = 0.05;

    #[must_use]
    pub const fn axis(mut self, axis: SoleAxis) -> Self {
        self.axis = axis;
        self
    }

    #[must_use]
    pub const fn thresholds(mut self, heel_end: f64, toe_start: f64) -> Self {
        self.heel_end = heel_end;
        self.toe_start = toe_start;
        self
    }

    #[must_use]
    pub const fn blend_margin(mut self, margin: f64) -> Self {
        self.blend_margin = margin;
        self
    }

    #[must_use]
    pub const fn reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }

    /// `[lo, hi)` band of a sub-zone; FULL spans `[0, 1]`.
    #[must_use]
    pub const fn band(&self, zone: Zone) -> (f64, f64) {
        match zone {
            Zone::Full => (0.0, 1.0),
            Zone::Heel => (0.0, self.heel_end),
            Zone::Midfoot => (self.heel_end, self.toe_start),
            Zone::Toe => (self.toe_start, 1.0),
        }
    }

    /// # Errors
    /// `InvalidParameter` unless `0 < heel_end < toe_start < 1` and
    /// `0 <= blend_margin <= ` the narrowest band.
    pub fn validate(&self) -> GeomResult<()> {
        let (h, t, m) = (self.heel_end, self.toe_start, self.blend_margin);
        if !(h.is_finite() && t.is_finite() && 0.0 < h && h < t && t < 1.0) {
            return Err(GeomError::invalid(
                "zone_thresholds",
                format!("need 0 < heel_end < toe_start < 1, got {h} and {t}"),
            ));
        }
        let narrowest = h.min(t - h).min(1.0 - t);
        if !(m.is_finite() && m >= 0.0 && m <= narrowest) {
            return Err(GeomError::invalid(
                "blend_margin",
                format!("must be in [0, {narrowest}], got {m}"),
            ));
        }
        Ok(())
    }
}

impl Default for ZoneLayout {
    fn default() -> Self {
        Self {
            axis: SoleAxis::Auto,
            heel_end: Self::DEFAULT_HEEL_END,
            toe_start: Self::DEFAULT_TOE_START,
            blend_margin: Self::DEFAULT_BLEND_MARGIN,
            reversed: false,
        }
    }
}

/// Weighted working set produced by classification.
///
/// Weight 1 means full effect, values in `(0, 1)` come from the blend margin.
/// Vertices not in the set are untouched by scaling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneSelection {
    weights: BTreeMap<usize, f64>,
}

impl ZoneSelection {
    /// Every vertex at weight 1.
    #[must_use]
    pub fn full(vertex_count: usize) -> Self {
        Self {
            weights: (0..vertex_count).map(|i| (i, 1.0)).collect(),
        }
    }

    /// Hard membership: each listed vertex at weight 1.
    #[must_use]
    pub fn from_indices(indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            weights: indices.into_iter().map(|i| (i, 1.0)).collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Weight of vertex `index`, 0 when absent.
    #[must_use]
    pub fn weight(&self, index: usize) -> f64 {
        self.weights.get(&index).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.weights.contains_key(&index)
    }

    /// Member indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.weights.keys().copied()
    }

    /// `(index, weight)` pairs in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.weights.iter().map(|(&i, &w)| (i, w))
    }

    /// Number of members with a partial (blended) weight.
    #[must_use]
    pub fn blended_count(&self) -> usize {
        self.weights.values().filter(|&&w| w < 1.0).count()
    }

    fn retain_selected(&mut self, selection: &BTreeSet<usize>) {
        self.weights.retain(|i, _| selection.contains(i));
    }
}

/// Disjoint vertex sets per sub-zone (no blending).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZonePartition {
    pub heel: Vec<usize>,
    pub midfoot: Vec<usize>,
    pub toe: Vec<usize>,
}

impl ZonePartition {
    #[must_use]
    pub fn members(&self, zone: Zone) -> Vec<usize> {
        match zone {
            Zone::Full => {
                let mut all: Vec<usize> = self
                    .heel
                    .iter()
                    .chain(&self.midfoot)
                    .chain(&self.toe)
                    .copied()
                    .collect();
                all.sort_unstable();
                all
            }
            Zone::Heel => self.heel.clone(),
            Zone::Midfoot => self.midfoot.clone(),
            Zone::Toe => self.toe.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneClassifier {
    layout: ZoneLayout,
    tol: Tolerance,
}

impl ZoneClassifier {
    /// # Errors
    /// `InvalidParameter` when the layout fails validation.
    pub fn new(layout: ZoneLayout, tol: Tolerance) -> GeomResult<Self> {
        layout.validate()?;
        Ok(Self { layout, tol })
    }

    #[must_use]
    pub const fn layout(&self) -> &ZoneLayout {
        &self.layout
    }

    /// Normalized position of `p` along the sole axis, in `[0, 1]`.
    ///
    /// A degenerate extent maps everything to `0.0`.
    #[must_use]
    pub fn normalized_coordinate(&self, p: Point3, extent: BBox) -> f64 {
        let axis = self.layout.axis.resolve(extent);
        let (min, max) = extent.span(axis);
        let span = max - min;
        if self.tol.is_zero_length(span) {
            return 0.0;
        }
        let t = ((p.component(axis) - min) / span).clamp(0.0, 1.0);
        if self.layout.reversed { 1.0 - t } else { t }
    }

    /// The single sub-zone containing normalized coordinate `t`.
    #[must_use]
    pub fn zone_of(&self, t: f64) -> Zone {
        if t < self.layout.heel_end {
            Zone::Heel
        } else if t < self.layout.toe_start {
            Zone::Midfoot
        } else {
            Zone::Toe
        }
    }

    /// Scale weight of `zone` at normalized coordinate `t`.
    #[must_use]
    pub fn weight(&self, zone: Zone, t: f64) -> f64 {
        if zone == Zone::Full {
            return 1.0;
        }
        let (lo, hi) = self.layout.band(zone);
        let margin = self.layout.blend_margin;

        if margin <= 0.0 {
            let inside = t >= lo && (t < hi || hi >= 1.0);
            return if inside { 1.0 } else { 0.0 };
        }

        let half = margin * 0.5;
        let rising = if lo <= 0.0 {
            1.0
        } else {
            ((t - (lo - half)) / margin).clamp(0.0, 1.0)
        };
        let falling = if hi >= 1.0 {
            1.0
        } else {
            (((hi + half) - t) / margin).clamp(0.0, 1.0)
        };
        rising.min(falling)
    }

    /// Split vertices into disjoint HEEL / MIDFOOT / TOE sets.
    #[must_use]
    pub fn partition(&self, positions: &[[f64; 3]], extent: BBox) -> ZonePartition {
        let mut partition = ZonePartition::default();
        for (i, p) in positions.iter().enumerate() {
            let t = self.normalized_coordinate(Point3::from_array(*p), extent);
            match self.zone_of(t) {
                Zone::Heel => partition.heel.push(i),
                Zone::Midfoot => partition.midfoot.push(i),
                _ => partition.toe.push(i),
            }
        }
        partition
    }

    /// Resolve a zone and target to a weighted working set.
    ///
    /// With [`Target::Selected`] the result is intersected with `selection`;
    /// an empty intersection is a valid, empty set.
    ///
    /// # Errors
    /// `InvalidParameter` when `selection` names a vertex outside `positions`
    /// and the target is [`Target::Selected`].
    pub fn classify(
        &self,
        positions: &[[f64; 3]],
        extent: BBox,
        selector: ZoneSelector,
        selection: &BTreeSet<usize>,
    ) -> GeomResult<ZoneSelection> {
        if selector.target == Target::Selected {
            if let Some(&bad) = selection.range(positions.len()..).next() {
                return Err(GeomError::invalid(
                    "selection",
                    format!("vertex {bad} out of range for {} vertices", positions.len()),
                ));
            }
        }

        let mut result = if selector.zone == Zone::Full {
            ZoneSelection::full(positions.len())
        } else {
            let axis = self.layout.axis.resolve(extent);
            let (min, max) = extent.span(axis);
            if self.tol.is_zero_length(max - min) {
                log::warn!("mesh has zero extent along sole axis {axis:?}; all vertices fall in HEEL");
            }
            let weights = positions
                .iter()
                .enumerate()
                .filter_map(|(i, p)| {
                    let t = self.normalized_coordinate(Point3::from_array(*p), extent);
                    let w = self.weight(selector.zone, t);
                    (w > 0.0).then_some((i, w))
                })
                .collect();
            ZoneSelection { weights }
        };

        if selector.target == Target::Selected {
            result.retain_selected(selection);
        }

        log::debug!(
            "classified {} / {} vertices into {} ({}), {} blended",
            result.len(),
            positions.len(),
            selector.zone,
            selector.target,
            result.blended_count()
        );

        Ok(result)
    }
}
