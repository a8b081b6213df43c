//! Host-facing shaping session.
//!
//! A [`ShaperSession`] owns the live mesh and the two baselines every
//! operation starts from:
//!
//! - the *pristine* snapshot, captured on load and restored by reset;
//! - the *shape* snapshot, captured after each scaling pass.
//!
//! Noise always displaces the shape snapshot (or the pristine one before any
//! scaling), so re-applying the same noise never accumulates. Scaling passes
//! compound until the next reset, and the most recent noise is re-applied on
//! top of each new shape.
//!
//! Every operation computes its full result before touching the live mesh. An
//! error leaves the session exactly as it was.

use std::collections::BTreeSet;

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::{ConfigError, ShaperConfig};
use crate::geom::{
    DisplacementDiagnostics, GeomError, Mesh, MeshSnapshot, NoiseParameters, ScaleParameters,
    ScalingDiagnostics, ZoneSelector, default_sole_mesh, displace, scale,
};
use crate::preset::{PresetError, PresetRecord, PresetStore};

#[derive(Error, Debug)]
pub enum ShaperError {
    #[error(transparent)]
    Geom(#[from] GeomError),
    #[error(transparent)]
    Preset(#[from] PresetError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type ShaperResult<T> = Result<T, ShaperError>;

/// Outcome of a scaling pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScaleReport {
    pub scaling: ScalingDiagnostics,
    /// Present when remembered noise was re-applied over the new shape.
    pub noise: Option<DisplacementDiagnostics>,
}

#[derive(Debug, Default)]
pub struct ShaperSession {
    config: ShaperConfig,
    live: Option<Mesh>,
    pristine: Option<MeshSnapshot>,
    shaped: Option<MeshSnapshot>,
    last_noise: Option<NoiseParameters>,
}

impl ShaperSession {
    /// # Errors
    /// `Geom(InvalidParameter)` when `config` fails validation.
    pub fn new(config: ShaperConfig) -> ShaperResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    #[must_use]
    pub const fn config(&self) -> &ShaperConfig {
        &self.config
    }

    /// Replace the host mesh and capture it as the pristine baseline.
    ///
    /// # Errors
    /// `Geom(InvalidMesh)` when the mesh fails validation; the previous mesh
    /// stays loaded.
    pub fn load_mesh(&mut self, mesh: Mesh) -> ShaperResult<()> {
        let pristine = MeshSnapshot::capture(&mesh)?;
        log::info!(
            "loaded mesh: {} vertices, {} faces",
            mesh.vertex_count(),
            mesh.face_count()
        );
        self.live = Some(mesh);
        self.pristine = Some(pristine);
        self.shaped = None;
        self.last_noise = None;
        Ok(())
    }

    /// Load the built-in base sole.
    ///
    /// # Errors
    /// As [`ShaperSession::load_mesh`].
    pub fn load_default(&mut self) -> ShaperResult<()> {
        self.load_mesh(default_sole_mesh())
    }

    #[must_use]
    pub const fn live_mesh(&self) -> Option<&Mesh> {
        self.live.as_ref()
    }

    #[must_use]
    pub const fn pristine(&self) -> Option<&MeshSnapshot> {
        self.pristine.as_ref()
    }

    /// Noise parameters that will be re-applied after the next scaling pass.
    #[must_use]
    pub const fn last_noise(&self) -> Option<&NoiseParameters> {
        self.last_noise.as_ref()
    }

    /// The snapshot the next operation starts from.
    fn shape_baseline(&self) -> ShaperResult<&MeshSnapshot> {
        self.shaped
            .as_ref()
            .or(self.pristine.as_ref())
            .ok_or(ShaperError::Geom(GeomError::MissingBaseline))
    }

    fn commit(&mut self, positions: Vec<[f64; 3]>) -> ShaperResult<()> {
        let live = self.live.as_mut().ok_or(GeomError::MissingBaseline)?;
        live.commit_positions(positions)?;
        Ok(())
    }

    /// Displace the current shape along its normals.
    ///
    /// # Errors
    /// `MissingBaseline` before a mesh is loaded, `InvalidParameter` for bad
    /// noise parameters.
    pub fn apply_noise(&mut self, params: &NoiseParameters) -> ShaperResult<DisplacementDiagnostics> {
        let (positions, diagnostics) = displace(self.shape_baseline()?, params)?;
        self.commit(positions)?;
        self.last_noise = Some(*params);
        Ok(diagnostics)
    }

    /// Scale the current shape within the selected zone, then re-apply the
    /// remembered noise.
    ///
    /// An empty working set (e.g. `Target::Selected` with nothing selected in
    /// the zone) is a no-op.
    ///
    /// # Errors
    /// `MissingBaseline` before a mesh is loaded, `InvalidParameter` for bad
    /// factors or a selection index outside the mesh.
    pub fn apply_scale(
        &mut self,
        params: &ScaleParameters,
        selector: ZoneSelector,
        selection: &BTreeSet<usize>,
    ) -> ShaperResult<ScaleReport> {
        let base = self.shape_baseline()?;
        let Some((shaped, scaling)) = self.stage_scale(base, params, selector, selection)? else {
            return Ok(ScaleReport::default());
        };

        let (positions, noise) = match &self.last_noise {
            Some(noise) => {
                let (positions, diagnostics) = displace(&shaped, noise)?;
                (positions, Some(diagnostics))
            }
            None => (shaped.positions().to_vec(), None),
        };

        self.commit(positions)?;
        self.shaped = Some(shaped);
        Ok(ScaleReport { scaling, noise })
    }

    /// Scale `base` and capture the result as a new shape snapshot. Returns
    /// `None` when the working set is empty.
    fn stage_scale(
        &self,
        base: &MeshSnapshot,
        params: &ScaleParameters,
        selector: ZoneSelector,
        selection: &BTreeSet<usize>,
    ) -> ShaperResult<Option<(MeshSnapshot, ScalingDiagnostics)>> {
        params.validate()?;
        let classifier = self.config.classifier()?;
        let working = classifier.classify(base.positions(), base.bbox(), selector, selection)?;
        if working.is_empty() {
            log::info!("no vertices in {} ({}); scale skipped", selector.zone, selector.target);
            return Ok(None);
        }

        let (positions, diagnostics) = scale(base, &working, params)?;
        let shaped = base.recapture(positions)?;
        Ok(Some((shaped, diagnostics)))
    }

    /// Restore the pristine positions and forget the shape and noise.
    ///
    /// # Errors
    /// `MissingBaseline` before a mesh is loaded.
    pub fn reset_mesh(&mut self) -> ShaperResult<()> {
        let pristine = self.pristine.as_ref().ok_or(GeomError::MissingBaseline)?;
        let positions = pristine.positions().to_vec();
        self.commit(positions)?;
        self.shaped = None;
        self.last_noise = None;
        log::debug!("mesh reset to pristine baseline");
        Ok(())
    }

    /// Store the given parameters under `name`, overwriting any existing
    /// preset of that name.
    ///
    /// # Errors
    /// `InvalidName` for a blank name, `InvalidRecord` for out-of-range
    /// parameters, or a store error.
    pub fn save_preset(
        &self,
        store: &mut dyn PresetStore,
        name: &str,
        noise: NoiseParameters,
        scale: ScaleParameters,
        selector: ZoneSelector,
    ) -> ShaperResult<PresetRecord> {
        let record = PresetRecord::new(name, noise, scale, selector)?;
        record.validate()?;
        store.save(record.clone())?;
        log::info!("saved preset `{}`", record.name);
        Ok(record)
    }

    /// Fetch a preset's parameters without applying them.
    ///
    /// # Errors
    /// `NotFound` when no preset has this name.
    pub fn load_preset(&self, store: &dyn PresetStore, name: &str) -> ShaperResult<PresetRecord> {
        Ok(store.load(name)?)
    }

    /// # Errors
    /// `NotFound` when no preset has this name.
    pub fn delete_preset(&self, store: &mut dyn PresetStore, name: &str) -> ShaperResult<()> {
        store.delete(name)?;
        log::info!("deleted preset `{}`", name.trim());
        Ok(())
    }

    /// Rebuild the shape a preset describes: reset, then scale, then noise.
    ///
    /// # Errors
    /// `NotFound` for an unknown preset, `MissingBaseline` before a mesh is
    /// loaded, or any error the scale or noise pass raises. The live mesh is
    /// untouched on error.
    pub fn replay_preset(
        &mut self,
        store: &dyn PresetStore,
        name: &str,
        selection: &BTreeSet<usize>,
    ) -> ShaperResult<PresetRecord> {
        let record = store.load(name)?;
        let pristine = self.pristine.as_ref().ok_or(GeomError::MissingBaseline)?;

        let staged = self.stage_scale(pristine, &record.scale, record.selector, selection)?;
        let shape = staged.as_ref().map_or(pristine, |(shaped, _)| shaped);
        let (positions, _) = displace(shape, &record.noise)?;

        self.commit(positions)?;
        self.shaped = staged.map(|(shaped, _)| shaped);
        self.last_noise = Some(record.noise);
        log::info!("replayed preset `{}`", record.name);
        Ok(record)
    }

    /// Signature of the live mesh; see [`mesh_signature`].
    ///
    /// # Errors
    /// `MissingBaseline` before a mesh is loaded.
    pub fn signature(&self) -> ShaperResult<String> {
        let live = self.live.as_ref().ok_or(GeomError::MissingBaseline)?;
        Ok(mesh_signature(live))
    }
}

/// SHA-256 hex digest identifying a mesh state.
///
/// Covers the vertex and face counts and every position rounded to six
/// decimals, in vertex order.
#[must_use]
pub fn mesh_signature(mesh: &Mesh) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}|{}|", mesh.vertex_count(), mesh.face_count()).as_bytes());

    for p in &mesh.positions {
        hasher.update(format!("{:.6},{:.6},{:.6};", p[0], p[1], p[2]).as_bytes());
    }
    hex::encode(hasher.finalize())
}
