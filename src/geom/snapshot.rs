//! Immutable deformation baselines.
//!
//! A [`MeshSnapshot`] is captured once from a validated [`Mesh`] and then only
//! read. Displacement and scaling always start from a snapshot, which is what
//! makes reset-then-reapply reproduce bit-identical positions.

use std::sync::Arc;

use super::error::GeomResult;
use super::mesh::{Mesh, compute_vertex_normals};
use super::{BBox, Point3, Vec3};

#[derive(Debug)]
struct SnapshotData {
    positions: Vec<[f64; 3]>,
    normals: Vec<[f64; 3]>,
    faces: Vec<Vec<u32>>,
    bbox: BBox,
}

/// Read-only copy of a mesh's positions, unit normals and faces.
///
/// Cloning is cheap and shares the captured buffers.
#[derive(Debug, Clone)]
pub struct MeshSnapshot {
    data: Arc<SnapshotData>,
}

impl MeshSnapshot {
    /// Capture a baseline from `mesh`.
    ///
    /// Normals supplied by the mesh are normalized; missing normals are derived
    /// from the faces. Degenerate normals fall back to `+Z`.
    ///
    /// # Errors
    /// Returns [`GeomError::InvalidMesh`](super::GeomError::InvalidMesh) when
    /// the mesh fails validation.
    pub fn capture(mesh: &Mesh) -> GeomResult<Self> {
        mesh.validate()?;

        let (normals, fallback_count) = match &mesh.normals {
            Some(normals) => {
                let mut fallback_count = 0;
                let normals = normals
                    .iter()
                    .map(|n| {
                        Vec3::from_array(*n).normalized().unwrap_or_else(|| {
                            fallback_count += 1;
                            Vec3::Z
                        })
                    })
                    .map(Vec3::to_array)
                    .collect::<Vec<_>>();
                (normals, fallback_count)
            }
            None => compute_vertex_normals(&mesh.positions, &mesh.faces),
        };

        if fallback_count > 0 {
            log::warn!("{fallback_count} vertices had no usable normal; using +Z");
        }

        // validate() rejected empty meshes, so a bbox exists.
        let bbox = mesh
            .bbox()
            .unwrap_or(BBox::new(Point3::ORIGIN, Point3::ORIGIN));

        log::debug!(
            "captured snapshot: {} vertices, {} faces",
            mesh.positions.len(),
            mesh.faces.len()
        );

        Ok(Self {
            data: Arc::new(SnapshotData {
                positions: mesh.positions.clone(),
                normals,
                faces: mesh.faces.clone(),
                bbox,
            }),
        })
    }

    /// Capture a baseline from new positions over the same topology,
    /// re-deriving normals from the faces. Used after a scaling pass.
    ///
    /// # Errors
    /// Returns an error when `positions` does not match the vertex count or
    /// contains non-finite values.
    pub fn recapture(&self, positions: Vec<[f64; 3]>) -> GeomResult<Self> {
        let mut mesh = self.to_mesh();
        mesh.commit_positions(positions)?;
        if !self.data.faces.is_empty() {
            // Stale after an anisotropic pass; capture derives them again.
            mesh.normals = None;
        }
        Self::capture(&mesh)
    }

    #[must_use]
    pub fn positions(&self) -> &[[f64; 3]] {
        &self.data.positions
    }

    #[must_use]
    pub fn normals(&self) -> &[[f64; 3]] {
        &self.data.normals
    }

    #[must_use]
    pub fn faces(&self) -> &[Vec<u32>] {
        &self.data.faces
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.data.positions.len()
    }

    /// Bounding box of the captured positions.
    #[must_use]
    pub fn bbox(&self) -> BBox {
        self.data.bbox
    }

    /// Rebuild a host mesh at the captured state.
    #[must_use]
    pub fn to_mesh(&self) -> Mesh {
        Mesh {
            positions: self.data.positions.clone(),
            normals: Some(self.data.normals.clone()),
            faces: self.data.faces.clone(),
        }
    }
}
