use super::error::{GeomError, GeomResult};
use super::{BBox, Point3, Vec3};

/// Polygon mesh as exchanged with the host.
///
/// Faces are index lists of three or more vertices. The engine treats them as
/// fixed topology: operations only ever produce new position buffers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub positions: Vec<[f64; 3]>,
    /// Per-vertex normals. Derived from the faces at capture time when absent.
    pub normals: Option<Vec<[f64; 3]>>,
    pub faces: Vec<Vec<u32>>,
}

impl Mesh {
    /// Create a mesh from positions and faces only.
    #[must_use]
    pub fn new(positions: Vec<[f64; 3]>, faces: Vec<Vec<u32>>) -> Self {
        Self {
            positions,
            normals: None,
            faces,
        }
    }

    #[must_use]
    pub fn with_normals(mut self, normals: Vec<[f64; 3]>) -> Self {
        self.normals = Some(normals);
        self
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns true if any vertex position contains NaN or Inf values.
    #[must_use]
    pub fn has_invalid_vertices(&self) -> bool {
        self.positions
            .iter()
            .any(|p| !p[0].is_finite() || !p[1].is_finite() || !p[2].is_finite())
    }

    #[must_use]
    pub fn bbox(&self) -> Option<BBox> {
        BBox::from_positions(&self.positions)
    }

    /// # Errors
    /// `InvalidMesh` for an empty mesh, non-finite positions or normals, a
    /// normals buffer of the wrong length, or a face with fewer than three
    /// corners or an out-of-range index.
    pub fn validate(&self) -> GeomResult<()> {
        if self.positions.is_empty() {
            return Err(GeomError::InvalidMesh("mesh has no vertices".to_string()));
        }
        if self.has_invalid_vertices() {
            return Err(GeomError::InvalidMesh(
                "mesh has invalid vertex coordinates (NaN/Inf)".to_string(),
            ));
        }
        let n = self.positions.len();
        for (face_index, face) in self.faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(GeomError::InvalidMesh(format!(
                    "face {face_index} has {} vertices, need at least 3",
                    face.len()
                )));
            }
            if let Some(&bad) = face.iter().find(|&&i| i as usize >= n) {
                return Err(GeomError::InvalidMesh(format!(
                    "face {face_index} references vertex {bad}, mesh has {n}"
                )));
            }
        }
        if let Some(normals) = &self.normals {
            if normals.len() != n {
                return Err(GeomError::InvalidMesh(format!(
                    "normals length ({}) does not match positions length ({n})",
                    normals.len()
                )));
            }
            if normals.iter().any(|v| !Vec3::from_array(*v).is_finite()) {
                return Err(GeomError::InvalidMesh(
                    "mesh has invalid normals (NaN/Inf)".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Replace every vertex position, keeping topology.
    ///
    /// # Errors
    /// `InvalidMesh` when `positions` has a different length; the mesh is
    /// left unchanged.
    pub fn commit_positions(&mut self, positions: Vec<[f64; 3]>) -> GeomResult<()> {
        if positions.len() != self.positions.len() {
            return Err(GeomError::InvalidMesh(format!(
                "commit of {} positions into a mesh of {} vertices",
                positions.len(),
                self.positions.len()
            )));
        }
        self.positions = positions;
        Ok(())
    }

    /// Triangle fan over each polygon face, as flat index triples.
    #[must_use]
    pub fn triangulated_indices(&self) -> Vec<u32> {
        let mut indices = Vec::with_capacity(self.faces.len() * 3);
        for face in &self.faces {
            for k in 1..face.len().saturating_sub(1) {
                indices.extend_from_slice(&[face[0], face[k], face[k + 1]]);
            }
        }
        indices
    }
}

/// Area-weighted vertex normals from the face topology.
///
/// Vertices without a usable adjacent face get `+Z`; the count of such
/// fallbacks is returned alongside the normals.
#[must_use]
pub fn compute_vertex_normals(positions: &[[f64; 3]], faces: &[Vec<u32>]) -> (Vec<[f64; 3]>, usize) {
    let mut accum = vec![Vec3::ZERO; positions.len()];

    for face in faces {
        for k in 1..face.len().saturating_sub(1) {
            let (i0, i1, i2) = (face[0] as usize, face[k] as usize, face[k + 1] as usize);
            let (Some(p0), Some(p1), Some(p2)) =
                (positions.get(i0), positions.get(i1), positions.get(i2))
            else {
                continue;
            };

            let a = Point3::from_array(*p0);
            let ab = Point3::from_array(*p1).sub_point(a);
            let ac = Point3::from_array(*p2).sub_point(a);
            // Cross product magnitude weights by triangle area.
            let face_normal = ab.cross(ac);

            accum[i0] = accum[i0] + face_normal;
            accum[i1] = accum[i1] + face_normal;
            accum[i2] = accum[i2] + face_normal;
        }
    }

    let mut fallback_count = 0;
    let normals: Vec<[f64; 3]> = accum
        .into_iter()
        .map(|n| {
            n.normalized().unwrap_or_else(|| {
                fallback_count += 1;
                Vec3::Z
            })
        })
        .map(Vec3::to_array)
        .collect();

    (normals, fallback_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_quad() -> Mesh {
        Mesh::new(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            vec![vec![0, 1, 2, 3]],
        )
    }

    #[test]
    fn test_quad_normals_point_up() {
        let mesh = make_quad();
        let (normals, fallbacks) = compute_vertex_normals(&mesh.positions, &mesh.faces);
        assert_eq!(fallbacks, 0);
        for n in normals {
            assert!((n[2] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_isolated_vertex_falls_back_to_z() {
        let mut mesh = make_quad();
        mesh.positions.push([5.0, 5.0, 5.0]);
        let (normals, fallbacks) = compute_vertex_normals(&mesh.positions, &mesh.faces);
        assert_eq!(fallbacks, 1);
        assert_eq!(normals[4], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_triangle_fan() {
        let mesh = make_quad();
        assert_eq!(mesh.triangulated_indices(), vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_validate_rejects_bad_buffers() {
        assert!(Mesh::default().validate().is_err());

        let mesh = Mesh::new(vec![[0.0, 0.0, 0.0]], vec![vec![0, 1, 2]]);
        assert!(matches!(mesh.validate(), Err(GeomError::InvalidMesh(_))));

        let mesh = Mesh::new(vec![[f64::NAN, 0.0, 0.0]], vec![]);
        assert!(mesh.validate().is_err());

        let mesh = make_quad().with_normals(vec![[0.0, 0.0, 1.0]]);
        assert!(mesh.validate().is_err());

        let mesh = Mesh::new(vec![[0.0; 3], [1.0, 0.0, 0.0]], vec![vec![0, 1]]);
        assert!(mesh.validate().is_err());

        assert!(make_quad().validate().is_ok());
    }

    #[test]
    fn test_commit_rejects_wrong_length() {
        let mut mesh = make_quad();
        let before = mesh.clone();
        assert!(mesh.commit_positions(vec![[0.0; 3]]).is_err());
        assert_eq!(mesh, before);

        mesh.commit_positions(vec![[2.0; 3]; 4]).unwrap();
        assert_eq!(mesh.positions[3], [2.0; 3]);
    }
}
