//! Binary STL export and import.
//!
//! Polygon faces are fan-triangulated on export, one facet per triangle with
//! its geometric normal. STL stores `f32`, so a round trip is exact only to
//! single precision.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use stl_io::{Normal, Triangle, Vertex};
use thiserror::Error;

use crate::geom::{GeomError, Mesh, Point3, Vec3};

#[derive(Error, Debug)]
pub enum StlError {
    #[error("mesh validation failed: {0}")]
    Invalid(#[from] GeomError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type StlResult<T> = Result<T, StlError>;

#[allow(clippy::cast_possible_truncation)]
fn to_f32(v: [f64; 3]) -> [f32; 3] {
    [v[0] as f32, v[1] as f32, v[2] as f32]
}

fn triangles(mesh: &Mesh) -> Vec<Triangle> {
    mesh.triangulated_indices()
        .chunks_exact(3)
        .map(|tri| {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| mesh.positions[i as usize]);
            let origin = Point3::from_array(a);
            let normal = Point3::from_array(b)
                .sub_point(origin)
                .cross(Point3::from_array(c).sub_point(origin))
                .normalized()
                .unwrap_or(Vec3::ZERO);
            Triangle {
                normal: Normal::new(to_f32(normal.to_array())),
                vertices: [a, b, c].map(|p| Vertex::new(to_f32(p))),
            }
        })
        .collect()
}

/// Write `mesh` as binary STL.
///
/// # Errors
/// `Invalid` when the mesh fails validation, `Io` when writing fails.
pub fn write_stl<W: Write>(writer: &mut W, mesh: &Mesh) -> StlResult<()> {
    mesh.validate()?;
    let triangles = triangles(mesh);
    stl_io::write_stl(writer, triangles.iter())?;
    log::debug!("wrote {} STL facets", triangles.len());
    Ok(())
}

/// # Errors
/// As [`write_stl`], plus `Io` when the file cannot be created.
pub fn write_stl_file(path: &Path, mesh: &Mesh) -> StlResult<()> {
    let mut w = BufWriter::new(File::create(path)?);
    write_stl(&mut w, mesh)?;
    w.flush()?;
    Ok(())
}

/// Read an STL file (binary or ASCII) into a triangle mesh. Coincident
/// vertices are merged by the reader.
///
/// # Errors
/// `Io` when the file cannot be read or parsed, `Invalid` when the result is
/// not a valid mesh.
pub fn read_stl_file(path: &Path) -> StlResult<Mesh> {
    let mut file = File::open(path)?;
    let indexed = stl_io::read_stl(&mut file)?;

    let positions = indexed
        .vertices
        .iter()
        .map(|v| [f64::from(v[0]), f64::from(v[1]), f64::from(v[2])])
        .collect();
    let faces = indexed
        .faces
        .iter()
        .map(|face| {
            face.vertices
                .iter()
                .map(|&i| {
                    u32::try_from(i).map_err(|_| {
                        GeomError::InvalidMesh(format!("STL vertex index {i} out of range"))
                    })
                })
                .collect::<Result<Vec<u32>, GeomError>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mesh = Mesh::new(positions, faces);
    mesh.validate()?;
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::default_sole_mesh;

    #[test]
    fn test_sole_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sole.stl");
        let sole = default_sole_mesh();
        write_stl_file(&path, &sole).unwrap();

        let read = read_stl_file(&path).unwrap();
        assert_eq!(read.face_count(), sole.triangulated_indices().len() / 3);
        assert!(read.faces.iter().all(|f| f.len() == 3));

        let close = |a: &[f64; 3], b: &[f64; 3]| (0..3).all(|k| (a[k] - b[k]).abs() < 1e-6);
        for p in &read.positions {
            assert!(sole.positions.iter().any(|q| close(p, q)));
        }
        let (before, after) = (sole.bbox().unwrap(), read.bbox().unwrap());
        assert!(close(&before.min.to_array(), &after.min.to_array()));
        assert!(close(&before.max.to_array(), &after.max.to_array()));
    }

    #[test]
    fn test_quad_facets_carry_normals() {
        let quad = Mesh::new(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            vec![vec![0, 1, 2, 3]],
        );
        let mut bytes = io::Cursor::new(Vec::new());
        write_stl(&mut bytes, &quad).unwrap();
        bytes.set_position(0);

        let indexed = stl_io::read_stl(&mut bytes).unwrap();
        assert_eq!(indexed.faces.len(), 2);
        assert_eq!(indexed.vertices.len(), 4);
        for face in &indexed.faces {
            assert_eq!(face.normal[2], 1.0);
        }
    }

    #[test]
    fn test_invalid_mesh_not_written() {
        let mut bytes = Vec::new();
        let result = write_stl(&mut bytes, &Mesh::default());
        assert!(matches!(result, Err(StlError::Invalid(_))));
        assert!(bytes.is_empty());
    }
}
