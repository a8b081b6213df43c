mod core;
mod displacement;
mod error;
mod mesh;
mod noise_field;
mod scaling;
mod snapshot;
mod sole;
mod zones;

pub use core::{Axis, BBox, Point3, Tolerance, Vec3};
pub use displacement::{DisplacementDiagnostics, displace};
pub use error::{GeomError, GeomResult};
pub use mesh::{Mesh, compute_vertex_normals};
pub use noise_field::{NoiseField, NoiseKind, NoiseParameters, evaluate, seed_hash};
pub use scaling::{ScaleParameters, ScalingDiagnostics, scale};
pub use snapshot::MeshSnapshot;
pub use sole::{SoleProfile, default_sole_mesh, sole_mesh};
pub use zones::{
    SoleAxis, Target, Zone, ZoneClassifier, ZoneLayout, ZonePartition, ZoneSelection,
    ZoneSelector,
};

#[cfg(test)]
mod tests;
