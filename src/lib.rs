#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Deterministic shaping engine for shoe-sole meshes.
//!
//! The [`geom`] module holds the pure geometry: seeded noise fields, normal
//! displacement, longitudinal zone classification and zoned anisotropic
//! scaling, all reading immutable [`geom::MeshSnapshot`] baselines and
//! returning fresh position buffers. [`ShaperSession`] wires them to a live
//! mesh with reset and preset replay; [`preset`] persists parameter sets and
//! [`io`] exchanges meshes as STL.
//!
//! ```ignore
//! use std::collections::BTreeSet;
//! use sole_engine::{ShaperSession, geom::{NoiseKind, NoiseParameters}};
//!
//! let mut session = ShaperSession::default();
//! session.load_default()?;
//! session.apply_noise(&NoiseParameters::new(NoiseKind::Simplex, 3.0, 0.01, 42))?;
//! println!("{}", session.signature()?);
//! ```

pub mod config;
pub mod geom;
pub mod io;
pub mod preset;
pub mod session;

pub use config::{ConfigError, ShaperConfig};
pub use preset::{JsonPresetStore, MemoryPresetStore, PresetError, PresetRecord, PresetStore};
pub use session::{ScaleReport, ShaperError, ShaperResult, ShaperSession, mesh_signature};
