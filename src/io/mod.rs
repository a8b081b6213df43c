//! Mesh file formats.

pub mod stl;

pub use stl::{StlError, StlResult, read_stl_file, write_stl, write_stl_file};
