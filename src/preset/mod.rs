//! Named parameter sets that reproduce a shaping pass.
//!
//! The engine only needs the [`PresetStore`] contract. [`MemoryPresetStore`]
//! keeps records in process; [`JsonPresetStore`] persists them to a single
//! JSON document on disk.

mod json_store;
mod record;
mod store;

pub use json_store::JsonPresetStore;
pub use record::PresetRecord;
pub use store::{MemoryPresetStore, PresetError, PresetResult, PresetStore};
