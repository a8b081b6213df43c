use std::collections::BTreeMap;

use thiserror::Error;

use super::record::{PresetRecord, normalize_name};
use crate::geom::GeomError;

#[derive(Error, Debug)]
pub enum PresetError {
    #[error("preset `{0}` not found")]
    NotFound(String),
    #[error("invalid preset name `{0}`: must not be blank")]
    InvalidName(String),
    #[error("invalid preset parameters: {0}")]
    InvalidRecord(#[from] GeomError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type PresetResult<T> = Result<T, PresetError>;

/// Keyed persistence for [`PresetRecord`]s.
///
/// Names are trimmed before use. Saving an existing name overwrites it; a
/// failed call leaves the store as it was.
pub trait PresetStore {
    /// # Errors
    /// `InvalidName` for a blank name, `InvalidRecord` when the parameters
    /// fail validation, or a backend error.
    fn save(&mut self, record: PresetRecord) -> PresetResult<()>;

    /// # Errors
    /// `NotFound` when no record has this name.
    fn load(&self, name: &str) -> PresetResult<PresetRecord>;

    /// # Errors
    /// `NotFound` when no record has this name.
    fn delete(&mut self, name: &str) -> PresetResult<()>;

    /// Stored names in ascending order.
    fn list(&self) -> Vec<String>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPresetStore {
    records: BTreeMap<String, PresetRecord>,
}

impl MemoryPresetStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn records(&self) -> &BTreeMap<String, PresetRecord> {
        &self.records
    }
}

impl PresetStore for MemoryPresetStore {
    fn save(&mut self, mut record: PresetRecord) -> PresetResult<()> {
        record.name = normalize_name(&record.name)?;
        record.validate()?;
        self.records.insert(record.name.clone(), record);
        Ok(())
    }

    fn load(&self, name: &str) -> PresetResult<PresetRecord> {
        self.records
            .get(name.trim())
            .cloned()
            .ok_or_else(|| PresetError::NotFound(name.to_string()))
    }

    fn delete(&mut self, name: &str) -> PresetResult<()> {
        self.records
            .remove(name.trim())
            .map(|_| ())
            .ok_or_else(|| PresetError::NotFound(name.to_string()))
    }

    fn list(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{NoiseKind, NoiseParameters, ScaleParameters, Target, Zone, ZoneSelector};

    fn record(name: &str, seed: i64) -> PresetRecord {
        PresetRecord {
            name: name.to_string(),
            noise: NoiseParameters::new(NoiseKind::Perlin, 1.5, 0.02, seed),
            scale: ScaleParameters::IDENTITY,
            selector: ZoneSelector::new(Zone::Heel, Target::All),
        }
    }

    #[test]
    fn test_save_load_delete() {
        let mut store = MemoryPresetStore::new();
        store.save(record("A", 1)).unwrap();
        assert_eq!(store.load("A").unwrap().noise.seed, 1);

        store.save(record("A", 2)).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.load(" A ").unwrap().noise.seed, 2);

        store.delete("A").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_missing_name_is_not_found() {
        let mut store = MemoryPresetStore::new();
        store.save(record("kept", 0)).unwrap();

        assert!(matches!(store.load("gone"), Err(PresetError::NotFound(name)) if name == "gone"));
        assert!(matches!(store.delete("gone"), Err(PresetError::NotFound(_))));
        assert_eq!(store.list(), vec!["kept".to_string()]);
    }

    #[test]
    fn test_blank_name_leaves_store_unchanged() {
        let mut store = MemoryPresetStore::new();
        assert!(matches!(store.save(record("  ", 0)), Err(PresetError::InvalidName(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let mut store = MemoryPresetStore::new();
        let mut bad = record("bad", 0);
        bad.scale.scale_x = 0.0;
        assert!(matches!(store.save(bad), Err(PresetError::InvalidRecord(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_list_is_sorted() {
        let mut store = MemoryPresetStore::new();
        for name in ["toe", "Heel", "arch"] {
            store.save(record(name, 0)).unwrap();
        }
        assert_eq!(store.list(), vec!["Heel", "arch", "toe"]);
    }
}
