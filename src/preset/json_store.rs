use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::record::PresetRecord;
use super::store::{MemoryPresetStore, PresetResult, PresetStore};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct PresetDocument {
    version: u32,
    presets: Vec<PresetRecord>,
}

/// Preset store backed by one JSON file.
///
/// Every mutation rewrites the whole document through a temporary sibling
/// file that is then renamed over the original, so a crash mid-write leaves
/// the previous document intact. The file is not locked; one writer at a time.
#[derive(Debug)]
pub struct JsonPresetStore {
    path: PathBuf,
    cache: MemoryPresetStore,
}

impl JsonPresetStore {
    /// Open the store at `path`. A missing file is an empty store and is only
    /// created on the first save.
    ///
    /// Records read from disk go through the same name normalization and
    /// validation as [`PresetStore::save`], so a hand-edited `" Trail "` is
    /// stored and looked up as `"Trail"`.
    ///
    /// # Errors
    /// `Io` when the file exists but cannot be read, `Json` when it does not
    /// parse, `InvalidName` or `InvalidRecord` when a stored record would be
    /// rejected by `save`.
    pub fn open(path: impl Into<PathBuf>) -> PresetResult<Self> {
        let path = path.into();
        let mut cache = MemoryPresetStore::new();
        match fs::read_to_string(&path) {
            Ok(text) => {
                let document: PresetDocument = serde_json::from_str(&text)?;
                if document.version != FORMAT_VERSION {
                    log::warn!(
                        "preset file {} has version {}, expected {FORMAT_VERSION}",
                        path.display(),
                        document.version
                    );
                }
                for record in document.presets {
                    cache.save(record)?;
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        log::debug!("opened preset store {} ({} presets)", path.display(), cache.len());

        Ok(Self { path, cache })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy of the records and persist it; the in-memory
    /// state only advances once the file is written.
    fn commit(
        &mut self,
        change: impl FnOnce(&mut MemoryPresetStore) -> PresetResult<()>,
    ) -> PresetResult<()> {
        let mut next = self.cache.clone();
        change(&mut next)?;
        write_document(&self.path, &next)?;
        self.cache = next;
        Ok(())
    }
}

fn write_document(path: &Path, store: &MemoryPresetStore) -> PresetResult<()> {
    let document = PresetDocument {
        version: FORMAT_VERSION,
        presets: store.records().values().cloned().collect(),
    };
    let json = serde_json::to_string_pretty(&document)?;

    let file_name = path
        .file_name()
        .map_or_else(|| "presets".into(), |name| name.to_string_lossy().into_owned());
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    fs::write(&tmp, json)?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }
    Ok(())
}

impl PresetStore for JsonPresetStore {
    fn save(&mut self, record: PresetRecord) -> PresetResult<()> {
        self.commit(|store| store.save(record))
    }

    fn load(&self, name: &str) -> PresetResult<PresetRecord> {
        self.cache.load(name)
    }

    fn delete(&mut self, name: &str) -> PresetResult<()> {
        self.commit(|store| store.delete(name))
    }

    fn list(&self) -> Vec<String> {
        self.cache.list()
    }
}
