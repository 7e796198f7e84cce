use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use monitor_core::KnownItemSet;
use monitor_logging::monitor_info;

use crate::persist::{AtomicFileWriter, PersistError};

/// File-backed record of every item id already reported.
///
/// On disk: a pretty-printed, sorted JSON array of id strings.
#[derive(Debug)]
pub struct DedupStore {
    writer: AtomicFileWriter,
    known: KnownItemSet,
}

impl DedupStore {
    /// Load from `path`. A missing file is a first run and yields an empty set;
    /// an unreadable or malformed one is an error, never an empty set.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let path = path.into();
        let known = match fs::read_to_string(&path) {
            Ok(text) => parse_ids(&path, &text)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                monitor_info!("No known-items file at {:?}; starting empty", path);
                KnownItemSet::new()
            }
            Err(err) => return Err(PersistError::Io(err)),
        };
        monitor_info!("Loaded {} known item ids from {:?}", known.len(), path);
        Ok(Self {
            writer: AtomicFileWriter::new(path),
            known,
        })
    }

    pub fn path(&self) -> &Path {
        self.writer.target()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.known.contains(id)
    }

    /// Returns `true` if the id was new.
    pub fn add(&mut self, id: impl Into<String>) -> bool {
        self.known.insert(id)
    }

    pub fn known(&self) -> &KnownItemSet {
        &self.known
    }

    pub fn known_mut(&mut self) -> &mut KnownItemSet {
        &mut self.known
    }

    /// Rewrite the whole file with the current set.
    pub fn save(&self) -> Result<(), PersistError> {
        let ids: Vec<&str> = self.known.iter().collect();
        let content = serde_json::to_string_pretty(&ids).map_err(|err| PersistError::Corrupt {
            path: self.path().to_path_buf(),
            message: err.to_string(),
        })?;
        self.writer.write(&format!("{content}\n"))
    }
}

fn parse_ids(path: &Path, text: &str) -> Result<KnownItemSet, PersistError> {
    if text.trim().is_empty() {
        return Ok(KnownItemSet::new());
    }
    let ids: Vec<String> = serde_json::from_str(text).map_err(|err| PersistError::Corrupt {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    Ok(ids.into_iter().collect())
}
