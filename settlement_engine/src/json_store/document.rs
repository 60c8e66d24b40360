use std::{fs, io::ErrorKind, path::PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::traits::StorageError;

/// A JSON document holding a list of records. Callers are responsible for holding the owning store's lock
/// across a load-mutate-save cycle.
pub(crate) struct DocumentFile {
    path: PathBuf,
}

impl DocumentFile {
    /// Opens the document, creating an empty list on disk if nothing is there yet.
    pub fn create(path: PathBuf) -> Result<Self, StorageError> {
        let doc = Self { path };
        if !doc.path.exists() {
            doc.save::<()>(&[])?;
        }
        Ok(doc)
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// A missing or empty file reads as an empty list, so a fresh deployment needs no seed file.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Vec<T>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(Vec::new()),
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|e| StorageError::Serialization(e.to_string()))
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save<T: Serialize>(&self, records: &[T]) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(records).map_err(|e| StorageError::Serialization(e.to_string()))?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
