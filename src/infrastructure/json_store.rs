use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::errors::DomainError;

/// One JSON file holding a whole entity collection.
///
/// Reads and writes always cover the entire document. `update` holds the
/// document lock across read-modify-write, so writers inside this process are
/// serialized; other processes writing the same file still race.
pub struct JsonDocument<T> {
    path: PathBuf,
    lock: Mutex<()>,
    _doc: PhantomData<fn() -> T>,
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            _doc: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The parsed document, or `T::default()` when the file does not exist.
    pub fn load(&self) -> Result<T, DomainError> {
        let _guard = self.guard();
        self.read()
    }

    /// Replaces the whole document.
    pub fn save(&self, doc: &T) -> Result<(), DomainError> {
        let _guard = self.guard();
        self.write(doc)
    }

    /// Applies `f` to the current document and saves the result. Nothing is
    /// written when `f` fails.
    pub fn update<R, F>(&self, f: F) -> Result<R, DomainError>
    where
        F: FnOnce(&mut T) -> Result<R, DomainError>,
    {
        let _guard = self.guard();
        let mut doc = self.read()?;
        let result = f(&mut doc)?;
        self.write(&doc)?;
        Ok(result)
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The guarded data is `()`, so a poisoned lock carries no broken state.
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read(&self) -> Result<T, DomainError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(io_error(&self.path, e)),
        };
        serde_json::from_str(&raw)
            .map_err(|e| DomainError::DataCorrupt(format!("{}: {}", self.path.display(), e)))
    }

    fn write(&self, doc: &T) -> Result<(), DomainError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
        }
        let body = serde_json::to_string_pretty(doc)
            .map_err(|e| DomainError::Internal(format!("serialize {}: {}", self.path.display(), e)))?;

        // Rename is atomic on the same filesystem: readers see old or new, never half.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| io_error(&self.path, e))
    }
}

fn io_error(path: &Path, e: std::io::Error) -> DomainError {
    DomainError::Internal(format!("{}: {}", path.display(), e))
}
