use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use indexmap::IndexMap;

use super::domain::{Deal, DealId};

/// Storage abstraction; callers always read and write whole deal aggregates.
pub trait DealRepository: Send + Sync {
    fn load(&self, id: &DealId) -> Result<Option<Deal>, RepositoryError>;
    /// Inserts or replaces the deal.
    fn save(&self, deal: &Deal) -> Result<(), RepositoryError>;
    fn list(&self) -> Result<Vec<Deal>, RepositoryError>;
    /// Removes the deal if present.
    fn delete(&self, id: &DealId) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("stored deals could not be decoded: {0}")]
    Serialization(String),
}

/// Process-local store, handy for tests and demos.
#[derive(Debug, Default)]
pub struct InMemoryDealRepository {
    deals: Mutex<IndexMap<DealId, Deal>>,
}

impl InMemoryDealRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DealRepository for InMemoryDealRepository {
    fn load(&self, id: &DealId) -> Result<Option<Deal>, RepositoryError> {
        let guard = self.deals.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn save(&self, deal: &Deal) -> Result<(), RepositoryError> {
        let mut guard = self.deals.lock().expect("repository mutex poisoned");
        guard.insert(deal.id.clone(), deal.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<Deal>, RepositoryError> {
        let guard = self.deals.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn delete(&self, id: &DealId) -> Result<(), RepositoryError> {
        let mut guard = self.deals.lock().expect("repository mutex poisoned");
        guard.shift_remove(id);
        Ok(())
    }
}

/// Keeps every deal in one JSON array on disk.
///
/// Each save rewrites the whole file through a temporary sibling and a rename.
#[derive(Debug)]
pub struct JsonFileDealRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileDealRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<Deal>, RepositoryError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(unavailable(&self.path, err)),
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&raw).map_err(|err| RepositoryError::Serialization(err.to_string()))
    }

    fn write_all(&self, deals: &[Deal]) -> Result<(), RepositoryError> {
        let rendered = serde_json::to_string_pretty(deals)
            .map_err(|err| RepositoryError::Serialization(err.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| unavailable(parent, err))?;
        }

        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        fs::write(&staging, rendered).map_err(|err| unavailable(&staging, err))?;
        fs::rename(&staging, &self.path).map_err(|err| unavailable(&self.path, err))
    }
}

fn unavailable(path: &Path, err: std::io::Error) -> RepositoryError {
    RepositoryError::Unavailable(format!("{}: {err}", path.display()))
}

impl DealRepository for JsonFileDealRepository {
    fn load(&self, id: &DealId) -> Result<Option<Deal>, RepositoryError> {
        let _guard = self.lock.lock().expect("repository mutex poisoned");
        Ok(self.read_all()?.into_iter().find(|deal| &deal.id == id))
    }

    fn save(&self, deal: &Deal) -> Result<(), RepositoryError> {
        let _guard = self.lock.lock().expect("repository mutex poisoned");
        let mut deals = self.read_all()?;
        match deals.iter_mut().find(|existing| existing.id == deal.id) {
            Some(existing) => *existing = deal.clone(),
            None => deals.push(deal.clone()),
        }
        self.write_all(&deals)
    }

    fn list(&self) -> Result<Vec<Deal>, RepositoryError> {
        let _guard = self.lock.lock().expect("repository mutex poisoned");
        self.read_all()
    }

    fn delete(&self, id: &DealId) -> Result<(), RepositoryError> {
        let _guard = self.lock.lock().expect("repository mutex poisoned");
        let mut deals = self.read_all()?;
        let before = deals.len();
        deals.retain(|deal| &deal.id != id);
        if deals.len() == before {
            return Ok(());
        }
        self.write_all(&deals)
    }
}
