//! Durable storage for the single shared vectorization model.
//!
//! The store owns the live model for the process: the first `load()` reads
//! the persisted blob (or hands out an untrained model), every later call
//! returns the cached value, and `save()` overwrites the blob and refreshes
//! the cache. Nothing else in the crate touches `model.bin` directly.

use crate::error::{EngineError, Result};
use crate::model::TfidfModel;
use crate::store::{from_bincode, to_bincode};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// Persists and caches the shared `TfidfModel`.
pub struct ModelStore {
    dir: PathBuf,
    cache: RwLock<Option<Arc<TfidfModel>>>,
}

impl ModelStore {
    /// Create a model store rooted at the given directory.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            cache: RwLock::new(None),
        })
    }

    fn model_path(&self) -> PathBuf {
        self.dir.join("model.bin")
    }

    fn manifest_path(&self) -> PathBuf {
        self.dir.join("model.json")
    }

    /// Return the cached model, reading the persisted blob on first use.
    /// If no blob exists yet, returns a fresh untrained model.
    pub fn load(&self) -> Result<Arc<TfidfModel>> {
        if let Some(model) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(Arc::clone(model));
        }

        let model = Arc::new(self.read_from_disk()?);
        let mut guard = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        // a concurrent load may have populated the cache first
        Ok(Arc::clone(guard.get_or_insert(model)))
    }

    fn read_from_disk(&self) -> Result<TfidfModel> {
        let path = self.model_path();
        if !path.exists() {
            return Ok(TfidfModel::untrained());
        }
        let bytes = fs::read(&path)?;
        from_bincode(&bytes)
    }

    /// Durably overwrite the single persisted model, then refresh the cache.
    pub fn save(&self, model: &TfidfModel) -> Result<()> {
        let data = to_bincode(model)?;
        fs::write(self.model_path(), &data)?;

        // Human-readable manifest alongside the blob
        let manifest = serde_json::json!({
            "version": model.version(),
            "dimension": model.dimension(),
        });
        let manifest_bytes = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| EngineError::Serialization(e.to_string()))?;
        fs::write(self.manifest_path(), &manifest_bytes)?;

        *self.cache.write().unwrap_or_else(PoisonError::into_inner) =
            Some(Arc::new(model.clone()));
        Ok(())
    }

    /// Check if a persisted model exists on disk.
    pub fn exists(&self) -> bool {
        self.model_path().exists()
    }
}
