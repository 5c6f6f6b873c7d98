//! In-memory catalog for testing and ephemeral use.
//!
//! [`InMemoryCatalog`] keeps canvas rows in a `HashMap` and version rows in
//! a `BTreeMap` keyed by `(canvas, version)`, both behind one `RwLock` so
//! the version-row insert and head advance of a commit are a single
//! critical section.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use easel_types::{CanvasId, Version};

use crate::error::{CatalogError, CatalogResult};
use crate::records::{CanvasRecord, VersionRecord};
use crate::traits::Catalog;

/// An in-memory implementation of [`Catalog`].
///
/// All data lives behind a `RwLock` and is lost when the catalog is
/// dropped.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    inner: RwLock<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    canvases: HashMap<CanvasId, CanvasRecord>,
    versions: BTreeMap<(CanvasId, Version), VersionRecord>,
}

impl Tables {
    fn max_version(&self, canvas_id: &CanvasId) -> Option<Version> {
        self.versions
            .range(
                (canvas_id.clone(), Version::UNCOMMITTED)
                    ..=(canvas_id.clone(), Version::new(u64::MAX)),
            )
            .next_back()
            .map(|((_, version), _)| *version)
    }
}

impl InMemoryCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> CatalogResult<std::sync::RwLockReadGuard<'_, Tables>> {
        self.inner
            .read()
            .map_err(|e| CatalogError::Internal(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> CatalogResult<std::sync::RwLockWriteGuard<'_, Tables>> {
        self.inner
            .write()
            .map_err(|e| CatalogError::Internal(format!("lock poisoned: {e}")))
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn insert_canvas(&self, record: &CanvasRecord) -> CatalogResult<()> {
        let mut tables = self.write()?;
        if tables.canvases.contains_key(&record.canvas_id) {
            return Err(CatalogError::CanvasExists {
                canvas_id: record.canvas_id.clone(),
            });
        }
        tables
            .canvases
            .insert(record.canvas_id.clone(), record.clone());
        Ok(())
    }

    async fn canvas(&self, canvas_id: &CanvasId) -> CatalogResult<Option<CanvasRecord>> {
        let tables = self.read()?;
        Ok(tables.canvases.get(canvas_id).cloned())
    }

    async fn head(&self, canvas_id: &CanvasId) -> CatalogResult<Option<Version>> {
        let tables = self.read()?;
        let record = tables
            .canvases
            .get(canvas_id)
            .ok_or_else(|| CatalogError::CanvasNotFound {
                canvas_id: canvas_id.clone(),
            })?;
        Ok(record.head_version)
    }

    async fn version(
        &self,
        canvas_id: &CanvasId,
        version: Version,
    ) -> CatalogResult<Option<VersionRecord>> {
        let tables = self.read()?;
        Ok(tables
            .versions
            .get(&(canvas_id.clone(), version))
            .cloned())
    }

    async fn versions(&self, canvas_id: &CanvasId) -> CatalogResult<Vec<VersionRecord>> {
        let tables = self.read()?;
        Ok(tables
            .versions
            .range(
                (canvas_id.clone(), Version::UNCOMMITTED)
                    ..=(canvas_id.clone(), Version::new(u64::MAX)),
            )
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn next_version(&self, canvas_id: &CanvasId) -> CatalogResult<Version> {
        let tables = self.read()?;
        if !tables.canvases.contains_key(canvas_id) {
            return Err(CatalogError::CanvasNotFound {
                canvas_id: canvas_id.clone(),
            });
        }
        Ok(tables
            .max_version(canvas_id)
            .map(Version::next)
            .unwrap_or_else(Version::first))
    }

    async fn commit_version(&self, record: &VersionRecord) -> CatalogResult<()> {
        if !record.version.is_committed() {
            return Err(CatalogError::UncommittedVersion {
                canvas_id: record.canvas_id.clone(),
            });
        }

        let mut tables = self.write()?;
        let row_key = (record.canvas_id.clone(), record.version);
        if tables.versions.contains_key(&row_key) {
            return Err(CatalogError::VersionExists {
                canvas_id: record.canvas_id.clone(),
                version: record.version,
            });
        }

        let canvas = tables
            .canvases
            .get_mut(&record.canvas_id)
            .ok_or_else(|| CatalogError::CanvasNotFound {
                canvas_id: record.canvas_id.clone(),
            })?;

        // Row insert and head advance inside the same write guard.
        if canvas.head_version.map_or(true, |head| record.version > head) {
            canvas.head_version = Some(record.version);
        }
        tables.versions.insert(row_key, record.clone());
        Ok(())
    }

    async fn soft_delete(&self, canvas_id: &CanvasId) -> CatalogResult<bool> {
        let mut tables = self.write()?;
        match tables.canvases.get_mut(canvas_id) {
            Some(canvas) if canvas.deleted_at.is_none() => {
                canvas.deleted_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn purge(&self, canvas_id: &CanvasId) -> CatalogResult<Vec<VersionRecord>> {
        let mut tables = self.write()?;
        tables.canvases.remove(canvas_id);
        let row_keys: Vec<(CanvasId, Version)> = tables
            .versions
            .range(
                (canvas_id.clone(), Version::UNCOMMITTED)
                    ..=(canvas_id.clone(), Version::new(u64::MAX)),
            )
            .map(|(key, _)| key.clone())
            .collect();
        let mut removed = Vec::with_capacity(row_keys.len());
        for key in row_keys {
            if let Some(record) = tables.versions.remove(&key) {
                removed.push(record);
            }
        }
        Ok(removed)
    }
}
