//! Snapshot persistence
//!
//! All writes are crash-safe. The checkpoint goes through a temp file in
//! the target directory that is persisted over the checkpoint path, and
//! the published catalog only ever changes via a rename of a completed
//! checkpoint. A reader holding either path sees a complete artifact or
//! the previous one, never a partial write.

use crate::catalog::CatalogSnapshot;
use crate::{CrawlError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Where the checkpoint for a given catalog path lives.
pub fn checkpoint_path(catalog_path: &Path) -> PathBuf {
    let mut os = catalog_path.as_os_str().to_os_string();
    os.push(".checkpoint");
    PathBuf::from(os)
}

/// Owns the catalog and checkpoint locations for one crawl target.
pub struct SnapshotStore {
    catalog_path: PathBuf,
    checkpoint_path: PathBuf,
}

impl SnapshotStore {
    pub fn new(catalog_path: impl Into<PathBuf>) -> Self {
        let catalog_path = catalog_path.into();
        let checkpoint_path = checkpoint_path(&catalog_path);
        Self {
            catalog_path,
            checkpoint_path,
        }
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    pub fn checkpoint_path(&self) -> &Path {
        &self.checkpoint_path
    }

    /// Loads the promoted snapshot from a previous completed run.
    /// Returns `None` when no catalog has been published yet.
    pub fn load_snapshot(&self) -> Result<Option<CatalogSnapshot>> {
        read_snapshot(&self.catalog_path)
    }

    /// Loads the checkpoint left by an interrupted run, if any.
    pub fn load_checkpoint(&self) -> Result<Option<CatalogSnapshot>> {
        read_snapshot(&self.checkpoint_path)
    }

    /// Durably writes the checkpoint. The previous checkpoint stays
    /// intact if anything fails before the final rename.
    pub fn save_checkpoint(&self, snapshot: &CatalogSnapshot) -> Result<()> {
        let dir = parent_dir(&self.checkpoint_path);
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, snapshot)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.checkpoint_path)
            .map_err(|e| CrawlError::Io(e.error))?;

        tracing::debug!("Checkpoint saved to {}", self.checkpoint_path.display());
        Ok(())
    }

    /// Promotes the completed checkpoint onto the catalog path. The
    /// rename stays within one directory so it is atomic on the
    /// filesystems this runs on.
    pub fn promote(&self) -> Result<()> {
        fs::rename(&self.checkpoint_path, &self.catalog_path)?;
        tracing::info!("Catalog promoted to {}", self.catalog_path.display());
        Ok(())
    }

    /// Removes any leftover checkpoint. Missing is fine.
    pub fn clear_checkpoint(&self) -> Result<()> {
        match fs::remove_file(&self.checkpoint_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn read_snapshot(path: &Path) -> Result<Option<CatalogSnapshot>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let snapshot = serde_json::from_str(&content)?;
    Ok(Some(snapshot))
}
