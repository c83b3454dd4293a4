//! Execution engine: the executor seam and the artifact slot it runs through.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{data::InputData, Result};

pub mod python;

pub use python::PythonExecutor;

/// Runs one generated artifact and returns what its entry point returned.
///
/// This is where generated code gets full process privilege. Alternative
/// implementations (sandboxed, remote) plug in here without touching the
/// session.
#[async_trait]
pub trait ArtifactExecutor: Send + Sync {
    async fn execute(&self, source: &str, entry_point: &str, input: &InputData) -> Result<Value>;

    /// Remove any artifact or module binding left behind by a previous run.
    fn evict(&self) -> Result<()> {
        Ok(())
    }

    /// Whether anything from a previous run is still loadable.
    fn has_stale_state(&self) -> bool {
        false
    }
}

/// The single well-known location a generated module lives at.
///
/// Holding a [`SlotGuard`] is the only way to write to it, and dropping the
/// guard clears the file and any compiled copy of the module.
#[derive(Debug, Clone)]
pub struct ArtifactSlot {
    path: PathBuf,
    module_name: String,
}

impl ArtifactSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let module_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, module_name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Directory the module is imported from.
    pub fn dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn pycache_entries(&self) -> Vec<PathBuf> {
        let cache_dir = self.dir().join("__pycache__");
        let prefix = format!("{}.", self.module_name);
        match fs::read_dir(&cache_dir) {
            Ok(rd) => rd
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".pyc"))
                })
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Delete the artifact and its compiled copies. Absence is not an error.
    pub fn evict(&self) -> io::Result<()> {
        remove_if_present(&self.path)?;
        for p in self.pycache_entries() {
            remove_if_present(&p)?;
        }
        Ok(())
    }

    pub fn is_occupied(&self) -> bool {
        self.path.exists() || !self.pycache_entries().is_empty()
    }

    pub fn acquire(&self) -> io::Result<SlotGuard<'_>> {
        self.evict()?;
        debug!(path = %self.path.display(), "artifact slot acquired");
        Ok(SlotGuard { slot: self })
    }
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Exclusive use of an [`ArtifactSlot`] for one attempt.
#[derive(Debug)]
pub struct SlotGuard<'a> {
    slot: &'a ArtifactSlot,
}

impl SlotGuard<'_> {
    /// Replace the artifact contents with `source`.
    pub fn write(&self, source: &str) -> io::Result<()> {
        if let Some(parent) = self.slot.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.slot.path, source)
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.slot.evict() {
            warn!(path = %self.slot.path.display(), error = %e, "failed to release artifact slot");
        } else {
            debug!(path = %self.slot.path.display(), "artifact slot released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_name_is_file_stem() {
        let slot = ArtifactSlot::new("generated.py");
        assert_eq!(slot.module_name(), "generated");
        assert_eq!(slot.dir(), PathBuf::from("."));
    }

    #[test]
    fn guard_releases_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let slot = ArtifactSlot::new(dir.path().join("generated.py"));
        {
            let guard = slot.acquire().unwrap();
            guard.write("x = 1\n").unwrap();
            assert!(slot.is_occupied());
        }
        assert!(!slot.is_occupied());
    }

    #[test]
    fn acquire_clears_stale_file_and_bytecode() {
        let dir = tempfile::tempdir().unwrap();
        let slot = ArtifactSlot::new(dir.path().join("generated.py"));
        fs::write(slot.path(), "stale = True\n").unwrap();
        let cache = dir.path().join("__pycache__");
        fs::create_dir_all(&cache).unwrap();
        fs::write(cache.join("generated.cpython-311.pyc"), b"\0").unwrap();
        fs::write(cache.join("other.cpython-311.pyc"), b"\0").unwrap();

        let guard = slot.acquire().unwrap();
        assert!(!slot.path().exists());
        assert!(!cache.join("generated.cpython-311.pyc").exists());
        assert!(cache.join("other.cpython-311.pyc").exists());
        drop(guard);
    }

    #[test]
    fn evict_tolerates_absence() {
        let dir = tempfile::tempdir().unwrap();
        let slot = ArtifactSlot::new(dir.path().join("missing").join("generated.py"));
        assert!(slot.evict().is_ok());
    }
}
