use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use super::ObjectStore;
use crate::util::ensure_directory;

/// Bucket emulation on the local file system: objects live under `root`
/// at their object path.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: &Path) -> Result<Self> {
        ensure_directory(root)?;
        let root = root
            .canonicalize()
            .with_context(|| format!("failed to resolve bucket root: {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ObjectStore for LocalObjectStore {
    fn upload_bytes(&self, object_path: &str, data: &[u8]) -> Result<String> {
        let relative = Path::new(object_path);
        if relative.is_absolute()
            || relative
                .components()
                .any(|component| matches!(component, std::path::Component::ParentDir))
        {
            bail!("object path escapes bucket root: {object_path}");
        }

        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            ensure_directory(parent)?;
        }
        fs::write(&path, data)
            .with_context(|| format!("failed to write object: {}", path.display()))?;

        Ok(format!("file://{}", path.display()))
    }
}
