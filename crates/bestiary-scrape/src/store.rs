use std::path::{Path, PathBuf};

use crate::error::Result;

const IMAGE_EXTENSION: &str = "jpg";

/// Append-only directory of downloaded images, one file per subject.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File the image for `file_stem` is stored in. Stems come from
    /// `Subject::file_stem` and are already filesystem safe.
    pub fn path_for(&self, file_stem: &str) -> PathBuf {
        self.root.join(format!("{file_stem}.{IMAGE_EXTENSION}"))
    }

    /// Writes `bytes` under `file_stem` and returns the canonical absolute path.
    pub async fn save(&self, file_stem: &str, bytes: &[u8]) -> Result<PathBuf> {
        // create_dir_all succeeds when the directory already exists, so
        // concurrent workers can all call it.
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.path_for(file_stem);
        tokio::fs::write(&path, bytes).await?;
        Ok(tokio::fs::canonicalize(&path).await?)
    }
}
