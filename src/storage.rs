use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{AppError, Result};

/// Progress photos on the local filesystem, one flat directory.
#[derive(Clone, Debug)]
pub struct PhotoStorage {
    root: PathBuf,
}

impl PhotoStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// A fresh `<uuid>.<ext>` file name.
    pub fn new_file_name(extension: &str) -> String {
        format!("{}.{}", Uuid::new_v4(), extension)
    }

    pub async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(file_name)?;
        self.ensure_dir().await?;
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(path = %path.display(), size = bytes.len(), "Stored photo");
        Ok(())
    }

    pub async fn read(&self, file_name: &str) -> Result<Vec<u8>> {
        let path = self.path_for(file_name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AppError::NotFound("Photo not found".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a stored file. A file that is already gone is not an error.
    pub async fn delete(&self, file_name: &str) -> Result<()> {
        let path = self.path_for(file_name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Photo file already missing");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn path_for(&self, file_name: &str) -> Result<PathBuf> {
        let valid = !file_name.is_empty()
            && file_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            && !file_name.starts_with('.');
        if !valid {
            return Err(AppError::BadRequest("Invalid file name".to_string()));
        }
        Ok(self.root.join(file_name))
    }
}
