//! Local filesystem object storage for deliverable files.
//!
//! Objects are addressed by relative keys such as
//! `deliverables/{project_id}/{uuid}.pdf`, resolved under a configured root.

use std::path::{Component, Path, PathBuf};

use portal_core::error::CoreError;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` at `key`, creating parent directories. Returns the size.
    pub async fn put(&self, key: &str, bytes: &[u8]) -> Result<u64, CoreError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error("create directory", key, e))?;
        }
        let mut file = File::create(&path)
            .await
            .map_err(|e| storage_error("create", key, e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| storage_error("write", key, e))?;
        file.flush().await.map_err(|e| storage_error("flush", key, e))?;
        Ok(bytes.len() as u64)
    }

    /// Open the object for streaming, with its size.
    ///
    /// A missing object is a `NotFound`; the row that pointed at it outlived
    /// the bytes.
    pub async fn open(&self, key: &str) -> Result<(File, u64), CoreError> {
        let path = self.resolve(key)?;
        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(key, "Stored object is missing");
                return Err(CoreError::NotFound {
                    entity: "StoredObject",
                    id: uuid::Uuid::nil(),
                });
            }
            Err(e) => return Err(storage_error("open", key, e)),
        };
        let size = file
            .metadata()
            .await
            .map_err(|e| storage_error("stat", key, e))?
            .len();
        Ok((file, size))
    }

    /// Remove the object. Returns `false` if it did not exist.
    pub async fn delete(&self, key: &str) -> Result<bool, CoreError> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(storage_error("delete", key, e)),
        }
    }

    /// Map a key onto the root. Only plain relative components are allowed.
    fn resolve(&self, key: &str) -> Result<PathBuf, CoreError> {
        let relative = Path::new(key);
        let plain = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(CoreError::Validation(format!("Invalid storage key '{key}'")));
        }
        Ok(self.root.join(relative))
    }
}

fn storage_error(op: &str, key: &str, e: std::io::Error) -> CoreError {
    CoreError::DependencyFailure(format!("Storage {op} failed for '{key}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn put_open_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let key = "deliverables/p1/file.txt";

        assert_eq!(storage.put(key, b"hello").await.unwrap(), 5);

        let (mut file, size) = storage.open(key).await.unwrap();
        assert_eq!(size, 5);
        let mut contents = String::new();
        file.read_to_string(&mut contents).await.unwrap();
        assert_eq!(contents, "hello");

        assert!(storage.delete(key).await.unwrap());
        assert!(!storage.delete(key).await.unwrap());
        assert_matches!(storage.open(key).await, Err(CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn rejects_keys_escaping_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        for key in ["../etc/passwd", "/etc/passwd", "a/../../b", ""] {
            assert_matches!(
                storage.put(key, b"x").await,
                Err(CoreError::Validation(_)),
                "{key}"
            );
        }
    }
}
