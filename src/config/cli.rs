use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        Path::new(&self.base_path).join(path)
    }

    /// Writes into a sibling temp file, runs `check` over the bytes read back
    /// from disk, and only then renames over `full_path`.
    fn write_staged(
        full_path: &Path,
        data: &[u8],
        check: Option<&(dyn Fn(&[u8]) -> Result<()> + Sync)>,
    ) -> Result<()> {
        let parent = match full_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let mut staged = tempfile::Builder::new()
            .prefix(".fleet-etl-")
            .suffix(".tmp")
            .tempfile_in(&parent)?;
        staged.write_all(data)?;
        staged.as_file().sync_all()?;
        tracing::debug!("Staged {} bytes at {}", data.len(), staged.path().display());

        if let Some(check) = check {
            let written = fs::read(staged.path())?;
            // 驗證失敗時 staged 被 drop，暫存檔自動刪除
            check(&written)?;
        }

        staged
            .persist(full_path)
            .map_err(|e| EtlError::IoError(e.error))?;
        Ok(())
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.resolve(path);
        let data = fs::read(full_path)?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        Self::write_staged(&self.resolve(path), data, None)
    }

    async fn write_file_checked(
        &self,
        path: &str,
        data: &[u8],
        check: &(dyn Fn(&[u8]) -> Result<()> + Sync),
    ) -> Result<()> {
        Self::write_staged(&self.resolve(path), data, Some(check))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_and_read_back() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_str().unwrap().to_string());

        storage.write_file("nested/out.csv", b"a,b\n1,2\n").await.unwrap();
        let data = storage.read_file("nested/out.csv").await.unwrap();

        assert_eq!(data, b"a,b\n1,2\n");
    }

    #[tokio::test]
    async fn test_failed_check_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_str().unwrap().to_string());

        let reject = |_: &[u8]| -> Result<()> {
            Err(EtlError::ProcessingError {
                message: "rejected".to_string(),
            })
        };
        let result = storage
            .write_file_checked("out.csv", b"secret", &reject)
            .await;

        assert!(result.is_err());
        assert!(!dir.path().join("out.csv").exists());
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_write_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_str().unwrap().to_string());

        storage.write_file("out.csv", b"old").await.unwrap();
        storage.write_file("out.csv", b"new").await.unwrap();

        assert_eq!(fs::read(dir.path().join("out.csv")).unwrap(), b"new");
    }
}
