use crate::core::Storage;
use crate::utils::error::Result;
use std::fs;
use std::path::Path;

/// Filesystem storage; relative paths resolve against `base_path`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = fs::read(full_path)?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_creates_dated_folders() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_string_lossy().to_string());

        storage
            .write_file("output/2026-10-16/log-x.csv", b"current_id")
            .await
            .unwrap();
        let data = storage.read_file("output/2026-10-16/log-x.csv").await.unwrap();
        assert_eq!(data, b"current_id");
    }

    #[tokio::test]
    async fn test_absolute_paths_bypass_base() {
        let temp_dir = TempDir::new().unwrap();
        let absolute = temp_dir.path().join("export.xml");
        std::fs::write(&absolute, "<enfinity/>").unwrap();

        let storage = LocalStorage::new("does-not-matter".to_string());
        let data = storage.read_file(absolute.to_str().unwrap()).await.unwrap();
        assert_eq!(data, b"<enfinity/>");
    }
}
