use crate::core::Storage;
use crate::utils::error::Result;
use std::fs;
use std::path::Path;

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

    async fn list_files(&self, dir: &str, extension: &str) -> Result<Option<Vec<String>>> {
        let full_path = Path::new(&self.base_path).join(dir);
        if !full_path.is_dir() {
            return Ok(None);
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(full_path)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(Some(names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_list_files_filters_and_sorts() {
        let temp_dir = TempDir::new().unwrap();
        let essays = temp_dir.path().join("essays");
        fs::create_dir_all(essays.join("nested.txt")).unwrap();
        fs::write(essays.join("b.txt"), "B").unwrap();
        fs::write(essays.join("a.txt"), "A").unwrap();
        fs::write(essays.join("notes.md"), "ignored").unwrap();

        let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
        let names = storage.list_files("essays", "txt").await.unwrap();

        assert_eq!(names, Some(vec!["a.txt".to_string(), "b.txt".to_string()]));
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());

        assert_eq!(storage.list_files("rubric", "md").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());

        storage
            .write_file("outputs/a.feedback.txt", b"feedback")
            .await
            .unwrap();

        let data = storage.read_file("outputs/a.feedback.txt").await.unwrap();
        assert_eq!(data, b"feedback");
    }
}
