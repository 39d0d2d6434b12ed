// JSON file backend: one `<key>.json` file per key

use crate::kv::{KeyValueStore, validate_key};
use eyre::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const LOCK_FILE: &str = ".lock";

/// Key-value store backed by plain files in a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open or create a file store rooted at `dir`
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).context("Failed to create store directory")?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn write_replace(tmp_path: &Path, path: &Path, value: &str) -> Result<()> {
        let mut file = File::create(tmp_path).context("Failed to create temp file")?;
        file.write_all(value.as_bytes())
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        file.sync_all()
            .with_context(|| format!("Failed to sync {}", tmp_path.display()))?;
        fs::rename(tmp_path, path).with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let path = self.path_for(key);

        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.path_for(key);
        let tmp_path = self.dir.join(format!("{}.json.tmp", key));

        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.dir.join(LOCK_FILE))
            .context("Failed to open lock file")?;
        lock.lock_exclusive().context("Failed to acquire file lock")?;

        // Write aside and rename so readers never see a half-written file
        let written = Self::write_replace(&tmp_path, &path, value);
        if written.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        written?;

        debug!(path = ?path, bytes = value.len(), "Wrote value");

        // Lock is released when `lock` is dropped
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested/data");

        let store = FileStore::open(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(store.dir(), dir.as_path());
    }

    #[test]
    fn test_get_missing_key() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();

        assert_eq!(store.get("todos").unwrap(), None);
    }

    #[test]
    fn test_set_then_get() {
        let temp = TempDir::new().unwrap();
        let mut store = FileStore::open(temp.path()).unwrap();

        store.set("todos", r#"[{"id":1}]"#).unwrap();
        assert!(temp.path().join("todos.json").exists());
        assert!(!temp.path().join("todos.json.tmp").exists());
        assert_eq!(store.get("todos").unwrap().as_deref(), Some(r#"[{"id":1}]"#));

        store.set("todos", "[]").unwrap();
        assert_eq!(store.get("todos").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_values_survive_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let mut store = FileStore::open(temp.path()).unwrap();
            store.set("todos", "persisted").unwrap();
        }

        let store = FileStore::open(temp.path()).unwrap();
        assert_eq!(store.get("todos").unwrap().as_deref(), Some("persisted"));
    }

    #[test]
    fn test_failed_write_removes_temp_file() {
        let temp = TempDir::new().unwrap();
        let mut store = FileStore::open(temp.path()).unwrap();

        // A directory in the target's place makes the final rename fail
        fs::create_dir(temp.path().join("todos.json")).unwrap();

        let err = store.set("todos", "[]").unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to replace"));
        assert!(!temp.path().join("todos.json.tmp").exists());
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let temp = TempDir::new().unwrap();
        let mut store = FileStore::open(temp.path()).unwrap();

        assert!(store.set("../escape", "x").is_err());
        assert!(store.get("a/b").is_err());
    }
}
