use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{Result, StorageError};
use crate::storage::KeyValueStore;

type Entries = BTreeMap<String, Value>;

/// Key-value store persisted as a single JSON object on disk.
///
/// Writers inside one process are serialized by `write_lock`; every write
/// rewrites the whole file through a temp file and rename.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileKeyValueStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<Entries> {
        if !self.path.exists() {
            return Ok(Entries::new());
        }
        let contents = fs::read_to_string(&self.path).await?;
        if contents.trim().is_empty() {
            return Ok(Entries::new());
        }
        match serde_json::from_str::<Value>(&contents)? {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(StorageError::InvalidData {
                key: self.path.display().to_string(),
                reason: format!("expected a JSON object, found {}", type_name(&other)),
            }),
        }
    }

    async fn write_entries(&self, entries: &Entries) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let contents = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");

        // Tokens live in this file: create it owner-only
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&tmp_path).await?;
        #[cfg(unix)]
        {
            // `mode` only applies on create; a stale temp file keeps its old one
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .await?;
        }
        file.write_all(contents.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut entries = self.read_entries().await?;
        Ok(entries.remove(key))
    }

    async fn set_many(&self, new_entries: Vec<(String, Value)>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await?;
        for (key, value) in new_entries {
            entries.insert(key, value);
        }
        self.write_entries(&entries).await
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await?;
        let before = entries.len();
        for key in keys {
            entries.remove(*key);
        }
        if entries.len() == before {
            return Ok(());
        }
        self.write_entries(&entries).await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.read_entries().await?.into_keys().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path().join("storage.json"));

        assert_eq!(store.get("github_token").await.unwrap(), None);
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn values_survive_a_new_handle() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let store = FileKeyValueStore::new(&path);
        store.set("github_token", json!("ghp_abc")).await.unwrap();

        let reopened = FileKeyValueStore::new(&path);
        assert_eq!(
            reopened.get("github_token").await.unwrap(),
            Some(json!("ghp_abc"))
        );
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn remove_deletes_only_named_keys() {
        let dir = tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path().join("storage.json"));
        store
            .set_many(vec![
                ("github_user_code".into(), json!("WXYZ-1234")),
                ("github_token".into(), json!("t")),
            ])
            .await
            .unwrap();

        store.remove(&["github_user_code"]).await.unwrap();

        assert_eq!(store.keys().await.unwrap(), vec!["github_token"]);
    }

    #[tokio::test]
    async fn non_object_file_is_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        let store = FileKeyValueStore::new(&path);
        let err = store.get("anything").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidData { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let store = FileKeyValueStore::new(&path);
        store.set("github_token", json!("secret")).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stale_temp_file_is_not_left_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, "leftover from a crash").unwrap();
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileKeyValueStore::new(&path);
        store.set("github_token", json!("secret")).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!tmp_path.exists());
        assert_eq!(store.get("github_token").await.unwrap(), Some(json!("secret")));
    }
}
