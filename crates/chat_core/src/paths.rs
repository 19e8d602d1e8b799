use std::path::{Path, PathBuf};

/// Root directory for archiver state (~/.chat_archiver)
pub fn archiver_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join(".chat_archiver")
}

/// Path of config.json inside the archiver dir
pub fn config_json_path() -> PathBuf {
    archiver_dir().join("config.json")
}

/// Key-value storage file inside a data directory
pub fn storage_file_path(data_dir: &Path) -> PathBuf {
    data_dir.join("storage.json")
}

/// Create the data directory if it does not exist yet
pub fn ensure_dir(dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    Ok(dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_file_lives_in_data_dir() {
        let dir = PathBuf::from("/tmp/archiver-data");
        assert_eq!(
            storage_file_path(&dir),
            PathBuf::from("/tmp/archiver-data/storage.json")
        );
    }

    #[test]
    fn ensure_dir_creates_nested_dirs() {
        let root = tempfile::tempdir().expect("tempdir");
        let nested = root.path().join("a").join("b");
        let created = ensure_dir(&nested).expect("create");
        assert!(created.is_dir());
    }
}
