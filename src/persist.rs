//! Atomic JSON persistence shared by the settings file.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::EditError;

/// Per-file mutex map to serialize concurrent writes to the same path.
static FILE_LOCKS: LazyLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Atomically write bytes to a file using write-to-temp-then-rename.
///
/// 1. Acquires a per-file mutex so concurrent callers never share the `.tmp` file
/// 2. Writes data to a `.tmp` sibling file and fsyncs it
/// 3. Renames the existing file to `.bak` (best-effort)
/// 4. Renames the `.tmp` file to the target path
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<(), EditError> {
    let lock = FILE_LOCKS
        .lock()
        .entry(path.to_path_buf())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone();
    let _guard = lock.lock();

    let file_name = path.file_name().unwrap_or_default();

    let mut tmp_name = OsString::from(file_name);
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(&tmp_name);

    let mut bak_name = OsString::from(file_name);
    bak_name.push(".bak");
    let bak_path = path.with_file_name(&bak_name);

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    if path.exists() {
        let _ = fs::rename(path, &bak_path);
    }

    fs::rename(&tmp_path, path)?;

    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), EditError> {
    let json = serde_json::to_string_pretty(value)?;
    atomic_write(path, json.as_bytes())
}

pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, EditError> {
    let data = fs::read_to_string(path)?;
    let value = serde_json::from_str(&data)?;
    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn second_write_keeps_backup() {
        let dir = std::env::temp_dir().join("voxedit_test_persist");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("value.json");

        write_json(&path, &serde_json::json!({"n": 1})).unwrap();
        write_json(&path, &serde_json::json!({"n": 2})).unwrap();

        let current: serde_json::Value = read_json(&path).unwrap();
        assert_eq!(current, serde_json::json!({"n": 2}));
        let backup: serde_json::Value = read_json(&dir.join("value.json.bak")).unwrap();
        assert_eq!(backup, serde_json::json!({"n": 1}));
        assert!(!dir.join("value.json.tmp").exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn read_missing_is_io_error() {
        let missing = std::env::temp_dir().join("voxedit_test_persist_missing.json");
        let err = read_json::<serde_json::Value>(&missing).unwrap_err();
        assert_eq!(err.code(), "io");
    }
}
