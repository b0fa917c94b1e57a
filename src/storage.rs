use std::{
    collections::HashMap,
    fmt,
    fs::{self, File, OpenOptions},
    io::{self, Read, Write},
    path::{Component, Path, PathBuf},
    sync::RwLock,
};

use thiserror::Error;
use tracing::trace;

/// 儲存操作可能發生的錯誤類型。
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Key is invalid: {0}")]
    InvalidKey(String),
    #[error("Key not found: {0}")]
    NotFound(String),
    #[error("Lock poisoned")]
    LockPoisoned,
}

/// 儲存操作的結果類型，封裝 [`StorageError`]。
pub type Result<T> = std::result::Result<T, StorageError>;

/// 位元組序列的持久化介面。
///
/// 金鑰與證書的 PEM 資料只在此邊界讀寫，核心運算本身不接觸檔案系統。
pub trait Storage: Send + Sync + fmt::Debug {
    /// 讀取指定 key 所對應檔案的內容。
    fn read_file(&self, key: &str) -> Result<Vec<u8>>;

    /// 將資料寫入指定 key 所對應的檔案中，必要時建立父目錄。
    fn write_file(&self, key: &str, value: &[u8]) -> Result<()>;

    /// 刪除指定 key 所對應的檔案，不存在時不視為錯誤。
    fn remove(&self, key: &str) -> Result<()>;

    /// 檢查指定 key 是否存在。
    fn exists(&self, key: &str) -> Result<bool>;
}

/// 將 key 正規化為相對路徑，拒絕空字串、控制字元與跳出根目錄的 `..`。
fn normalize_key(key: &str) -> Result<PathBuf> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Empty key".to_string()));
    }
    if key.contains('\0') || key.contains('\n') || key.contains('\r') {
        return Err(StorageError::InvalidKey(format!(
            "Invalid characters in key: {}",
            key
        )));
    }
    if key.ends_with('/') {
        return Err(StorageError::InvalidKey(format!(
            "File key cannot end with '/': {}",
            key
        )));
    }

    let mut normalized = PathBuf::new();
    for component in Path::new(key).components() {
        match component {
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(StorageError::InvalidKey(format!(
                        "Cannot use '..' to escape root directory: {}",
                        key
                    )));
                }
            }
            Component::Normal(name) => normalized.push(name),
            Component::Prefix(_) => {
                return Err(StorageError::InvalidKey(format!("Invalid path: {}", key)))
            }
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(StorageError::InvalidKey(format!("Invalid path: {}", key)));
    }
    Ok(normalized)
}

/// 以目錄為根的檔案儲存，每個 key 對應根目錄下的一個檔案。
#[derive(Debug)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// 開啟（必要時建立）指定的根目錄。
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        Ok(self.root.join(normalize_key(key)?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Storage for FileStorage {
    fn read_file(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    fn write_file(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        // 檔案控制代碼在離開作用域時關閉，錯誤路徑亦同。
        let mut file = options.open(&path)?;
        file.write_all(value)?;
        file.sync_all()?;

        trace!(key, len = value.len(), "wrote file");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.path_for(key)?.is_file())
    }
}

/// 基於記憶體的儲存實作，主要用於測試。
#[derive(Debug, Default)]
pub struct MemStorage {
    data: RwLock<HashMap<PathBuf, Vec<u8>>>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemStorage {
    fn read_file(&self, key: &str) -> Result<Vec<u8>> {
        let path = normalize_key(key)?;
        let data = self.data.read().map_err(|_| StorageError::LockPoisoned)?;
        data.get(&path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn write_file(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = normalize_key(key)?;
        self.data
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .insert(path, value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = normalize_key(key)?;
        self.data
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .remove(&path);
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let path = normalize_key(key)?;
        Ok(self
            .data
            .read()
            .map_err(|_| StorageError::LockPoisoned)?
            .contains_key(&path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_mem_storage_basic_operations() -> Result<()> {
        let storage = MemStorage::new();
        storage.write_file("dir1/file1.txt", b"Hello, MemStorage")?;
        assert_eq!(storage.read_file("dir1/file1.txt")?, b"Hello, MemStorage");

        assert!(storage.exists("dir1/file1.txt")?);
        storage.remove("dir1/file1.txt")?;
        assert!(!storage.exists("dir1/file1.txt")?);
        match storage.read_file("dir1/file1.txt") {
            Err(StorageError::NotFound(_)) => {}
            _ => panic!("預期 NotFound 錯誤"),
        }
        Ok(())
    }

    #[test]
    fn test_keys_are_normalized() -> Result<()> {
        let storage = MemStorage::new();
        storage.write_file("/a/./b/../c.pem", b"data")?;
        assert_eq!(storage.read_file("a/c.pem")?, b"data");
        Ok(())
    }

    #[test]
    fn test_invalid_keys() {
        let storage = MemStorage::new();
        for key in ["", "invalid/", "../escape", "a\nb", "/"] {
            assert!(
                matches!(storage.write_file(key, b"data"), Err(StorageError::InvalidKey(_))),
                "key {:?} should be rejected",
                key
            );
        }
    }

    #[test]
    fn test_file_storage_basic_operations() -> Result<()> {
        let temp_dir = tempdir()?;
        let storage = FileStorage::open(temp_dir.path().join("store"))?;

        storage.write_file("example.com/cert.pem", b"Hello, FileStorage")?;
        assert!(storage.root().join("example.com/cert.pem").is_file());
        assert_eq!(storage.read_file("example.com/cert.pem")?, b"Hello, FileStorage");

        storage.write_file("example.com/cert.pem", b"short")?;
        assert_eq!(storage.read_file("example.com/cert.pem")?, b"short");

        storage.remove("example.com/cert.pem")?;
        assert!(!storage.exists("example.com/cert.pem")?);
        storage.remove("example.com/cert.pem")?;
        assert!(matches!(
            storage.read_file("example.com/cert.pem"),
            Err(StorageError::NotFound(_))
        ));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_file_storage_restricts_permissions() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempdir()?;
        let storage = FileStorage::open(temp_dir.path())?;
        storage.write_file("key.pem", b"secret")?;

        let mode = fs::metadata(temp_dir.path().join("key.pem"))?.permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        Ok(())
    }
}
