//! Content-addressed image storage for listing photos
//!
//! Uploads are stored under `<sha256 of the bytes>.<ext>` in a single
//! directory. A file is written once; uploading the same bytes again returns
//! the existing path.
use super::config::UploadLimits;
use super::error::{MarketError, Result, ValidationError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub file_name: String,
    /// Public path, suitable for `Item::images`.
    pub file_path: String,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    limits: UploadLimits,
}

impl FileStore {
    pub fn open(root: impl Into<PathBuf>, limits: UploadLimits) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root, limits })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn put(&self, name: &str, bytes: &[u8]) -> Result<StoredFile> {
        let ext = self.check(name, bytes)?;
        let file_name = format!("{}.{ext}", sha256::digest(bytes));
        let path = self.root.join(&file_name);

        if path.exists() {
            debug!(file = %file_name, "upload already stored");
        } else {
            fs::write(&path, bytes)?;
            info!(file = %file_name, size = bytes.len(), "image stored");
        }

        Ok(StoredFile {
            file_path: format!("{}/{file_name}", self.limits.public_prefix.trim_end_matches('/')),
            file_name,
        })
    }

    /// Store a batch. The whole batch is validated before anything is written.
    pub fn put_many(&self, files: &[(&str, &[u8])]) -> Result<Vec<StoredFile>> {
        if files.is_empty() {
            return Err(ValidationError::NoImages.into());
        }
        if files.len() > self.limits.max_files {
            return Err(ValidationError::TooManyFiles(self.limits.max_files).into());
        }
        for (name, bytes) in files {
            self.check(name, bytes)?;
        }
        files.iter().map(|(name, bytes)| self.put(name, bytes)).collect()
    }

    /// Read a stored file by its public path or bare file name.
    pub fn read(&self, path: &str) -> Result<Vec<u8>> {
        // only the last component is honoured, nothing outside the root is reachable
        let file_name = Path::new(path)
            .file_name()
            .ok_or_else(|| MarketError::not_found(format!("File {path}")))?;

        match fs::read(self.root.join(file_name)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(MarketError::not_found(format!("File {path}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    // Returns the normalised extension.
    fn check(&self, name: &str, bytes: &[u8]) -> Result<String> {
        let ext = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if !self.limits.extensions.iter().any(|allowed| *allowed == ext) {
            return Err(ValidationError::UnsupportedImage(name.to_string()).into());
        }
        if bytes.len() as u64 > self.limits.max_bytes {
            return Err(ValidationError::FileTooLarge {
                max: self.limits.max_bytes,
            }
            .into());
        }
        Ok(ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path) -> FileStore {
        FileStore::open(dir.join("uploads"), UploadLimits::default()).unwrap()
    }

    #[test]
    fn same_bytes_share_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = store(dir.path());

        let first = files.put("Shirt.PNG", b"fake png").unwrap();
        let again = files.put("other-name.png", b"fake png").unwrap();

        assert_eq!(first, again);
        assert!(first.file_name.ends_with(".png"));
        assert_eq!(first.file_path, format!("/uploads/{}", first.file_name));
        assert_eq!(files.read(&first.file_path).unwrap(), b"fake png");
    }

    #[test]
    fn rejects_unknown_types_and_large_files() {
        let dir = tempfile::tempdir().unwrap();
        let files = FileStore::open(
            dir.path(),
            UploadLimits {
                max_bytes: 4,
                ..UploadLimits::default()
            },
        )
        .unwrap();

        assert!(matches!(
            files.put("notes.txt", b"hi").unwrap_err(),
            MarketError::Validation(ValidationError::UnsupportedImage(_))
        ));
        assert!(matches!(
            files.put("big.jpg", b"too big").unwrap_err(),
            MarketError::Validation(ValidationError::FileTooLarge { max: 4 })
        ));
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let files = store(dir.path());

        let batch: Vec<(&str, &[u8])> = vec![("a.png", &b"a"[..]), ("b.exe", &b"b"[..])];
        assert!(files.put_many(&batch).is_err());
        assert_eq!(fs::read_dir(files.root()).unwrap().count(), 0);

        let six: Vec<(&str, &[u8])> = (0..6).map(|_| ("a.png", &b"a"[..])).collect();
        assert!(matches!(
            files.put_many(&six).unwrap_err(),
            MarketError::Validation(ValidationError::TooManyFiles(5))
        ));
    }

    #[test]
    fn read_stays_inside_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let files = store(dir.path());
        fs::write(dir.path().join("secret.png"), b"x").unwrap();

        assert!(matches!(
            files.read("../secret.png").unwrap_err(),
            MarketError::NotFound(_)
        ));
    }
}
