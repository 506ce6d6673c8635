//! Local-disk storage engine for review attachments
//!
//! Validates uploaded image payloads, generates collision-resistant stored
//! names, and persists bytes as flat files under a single content root.

use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::config::StorageConfig;
use crate::core::error::{AppError, Result};
use crate::shared::constants::{ACCEPTED_CONTENT_TYPES, ACCEPTED_EXTENSIONS, MAX_UPLOAD_SIZE};
use crate::shared::validation::is_path_safe;

/// Outcome of a successful store: everything the metadata layer records
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub stored_filename: String,
    pub file_path: String,
    pub file_size: i64,
}

/// Local-disk storage engine
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    /// Create a new storage engine from configuration
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: PathBuf::from(&config.root_dir),
        }
    }

    /// Create the storage root if missing
    ///
    /// Called once at startup; a root that cannot be created is fatal.
    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            AppError::Storage(format!(
                "Failed to create storage root '{}': {}",
                self.root.display(),
                e
            ))
        })?;

        info!("Storage root ready at '{}'", self.root.display());
        Ok(())
    }

    /// The configured content root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate and persist an uploaded payload
    ///
    /// # Arguments
    /// * `data` - The raw upload bytes
    /// * `content_type` - The declared MIME type
    /// * `original_filename` - The user-supplied filename (used only for
    ///   extension validation, never for path construction)
    ///
    /// # Returns
    /// The generated stored name plus size/path metadata. A collision on the
    /// generated name fails rather than overwriting the existing file.
    pub async fn store(
        &self,
        data: &[u8],
        content_type: &str,
        original_filename: &str,
    ) -> Result<StoredFile> {
        let extension = validate_upload(data, content_type, original_filename)?;

        let stored_filename = generate_stored_name(&extension);
        let path = self.root.join(&stored_filename);

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    AppError::Storage(format!("Stored name collision: '{}'", stored_filename))
                } else {
                    AppError::Storage(format!("Failed to create '{}': {}", stored_filename, e))
                }
            })?;

        if let Err(e) = write_file(&mut file, data).await {
            // Never leave a partial file behind
            drop(file);
            let _ = fs::remove_file(&path).await;
            return Err(AppError::Storage(format!(
                "Failed to write '{}': {}",
                stored_filename, e
            )));
        }

        debug!(
            "Stored '{}' ({} bytes) as '{}'",
            original_filename,
            data.len(),
            stored_filename
        );

        Ok(StoredFile {
            stored_filename,
            file_path: path.to_string_lossy().into_owned(),
            file_size: data.len() as i64,
        })
    }

    /// Read a stored file back as bytes
    pub async fn load(&self, stored_name: &str) -> Result<Vec<u8>> {
        let path = self.resolve(stored_name)?;

        match fs::read(&path).await {
            Ok(bytes) => {
                debug!("Loaded '{}' ({} bytes)", stored_name, bytes.len());
                Ok(bytes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("File not found: {}", stored_name)))
            }
            Err(e) => Err(AppError::Storage(format!(
                "Failed to read '{}': {}",
                stored_name, e
            ))),
        }
    }

    /// Delete a stored file
    ///
    /// Idempotent: returns `false` (not an error) when the file was already
    /// absent.
    pub async fn delete(&self, stored_name: &str) -> Result<bool> {
        let path = self.resolve(stored_name)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted stored file '{}'", stored_name);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to delete '{}': {}",
                stored_name, e
            ))),
        }
    }

    /// Check whether a stored file is present on disk
    pub async fn exists(&self, stored_name: &str) -> bool {
        if !is_path_safe(stored_name) {
            return false;
        }

        fs::try_exists(self.root.join(stored_name))
            .await
            .unwrap_or(false)
    }

    /// Resolve a stored name against the root, rejecting traversal attempts
    /// before touching the filesystem
    fn resolve(&self, stored_name: &str) -> Result<PathBuf> {
        if !is_path_safe(stored_name) {
            return Err(AppError::InvalidFile(format!(
                "Invalid stored file name: {}",
                stored_name
            )));
        }

        Ok(self.root.join(stored_name))
    }
}

async fn write_file(file: &mut fs::File, data: &[u8]) -> std::io::Result<()> {
    file.write_all(data).await?;
    file.sync_all().await
}

/// Validate an upload and return its lowercase extension (without the dot)
fn validate_upload(data: &[u8], content_type: &str, original_filename: &str) -> Result<String> {
    if data.is_empty() {
        return Err(AppError::InvalidFile("File is empty".to_string()));
    }

    if data.len() > MAX_UPLOAD_SIZE {
        return Err(AppError::InvalidFile(format!(
            "File exceeds maximum size of {} MB",
            MAX_UPLOAD_SIZE / 1024 / 1024
        )));
    }

    if !ACCEPTED_CONTENT_TYPES.contains(&content_type) {
        return Err(AppError::InvalidFile(format!(
            "Content type '{}' is not allowed. Allowed types: {}",
            content_type,
            ACCEPTED_CONTENT_TYPES.join(", ")
        )));
    }

    if original_filename.contains("..") {
        return Err(AppError::InvalidFile(
            "Filename contains invalid path sequence".to_string(),
        ));
    }

    let extension = original_filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .ok_or_else(|| AppError::InvalidFile("Filename has no extension".to_string()))?;

    if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::InvalidFile(format!(
            "File extension '.{}' is not allowed. Allowed extensions: .jpg, .jpeg, .png",
            extension
        )));
    }

    if !extension_matches_type(&extension, content_type) {
        return Err(AppError::InvalidFile(format!(
            "File extension '.{}' does not match declared content type '{}'",
            extension, content_type
        )));
    }

    Ok(extension)
}

/// Extension/type cross-check: disguised payloads fail even when both the
/// extension and the type are individually acceptable
fn extension_matches_type(extension: &str, content_type: &str) -> bool {
    match extension {
        "jpg" | "jpeg" => matches!(content_type, "image/jpeg" | "image/jpg"),
        "png" => content_type == "image/png",
        _ => false,
    }
}

/// `<UTC timestamp>_<8 hex chars>.<ext>`, e.g. `20250817_093015_a1b2c3d4.jpg`
fn generate_stored_name(extension: &str) -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}.{}", timestamp, &suffix[..8], extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::validation::STORED_FILENAME_REGEX;

    fn temp_engine() -> (DiskStorage, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskStorage::new(&StorageConfig {
            root_dir: dir.path().to_string_lossy().into_owned(),
        });
        (storage, dir)
    }

    #[tokio::test]
    async fn test_store_and_load_roundtrip() {
        let (storage, _dir) = temp_engine();

        // 9 MiB is under the limit and must be accepted
        let data = vec![0x42u8; 9 * 1024 * 1024];
        let stored = storage.store(&data, "image/png", "evidence.png").await.unwrap();

        assert!(STORED_FILENAME_REGEX.is_match(&stored.stored_filename));
        assert_eq!(stored.file_size, data.len() as i64);
        assert!(storage.exists(&stored.stored_filename).await);

        let loaded = storage.load(&stored.stored_filename).await.unwrap();
        assert_eq!(loaded.len(), data.len());
    }

    #[tokio::test]
    async fn test_store_rejects_unaccepted_extension() {
        let (storage, _dir) = temp_engine();

        let data = vec![0x42u8; 1024];
        let err = storage.store(&data, "image/png", "evidence.pdf").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidFile(_)));
    }

    #[tokio::test]
    async fn test_store_rejects_empty_and_oversize() {
        let (storage, _dir) = temp_engine();

        let err = storage.store(&[], "image/png", "a.png").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidFile(_)));

        let oversize = vec![0u8; MAX_UPLOAD_SIZE + 1];
        let err = storage.store(&oversize, "image/png", "a.png").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidFile(_)));
    }

    #[tokio::test]
    async fn test_store_rejects_content_type_outside_allow_list() {
        let (storage, _dir) = temp_engine();

        let err = storage
            .store(&[1, 2, 3], "application/pdf", "a.png")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidFile(_)));
    }

    #[tokio::test]
    async fn test_store_rejects_extension_type_mismatch() {
        let (storage, _dir) = temp_engine();

        let err = storage
            .store(&[1, 2, 3], "image/png", "disguised.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidFile(_)));

        // image/jpg is an accepted alias for jpeg extensions
        let stored = storage.store(&[1, 2, 3], "image/jpg", "photo.jpeg").await.unwrap();
        assert!(storage.exists(&stored.stored_filename).await);
    }

    #[tokio::test]
    async fn test_store_rejects_missing_extension_and_traversal_name() {
        let (storage, _dir) = temp_engine();

        let err = storage.store(&[1, 2, 3], "image/png", "noext").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidFile(_)));

        let err = storage
            .store(&[1, 2, 3], "image/png", "../up.png")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidFile(_)));
    }

    #[tokio::test]
    async fn test_load_missing_file_is_not_found() {
        let (storage, _dir) = temp_engine();

        let err = storage
            .load("20250101_000000_deadbeef.png")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_load_rejects_path_traversal() {
        let (storage, _dir) = temp_engine();

        let err = storage.load("../../etc/passwd").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidFile(_)));

        assert!(!storage.exists("../../etc/passwd").await);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (storage, _dir) = temp_engine();

        let stored = storage.store(&[1, 2, 3], "image/jpeg", "a.jpg").await.unwrap();

        assert!(storage.delete(&stored.stored_filename).await.unwrap());
        assert!(!storage.exists(&stored.stored_filename).await);
        assert!(!storage.delete(&stored.stored_filename).await.unwrap());
    }

    #[tokio::test]
    async fn test_init_creates_nested_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("content").join("images");
        let storage = DiskStorage::new(&StorageConfig {
            root_dir: root.to_string_lossy().into_owned(),
        });

        storage.init().await.unwrap();
        assert!(root.is_dir());
    }
}
