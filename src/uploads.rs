// Photos and profile pictures on local disk. Rows store paths relative to the root.
use std::path::{Path, PathBuf};

use chrono::Utc;

const PHOTO_DIR: &str = "uploads";
const PROFILE_DIR: &str = "profile_pics";

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Invalid file name")]
    InvalidName,

    #[error("File not found")]
    NotFound,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
}

impl UploadDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store a photo as `uploads/<YYYYmmddHHMMSS>_<name>` and return that path.
    pub async fn save_photo(&self, original_name: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let name = format!(
            "{}_{}",
            Utc::now().format("%Y%m%d%H%M%S"),
            client_file_name(original_name)?
        );
        self.write(PHOTO_DIR, &name, bytes).await
    }

    /// Store a profile picture as `profile_pics/user_<id>_<name>` and return that path.
    pub async fn save_profile_picture(
        &self,
        user_id: i64,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<String, UploadError> {
        let name = format!("user_{}_{}", user_id, client_file_name(original_name)?);
        self.write(PROFILE_DIR, &name, bytes).await
    }

    pub async fn read_photo(&self, file_name: &str) -> Result<Vec<u8>, UploadError> {
        self.read(PHOTO_DIR, file_name).await
    }

    pub async fn read_profile_picture(&self, file_name: &str) -> Result<Vec<u8>, UploadError> {
        self.read(PROFILE_DIR, file_name).await
    }

    /// Remove a file returned by one of the `save_*` methods. Failures are logged, not returned.
    pub async fn discard(&self, relative: &str) {
        let valid = relative
            .split_once('/')
            .filter(|(dir, name)| {
                (*dir == PHOTO_DIR || *dir == PROFILE_DIR) && check_stored_name(name).is_ok()
            })
            .is_some();
        if !valid {
            tracing::warn!("Refusing to discard upload {}", relative);
            return;
        }
        if let Err(e) = tokio::fs::remove_file(self.root.join(relative)).await {
            tracing::warn!("Failed to discard upload {}: {}", relative, e);
        }
    }

    async fn write(&self, dir: &str, name: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let dir_path = self.root.join(dir);
        tokio::fs::create_dir_all(&dir_path).await?;
        tokio::fs::write(dir_path.join(name), bytes).await?;

        let relative = format!("{}/{}", dir, name);
        tracing::info!("Stored upload {} ({} bytes)", relative, bytes.len());
        Ok(relative)
    }

    async fn read(&self, dir: &str, file_name: &str) -> Result<Vec<u8>, UploadError> {
        check_stored_name(file_name)?;
        match tokio::fs::read(self.root.join(dir).join(file_name)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(UploadError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keep only the final path component of a client-supplied name.
pub fn client_file_name(original: &str) -> Result<&str, UploadError> {
    let name = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        return Err(UploadError::InvalidName);
    }
    Ok(name)
}

/// Names in fetch URLs must be a bare file name.
fn check_stored_name(name: &str) -> Result<(), UploadError> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(UploadError::InvalidName);
    }
    Ok(())
}

pub fn content_type(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .as_ref()
        .to_string()
}
