//! Product image upload.
//!
//! With a remote store the file goes to object storage under a random path
//! and the public URL is returned. Otherwise the bytes are kept in a
//! process-local session registry and a `blob:shoebox/<uuid>` reference is
//! returned instead.
//!
//! Session references are not persisted and stop resolving once the process
//! exits or the image has been idle for [`SESSION_IDLE`]. A product saved
//! with such a reference keeps a dangling `image_url` afterwards.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use crate::remote::{RemoteClient, RemoteOutcome};

/// Prefix of session image references.
pub const SESSION_PREFIX: &str = "blob:shoebox/";

/// Idle time after which a session image is dropped.
pub const SESSION_IDLE: Duration = Duration::from_secs(30 * 60);

/// Total bytes kept in the session registry.
const SESSION_CAPACITY_BYTES: u64 = 64 * 1024 * 1024;

/// Folder inside the bucket that product images are uploaded to.
const REMOTE_FOLDER: &str = "products";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image file is empty")]
    Empty,
    #[error("Failed to read image {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A binary file handed in for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImageUpload {
    /// Wrap in-memory bytes, guessing the content type from the file name.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(&file_name).to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// Read an image from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Io`] if the file cannot be read.
    pub async fn from_path(path: &Path) -> Result<Self, ImageError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ImageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(file_name, bytes))
    }

    /// Lowercased extension of the file name, `bin` when there is none.
    #[must_use]
    pub fn extension(&self) -> String {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty() && e.bytes().all(|b| b.is_ascii_alphanumeric()))
            .map_or_else(|| "bin".to_string(), str::to_ascii_lowercase)
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("avif") => "image/avif",
        _ => "application/octet-stream",
    }
}

/// An image held for the current session.
#[derive(Debug, Clone)]
pub struct SessionImage {
    pub content_type: String,
    pub bytes: Arc<Vec<u8>>,
}

/// Process-local registry of images uploaded without a remote store.
#[derive(Clone)]
pub struct SessionImages {
    cache: Cache<Uuid, SessionImage>,
}

impl std::fmt::Debug for SessionImages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionImages")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl Default for SessionImages {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionImages {
    #[must_use]
    pub fn new() -> Self {
        let cache = Cache::builder()
            .max_capacity(SESSION_CAPACITY_BYTES)
            .weigher(|_id: &Uuid, image: &SessionImage| {
                u32::try_from(image.bytes.len()).unwrap_or(u32::MAX)
            })
            .time_to_idle(SESSION_IDLE)
            .build();
        Self { cache }
    }

    /// Keep an upload for this session and return its reference.
    pub async fn register(&self, upload: ImageUpload) -> String {
        let id = Uuid::new_v4();
        self.cache
            .insert(
                id,
                SessionImage {
                    content_type: upload.content_type,
                    bytes: Arc::new(upload.bytes),
                },
            )
            .await;
        format!("{SESSION_PREFIX}{id}")
    }

    /// Look up a session reference. `None` once the image is gone or for any
    /// other URL.
    pub async fn resolve(&self, reference: &str) -> Option<SessionImage> {
        let id = reference.strip_prefix(SESSION_PREFIX)?;
        let id = Uuid::parse_str(id).ok()?;
        self.cache.get(&id).await
    }
}

/// Uploads product images to the remote bucket or the session registry.
#[derive(Debug, Clone)]
pub struct ImageStore {
    remote: Option<RemoteClient>,
    session: SessionImages,
}

impl ImageStore {
    #[must_use]
    pub fn new(remote: Option<RemoteClient>) -> Self {
        Self {
            remote,
            session: SessionImages::new(),
        }
    }

    /// Session registry used when the remote bucket is not available.
    #[must_use]
    pub const fn session(&self) -> &SessionImages {
        &self.session
    }

    /// Upload an image and return a URL for it.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Empty`] for an empty file.
    #[instrument(skip(self, upload), fields(file_name = %upload.file_name))]
    pub async fn upload(&self, upload: ImageUpload) -> Result<String, ImageError> {
        if upload.bytes.is_empty() {
            return Err(ImageError::Empty);
        }

        if let Some(remote) = &self.remote {
            let path = format!("{REMOTE_FOLDER}/{}.{}", Uuid::new_v4(), upload.extension());
            // The bytes are needed again if the upload falls through.
            match remote
                .upload_object(&path, &upload.content_type, upload.bytes.clone())
                .await
            {
                RemoteOutcome::Success(url) => {
                    tracing::debug!(%url, "Image uploaded to remote bucket");
                    return Ok(url);
                }
                RemoteOutcome::Unavailable(_) | RemoteOutcome::Invalid(_) => {}
            }
        }

        let reference = self.session.register(upload).await;
        tracing::debug!(%reference, "Image kept for this session only");
        Ok(reference)
    }
}
