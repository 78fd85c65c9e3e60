/// Image upload storage
///
/// Uploaded bytes are handed to a [`MediaStore`], which returns the URL the
/// client should store on a property image. The local store writes under a
/// configured directory that the HTTP layer also serves statically.
///
/// # Example
///
/// ```no_run
/// use bytes::Bytes;
/// use coastal_shared::media::{LocalMediaStore, MediaStore};
///
/// # async fn example() -> Result<(), coastal_shared::media::MediaError> {
/// let store = LocalMediaStore::new("media", "/media");
/// let url = store.store("kitchen.png", Bytes::from_static(b"\x89PNG")).await?;
/// assert!(url.starts_with("/media/") && url.ends_with(".png"));
/// # Ok(())
/// # }
/// ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

/// Extension used when the upload's filename has none
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Longest extension kept from a client filename
const MAX_EXTENSION_LEN: usize = 10;

/// Error type for media storage
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// Nothing was uploaded
    #[error("Upload is empty")]
    Empty,

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination for uploaded media
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persists `data` and returns a URL for it
    ///
    /// A returned URL always points at a complete file.
    async fn store(&self, original_filename: &str, data: Bytes) -> Result<String, MediaError>;
}

/// Stores files on the local disk
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
    url_prefix: String,
}

impl LocalMediaStore {
    /// Creates a store writing into `root` and returning URLs under `url_prefix`
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        let url_prefix = url_prefix.into().trim_end_matches('/').to_string();
        Self {
            root: root.into(),
            url_prefix,
        }
    }

    /// Directory files are written to
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the storage directory if it does not exist
    pub async fn ensure_root(&self) -> Result<(), MediaError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn store(&self, original_filename: &str, data: Bytes) -> Result<String, MediaError> {
        if data.is_empty() {
            return Err(MediaError::Empty);
        }

        self.ensure_root().await?;

        let name = stored_file_name(original_filename);
        let final_path = self.root.join(&name);
        let part_path = self.root.join(format!("{}.part", name));

        let write = async {
            let mut file = fs::File::create(&part_path).await?;
            file.write_all(&data).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&part_path, &final_path).await
        };

        if let Err(e) = write.await {
            // Partial file is never renamed into place
            let _ = fs::remove_file(&part_path).await;
            return Err(MediaError::Io(e));
        }

        debug!(path = %final_path.display(), "Wrote media file");
        info!(file = %name, bytes = data.len(), "Stored upload");

        Ok(format!("{}/{}", self.url_prefix, name))
    }
}

/// Extension of a client filename, lowercased, without the dot
///
/// Falls back to [`DEFAULT_EXTENSION`] when the name has no usable extension.
pub fn file_extension(original_filename: &str) -> String {
    let base = original_filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_filename);

    match base.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

/// Random file name keeping the upload's extension
pub fn stored_file_name(original_filename: &str) -> String {
    format!("{}.{}", Uuid::new_v4().simple(), file_extension(original_filename))
}
