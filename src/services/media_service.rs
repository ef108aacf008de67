use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use tracing::debug;
use uuid::Uuid;

/// URL prefix the media directory is served under.
pub const MEDIA_URL: &str = "/media";

const RECIPE_IMAGE_DIR: &str = "recipes/images";

/// Declared types a recipe image may carry.
const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/gif", "image/webp"];

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Image is not valid base64: {0}")]
    InvalidEncoding(String),
    #[error("Image is empty")]
    Empty,
    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),
    #[error("Upload a valid image. The file is not a JPEG, PNG, GIF or WebP image.")]
    NotAnImage,
    #[error("Failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw image bytes decoded from a request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub extension: String,
}

/// Decodes `data:image/png;base64,...` or a bare base64 string.
///
/// The declared type must be an allowed image type, and the bytes must
/// actually be one; the stored extension follows the bytes.
pub fn decode_image(encoded: &str) -> Result<DecodedImage, MediaError> {
    let payload = match encoded.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest
                .split_once(',')
                .ok_or_else(|| MediaError::InvalidEncoding("missing ',' after data URL header".to_string()))?;
            let mime = header.strip_suffix(";base64").unwrap_or(header).to_ascii_lowercase();
            if !ALLOWED_IMAGE_TYPES.contains(&mime.as_str()) {
                return Err(MediaError::UnsupportedType(mime));
            }
            data
        }
        None => encoded,
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| MediaError::InvalidEncoding(e.to_string()))?;
    if bytes.is_empty() {
        return Err(MediaError::Empty);
    }

    let extension = sniff_extension(&bytes).ok_or(MediaError::NotAnImage)?.to_string();
    Ok(DecodedImage { bytes, extension })
}

// Magic numbers of the accepted formats.
fn sniff_extension(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some("png"),
        [0xFF, 0xD8, 0xFF, ..] => Some("jpg"),
        [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some("gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("webp"),
        _ => None,
    }
}

/// Public URL for a stored image reference.
pub fn media_url(reference: &str) -> String {
    format!("{MEDIA_URL}/{reference}")
}

/// Persists uploaded images and hands back the reference stored on the row.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn save_recipe_image(&self, image: &DecodedImage) -> Result<String, MediaError>;
    async fn remove(&self, reference: &str) -> Result<(), MediaError>;
}

/// Stores images under a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsMediaStore {
    root: PathBuf,
}

impl FsMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn save_recipe_image(&self, image: &DecodedImage) -> Result<String, MediaError> {
        let dir = self.root.join(RECIPE_IMAGE_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), image.extension);
        tokio::fs::write(dir.join(&file_name), &image.bytes).await?;

        let reference = format!("{RECIPE_IMAGE_DIR}/{file_name}");
        debug!(reference = %reference, size = image.bytes.len(), "Stored recipe image.");
        Ok(reference)
    }

    async fn remove(&self, reference: &str) -> Result<(), MediaError> {
        match tokio::fs::remove_file(self.root.join(reference)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
