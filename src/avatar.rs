//! Avatar Storage & Image Sniffing
//!
//! Uploaded avatars are validated by content, never by filename: the image
//! kind is detected from magic numbers in the first 512 bytes, and anything
//! that is not JPEG or PNG is rejected before it reaches storage.
//!
//! New accounts that never upload anything get a random avatar from a fixed
//! default pool.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use rand::Rng;
use uuid::Uuid;

/// Default avatars assigned at signup, from <https://gopherize.me>
const DEFAULT_AVATARS: &[&str] = &[
    "https://storage.googleapis.com/gopherizeme.appspot.com/gophers/30c621a657fb4a0bf4234e1f20f7ce91333fd712.png",
    "https://storage.googleapis.com/gopherizeme.appspot.com/gophers/2046af9c8e11b2cbb4b2645ade710820a25fdf5a.png",
    "https://storage.googleapis.com/gopherizeme.appspot.com/gophers/39d232350da7b7a14d6c2f77ca29e07e01621376.png",
    "https://storage.googleapis.com/gopherizeme.appspot.com/gophers/3c7ee5835c4757164348ea6f1632d98905eb8bf1.png",
    "https://storage.googleapis.com/gopherizeme.appspot.com/gophers/96382a6c0ebab94b2c25e825b243f5936a90ef0f.png",
    "https://storage.googleapis.com/gopherizeme.appspot.com/gophers/db248fdd04d02e221b1f72ea10c85ccba1797b18.png",
];

/// Pick a random default avatar for a new account
pub fn random_default_avatar() -> &'static str {
    let index = rand::thread_rng().gen_range(0..DEFAULT_AVATARS.len());
    DEFAULT_AVATARS[index]
}

/// Image kinds accepted for avatars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl ImageKind {
    /// File extension used when persisting
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    /// MIME type of the detected content
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// Detect the image kind from content, examining at most the first 512
/// bytes. Returns `None` for anything that is not a JPEG or PNG, regardless
/// of what the upload claims to be.
pub fn sniff_image(data: &[u8]) -> Option<ImageKind> {
    let head = &data[..data.len().min(512)];

    if head.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(ImageKind::Jpeg);
    }
    if head.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some(ImageKind::Png);
    }
    None
}

/// Avatar storage failed
#[derive(Debug)]
pub struct AvatarError(String);

impl fmt::Display for AvatarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "avatar storage failed: {}", self.0)
    }
}

impl std::error::Error for AvatarError {}

/// The object-storage collaborator for avatar uploads.
///
/// Callers hand over already-sniffed image bytes and get back a stable
/// public URL. One avatar per account: re-uploading overwrites.
#[async_trait]
pub trait AvatarStore: Send + Sync {
    async fn store(&self, owner: Uuid, kind: ImageKind, data: Bytes) -> Result<String, AvatarError>;
}

/// Filesystem-backed avatar store.
///
/// Writes to `<root>/<owner>/avatar.<ext>` and returns
/// `<public_base>/<owner>/avatar.<ext>`.
#[derive(Debug, Clone)]
pub struct FsAvatarStore {
    root: PathBuf,
    public_base: String,
}

impl FsAvatarStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into(),
        }
    }
}

#[async_trait]
impl AvatarStore for FsAvatarStore {
    async fn store(
        &self,
        owner: Uuid,
        kind: ImageKind,
        data: Bytes,
    ) -> Result<String, AvatarError> {
        let dir = self.root.join(owner.to_string());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AvatarError(e.to_string()))?;

        let filename = format!("avatar.{}", kind.extension());
        tokio::fs::write(dir.join(&filename), &data)
            .await
            .map_err(|e| AvatarError(e.to_string()))?;

        Ok(format!("{}/{}/{}", self.public_base, owner, filename))
    }
}

/// In-memory avatar store for tests and keyless development
#[derive(Debug, Default)]
pub struct MemoryAvatarStore {
    uploads: std::sync::RwLock<std::collections::HashMap<Uuid, (ImageKind, Bytes)>>,
}

impl MemoryAvatarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes stored for an owner (test helper)
    pub fn get(&self, owner: Uuid) -> Option<(ImageKind, Bytes)> {
        self.uploads.read().unwrap().get(&owner).cloned()
    }
}

#[async_trait]
impl AvatarStore for MemoryAvatarStore {
    async fn store(
        &self,
        owner: Uuid,
        kind: ImageKind,
        data: Bytes,
    ) -> Result<String, AvatarError> {
        self.uploads.write().unwrap().insert(owner, (kind, data));
        Ok(format!("memory://avatars/{}/avatar.{}", owner, kind.extension()))
    }
}
