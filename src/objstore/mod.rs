//! Object store for proof photos
//!
//! Submissions reference their photo evidence by URL; this seam turns bytes
//! into a dereferenceable URL and back. The disk store writes under a
//! configured directory and serves through the `/media/{name}` route.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

use crate::types::{GreenwayError, Result};

/// Binary storage seam: bytes in, dereferenceable URL out
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object and return the URL it can be fetched from
    async fn put(&self, bytes: &[u8], content_type: &str) -> Result<String>;

    /// Fetch a stored object by name, with its content type
    async fn get(&self, name: &str) -> Result<Option<(Vec<u8>, String)>>;

    /// Remove a stored object; deleting a missing object succeeds
    async fn delete(&self, name: &str) -> Result<()>;
}

/// Disk-backed object store
pub struct DiskObjectStore {
    dir: PathBuf,
    public_url: String,
}

impl DiskObjectStore {
    pub fn new(dir: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_url: public_url.into(),
        }
    }

    /// Create the media directory if it does not exist yet
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| GreenwayError::ObjectStore(format!("Cannot create media dir: {}", e)))
    }

    fn extension_for(content_type: &str) -> &'static str {
        match content_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "bin",
        }
    }

    fn content_type_for(name: &str) -> &'static str {
        match name.rsplit('.').next() {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("webp") => "image/webp",
            Some("gif") => "image/gif",
            _ => "application/octet-stream",
        }
    }

    fn valid_name(name: &str) -> bool {
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            && !name.contains("..")
    }
}

#[async_trait]
impl ObjectStore for DiskObjectStore {
    async fn put(&self, bytes: &[u8], content_type: &str) -> Result<String> {
        let name = format!(
            "{}.{}",
            Uuid::new_v4(),
            Self::extension_for(content_type)
        );
        let path = self.dir.join(&name);

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| GreenwayError::ObjectStore(format!("Write failed: {}", e)))?;

        debug!(name = %name, size = bytes.len(), "Stored object");
        Ok(format!("{}/media/{}", self.public_url.trim_end_matches('/'), name))
    }

    async fn get(&self, name: &str) -> Result<Option<(Vec<u8>, String)>> {
        // Names are always our own uuid.ext form; anything else is refused
        if !Self::valid_name(name) {
            return Ok(None);
        }

        let path = self.dir.join(name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some((bytes, Self::content_type_for(name).to_string()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(GreenwayError::ObjectStore(format!("Read failed: {}", e))),
        }
    }

    async fn delete(&self, name: &str) -> Result<()> {
        if !Self::valid_name(name) {
            return Ok(());
        }

        let path = self.dir.join(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(GreenwayError::ObjectStore(format!("Delete failed: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_validation_refuses_traversal() {
        assert!(DiskObjectStore::valid_name("abc-123.jpg"));
        assert!(!DiskObjectStore::valid_name("../etc/passwd"));
        assert!(!DiskObjectStore::valid_name("a/b.jpg"));
        assert!(!DiskObjectStore::valid_name(""));
    }

    #[test]
    fn content_type_round_trip() {
        assert_eq!(DiskObjectStore::extension_for("image/png"), "png");
        assert_eq!(DiskObjectStore::content_type_for("x.png"), "image/png");
        assert_eq!(
            DiskObjectStore::content_type_for("x.unknown"),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn put_then_get() {
        let dir = std::env::temp_dir().join(format!("greenway-test-{}", Uuid::new_v4()));
        let store = DiskObjectStore::new(&dir, "http://localhost:8080");
        store.ensure_dir().await.unwrap();

        let url = store.put(b"fake-jpeg-bytes", "image/jpeg").await.unwrap();
        assert!(url.starts_with("http://localhost:8080/media/"));

        let name = url.rsplit('/').next().unwrap();
        let (bytes, content_type) = store.get(name).await.unwrap().unwrap();
        assert_eq!(bytes, b"fake-jpeg-bytes");
        assert_eq!(content_type, "image/jpeg");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn delete_removes_the_object_and_tolerates_missing_names() {
        let dir = std::env::temp_dir().join(format!("greenway-test-{}", Uuid::new_v4()));
        let store = DiskObjectStore::new(&dir, "http://localhost:8080");
        store.ensure_dir().await.unwrap();

        let url = store.put(b"orphan-bytes", "image/png").await.unwrap();
        let name = url.rsplit('/').next().unwrap().to_string();

        store.delete(&name).await.unwrap();
        assert!(store.get(&name).await.unwrap().is_none());

        // Deleting again, or deleting something never stored, is a no-op
        store.delete(&name).await.unwrap();
        store.delete("never-stored.jpg").await.unwrap();

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
