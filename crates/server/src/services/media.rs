//! Object-storage collaborator for customer pictures.
//!
//! The contract is narrow: accept a binary payload, return a stable
//! reference string. The catalog service treats failures here as best-effort
//! (logged and swallowed), so nothing in this module may block or abort a
//! customer write.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;

/// Errors from the media store.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// Underlying I/O failure.
    #[error("media I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stores binary payloads and hands back reference strings.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Store `bytes` under a name derived from `filename`, returning the
    /// reference to keep on the owning record.
    async fn put(&self, filename: &str, bytes: &[u8]) -> Result<String, MediaError>;
}

/// Filesystem-backed media store.
///
/// Objects land under `root` with a timestamped name; the returned reference
/// is the path relative to `root`, e.g. `media/1719000000000-0-avatar.png`.
pub struct FsMediaStorage {
    root: PathBuf,
    counter: AtomicU64,
}

impl FsMediaStorage {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// first write.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            counter: AtomicU64::new(0),
        }
    }

    fn object_name(&self, filename: &str) -> String {
        // Keep only the extension of the client-supplied name; everything
        // else is untrusted.
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| e.chars().all(char::is_alphanumeric));
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let stamp = Utc::now().timestamp_millis();
        match ext {
            Some(ext) => format!("{stamp}-{seq}.{ext}"),
            None => format!("{stamp}-{seq}"),
        }
    }
}

#[async_trait]
impl MediaStorage for FsMediaStorage {
    async fn put(&self, filename: &str, bytes: &[u8]) -> Result<String, MediaError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let name = self.object_name(filename);
        tokio::fs::write(self.root.join(&name), bytes).await?;
        Ok(format!("media/{name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_writes_bytes_and_returns_reference() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsMediaStorage::new(dir.path().to_path_buf());

        let reference = store.put("avatar.png", b"not really a png").await.expect("put");
        assert!(reference.starts_with("media/"));
        assert!(reference.ends_with(".png"));

        let name = reference.strip_prefix("media/").expect("prefix");
        let written = tokio::fs::read(dir.path().join(name)).await.expect("read");
        assert_eq!(written, b"not really a png");
    }

    #[tokio::test]
    async fn suspicious_extensions_are_dropped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsMediaStorage::new(dir.path().to_path_buf());

        let reference = store.put("../../etc/passwd", b"x").await.expect("put");
        let name = reference.strip_prefix("media/").expect("prefix");
        assert!(!name.contains('/'));
    }

    #[tokio::test]
    async fn distinct_uploads_get_distinct_references() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsMediaStorage::new(dir.path().to_path_buf());

        let a = store.put("a.png", b"a").await.expect("put");
        let b = store.put("a.png", b"b").await.expect("put");
        assert_ne!(a, b);
    }
}
