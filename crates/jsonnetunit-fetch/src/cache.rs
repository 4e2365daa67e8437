//! Flat on-disk cache of fetched payloads.
//!
//! Layout: `<root>/<key>` where `<key>` is [`CacheKey::for_url`]. File
//! contents are the raw response bytes. There is no eviction and no TTL.

use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{FetchError, Result};

/// Longest key kept in reversible form. Longer URLs fall back to a digest.
const MAX_ENCODED_KEY_LEN: usize = 200;

/// Filesystem-safe name for a cached URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for `url`.
    ///
    /// URL-safe base64 of the UTF-8 bytes, which round-trips back to the URL.
    /// Keys that would not fit in a filename become `sha256-<hex>` instead.
    pub fn for_url(url: &str) -> Self {
        let encoded = URL_SAFE_NO_PAD.encode(url.as_bytes());
        if encoded.len() <= MAX_ENCODED_KEY_LEN {
            return CacheKey(encoded);
        }
        let digest = Sha256::digest(url.as_bytes());
        CacheKey(format!("sha256-{}", hex::encode(digest)))
    }

    /// Recover the URL for reversible keys. `None` for digest keys.
    pub fn decode_url(&self) -> Option<String> {
        if self.0.starts_with("sha256-") {
            return None;
        }
        let bytes = URL_SAFE_NO_PAD.decode(self.0.as_bytes()).ok()?;
        String::from_utf8(bytes).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Directory-backed cache. The directory is created lazily on first write.
#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    /// Read an entry. A missing entry is `Ok(None)`, not an error.
    pub fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>> {
        let path = self.entry_path(key);
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(FetchError::Cache { path, source }),
        }
    }

    /// Whether an entry exists for `key`.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entry_path(key).is_file()
    }

    /// Store `data` under `key` unless an entry is already present.
    ///
    /// Writes a temp file next to the target and renames it into place without
    /// clobbering, so a concurrent first writer for the same key leaves exactly
    /// one complete entry behind.
    pub fn put(&self, key: &CacheKey, data: &[u8]) -> Result<()> {
        let path = self.entry_path(key);
        if path.exists() {
            debug!(key = %key, "cache entry already present");
            return Ok(());
        }

        let cache_err = |source| FetchError::Cache {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.root).map_err(|source| FetchError::Cache {
            path: self.root.clone(),
            source,
        })?;

        let mut tmp = NamedTempFile::new_in(&self.root).map_err(cache_err)?;
        tmp.write_all(data).map_err(cache_err)?;

        match tmp.persist_noclobber(&path) {
            Ok(_) => Ok(()),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(cache_err(e.error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_cache() -> (tempfile::TempDir, DiskCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path().join(".cache"));
        (dir, cache)
    }

    #[test]
    fn key_is_deterministic_and_reversible() {
        let url = "https://json-schema.org/draft/2020-12/schema";
        let a = CacheKey::for_url(url);
        let b = CacheKey::for_url(url);
        assert_eq!(a, b);
        assert_eq!(a.decode_url().as_deref(), Some(url));
    }

    #[test]
    fn key_is_filesystem_safe() {
        let key = CacheKey::for_url("http://example.com/a/b?c=d&e=f#frag");
        assert!(!key.as_str().contains('/'));
        assert!(!key.as_str().contains('+'));
        assert!(!key.as_str().contains('='));
    }

    #[test]
    fn distinct_urls_get_distinct_keys() {
        let a = CacheKey::for_url("http://example.com/a");
        let b = CacheKey::for_url("http://example.com/b");
        assert_ne!(a, b);
    }

    #[test]
    fn long_url_falls_back_to_digest() {
        let url = format!("https://example.com/{}", "x".repeat(400));
        let key = CacheKey::for_url(&url);
        assert!(key.as_str().starts_with("sha256-"));
        assert_eq!(key.as_str().len(), "sha256-".len() + 64);
        assert!(key.decode_url().is_none());
    }

    #[test]
    fn missing_entry_is_none() {
        let (_dir, cache) = make_cache();
        let key = CacheKey::for_url("http://example.com/missing");
        assert!(cache.get(&key).unwrap().is_none());
        assert!(!cache.contains(&key));
    }

    #[test]
    fn put_creates_directory_and_roundtrips() {
        let (_dir, cache) = make_cache();
        let key = CacheKey::for_url("http://example.com/a.json");
        cache.put(&key, b"{\"a\":1}").unwrap();
        assert!(cache.root().is_dir());
        assert_eq!(cache.get(&key).unwrap().unwrap(), b"{\"a\":1}");
    }

    #[test]
    fn put_never_replaces_existing_entry() {
        let (_dir, cache) = make_cache();
        let key = CacheKey::for_url("http://example.com/a.json");
        cache.put(&key, b"first").unwrap();
        cache.put(&key, b"second").unwrap();
        assert_eq!(cache.get(&key).unwrap().unwrap(), b"first");

        let entries: Vec<_> = fs::read_dir(cache.root()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
