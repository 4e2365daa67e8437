//! URL resolution: cache, then local fixtures, then the network.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheKey, DiskCache};
use crate::error::{FetchError, Result};
use crate::transport::Transport;

/// Reserved prefix for URLs served from the local fixtures directory.
pub const LOOPBACK_PREFIX: &str = "http://localhost:1234/";

/// Default fixtures directory (the JSON-Schema-Test-Suite remotes corpus).
pub const DEFAULT_FIXTURES_DIR: &str = "JSON-Schema-Test-Suite/remotes";

/// Redirects URLs under `prefix` to files under `dir`.
#[derive(Debug, Clone)]
pub struct LocalFixtures {
    prefix: String,
    dir: PathBuf,
}

impl Default for LocalFixtures {
    fn default() -> Self {
        Self::new(LOOPBACK_PREFIX, DEFAULT_FIXTURES_DIR)
    }
}

impl LocalFixtures {
    pub fn new(prefix: &str, dir: impl AsRef<Path>) -> Self {
        Self {
            prefix: prefix.to_string(),
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Local path for `url`, or `None` when the URL is not under the prefix.
    ///
    /// The remainder must be a plain relative path; `..` and absolute
    /// components are rejected.
    pub fn resolve(&self, url: &str) -> Option<Result<PathBuf>> {
        let rest = url.strip_prefix(&self.prefix)?;
        let rel = Path::new(rest);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if rest.is_empty() || escapes {
            return Some(Err(FetchError::InvalidFixturePath {
                url: url.to_string(),
            }));
        }
        Some(Ok(self.dir.join(rel)))
    }
}

/// Fetches URLs through the disk cache.
///
/// Not locked: two fetchers racing on the same key may both hit the network;
/// the cache keeps whichever complete entry lands first.
pub struct RemoteFetcher {
    cache: DiskCache,
    fixtures: LocalFixtures,
    transport: Arc<dyn Transport>,
}

impl RemoteFetcher {
    pub fn new(cache: DiskCache, fixtures: LocalFixtures, transport: Arc<dyn Transport>) -> Self {
        Self {
            cache,
            fixtures,
            transport,
        }
    }

    pub fn cache(&self) -> &DiskCache {
        &self.cache
    }

    pub fn fixtures(&self) -> &LocalFixtures {
        &self.fixtures
    }

    /// Resolve `url` to bytes.
    ///
    /// Cache hits are returned verbatim with no freshness check. Loopback URLs
    /// are read from disk and never cached. Everything else is fetched live and
    /// persisted before returning.
    pub fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let key = CacheKey::for_url(url);

        if let Some(data) = self.cache.get(&key)? {
            debug!(url = %url, key = %key, "cache hit");
            return Ok(data);
        }

        if let Some(path) = self.fixtures.resolve(url) {
            let path = path?;
            debug!(url = %url, path = ?path, "serving local fixture");
            return std::fs::read(&path).map_err(|source| FetchError::LocalRead { path, source });
        }

        debug!(url = %url, key = %key, "cache miss");
        let data = self.transport.get(url)?;
        self.cache.put(&key, &data)?;
        Ok(data)
    }
}
