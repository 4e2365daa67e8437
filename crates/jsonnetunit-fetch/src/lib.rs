//! jsonnetunit-fetch: disk-cached remote fetching
//!
//! Resolves URLs to bytes for the `fetch` native function. Resolution order:
//!
//! 1. the [`DiskCache`], keyed by a deterministic encoding of the URL
//! 2. [`LocalFixtures`], for URLs under the reserved loopback prefix
//! 3. a live GET through a [`Transport`], written back into the cache
//!
//! The cache never expires entries. Clearing it is a manual operation.

pub mod cache;
pub mod error;
pub mod fakes;
pub mod fetcher;
pub mod transport;

pub use cache::{CacheKey, DiskCache};
pub use error::{FetchError, Result};
pub use fetcher::{LocalFixtures, RemoteFetcher, DEFAULT_FIXTURES_DIR, LOOPBACK_PREFIX};
pub use transport::{HttpTransport, Transport};
